//! # NotificationRepository
//!
//! ユーザー通知の永続化を担当するリポジトリ。
//!
//! 既読化・削除の書き込みは `user_id` を条件に含め、
//! 所有者以外のリクエストでは行が一致しないようにする。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use saferoute_domain::{
    notification::{Notification, NotificationId, NotificationType},
    user::UserId,
    value_objects::ListLimit,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::corrupted;
use crate::error::InfraError;

/// 通知リポジトリトレイト
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError>;

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError>;

    /// ユーザーの通知を新しい順に取得
    async fn list_by_user(
        &self,
        user_id: &UserId,
        limit: ListLimit,
    ) -> Result<Vec<Notification>, InfraError>;

    /// 既読にする
    ///
    /// 既読済みの場合は最初の既読日時を保持する。
    /// 戻り値は所有者の通知が存在したか。
    async fn mark_read(
        &self,
        id: &NotificationId,
        owner: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, InfraError>;

    /// 削除する。戻り値は所有者の通知が存在したか。
    async fn delete(&self, id: &NotificationId, owner: &UserId) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    notification_id:   Uuid,
    user_id:           Uuid,
    notification_type: String,
    title:             String,
    message:           String,
    read_at:           Option<DateTime<Utc>>,
    created_at:        DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = InfraError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification::from_db(
            NotificationId::from_uuid(row.notification_id),
            UserId::from_uuid(row.user_id),
            row.notification_type
                .parse::<NotificationType>()
                .map_err(corrupted)?,
            row.title,
            row.message,
            row.read_at,
            row.created_at,
        ))
    }
}

/// PostgreSQL 実装の NotificationRepository
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %notification.user_id()))]
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                notification_id, user_id, notification_type, title, message,
                is_read, read_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id().as_uuid())
        .bind(notification.user_id().as_uuid())
        .bind(<&'static str>::from(notification.notification_type()))
        .bind(notification.title())
        .bind(notification.message())
        .bind(notification.is_read())
        .bind(notification.read_at())
        .bind(notification.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %id))]
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT notification_id, user_id, notification_type, title, message, read_at, created_at
            FROM notifications
            WHERE notification_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Notification::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn list_by_user(
        &self,
        user_id: &UserId,
        limit: ListLimit,
    ) -> Result<Vec<Notification>, InfraError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT notification_id, user_id, notification_type, title, message, read_at, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %id))]
    async fn mark_read(
        &self,
        id: &NotificationId,
        owner: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, $3)
            WHERE notification_id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %id))]
    async fn delete(&self, id: &NotificationId, owner: &UserId) -> Result<bool, InfraError> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE notification_id = $1 AND user_id = $2")
                .bind(id.as_uuid())
                .bind(owner.as_uuid())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}
