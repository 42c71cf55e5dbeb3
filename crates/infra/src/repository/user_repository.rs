//! # UserRepository
//!
//! ユーザー情報の永続化を担当するリポジトリ。
//!
//! ユーザーは物理削除しない。削除は `is_deleted` / `deleted_at` の設定のみ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use saferoute_domain::{
    password::PasswordHash,
    role::Role,
    user::{Phone, User, UserId, Username},
    value_objects::{Email, ListLimit},
};
use sqlx::PgPool;
use uuid::Uuid;

use super::corrupted;
use crate::error::InfraError;

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを登録する
    ///
    /// ユーザー名・メール・電話番号の重複は `InfraErrorKind::Conflict`。
    async fn insert(&self, user: &User) -> Result<(), InfraError>;

    /// ID でユーザーを検索（削除済みも含む）
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;

    /// ユーザー名でユーザーを検索（削除済みも含む）
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, InfraError>;

    /// 削除されていないユーザーの一覧を取得
    ///
    /// `role` を指定した場合は等値条件で絞り込む。作成日時の新しい順。
    async fn list(&self, role: Option<Role>, limit: ListLimit) -> Result<Vec<User>, InfraError>;

    /// ロール遷移を条件付きで書き込む
    ///
    /// 現在のロールが `expected` で、削除されていない場合のみ更新する。
    /// `user` の `role` と `suspension_reason` が書き込まれる。
    async fn update_role(&self, user: &User, expected: Role) -> Result<bool, InfraError>;

    /// 論理削除を条件付きで書き込む（未削除の場合のみ）
    async fn soft_delete(&self, id: &UserId, at: DateTime<Utc>) -> Result<bool, InfraError>;

    /// 投稿レポート数を 1 増やす
    async fn increment_reports_count(&self, id: &UserId) -> Result<(), InfraError>;

    /// 削除されていないユーザー数
    async fn count_active(&self) -> Result<i64, InfraError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    username: String,
    email: Option<String>,
    phone: Option<String>,
    password_hash: Option<String>,
    role: String,
    trust_score: i32,
    reports_count: i32,
    suspension_reason: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = InfraError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User::from_db(
            UserId::from_uuid(row.user_id),
            Username::new(row.username).map_err(corrupted)?,
            row.email.map(Email::new).transpose().map_err(corrupted)?,
            row.phone.map(Phone::new).transpose().map_err(corrupted)?,
            row.password_hash.map(PasswordHash::new),
            row.role.parse::<Role>().map_err(corrupted)?,
            row.trust_score,
            row.reports_count,
            row.suspension_reason,
            row.deleted_at,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user.id()))]
    async fn insert(&self, user: &User) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id, username, email, phone, password_hash, role,
                trust_score, reports_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.username().as_str())
        .bind(user.email().map(Email::as_str))
        .bind(user.phone().map(Phone::as_str))
        .bind(user.password_hash().map(PasswordHash::as_str))
        .bind(<&'static str>::from(user.role()))
        .bind(user.trust_score())
        .bind(user.reports_count())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %id))]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, username, email, phone, password_hash, role,
                trust_score, reports_count, suspension_reason, deleted_at,
                created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, username, email, phone, password_hash, role,
                trust_score, reports_count, suspension_reason, deleted_at,
                created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list(&self, role: Option<Role>, limit: ListLimit) -> Result<Vec<User>, InfraError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, username, email, phone, password_hash, role,
                trust_score, reports_count, suspension_reason, deleted_at,
                created_at, updated_at
            FROM users
            WHERE is_deleted = FALSE
              AND ($1::TEXT IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(role.map(<&'static str>::from))
        .bind(limit.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user.id()))]
    async fn update_role(&self, user: &User, expected: Role) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = $2, suspension_reason = $3, updated_at = $4
            WHERE user_id = $1 AND role = $5 AND is_deleted = FALSE
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(<&'static str>::from(user.role()))
        .bind(user.suspension_reason())
        .bind(user.updated_at())
        .bind(<&'static str>::from(expected))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %id))]
    async fn soft_delete(&self, id: &UserId, at: DateTime<Utc>) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_deleted = TRUE, deleted_at = $2, updated_at = $2
            WHERE user_id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %id))]
    async fn increment_reports_count(&self, id: &UserId) -> Result<(), InfraError> {
        sqlx::query("UPDATE users SET reports_count = reports_count + 1 WHERE user_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn count_active(&self) -> Result<i64, InfraError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_deleted = FALSE")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
