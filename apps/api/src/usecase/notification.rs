//! # 通知ユースケース
//!
//! 通知は所有者本人のみが閲覧・既読化・削除できる。
//! 他人の通知は存在しないものとして `not_found` を返す。
//! 利用停止中のユーザーも自分の通知は扱える（[`Capability::Authenticated`]）。

use std::sync::Arc;

use saferoute_domain::{
    clock::Clock,
    notification::{Notification, NotificationId},
    role::{AuthContext, Capability},
    value_objects::ListLimit,
};
use saferoute_infra::repository::NotificationRepository;

use crate::{
    error::ApiError,
    usecase::helpers::{FindResultExt, not_found},
};

pub const NOTIFICATION_LIST_LIMIT: i64 = 50;

/// 通知ユースケースの実装
pub struct NotificationUseCaseImpl {
    notification_repository: Arc<dyn NotificationRepository>,
    clock:                   Arc<dyn Clock>,
}

impl NotificationUseCaseImpl {
    pub fn new(
        notification_repository: Arc<dyn NotificationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notification_repository,
            clock,
        }
    }

    /// 自分の通知を新しい順に取得する
    pub async fn list_notifications(
        &self,
        caller: &AuthContext,
    ) -> Result<Vec<Notification>, ApiError> {
        caller.authorize(Capability::Authenticated)?;

        let limit = ListLimit::clamped(None, NOTIFICATION_LIST_LIMIT);
        Ok(self
            .notification_repository
            .list_by_user(caller.subject(), limit)
            .await?)
    }

    /// 既読にする
    ///
    /// 冪等。既読済みの場合は最初の `read_at` を保持する。
    pub async fn mark_read(
        &self,
        caller: &AuthContext,
        id: &NotificationId,
    ) -> Result<Notification, ApiError> {
        let notification = self.find_owned(caller, id).await?;
        let now = self.clock.now();

        if !self
            .notification_repository
            .mark_read(id, caller.subject(), now)
            .await?
        {
            return Err(not_found("Notification", id));
        }

        Ok(notification.mark_read(now))
    }

    pub async fn delete_notification(
        &self,
        caller: &AuthContext,
        id: &NotificationId,
    ) -> Result<(), ApiError> {
        self.find_owned(caller, id).await?;

        if !self
            .notification_repository
            .delete(id, caller.subject())
            .await?
        {
            return Err(not_found("Notification", id));
        }

        Ok(())
    }

    async fn find_owned(
        &self,
        caller: &AuthContext,
        id: &NotificationId,
    ) -> Result<Notification, ApiError> {
        caller.authorize(Capability::Authenticated)?;

        let notification = self
            .notification_repository
            .find_by_id(id)
            .await
            .or_not_found("Notification", id)?;

        if !notification.is_owned_by(caller.subject()) {
            return Err(not_found("Notification", id));
        }

        Ok(notification)
    }
}
