//! # 通知
//!
//! ユーザーごとの通知（プル型）。所有者のみが既読化・削除できる。
//!
//! 既読状態は `read_at` の有無から導出する。`is_read` と `read_at` を
//! 別々に持たないため、両者が食い違うことはない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    report::{ReportId, ReportTitle},
    user::UserId,
};

define_uuid_id! {
    /// 通知 ID
    pub struct NotificationId;
}

/// 通知種別
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ReportVerified,
    ReportRejected,
    System,
}

impl std::str::FromStr for NotificationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REPORT_VERIFIED" => Ok(Self::ReportVerified),
            "REPORT_REJECTED" => Ok(Self::ReportRejected),
            "SYSTEM" => Ok(Self::System),
            _ => Err(DomainError::Validation(format!("不正な通知種別: {}", s))),
        }
    }
}

/// 通知エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    id: NotificationId,
    user_id: UserId,
    notification_type: NotificationType,
    title: String,
    message: String,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        id: NotificationId,
        user_id: UserId,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            notification_type,
            title: title.into(),
            message: message.into(),
            read_at: None,
            created_at: now,
        }
    }

    /// レポート検証の通知を作成する
    pub fn report_verified(
        user_id: UserId,
        report_id: &ReportId,
        title: &ReportTitle,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            NotificationId::new(),
            user_id,
            NotificationType::ReportVerified,
            "Report verified",
            format!("Your report \"{}\" ({}) has been verified.", title, report_id),
            now,
        )
    }

    /// レポート却下の通知を作成する
    pub fn report_rejected(
        user_id: UserId,
        report_id: &ReportId,
        title: &ReportTitle,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            NotificationId::new(),
            user_id,
            NotificationType::ReportRejected,
            "Report rejected",
            format!(
                "Your report \"{}\" ({}) was rejected: {}",
                title, report_id, reason
            ),
            now,
        )
    }

    pub fn from_db(
        id: NotificationId,
        user_id: UserId,
        notification_type: NotificationType,
        title: String,
        message: String,
        read_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            notification_type,
            title,
            message,
            read_at,
            created_at,
        }
    }

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn notification_type(&self) -> NotificationType {
        self.notification_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn read_at(&self) -> Option<DateTime<Utc>> {
        self.read_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// 既読にした新しいインスタンスを返す
    ///
    /// 既読済みの場合は何もしない（最初の既読日時を保持する）。
    pub fn mark_read(self, now: DateTime<Utc>) -> Self {
        if self.is_read() {
            return self;
        }
        Self {
            read_at: Some(now),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn notification() -> Notification {
        Notification::new(
            NotificationId::new(),
            UserId::new(),
            NotificationType::System,
            "Welcome",
            "Thanks for joining",
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    #[rstest]
    fn test_新規通知は未読(notification: Notification) {
        assert!(!notification.is_read());
        assert_eq!(notification.read_at(), None);
    }

    #[rstest]
    fn test_既読化は冪等で最初の既読日時を保持する(notification: Notification) {
        let first = DateTime::from_timestamp(1_700_000_100, 0).unwrap();
        let second = DateTime::from_timestamp(1_700_000_200, 0).unwrap();

        let once = notification.mark_read(first);
        let twice = once.clone().mark_read(second);

        assert!(once.is_read());
        assert!(twice.is_read());
        assert_eq!(twice.read_at(), Some(first));
    }

    #[rstest]
    fn test_所有者を判定できる(notification: Notification) {
        let owner = notification.user_id().clone();

        assert!(notification.is_owned_by(&owner));
        assert!(!notification.is_owned_by(&UserId::new()));
    }

    #[rstest]
    fn test_却下通知に理由が含まれる() {
        let title = ReportTitle::new("Broken streetlight").unwrap();

        let notification = Notification::report_rejected(
            UserId::new(),
            &ReportId::new(),
            &title,
            "duplicate",
            Utc::now(),
        );

        assert_eq!(
            notification.notification_type(),
            NotificationType::ReportRejected
        );
        assert!(notification.message().contains("duplicate"));
        assert!(notification.message().contains("Broken streetlight"));
    }
}
