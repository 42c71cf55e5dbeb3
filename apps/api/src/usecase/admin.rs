//! # 管理者ユースケース
//!
//! レポートの審査（検証・却下）と統計を扱う。すべて `ADMIN` 専用。
//!
//! ## 審査の流れ
//!
//! 1. 権限確認（403）
//! 2. レポートの存在確認（404）
//! 3. 状態遷移の検証（`PENDING_VERIFICATION` 以外は 400）
//! 4. 条件付き書き込み（競合に負けた場合は 400）
//! 5. 投稿者への通知（失敗はログのみ）

use std::sync::Arc;

use saferoute_domain::{
    clock::Clock,
    notification::Notification,
    report::{Report, ReportId, ReportState},
    role::{AuthContext, Capability},
    value_objects::ListLimit,
};
use saferoute_infra::repository::{NotificationRepository, ReportRepository, ReportStatusCounts};

use crate::{
    error::ApiError,
    usecase::helpers::{FindResultExt, lost_transition_race, non_blank},
};

/// 審査待ち一覧の件数上限
pub const PENDING_LIST_LIMIT: i64 = 100;

/// 管理者ユースケースの実装
pub struct AdminUseCaseImpl {
    report_repository:       Arc<dyn ReportRepository>,
    notification_repository: Arc<dyn NotificationRepository>,
    clock:                   Arc<dyn Clock>,
}

impl AdminUseCaseImpl {
    pub fn new(
        report_repository: Arc<dyn ReportRepository>,
        notification_repository: Arc<dyn NotificationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            report_repository,
            notification_repository,
            clock,
        }
    }

    /// 審査待ちのレポートを深刻度の高い順、同順位は古い順に取得する
    pub async fn list_pending(&self, caller: &AuthContext) -> Result<Vec<Report>, ApiError> {
        caller.authorize(Capability::Admin)?;
        let limit = ListLimit::clamped(None, PENDING_LIST_LIMIT);
        Ok(self.report_repository.list_pending(limit).await?)
    }

    /// レポートを検証済みにする
    pub async fn verify_report(
        &self,
        caller: &AuthContext,
        id: &ReportId,
        notes: Option<String>,
    ) -> Result<Report, ApiError> {
        caller.authorize(Capability::Admin)?;

        let report = self
            .report_repository
            .find_by_id(id)
            .await
            .or_not_found("Report", id)?;

        let verified = report.verify(caller.subject().clone(), non_blank(notes), self.clock.now())?;
        self.apply_review(&verified, "verify").await?;

        tracing::info!(report_id = %id, reviewed_by = %caller.subject(), "レポートを検証しました");

        Ok(verified)
    }

    /// レポートを却下する（理由は必須）
    pub async fn reject_report(
        &self,
        caller: &AuthContext,
        id: &ReportId,
        reason: String,
    ) -> Result<Report, ApiError> {
        caller.authorize(Capability::Admin)?;

        let report = self
            .report_repository
            .find_by_id(id)
            .await
            .or_not_found("Report", id)?;

        let rejected = report.reject(caller.subject().clone(), reason, self.clock.now())?;
        self.apply_review(&rejected, "reject").await?;

        tracing::info!(report_id = %id, reviewed_by = %caller.subject(), "レポートを却下しました");

        Ok(rejected)
    }

    /// ステータスごとの件数
    pub async fn stats(&self, caller: &AuthContext) -> Result<ReportStatusCounts, ApiError> {
        caller.authorize(Capability::Admin)?;
        Ok(self.report_repository.count_by_status().await?)
    }

    async fn apply_review(&self, report: &Report, action: &'static str) -> Result<(), ApiError> {
        if !self.report_repository.update_review(report).await? {
            return Err(lost_transition_race("Report", report.id(), action));
        }
        self.notify_reporter(report).await;
        Ok(())
    }

    /// 投稿者に審査結果を通知する
    ///
    /// 審査は確定済みのため、通知の失敗はエラーにしない。
    async fn notify_reporter(&self, report: &Report) {
        let Some(reporter_id) = report.reporter_id() else {
            return;
        };

        let notification = match report.state() {
            ReportState::Verified { review, .. } => Notification::report_verified(
                reporter_id.clone(),
                report.id(),
                report.title(),
                review.reviewed_at,
            ),
            ReportState::Rejected { review, reason } => Notification::report_rejected(
                reporter_id.clone(),
                report.id(),
                report.title(),
                reason,
                review.reviewed_at,
            ),
            ReportState::PendingVerification => return,
        };

        if let Err(e) = self.notification_repository.insert(&notification).await {
            tracing::error!(
                error = %e,
                report_id = %report.id(),
                user_id = %reporter_id,
                "審査結果の通知に失敗しました"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use saferoute_domain::{
        clock::FixedClock,
        notification::NotificationType,
        report::{NewReport, ReportStatus, ReportTitle, ReportType, Severity},
        role::Role,
        user::UserId,
    };
    use saferoute_infra::mock::{MockNotificationRepository, MockReportRepository};

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn admin() -> AuthContext {
        AuthContext::new(UserId::new(), Role::Admin)
    }

    struct Sut {
        usecase:       AdminUseCaseImpl,
        reports:       MockReportRepository,
        notifications: MockNotificationRepository,
    }

    fn build(notifications: MockNotificationRepository) -> Sut {
        let reports = MockReportRepository::new();
        let usecase = AdminUseCaseImpl::new(
            Arc::new(reports.clone()),
            Arc::new(notifications.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        );
        Sut {
            usecase,
            reports,
            notifications,
        }
    }

    #[fixture]
    fn sut() -> Sut {
        build(MockNotificationRepository::new())
    }

    fn pending_report(
        reports: &MockReportRepository,
        reporter: Option<UserId>,
        severity: Severity,
        created_at: DateTime<Utc>,
    ) -> Report {
        let report = Report::new(
            NewReport {
                id: ReportId::new(),
                reporter_id: reporter,
                report_type: ReportType::new("pothole").unwrap(),
                severity,
                title: ReportTitle::new("Broken light").unwrap(),
                description: None,
                location: None,
                county: None,
            },
            created_at,
        );
        reports.add_report(report.clone());
        report
    }

    #[rstest]
    #[tokio::test]
    async fn test_管理者以外は審査できない(sut: Sut) {
        let report = pending_report(&sut.reports, None, Severity::Low, fixed_now());
        let caller = AuthContext::new(UserId::new(), Role::User);

        let result = sut.usecase.verify_report(&caller, report.id(), None).await;

        assert_eq!(result.unwrap_err().code(), "forbidden");
        assert_eq!(
            sut.reports.get(report.id()).unwrap().status(),
            ReportStatus::PendingVerification
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_権限チェックは存在チェックより先に行う(sut: Sut) {
        let caller = AuthContext::new(UserId::new(), Role::User);

        let result = sut.usecase.verify_report(&caller, &ReportId::new(), None).await;

        assert_eq!(result.unwrap_err().code(), "forbidden");
    }

    #[rstest]
    #[tokio::test]
    async fn test_存在しないレポートはnot_found(sut: Sut) {
        let result = sut.usecase.verify_report(&admin(), &ReportId::new(), None).await;

        assert_eq!(result.unwrap_err().code(), "not_found");
    }

    #[rstest]
    #[tokio::test]
    async fn test_検証すると審査者とメモが記録され投稿者に通知される(sut: Sut) {
        let reporter = UserId::new();
        let report = pending_report(&sut.reports, Some(reporter.clone()), Severity::High, fixed_now());
        let caller = admin();

        let verified = sut
            .usecase
            .verify_report(&caller, report.id(), Some("confirmed on site".to_string()))
            .await
            .unwrap();

        assert_eq!(verified.status(), ReportStatus::Verified);
        assert_eq!(
            verified.state().review().unwrap().reviewed_by,
            caller.subject().clone()
        );
        let stored = sut.reports.get(report.id()).unwrap();
        assert_eq!(stored.status(), ReportStatus::Verified);

        let notifications = sut.notifications.all();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].user_id(), &reporter);
        assert_eq!(
            notifications[0].notification_type(),
            NotificationType::ReportVerified
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_検証済みのレポートは却下できない(sut: Sut) {
        let report = pending_report(&sut.reports, None, Severity::Low, fixed_now());
        sut.usecase
            .verify_report(&admin(), report.id(), None)
            .await
            .unwrap();

        let result = sut
            .usecase
            .reject_report(&admin(), report.id(), "duplicate".to_string())
            .await;

        assert_eq!(result.unwrap_err().code(), "invalid_transition");
        assert_eq!(
            sut.reports.get(report.id()).unwrap().status(),
            ReportStatus::Verified
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_却下理由が空ならvalidation_error(sut: Sut) {
        let report = pending_report(&sut.reports, None, Severity::Low, fixed_now());

        let result = sut
            .usecase
            .reject_report(&admin(), report.id(), "   ".to_string())
            .await;

        assert_eq!(result.unwrap_err().code(), "validation_error");
    }

    #[tokio::test]
    async fn test_通知の失敗は審査結果に影響しない() {
        let sut = build(MockNotificationRepository::failing_inserts());
        let report = pending_report(&sut.reports, Some(UserId::new()), Severity::Low, fixed_now());

        let rejected = sut
            .usecase
            .reject_report(&admin(), report.id(), "duplicate".to_string())
            .await
            .unwrap();

        assert_eq!(rejected.status(), ReportStatus::Rejected);
        assert_eq!(
            sut.reports.get(report.id()).unwrap().status(),
            ReportStatus::Rejected
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_同時の検証と却下はどちらか一方だけが適用される(sut: Sut) {
        let report = pending_report(&sut.reports, None, Severity::Low, fixed_now());

        let (first_admin, second_admin) = (admin(), admin());

        let (verify, reject) = tokio::join!(
            sut.usecase.verify_report(&first_admin, report.id(), None),
            sut.usecase
                .reject_report(&second_admin, report.id(), "duplicate".to_string()),
        );

        let outcomes = [verify.is_ok(), reject.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let stored = sut.reports.get(report.id()).unwrap().status();
        assert!(matches!(
            stored,
            ReportStatus::Verified | ReportStatus::Rejected
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn test_審査待ち一覧は深刻度の高い順で同順位は古い順(sut: Sut) {
        let older_low = pending_report(&sut.reports, None, Severity::Low, fixed_now());
        let critical = pending_report(
            &sut.reports,
            None,
            Severity::Critical,
            fixed_now() + Duration::hours(2),
        );
        let newer_low = pending_report(
            &sut.reports,
            None,
            Severity::Low,
            fixed_now() + Duration::hours(1),
        );

        let pending = sut.usecase.list_pending(&admin()).await.unwrap();
        let ids: Vec<&ReportId> = pending.iter().map(|r| r.id()).collect();

        assert_eq!(ids, vec![critical.id(), older_low.id(), newer_low.id()]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_統計はステータスごとの件数を返す(sut: Sut) {
        let a = pending_report(&sut.reports, None, Severity::Low, fixed_now());
        let b = pending_report(&sut.reports, None, Severity::Low, fixed_now());
        pending_report(&sut.reports, None, Severity::Low, fixed_now());
        sut.usecase.verify_report(&admin(), a.id(), None).await.unwrap();
        sut.usecase
            .reject_report(&admin(), b.id(), "spam".to_string())
            .await
            .unwrap();

        let stats = sut.usecase.stats(&admin()).await.unwrap();

        assert_eq!(
            stats,
            ReportStatusCounts {
                verified: 1,
                pending:  1,
                rejected: 1,
            }
        );
    }
}
