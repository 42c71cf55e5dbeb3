//! # テスト用モック
//!
//! ユースケース・ハンドラのテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! saferoute-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 条件付き書き込みの意味論（期待状態との一致時のみ適用）は
//! PostgreSQL 実装と揃えている。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use saferoute_domain::{
    comment::Comment,
    facility::{Facility, FacilityId},
    notification::{Notification, NotificationId},
    password::{PasswordHash, PasswordVerifyResult, PlainPassword},
    report::{Report, ReportId, ReportStatus, VoteType},
    role::Role,
    user::{User, UserId, Username},
    value_objects::ListLimit,
};

use crate::{
    error::InfraError,
    password::{PasswordChecker, PasswordHasher},
    repository::{
        CommentRepository,
        FacilityFilter,
        FacilityRepository,
        NotificationRepository,
        ReportRepository,
        ReportStatusCounts,
        UserRepository,
        VoteCounts,
    },
};

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn insert(&self, user: &User) -> Result<(), InfraError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username() == user.username()) {
            return Err(InfraError::conflict("users_username_key"));
        }
        if user.email().is_some() && users.iter().any(|u| u.email() == user.email()) {
            return Err(InfraError::conflict("users_email_key"));
        }
        if user.phone().is_some() && users.iter().any(|u| u.phone() == user.phone()) {
            return Err(InfraError::conflict("users_phone_key"));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        Ok(self.get(id))
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn list(&self, role: Option<Role>, limit: ListLimit) -> Result<Vec<User>, InfraError> {
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| !u.is_deleted() && role.is_none_or(|r| u.role() == r))
            .cloned()
            .collect();
        users.sort_by_key(|u| std::cmp::Reverse(u.created_at()));
        users.truncate(limit.as_usize());
        Ok(users)
    }

    async fn update_role(&self, user: &User, expected: Role) -> Result<bool, InfraError> {
        let mut users = self.users.lock().unwrap();
        let Some(stored) = users
            .iter_mut()
            .find(|u| u.id() == user.id() && u.role() == expected && !u.is_deleted())
        else {
            return Ok(false);
        };
        *stored = user.clone();
        Ok(true)
    }

    async fn soft_delete(&self, id: &UserId, at: DateTime<Utc>) -> Result<bool, InfraError> {
        let mut users = self.users.lock().unwrap();
        let Some(pos) = users.iter().position(|u| u.id() == id && !u.is_deleted()) else {
            return Ok(false);
        };
        let deleted = users[pos]
            .clone()
            .soft_deleted(at)
            .map_err(|e| InfraError::unexpected(e.to_string()))?;
        users[pos] = deleted;
        Ok(true)
    }

    async fn increment_reports_count(&self, id: &UserId) -> Result<(), InfraError> {
        let mut users = self.users.lock().unwrap();
        if let Some(pos) = users.iter().position(|u| u.id() == id) {
            let u = users[pos].clone();
            users[pos] = User::from_db(
                u.id().clone(),
                u.username().clone(),
                u.email().cloned(),
                u.phone().cloned(),
                u.password_hash().cloned(),
                u.role(),
                u.trust_score(),
                u.reports_count() + 1,
                u.suspension_reason().map(str::to_string),
                u.deleted_at(),
                u.created_at(),
                u.updated_at(),
            );
        }
        Ok(())
    }

    async fn count_active(&self) -> Result<i64, InfraError> {
        let count = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| !u.is_deleted())
            .count();
        Ok(count as i64)
    }
}

// ===== MockReportRepository =====

#[derive(Clone, Default)]
pub struct MockReportRepository {
    reports: Arc<Mutex<Vec<Report>>>,
    flags:   Arc<Mutex<Vec<(ReportId, Option<UserId>, Option<String>)>>>,
}

impl MockReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_report(&self, report: Report) {
        self.reports.lock().unwrap().push(report);
    }

    pub fn get(&self, id: &ReportId) -> Option<Report> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    pub fn exists(&self, id: &ReportId) -> bool {
        self.get(id).is_some()
    }

    /// 記録された通報の件数
    pub fn flag_count(&self) -> usize {
        self.flags.lock().unwrap().len()
    }

    fn with_votes(report: &Report, upvotes: i32, downvotes: i32) -> Report {
        Report::from_db(
            report.id().clone(),
            report.reporter_id().cloned(),
            report.report_type().clone(),
            report.severity(),
            report.title().clone(),
            report.description().map(str::to_string),
            report.location(),
            report.county().cloned(),
            report.state().clone(),
            upvotes,
            downvotes,
            report.created_at(),
            report.updated_at(),
        )
    }
}

#[async_trait]
impl ReportRepository for MockReportRepository {
    async fn insert(&self, report: &Report) -> Result<(), InfraError> {
        self.add_report(report.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ReportId) -> Result<Option<Report>, InfraError> {
        Ok(self.get(id))
    }

    async fn list_recent(&self, limit: ListLimit) -> Result<Vec<Report>, InfraError> {
        let mut reports = self.reports.lock().unwrap().clone();
        reports.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        reports.truncate(limit.as_usize());
        Ok(reports)
    }

    async fn list_pending(&self, limit: ListLimit) -> Result<Vec<Report>, InfraError> {
        let mut reports: Vec<Report> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status() == ReportStatus::PendingVerification)
            .cloned()
            .collect();
        reports.sort_by_key(|r| (std::cmp::Reverse(r.severity().rank()), r.created_at()));
        reports.truncate(limit.as_usize());
        Ok(reports)
    }

    async fn update_review(&self, report: &Report) -> Result<bool, InfraError> {
        let mut reports = self.reports.lock().unwrap();
        let Some(stored) = reports.iter_mut().find(|r| {
            r.id() == report.id() && r.status() == ReportStatus::PendingVerification
        }) else {
            return Ok(false);
        };
        *stored = report.clone();
        Ok(true)
    }

    async fn vote(
        &self,
        id: &ReportId,
        vote: VoteType,
    ) -> Result<Option<VoteCounts>, InfraError> {
        let mut reports = self.reports.lock().unwrap();
        let Some(pos) = reports.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };
        let current = &reports[pos];
        let (up, down) = match vote {
            VoteType::Upvote => (current.upvotes() + 1, current.downvotes()),
            VoteType::Downvote => (current.upvotes(), current.downvotes() + 1),
        };
        reports[pos] = Self::with_votes(current, up, down);
        Ok(Some(VoteCounts {
            upvotes:   up,
            downvotes: down,
        }))
    }

    async fn add_flag(
        &self,
        id: &ReportId,
        flagged_by: Option<&UserId>,
        reason: Option<&str>,
        _now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        if !self.exists(id) {
            return Ok(false);
        }
        self.flags.lock().unwrap().push((
            id.clone(),
            flagged_by.cloned(),
            reason.map(str::to_string),
        ));
        Ok(true)
    }

    async fn count_by_status(&self) -> Result<ReportStatusCounts, InfraError> {
        let mut counts = ReportStatusCounts::default();
        for report in self.reports.lock().unwrap().iter() {
            match report.status() {
                ReportStatus::Verified => counts.verified += 1,
                ReportStatus::PendingVerification => counts.pending += 1,
                ReportStatus::Rejected => counts.rejected += 1,
            }
        }
        Ok(counts)
    }
}

// ===== MockCommentRepository =====

/// レポートの存在確認のため [`MockReportRepository`] を共有する
#[derive(Clone, Default)]
pub struct MockCommentRepository {
    reports:  MockReportRepository,
    comments: Arc<Mutex<Vec<Comment>>>,
}

impl MockCommentRepository {
    pub fn new(reports: MockReportRepository) -> Self {
        Self {
            reports,
            comments: Arc::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.comments.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CommentRepository for MockCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<bool, InfraError> {
        if !self.reports.exists(comment.report_id()) {
            return Ok(false);
        }
        self.comments.lock().unwrap().push(comment.clone());
        Ok(true)
    }

    async fn list_by_report(
        &self,
        report_id: &ReportId,
        limit: ListLimit,
    ) -> Result<Vec<Comment>, InfraError> {
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.report_id() == report_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| std::cmp::Reverse(c.created_at()));
        comments.truncate(limit.as_usize());
        Ok(comments)
    }
}

// ===== MockFacilityRepository =====

#[derive(Clone, Default)]
pub struct MockFacilityRepository {
    facilities: Arc<Mutex<Vec<Facility>>>,
}

impl MockFacilityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_facility(&self, facility: Facility) {
        self.facilities.lock().unwrap().push(facility);
    }
}

#[async_trait]
impl FacilityRepository for MockFacilityRepository {
    async fn insert(&self, facility: &Facility) -> Result<(), InfraError> {
        self.add_facility(facility.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &FacilityId) -> Result<Option<Facility>, InfraError> {
        Ok(self
            .facilities
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id() == id)
            .cloned())
    }

    async fn list_active(
        &self,
        filter: &FacilityFilter,
        limit: ListLimit,
    ) -> Result<Vec<Facility>, InfraError> {
        let mut facilities: Vec<Facility> = self
            .facilities
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.is_active())
            .filter(|f| filter.facility_type.is_none_or(|t| f.facility_type() == t))
            .filter(|f| filter.county.as_ref().is_none_or(|c| f.county() == c))
            .cloned()
            .collect();
        facilities.sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));
        facilities.truncate(limit.as_usize());
        Ok(facilities)
    }

    async fn update_details(&self, facility: &Facility) -> Result<bool, InfraError> {
        let mut facilities = self.facilities.lock().unwrap();
        let Some(stored) = facilities
            .iter_mut()
            .find(|f| f.id() == facility.id() && f.is_active())
        else {
            return Ok(false);
        };
        *stored = facility.clone();
        Ok(true)
    }

    async fn deactivate(&self, id: &FacilityId, at: DateTime<Utc>) -> Result<bool, InfraError> {
        let mut facilities = self.facilities.lock().unwrap();
        let Some(pos) = facilities
            .iter()
            .position(|f| f.id() == id && f.is_active())
        else {
            return Ok(false);
        };
        let deactivated = facilities[pos]
            .clone()
            .deactivate(at)
            .map_err(|e| InfraError::unexpected(e.to_string()))?;
        facilities[pos] = deactivated;
        Ok(true)
    }

    async fn count_active(&self) -> Result<i64, InfraError> {
        let count = self
            .facilities
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.is_active())
            .count();
        Ok(count as i64)
    }
}

// ===== MockNotificationRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationRepository {
    notifications: Arc<Mutex<Vec<Notification>>>,
    fail_inserts:  bool,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// `insert` が常に失敗するモックを作成する
    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    pub fn add_notification(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    pub fn all(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError> {
        if self.fail_inserts {
            return Err(InfraError::unexpected("通知の書き込みに失敗しました"));
        }
        self.add_notification(notification.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id() == id)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        limit: ListLimit,
    ) -> Result<Vec<Notification>, InfraError> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.is_owned_by(user_id))
            .cloned()
            .collect();
        notifications.sort_by_key(|n| std::cmp::Reverse(n.created_at()));
        notifications.truncate(limit.as_usize());
        Ok(notifications)
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        owner: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        let mut notifications = self.notifications.lock().unwrap();
        let Some(pos) = notifications
            .iter()
            .position(|n| n.id() == id && n.is_owned_by(owner))
        else {
            return Ok(false);
        };
        notifications[pos] = notifications[pos].clone().mark_read(at);
        Ok(true)
    }

    async fn delete(&self, id: &NotificationId, owner: &UserId) -> Result<bool, InfraError> {
        let mut notifications = self.notifications.lock().unwrap();
        let before = notifications.len();
        notifications.retain(|n| !(n.id() == id && n.is_owned_by(owner)));
        Ok(notifications.len() < before)
    }
}

// ===== MockPasswordHasher =====

/// Argon2 の計算を省略するパスワードハッシャー
///
/// ハッシュは `mock$<平文>` 形式。
#[derive(Clone, Copy, Default)]
pub struct MockPasswordHasher;

const MOCK_HASH_PREFIX: &str = "mock$";

#[async_trait]
impl PasswordHasher for MockPasswordHasher {
    async fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError> {
        Ok(PasswordHash::new(format!(
            "{MOCK_HASH_PREFIX}{}",
            password.as_str()
        )))
    }
}

#[async_trait]
impl PasswordChecker for MockPasswordHasher {
    async fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError> {
        let matched = hash
            .as_str()
            .strip_prefix(MOCK_HASH_PREFIX)
            .is_some_and(|plain| plain == password.as_str());
        Ok(PasswordVerifyResult::from(matched))
    }
}
