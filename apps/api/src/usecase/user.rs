//! # ユーザー管理ユースケース
//!
//! ロール遷移（昇格・利用停止・解除）、論理削除、管理ダッシュボードを扱う。
//!
//! ## 評価順序
//!
//! 権限（403）→ 存在（404）→ 状態遷移（400）の順に評価する。
//! 本人または管理者が操作できるリソースでは、パスの ID と呼び出し元を
//! 比較するだけで判定できるため、永続化アクセスより前に 403 を返す。

use std::sync::Arc;

use saferoute_domain::{
    clock::Clock,
    role::{AuthContext, Capability, Role},
    user::{User, UserId},
    value_objects::ListLimit,
};
use saferoute_infra::repository::{FacilityRepository, ReportRepository, UserRepository};

use crate::{
    error::ApiError,
    usecase::helpers::{FindResultExt, lost_transition_race, non_blank},
};

pub const USER_LIST_LIMIT: i64 = 100;

/// 管理ダッシュボードの集計値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_users:      i64,
    pub total_reports:    i64,
    pub verified_reports: i64,
    pub total_facilities: i64,
}

/// ユーザー管理ユースケースの実装
pub struct UserUseCaseImpl {
    user_repository:     Arc<dyn UserRepository>,
    report_repository:   Arc<dyn ReportRepository>,
    facility_repository: Arc<dyn FacilityRepository>,
    clock:               Arc<dyn Clock>,
}

impl UserUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        report_repository: Arc<dyn ReportRepository>,
        facility_repository: Arc<dyn FacilityRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            report_repository,
            facility_repository,
            clock,
        }
    }

    /// 削除されていないユーザーを新しい順に取得する
    ///
    /// `limit` は `1..=100` に丸める。
    pub async fn list_users(
        &self,
        caller: &AuthContext,
        role: Option<String>,
        limit: Option<i64>,
    ) -> Result<Vec<User>, ApiError> {
        caller.authorize(Capability::Admin)?;

        let role = non_blank(role).map(|r| r.parse::<Role>()).transpose()?;
        let limit = ListLimit::clamped(limit, USER_LIST_LIMIT);

        Ok(self.user_repository.list(role, limit).await?)
    }

    pub async fn get_user(&self, caller: &AuthContext, id: &UserId) -> Result<User, ApiError> {
        caller.authorize(Capability::OwnerOrAdmin(id))?;
        self.user_repository
            .find_by_id(id)
            .await
            .or_not_found("User", id)
    }

    /// `USER` を `ADMIN` に昇格する（降格の経路はない）
    pub async fn promote(&self, caller: &AuthContext, id: &UserId) -> Result<User, ApiError> {
        caller.authorize(Capability::Admin)?;
        let user = self.find(id).await?;
        let expected = user.role();

        let promoted = user.promote(self.clock.now())?;
        self.apply_role_change(&promoted, expected, "promote").await?;

        tracing::info!(user_id = %id, by = %caller.subject(), "ユーザーを管理者に昇格しました");

        Ok(promoted)
    }

    /// 利用停止にする
    ///
    /// 管理者は自分自身を利用停止にできない。
    pub async fn suspend(
        &self,
        caller: &AuthContext,
        id: &UserId,
        reason: Option<String>,
    ) -> Result<User, ApiError> {
        caller.authorize(Capability::Admin)?;
        let user = self.find(id).await?;
        reject_self_action(caller, id, "suspend")?;
        let expected = user.role();

        let suspended = user.suspend(non_blank(reason), self.clock.now())?;
        self.apply_role_change(&suspended, expected, "suspend").await?;

        tracing::info!(user_id = %id, by = %caller.subject(), "ユーザーを利用停止にしました");

        Ok(suspended)
    }

    /// 利用停止を解除する（ロールは `USER` に戻る）
    pub async fn unsuspend(&self, caller: &AuthContext, id: &UserId) -> Result<User, ApiError> {
        caller.authorize(Capability::Admin)?;
        let user = self.find(id).await?;
        let expected = user.role();

        let restored = user.unsuspend(self.clock.now())?;
        self.apply_role_change(&restored, expected, "unsuspend").await?;

        Ok(restored)
    }

    /// 論理削除する（本人または管理者）
    ///
    /// 管理者は自分自身を削除できない。
    pub async fn delete_user(&self, caller: &AuthContext, id: &UserId) -> Result<User, ApiError> {
        caller.authorize(Capability::OwnerOrAdmin(id))?;
        let user = self.find(id).await?;
        if caller.is_admin() {
            reject_self_action(caller, id, "delete")?;
        }

        let now = self.clock.now();
        let deleted = user.soft_deleted(now)?;

        if !self.user_repository.soft_delete(id, now).await? {
            return Err(lost_transition_race("User", id, "delete"));
        }

        tracing::info!(user_id = %id, by = %caller.subject(), "ユーザーを削除しました");

        Ok(deleted)
    }

    /// 管理ダッシュボードの集計を取得する
    pub async fn dashboard(&self, caller: &AuthContext) -> Result<DashboardSummary, ApiError> {
        caller.authorize(Capability::Admin)?;

        let total_users = self.user_repository.count_active().await?;
        let reports = self.report_repository.count_by_status().await?;
        let total_facilities = self.facility_repository.count_active().await?;

        Ok(DashboardSummary {
            total_users,
            total_reports: reports.total(),
            verified_reports: reports.verified,
            total_facilities,
        })
    }

    async fn find(&self, id: &UserId) -> Result<User, ApiError> {
        self.user_repository
            .find_by_id(id)
            .await
            .or_not_found("User", id)
    }

    async fn apply_role_change(
        &self,
        user: &User,
        expected: Role,
        action: &'static str,
    ) -> Result<(), ApiError> {
        if !self.user_repository.update_role(user, expected).await? {
            return Err(lost_transition_race("User", user.id(), action));
        }
        Ok(())
    }
}

fn reject_self_action(
    caller: &AuthContext,
    target: &UserId,
    action: &'static str,
) -> Result<(), ApiError> {
    if caller.subject() == target {
        return Err(ApiError::InvalidTransition(format!(
            "管理者は自分自身を {action} できません"
        )));
    }
    Ok(())
}
