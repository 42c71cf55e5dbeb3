//! # レポートユースケース
//!
//! レポートの投稿・閲覧と、コメント・投票・通報を扱う。
//!
//! 認証は任意。トークンがある場合は投稿者として記録し、
//! `SUSPENDED` の呼び出し元からの書き込みは拒否する。

use std::sync::Arc;

use saferoute_domain::{
    clock::Clock,
    comment::{Comment, CommentId, CommentText},
    report::{NewReport, Report, ReportId, ReportTitle, ReportType, Severity, VoteType},
    role::{AuthContext, Capability},
    value_objects::{County, GeoPoint, ListLimit},
};
use saferoute_infra::repository::{
    CommentRepository,
    ReportRepository,
    UserRepository,
    VoteCounts,
};

use crate::{
    error::ApiError,
    usecase::helpers::{FindResultExt, non_blank, not_found},
};

/// 一覧の件数上限
pub const REPORT_LIST_LIMIT: i64 = 200;
pub const COMMENT_LIST_LIMIT: i64 = 100;

/// レポート投稿の入力
#[derive(Debug, Default)]
pub struct CreateReportInput {
    pub title:       String,
    pub report_type: String,
    pub severity:    Option<String>,
    pub description: Option<String>,
    pub lat:         Option<f64>,
    pub lng:         Option<f64>,
    pub county:      Option<String>,
}

/// レポートユースケースの実装
pub struct ReportUseCaseImpl {
    report_repository:  Arc<dyn ReportRepository>,
    comment_repository: Arc<dyn CommentRepository>,
    user_repository:    Arc<dyn UserRepository>,
    clock:              Arc<dyn Clock>,
}

impl ReportUseCaseImpl {
    pub fn new(
        report_repository: Arc<dyn ReportRepository>,
        comment_repository: Arc<dyn CommentRepository>,
        user_repository: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            report_repository,
            comment_repository,
            user_repository,
            clock,
        }
    }

    /// レポートを投稿する
    ///
    /// 呼び出し元が認証済みなら投稿者として記録し、その `reports_count` を加算する。
    /// 加算は 2 つ目の書き込みのため、失敗してもレポート自体は作成済みとして扱う。
    pub async fn create_report(
        &self,
        caller: Option<&AuthContext>,
        input: CreateReportInput,
    ) -> Result<Report, ApiError> {
        authorize_writer(caller)?;

        let title = ReportTitle::new(input.title)?;
        let report_type = ReportType::new(input.report_type)?;
        let severity = match non_blank(input.severity) {
            Some(s) => s.parse::<Severity>()?,
            None => Severity::default(),
        };
        let location = GeoPoint::from_pair(input.lat, input.lng)?;
        let county = non_blank(input.county).map(County::new).transpose()?;

        let reporter_id = caller.map(|c| c.subject().clone());
        let report = Report::new(
            NewReport {
                id: ReportId::new(),
                reporter_id: reporter_id.clone(),
                report_type,
                severity,
                title,
                description: non_blank(input.description),
                location,
                county,
            },
            self.clock.now(),
        );

        self.report_repository.insert(&report).await?;

        if let Some(reporter_id) = reporter_id
            && let Err(e) = self
                .user_repository
                .increment_reports_count(&reporter_id)
                .await
        {
            tracing::error!(
                error = %e,
                user_id = %reporter_id,
                report_id = %report.id(),
                "投稿数の更新に失敗しました"
            );
        }

        tracing::info!(report_id = %report.id(), severity = %report.severity(), "レポートを投稿しました");

        Ok(report)
    }

    /// 新しい順にレポートを取得する
    pub async fn list_reports(&self) -> Result<Vec<Report>, ApiError> {
        let limit = ListLimit::clamped(None, REPORT_LIST_LIMIT);
        Ok(self.report_repository.list_recent(limit).await?)
    }

    pub async fn get_report(&self, id: &ReportId) -> Result<Report, ApiError> {
        self.report_repository
            .find_by_id(id)
            .await
            .or_not_found("Report", id)
    }

    /// コメントを投稿する
    ///
    /// 存在確認は書き込みと同じステートメントで行う。
    pub async fn add_comment(
        &self,
        caller: Option<&AuthContext>,
        report_id: ReportId,
        text: String,
    ) -> Result<Comment, ApiError> {
        authorize_writer(caller)?;
        let text = CommentText::new(text)?;

        let comment = Comment::new(
            CommentId::new(),
            report_id,
            caller.map(|c| c.subject().clone()),
            text,
            self.clock.now(),
        );

        if !self.comment_repository.insert(&comment).await? {
            return Err(not_found("Report", comment.report_id()));
        }

        Ok(comment)
    }

    /// レポートのコメントを新しい順に取得する
    pub async fn list_comments(&self, report_id: &ReportId) -> Result<Vec<Comment>, ApiError> {
        let limit = ListLimit::clamped(None, COMMENT_LIST_LIMIT);
        Ok(self
            .comment_repository
            .list_by_report(report_id, limit)
            .await?)
    }

    /// 投票する
    ///
    /// 投票はステータスに関係なく可能。存在しないレポートでは何も更新しない。
    pub async fn vote(
        &self,
        caller: Option<&AuthContext>,
        report_id: &ReportId,
        vote_type: &str,
    ) -> Result<VoteCounts, ApiError> {
        authorize_writer(caller)?;
        let vote_type = vote_type.parse::<VoteType>()?;

        self.report_repository
            .vote(report_id, vote_type)
            .await
            .or_not_found("Report", report_id)
    }

    /// 不適切なレポートとして通報する
    ///
    /// 記録した理由を返す。
    pub async fn flag(
        &self,
        caller: Option<&AuthContext>,
        report_id: &ReportId,
        reason: Option<String>,
    ) -> Result<Option<String>, ApiError> {
        authorize_writer(caller)?;
        let reason = non_blank(reason);

        let recorded = self
            .report_repository
            .add_flag(
                report_id,
                caller.map(|c| c.subject()),
                reason.as_deref(),
                self.clock.now(),
            )
            .await?;

        if !recorded {
            return Err(not_found("Report", report_id));
        }

        tracing::info!(report_id = %report_id, "レポートが通報されました");

        Ok(reason)
    }
}

/// 認証済みの場合のみ書き込み権限を確認する
fn authorize_writer(caller: Option<&AuthContext>) -> Result<(), ApiError> {
    if let Some(caller) = caller {
        caller.authorize(Capability::Writer)?;
    }
    Ok(())
}
