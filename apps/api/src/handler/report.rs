//! # レポートハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/v1/reports` - レポート作成（認証任意）
//! - `GET /api/v1/reports` - 最近のレポート一覧
//! - `GET /api/v1/reports/{report_id}` - レポート取得
//! - `POST /api/v1/reports/{report_id}/comments` - コメント投稿
//! - `GET /api/v1/reports/{report_id}/comments` - コメント一覧
//! - `POST /api/v1/reports/{report_id}/vote` - 投票
//! - `POST /api/v1/reports/{report_id}/flag` - 通報
//!
//! 書き込み系は匿名でも受け付けるが、利用停止中のユーザーは `forbidden`。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use saferoute_domain::{
    comment::Comment,
    report::{Report, ReportId, ReportState as Lifecycle},
};
use saferoute_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiPath, Authenticated, ValidatedJson},
    usecase::{CreateReportInput, ReportUseCaseImpl},
};

/// レポート API の共有状態
pub struct ReportState {
    pub usecase: ReportUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// レポート作成リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[validate(length(min = 3, max = 200))]
    pub title:       String,
    #[validate(length(min = 1, max = 50))]
    pub report_type: String,
    pub severity:    Option<String>,
    pub description: Option<String>,
    pub lat:         Option<f64>,
    pub lng:         Option<f64>,
    #[validate(length(max = 100))]
    pub county:      Option<String>,
}

/// コメント投稿リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 500))]
    pub comment_text: String,
}

/// 投票リクエスト
///
/// `vote_type` の値検証はユースケースで行う（列挙外は `invalid_input`）。
#[derive(Debug, Deserialize, Validate)]
pub struct VoteRequest {
    pub vote_type: String,
}

/// 通報リクエスト
#[derive(Debug, Default, Deserialize, Validate)]
pub struct FlagRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// レポート DTO
#[derive(Debug, Serialize)]
pub struct ReportDto {
    pub report_id:          Uuid,
    pub reporter_id:        Option<Uuid>,
    pub report_type:        String,
    pub severity:           String,
    pub title:              String,
    pub description:        Option<String>,
    pub lat:                Option<f64>,
    pub lng:                Option<f64>,
    pub county:             Option<String>,
    pub status:             String,
    pub upvotes:            i32,
    pub downvotes:          i32,
    pub reviewed_by:        Option<Uuid>,
    pub reviewed_at:        Option<String>,
    pub verification_notes: Option<String>,
    pub rejection_reason:   Option<String>,
    pub created_at:         String,
    pub updated_at:         String,
}

impl From<&Report> for ReportDto {
    fn from(report: &Report) -> Self {
        let review = report.state().review();
        let (verification_notes, rejection_reason) = match report.state() {
            Lifecycle::PendingVerification => (None, None),
            Lifecycle::Verified { notes, .. } => (notes.clone(), None),
            Lifecycle::Rejected { reason, .. } => (None, Some(reason.clone())),
        };

        Self {
            report_id: *report.id().as_uuid(),
            reporter_id: report.reporter_id().map(|id| *id.as_uuid()),
            report_type: report.report_type().as_str().to_string(),
            severity: report.severity().to_string(),
            title: report.title().as_str().to_string(),
            description: report.description().map(str::to_string),
            lat: report.location().map(|p| p.latitude()),
            lng: report.location().map(|p| p.longitude()),
            county: report.county().map(|c| c.as_str().to_string()),
            status: report.status().to_string(),
            upvotes: report.upvotes(),
            downvotes: report.downvotes(),
            reviewed_by: review.map(|r| *r.reviewed_by.as_uuid()),
            reviewed_at: review.map(|r| r.reviewed_at.to_rfc3339()),
            verification_notes,
            rejection_reason,
            created_at: report.created_at().to_rfc3339(),
            updated_at: report.updated_at().to_rfc3339(),
        }
    }
}

/// コメント DTO
#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub comment_id:   Uuid,
    pub report_id:    Uuid,
    pub user_id:      Option<Uuid>,
    pub comment_text: String,
    pub upvotes:      i32,
    pub downvotes:    i32,
    pub created_at:   String,
}

impl From<&Comment> for CommentDto {
    fn from(comment: &Comment) -> Self {
        Self {
            comment_id:   *comment.id().as_uuid(),
            report_id:    *comment.report_id().as_uuid(),
            user_id:      comment.author_id().map(|id| *id.as_uuid()),
            comment_text: comment.text().as_str().to_string(),
            upvotes:      comment.upvotes(),
            downvotes:    comment.downvotes(),
            created_at:   comment.created_at().to_rfc3339(),
        }
    }
}

/// 投票結果 DTO
#[derive(Debug, Serialize)]
pub struct VoteResultDto {
    pub report_id: Uuid,
    pub upvotes:   i32,
    pub downvotes: i32,
}

/// 通報結果 DTO
#[derive(Debug, Serialize)]
pub struct FlagResultDto {
    pub flagged: bool,
    pub reason:  Option<String>,
}

// --- ハンドラ ---

/// POST /api/v1/reports
///
/// ## レスポンス
///
/// - `200 OK`: 作成したレポート（`PENDING_VERIFICATION`）
/// - `400 Bad Request`: バリデーションエラー
/// - `403 Forbidden`: 利用停止中のユーザー
#[tracing::instrument(skip_all)]
pub async fn create_report(
    State(state): State<Arc<ReportState>>,
    caller: Option<Authenticated>,
    ValidatedJson(req): ValidatedJson<CreateReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateReportInput {
        title:       req.title,
        report_type: req.report_type,
        severity:    req.severity,
        description: req.description,
        lat:         req.lat,
        lng:         req.lng,
        county:      req.county,
    };

    let report = state
        .usecase
        .create_report(caller.as_ref().map(|Authenticated(c)| c), input)
        .await?;

    let response = ApiResponse::new(ReportDto::from(&report));
    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/reports
///
/// 作成日時の新しい順に最大 200 件。
#[tracing::instrument(skip_all)]
pub async fn list_reports(
    State(state): State<Arc<ReportState>>,
) -> Result<impl IntoResponse, ApiError> {
    let reports = state.usecase.list_reports().await?;

    let items: Vec<ReportDto> = reports.iter().map(ReportDto::from).collect();

    let response = ApiResponse::new(items);
    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/reports/{report_id}
#[tracing::instrument(skip_all, fields(%report_id))]
pub async fn get_report(
    State(state): State<Arc<ReportState>>,
    ApiPath(report_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .usecase
        .get_report(&ReportId::from_uuid(report_id))
        .await?;

    let response = ApiResponse::new(ReportDto::from(&report));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/reports/{report_id}/comments
///
/// ## レスポンス
///
/// - `200 OK`: 作成したコメント
/// - `400 Bad Request`: 本文が空または 500 文字超
/// - `404 Not Found`: レポートが存在しない
#[tracing::instrument(skip_all, fields(%report_id))]
pub async fn create_comment(
    State(state): State<Arc<ReportState>>,
    caller: Option<Authenticated>,
    ApiPath(report_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .usecase
        .add_comment(
            caller.as_ref().map(|Authenticated(c)| c),
            ReportId::from_uuid(report_id),
            req.comment_text,
        )
        .await?;

    let response = ApiResponse::new(CommentDto::from(&comment));
    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/reports/{report_id}/comments
///
/// 存在しないレポートに対しては空の一覧を返す。
#[tracing::instrument(skip_all, fields(%report_id))]
pub async fn list_comments(
    State(state): State<Arc<ReportState>>,
    ApiPath(report_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .usecase
        .list_comments(&ReportId::from_uuid(report_id))
        .await?;

    let items: Vec<CommentDto> = comments.iter().map(CommentDto::from).collect();

    let response = ApiResponse::new(items);
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/reports/{report_id}/vote
///
/// ## レスポンス
///
/// - `200 OK`: 投票後のカウンタ
/// - `400 Bad Request`: `vote_type` が `UPVOTE` / `DOWNVOTE` 以外（`invalid_input`）
/// - `404 Not Found`: レポートが存在しない（カウンタは変化しない）
#[tracing::instrument(skip_all, fields(%report_id))]
pub async fn vote_report(
    State(state): State<Arc<ReportState>>,
    caller: Option<Authenticated>,
    ApiPath(report_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report_id = ReportId::from_uuid(report_id);

    let counts = state
        .usecase
        .vote(
            caller.as_ref().map(|Authenticated(c)| c),
            &report_id,
            &req.vote_type,
        )
        .await?;

    let response = ApiResponse::new(VoteResultDto {
        report_id: *report_id.as_uuid(),
        upvotes:   counts.upvotes,
        downvotes: counts.downvotes,
    });
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/reports/{report_id}/flag
///
/// ボディ（`reason`）は省略できる。
#[tracing::instrument(skip_all, fields(%report_id))]
pub async fn flag_report(
    State(state): State<Arc<ReportState>>,
    caller: Option<Authenticated>,
    ApiPath(report_id): ApiPath<Uuid>,
    body: Option<ValidatedJson<FlagRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|ValidatedJson(req)| req).unwrap_or_default();

    let reason = state
        .usecase
        .flag(
            caller.as_ref().map(|Authenticated(c)| c),
            &ReportId::from_uuid(report_id),
            req.reason,
        )
        .await?;

    let response = ApiResponse::new(FlagResultDto {
        flagged: true,
        reason,
    });
    Ok((StatusCode::OK, Json(response)))
}
