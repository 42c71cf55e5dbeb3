//! # レポート審査ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/admin/pending` - 審査待ちレポート一覧
//! - `POST /api/v1/admin/{report_id}/verify` - 検証済みにする
//! - `POST /api/v1/admin/{report_id}/reject` - 却下する（理由必須）
//! - `GET /api/v1/admin/stats` - ステータス別件数
//!
//! ルーターは認証必須のガードを通す。ロールの確認はユースケースで行う。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use saferoute_domain::report::ReportId;
use saferoute_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiPath, Authenticated, ValidatedJson},
    handler::report::ReportDto,
    usecase::AdminUseCaseImpl,
};

/// 審査 API の共有状態
pub struct AdminState {
    pub usecase: AdminUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 検証リクエスト
#[derive(Debug, Default, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// 却下リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

/// ステータス別件数 DTO
#[derive(Debug, Serialize)]
pub struct ReportStatsDto {
    pub verified: i64,
    pub pending:  i64,
    pub rejected: i64,
}

// --- ハンドラ ---

/// GET /api/v1/admin/pending
///
/// 深刻度の高い順、同じ深刻度では古い順に最大 100 件。
#[tracing::instrument(skip_all)]
pub async fn list_pending(
    State(state): State<Arc<AdminState>>,
    Authenticated(caller): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    let reports = state.usecase.list_pending(&caller).await?;

    let items: Vec<ReportDto> = reports.iter().map(ReportDto::from).collect();

    let response = ApiResponse::new(items);
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/admin/{report_id}/verify
///
/// ボディは省略できる。
///
/// ## レスポンス
///
/// - `200 OK`: 更新後のレポート
/// - `400 Bad Request`: 審査済み（`invalid_transition`）
/// - `403 Forbidden`: 管理者以外
/// - `404 Not Found`: レポートが存在しない
#[tracing::instrument(skip_all, fields(%report_id))]
pub async fn verify_report(
    State(state): State<Arc<AdminState>>,
    Authenticated(caller): Authenticated,
    ApiPath(report_id): ApiPath<Uuid>,
    body: Option<ValidatedJson<VerifyRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|ValidatedJson(req)| req).unwrap_or_default();

    let report = state
        .usecase
        .verify_report(&caller, &ReportId::from_uuid(report_id), req.notes)
        .await?;

    let response = ApiResponse::new(ReportDto::from(&report));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/admin/{report_id}/reject
///
/// レスポンスは verify と同じ。理由が空なら `validation_error`。
#[tracing::instrument(skip_all, fields(%report_id))]
pub async fn reject_report(
    State(state): State<Arc<AdminState>>,
    Authenticated(caller): Authenticated,
    ApiPath(report_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .usecase
        .reject_report(&caller, &ReportId::from_uuid(report_id), req.reason)
        .await?;

    let response = ApiResponse::new(ReportDto::from(&report));
    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/admin/stats
#[tracing::instrument(skip_all)]
pub async fn report_stats(
    State(state): State<Arc<AdminState>>,
    Authenticated(caller): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    let counts = state.usecase.stats(&caller).await?;

    let response = ApiResponse::new(ReportStatsDto {
        verified: counts.verified,
        pending:  counts.pending,
        rejected: counts.rejected,
    });
    Ok((StatusCode::OK, Json(response)))
}
