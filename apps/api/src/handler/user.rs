//! # ユーザー管理ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/users?role=&limit=` - ユーザー一覧（管理者）
//! - `GET /api/v1/users/{user_id}` - ユーザー取得（本人または管理者）
//! - `POST /api/v1/users/{user_id}/promote` - 管理者に昇格（管理者）
//! - `POST /api/v1/users/{user_id}/suspend` - 利用停止（管理者）
//! - `POST /api/v1/users/{user_id}/unsuspend` - 利用停止の解除（管理者）
//! - `DELETE /api/v1/users/{user_id}` - 論理削除（本人または管理者）
//! - `GET /api/v1/users/analytics/dashboard` - 管理ダッシュボード（管理者）

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use saferoute_domain::user::{User, UserId};
use saferoute_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiPath, ApiQuery, Authenticated, ValidatedJson},
    handler::DeletedDto,
    usecase::UserUseCaseImpl,
};

/// ユーザー管理 API の共有状態
pub struct UserState {
    pub usecase: UserUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// ユーザー一覧のクエリ
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role:  Option<String>,
    pub limit: Option<i64>,
}

/// 利用停止リクエスト
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SuspendRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// ユーザー DTO
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub user_id:           Uuid,
    pub username:          String,
    pub email:             Option<String>,
    pub phone:             Option<String>,
    pub role:              String,
    pub trust_score:       i32,
    pub reports_count:     i32,
    pub suspension_reason: Option<String>,
    pub is_deleted:        bool,
    pub created_at:        String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            user_id:           *user.id().as_uuid(),
            username:          user.username().as_str().to_string(),
            email:             user.email().map(|e| e.as_str().to_string()),
            phone:             user.phone().map(|p| p.as_str().to_string()),
            role:              user.role().to_string(),
            trust_score:       user.trust_score(),
            reports_count:     user.reports_count(),
            suspension_reason: user.suspension_reason().map(str::to_string),
            is_deleted:        user.is_deleted(),
            created_at:        user.created_at().to_rfc3339(),
        }
    }
}

/// ロール遷移の結果 DTO
#[derive(Debug, Serialize)]
pub struct RoleChangeDto {
    pub user_id: Uuid,
    pub role:    String,
}

impl From<&User> for RoleChangeDto {
    fn from(user: &User) -> Self {
        Self {
            user_id: *user.id().as_uuid(),
            role:    user.role().to_string(),
        }
    }
}

/// 管理ダッシュボード DTO
#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub total_users:      i64,
    pub total_reports:    i64,
    pub verified_reports: i64,
    pub total_facilities: i64,
}

// --- ハンドラ ---

/// GET /api/v1/users
///
/// `limit` は 1〜100 に丸める。`role` が不正なら `validation_error`。
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<Arc<UserState>>,
    Authenticated(caller): Authenticated,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .usecase
        .list_users(&caller, query.role, query.limit)
        .await?;

    let items: Vec<UserDto> = users.iter().map(UserDto::from).collect();

    let response = ApiResponse::new(items);
    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/users/{user_id}
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn get_user(
    State(state): State<Arc<UserState>>,
    Authenticated(caller): Authenticated,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .usecase
        .get_user(&caller, &UserId::from_uuid(user_id))
        .await?;

    let response = ApiResponse::new(UserDto::from(&user));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/users/{user_id}/promote
///
/// ## レスポンス
///
/// - `200 OK`: `{user_id, role}`
/// - `400 Bad Request`: `USER` 以外からの昇格（`invalid_transition`）
/// - `403 Forbidden`: 管理者以外
/// - `404 Not Found`: ユーザーが存在しない
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn promote_user(
    State(state): State<Arc<UserState>>,
    Authenticated(caller): Authenticated,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .usecase
        .promote(&caller, &UserId::from_uuid(user_id))
        .await?;

    let response = ApiResponse::new(RoleChangeDto::from(&user));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/users/{user_id}/suspend
///
/// ボディ（`reason`）は省略できる。
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn suspend_user(
    State(state): State<Arc<UserState>>,
    Authenticated(caller): Authenticated,
    ApiPath(user_id): ApiPath<Uuid>,
    body: Option<ValidatedJson<SuspendRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|ValidatedJson(req)| req).unwrap_or_default();

    let user = state
        .usecase
        .suspend(&caller, &UserId::from_uuid(user_id), req.reason)
        .await?;

    let response = ApiResponse::new(RoleChangeDto::from(&user));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/users/{user_id}/unsuspend
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn unsuspend_user(
    State(state): State<Arc<UserState>>,
    Authenticated(caller): Authenticated,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .usecase
        .unsuspend(&caller, &UserId::from_uuid(user_id))
        .await?;

    let response = ApiResponse::new(RoleChangeDto::from(&user));
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /api/v1/users/{user_id}
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn delete_user(
    State(state): State<Arc<UserState>>,
    Authenticated(caller): Authenticated,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .usecase
        .delete_user(&caller, &UserId::from_uuid(user_id))
        .await?;

    let response = ApiResponse::new(DeletedDto { deleted: true });
    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/users/analytics/dashboard
#[tracing::instrument(skip_all)]
pub async fn dashboard(
    State(state): State<Arc<UserState>>,
    Authenticated(caller): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.usecase.dashboard(&caller).await?;

    let response = ApiResponse::new(DashboardDto {
        total_users:      summary.total_users,
        total_reports:    summary.total_reports,
        verified_reports: summary.verified_reports,
        total_facilities: summary.total_facilities,
    });
    Ok((StatusCode::OK, Json(response)))
}
