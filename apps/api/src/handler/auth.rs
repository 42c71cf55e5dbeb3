//! # 認証ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/v1/auth/register` - ユーザー登録（トークンを同時に発行）
//! - `POST /api/v1/auth/login` - ログイン
//!
//! どちらも認証ガードを通さない。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use saferoute_domain::user::User;
use saferoute_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiError,
    extract::ValidatedJson,
    usecase::{AuthUseCaseImpl, RegisterInput},
};

/// 認証 API の共有状態
pub struct AuthState {
    pub usecase: AuthUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// ユーザー登録リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email:    Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone:    Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
}

/// ログインリクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// 登録直後のユーザー DTO
#[derive(Debug, Serialize)]
pub struct RegisteredUserDto {
    pub user_id:    Uuid,
    pub username:   String,
    pub email:      Option<String>,
    pub role:       String,
    pub created_at: String,
}

/// ログインユーザー DTO
#[derive(Debug, Serialize)]
pub struct LoginUserDto {
    pub user_id:  Uuid,
    pub username: String,
    pub email:    Option<String>,
}

/// 認証レスポンス
#[derive(Debug, Serialize)]
pub struct AuthResponseData<U> {
    pub user:  U,
    pub token: String,
}

impl From<&User> for RegisteredUserDto {
    fn from(user: &User) -> Self {
        Self {
            user_id:    *user.id().as_uuid(),
            username:   user.username().as_str().to_string(),
            email:      user.email().map(|e| e.as_str().to_string()),
            role:       user.role().to_string(),
            created_at: user.created_at().to_rfc3339(),
        }
    }
}

impl From<&User> for LoginUserDto {
    fn from(user: &User) -> Self {
        Self {
            user_id:  *user.id().as_uuid(),
            username: user.username().as_str().to_string(),
            email:    user.email().map(|e| e.as_str().to_string()),
        }
    }
}

// --- ハンドラ ---

/// POST /api/v1/auth/register
///
/// ## レスポンス
///
/// - `200 OK`: 作成したユーザーとトークン
/// - `400 Bad Request`: バリデーションエラー
/// - `409 Conflict`: ユーザー名・メールアドレス・電話番号の重複
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<Arc<AuthState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = RegisterInput {
        username: req.username,
        email:    req.email,
        phone:    req.phone,
        password: req.password,
    };

    let output = state.usecase.register(input).await?;

    let response = ApiResponse::new(AuthResponseData {
        user:  RegisteredUserDto::from(&output.user),
        token: output.token,
    });
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/auth/login
///
/// ## レスポンス
///
/// - `200 OK`: ユーザーとトークン
/// - `400 Bad Request`: パスワード未設定のアカウント（`no_password_set`）
/// - `401 Unauthorized`: 資格情報の不一致（`invalid_credentials`）
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AuthState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let output = state.usecase.login(&req.username, &req.password).await?;

    let response = ApiResponse::new(AuthResponseData {
        user:  LoginUserDto::from(&output.user),
        token: output.token,
    });
    Ok((StatusCode::OK, Json(response)))
}
