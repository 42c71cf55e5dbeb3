//! # API エラーハンドリング
//!
//! HTTP API のエラー定義と、axum レスポンスへの変換を行う。
//!
//! ## エラーの階層
//!
//! ```text
//! DomainError / InfraError
//!        ↓ From
//! ApiError
//!        ↓ IntoResponse
//! { "error": <code>, "detail"?: <message> }
//! ```
//!
//! ## コード一覧
//!
//! | ApiError | HTTP Status | `error` |
//! |----------|-------------|---------|
//! | Validation | 400 | `validation_error` |
//! | InvalidInput | 400 | `invalid_input` |
//! | InvalidTransition | 400 | `invalid_transition` |
//! | NoPasswordSet | 400 | `no_password_set` |
//! | Unauthorized | 401 | `unauthorized` |
//! | InvalidToken | 401 | `invalid_token` |
//! | InvalidCredentials | 401 | `invalid_credentials` |
//! | Forbidden | 403 | `forbidden` |
//! | NotFound | 404 | `not_found` |
//! | UserExists | 409 | `user_exists` |
//! | Conflict | 409 | `conflict` |
//! | Timeout | 504 | `timeout` |
//! | Store / Internal | 500 | `server_error` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use saferoute_domain::DomainError;
use saferoute_infra::{InfraError, InfraErrorKind};
use saferoute_shared::ErrorResponse;
use thiserror::Error;

/// API 層で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("入力値が不正です: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("パスワードが設定されていません")]
    NoPasswordSet,

    /// 認証ヘッダーがない
    #[error("認証が必要です")]
    Unauthorized,

    /// トークンが不正、または期限切れ
    #[error("トークンが無効です")]
    InvalidToken,

    #[error("ユーザー名またはパスワードが正しくありません")]
    InvalidCredentials,

    #[error("権限がありません: {0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("ユーザーが既に存在します")]
    UserExists,

    #[error("競合が発生しました: {0}")]
    Conflict(String),

    #[error("リクエストがタイムアウトしました")]
    Timeout,

    /// 永続化層の予期しない失敗
    #[error("データベースエラー: {0}")]
    Store(InfraError),

    #[error("内部エラー: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InvalidInput(_)
            | Self::InvalidTransition(_)
            | Self::NoPasswordSet => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidToken | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UserExists | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::NoPasswordSet => "no_password_set",
            Self::Unauthorized => "unauthorized",
            Self::InvalidToken => "invalid_token",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::UserExists => "user_exists",
            Self::Conflict(_) => "conflict",
            Self::Timeout => "timeout",
            Self::Store(_) | Self::Internal(_) => "server_error",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::Validation(msg)
            | Self::InvalidInput(msg)
            | Self::InvalidTransition(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Internal(msg) => Some(msg.clone()),
            Self::Store(e) => Some(e.to_string()),
            Self::NoPasswordSet
            | Self::Unauthorized
            | Self::InvalidToken
            | Self::InvalidCredentials
            | Self::UserExists
            | Self::Timeout => None,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidInput(msg) => Self::InvalidInput(msg),
            e @ DomainError::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
            e @ DomainError::NotFound { .. } => Self::NotFound(e.to_string()),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

impl From<InfraError> for ApiError {
    fn from(e: InfraError) -> Self {
        if e.as_conflict().is_some() {
            return Self::Conflict(e.to_string());
        }
        if let InfraErrorKind::InvalidInput(msg) = e.kind() {
            return Self::Validation(msg.clone());
        }
        Self::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Store(e) => {
                tracing::error!(error = %e, span_trace = %e.span_trace(), "永続化層でエラーが発生しました");
            }
            Self::Internal(msg) => tracing::error!("内部エラー: {}", msg),
            _ => {}
        }

        let body = match self.detail() {
            Some(detail) => ErrorResponse::with_detail(self.code(), detail),
            None => ErrorResponse::code(self.code()),
        };

        (self.status(), Json(body)).into_response()
    }
}
