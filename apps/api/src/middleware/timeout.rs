//! # リクエストタイムアウト
//!
//! 各リクエストを `tokio::time::timeout` で包む。期限を過ぎると実行中の
//! future は破棄され、進行中の永続化呼び出しも同時にキャンセルされる。

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// タイムアウトミドルウェア
///
/// 期限切れの場合は `504 {"error":"timeout"}` を返す。
pub async fn request_timeout(
    State(limit): State<Duration>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%method, %uri, timeout_ms = limit.as_millis() as u64, "リクエストがタイムアウトしました");
            ApiError::Timeout.into_response()
        }
    }
}
