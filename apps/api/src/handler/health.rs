//! # ヘルスチェック・サービス情報ハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! GET /health     -> {"status":"ok"}
//! GET /api/info   -> {"name":"SafeRoute API","version":"0.4.0"}
//! ```
//!
//! どちらもデータベースへ接続せず、プロセスの起動状態のみを返す。

use axum::Json;
use saferoute_shared::{HealthResponse, ServiceInfoResponse};

pub const SERVICE_NAME: &str = "SafeRoute API";

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// GET /api/info
pub async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        name:    SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
