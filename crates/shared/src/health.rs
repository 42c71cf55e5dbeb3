//! # ヘルスチェック・サービス情報
//!
//! `/health` と `/api/info` が返すレスポンス型。

use serde::{Deserialize, Serialize};

/// ヘルスチェックレスポンス
///
/// ```
/// use saferoute_shared::HealthResponse;
///
/// assert_eq!(HealthResponse::ok().status, "ok");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 稼働状態（常に `"ok"`）
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// サービス情報レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    /// サービス名
    pub name:    String,
    /// バージョン（Cargo.toml から取得）
    pub version: String,
}
