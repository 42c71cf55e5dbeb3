//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス構造体 `{ "error": code, "detail"?: message }`
//! を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - `error` は機械可読なスネークケースのコード（`not_found`, `invalid_token` など）
//! - `detail` は人間向けの補足情報。不要な場合はキーごと省略する

use serde::{Deserialize, Serialize};

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error:  String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    /// detail なしのエラーを作成する
    pub fn code(error: impl Into<String>) -> Self {
        Self {
            error:  error.into(),
            detail: None,
        }
    }

    /// detail 付きのエラーを作成する
    pub fn with_detail(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error:  error.into(),
            detail: Some(detail.into()),
        }
    }
}
