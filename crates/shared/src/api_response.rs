//! # 成功レスポンスのエンベロープ
//!
//! すべての成功レスポンスは `{ "data": <行 | 行の配列> }` で返す。

use serde::Serialize;

/// `{ "data": T }`
///
/// ```
/// use saferoute_shared::ApiResponse;
///
/// let body = serde_json::to_string(&ApiResponse::new([1, 2])).unwrap();
/// assert_eq!(body, r#"{"data":[1,2]}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
