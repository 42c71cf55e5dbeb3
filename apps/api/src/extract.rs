//! # リクエスト抽出器
//!
//! axum 標準の抽出器を包み、失敗時のレスポンスを `ApiError` の形式に揃える。
//!
//! - [`ValidatedJson`]: JSON ボディの解析と `validator` による宣言的検証
//! - [`ApiPath`] / [`ApiQuery`]: パス・クエリパラメータの解析
//! - [`Authenticated`]: 認証ガードが格納した [`AuthContext`] の取り出し

use std::convert::Infallible;

use axum::{
    Json,
    extract::{
        FromRequest,
        FromRequestParts,
        OptionalFromRequest,
        OptionalFromRequestParts,
        Path,
        Query,
        Request,
    },
    body::{Body, to_bytes},
    http::request::Parts,
};
use saferoute_domain::role::AuthContext;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// 検証付き JSON 抽出器
///
/// 不正な JSON と検証エラーはどちらも `validation_error` になる。
///
/// ```rust,ignore
/// #[derive(Deserialize, Validate)]
/// struct RegisterRequest {
///     #[validate(length(min = 3, max = 50))]
///     username: String,
/// }
///
/// async fn register(ValidatedJson(req): ValidatedJson<RegisterRequest>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        data.validate()
            .map_err(|e| ApiError::Validation(describe(&e)))?;

        Ok(Self(data))
    }
}

/// 任意ボディとして読み込む上限
const OPTIONAL_BODY_LIMIT: usize = 64 * 1024;

/// ボディ任意のエンドポイント用
///
/// ボディが空（空白のみを含む）なら `None`。中身があれば `Content-Type` の有無を含めて
/// 通常どおり解析・検証するため、ヘッダーのない JSON は黙って捨てられず `validation_error` になる。
impl<T, S> OptionalFromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = to_bytes(body, OPTIONAL_BODY_LIMIT)
            .await
            .map_err(|e| ApiError::Validation(format!("ボディを読み込めません: {e}")))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        <Self as FromRequest<S>>::from_request(req, state)
            .await
            .map(Some)
    }
}

/// パスパラメータ抽出器
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = <Path<T> as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// クエリパラメータ抽出器
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = <Query<T> as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// 認証済みの呼び出し元
///
/// `require_auth` / `optional_auth` が格納した [`AuthContext`] を取り出す。
/// 格納されていなければ `unauthorized`。認証任意のルートでは
/// `Option<Authenticated>` として受け取る。
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthContext);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthContext>().cloned().map(Self))
    }
}

/// 検証エラーを `field: message` 形式の 1 行にまとめる
///
/// フィールド名順に並べるため、出力は決定的になる。
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let codes: Vec<String> = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            format!("{}: {}", field, codes.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}
