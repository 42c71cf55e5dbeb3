//! # ロール認可ミドルウェア
//!
//! 認証ガードが格納した [`AuthContext`] のロールを、ルート単位で検証する。
//! パス・ボディの抽出より前に評価されるため、権限のない呼び出し元は
//! 入力の内容にかかわらず 403 で打ち切られる。
//!
//! 認証ガード（`require_auth` / `optional_auth`）より内側に置くこと。
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! Router::new()
//!     .route("/admin/pending", get(list_pending))
//!     .route_layer(from_fn_with_state(RequiredRole::Admin, require_role))
//!     .layer(from_fn_with_state(guard_state, require_auth))
//! ```

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use saferoute_domain::role::{AuthContext, Capability};

use crate::error::ApiError;

/// ルートが要求するロール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    /// 管理者のみ。未認証は 401
    Admin,
    /// 書き込み権限。匿名は通過し、`SUSPENDED` は 403
    Writer,
}

/// ロール認可ミドルウェア
pub async fn require_role(
    State(required): State<RequiredRole>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    match (required, request.extensions().get::<AuthContext>()) {
        (RequiredRole::Admin, None) => return Err(ApiError::Unauthorized),
        (RequiredRole::Admin, Some(ctx)) => ctx.authorize(Capability::Admin)?,
        (RequiredRole::Writer, Some(ctx)) => ctx.authorize(Capability::Writer)?,
        (RequiredRole::Writer, None) => {}
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        Router,
        http::{Method, StatusCode},
        middleware::from_fn_with_state,
        routing::post,
    };
    use rstest::rstest;
    use saferoute_domain::{role::Role, user::UserId};
    use tower::ServiceExt;

    use super::*;
    use crate::extract::{ApiPath, ValidatedJson};

    #[derive(Debug, serde::Deserialize, validator::Validate)]
    struct ReasonRequest {
        #[validate(length(min = 1))]
        #[allow(dead_code)]
        reason: String,
    }

    async fn reject(
        ApiPath(_id): ApiPath<uuid::Uuid>,
        ValidatedJson(_req): ValidatedJson<ReasonRequest>,
    ) -> StatusCode {
        StatusCode::OK
    }

    fn app(required: RequiredRole, caller: Option<Role>) -> Router {
        let router = Router::new()
            .route("/items/{id}/reject", post(reject))
            .route_layer(from_fn_with_state(required, require_role));
        match caller {
            Some(role) => router.layer(Extension(AuthContext::new(UserId::new(), role))),
            None => router,
        }
    }

    async fn call(app: Router, uri: &str, body: &str) -> StatusCode {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[rstest]
    #[case::不正なボディ("/items/8f0e3c52-6a0e-4d3c-9a51-3f1b2c4d5e6f/reject", "{}")]
    #[case::不正なid("/items/not-a-uuid/reject", r#"{"reason":"dup"}"#)]
    #[tokio::test]
    async fn test_管理者ルートは入力検証より先に一般ユーザーを403で拒否する(
        #[case] uri: &str,
        #[case] body: &str,
    ) {
        let status = call(app(RequiredRole::Admin, Some(Role::User)), uri, body).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_管理者ルートは未認証なら401() {
        let app = app(RequiredRole::Admin, None);

        let status = call(app, "/items/not-a-uuid/reject", "{}").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_管理者は検証まで進む() {
        let app = app(RequiredRole::Admin, Some(Role::Admin));

        let status = call(app, "/items/not-a-uuid/reject", "{}").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[case(None, StatusCode::BAD_REQUEST)]
    #[case(Some(Role::User), StatusCode::BAD_REQUEST)]
    #[case(Some(Role::Suspended), StatusCode::FORBIDDEN)]
    #[tokio::test]
    async fn test_書き込みルートは利用停止中のみ先に拒否する(
        #[case] caller: Option<Role>,
        #[case] expected: StatusCode,
    ) {
        let app = app(RequiredRole::Writer, caller);

        let status = call(app, "/items/not-a-uuid/reject", "{}").await;

        assert_eq!(status, expected);
    }
}
