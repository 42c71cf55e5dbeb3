//! # 認証ガード
//!
//! `Authorization: Bearer <token>` を検証し、復元した [`AuthContext`] を
//! リクエスト拡張に格納する。ハンドラは [`crate::extract::Authenticated`] で受け取る。
//!
//! | 状況 | `require_auth` | `optional_auth` |
//! |------|----------------|-----------------|
//! | ヘッダーなし | 401 `unauthorized` | 匿名として通過 |
//! | 不正・期限切れ | 401 `invalid_token` | 401 `invalid_token` |
//! | 有効 | 通過 | 通過 |
//!
//! ガードは永続化アクセスより前に 1 回だけ評価される。
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! Router::new()
//!     .route("/notifications", get(list_notifications))
//!     .layer(from_fn_with_state(guard_state, require_auth))
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use saferoute_domain::role::AuthContext;
use saferoute_infra::{TokenError, TokenService};

use crate::error::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// 認証ガードの状態
#[derive(Clone)]
pub struct AuthGuardState {
    pub token_service: Arc<dyn TokenService>,
}

/// 認証必須のガード
pub async fn require_auth(
    State(state): State<AuthGuardState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let context = authenticate(state.token_service.as_ref(), &request)?
        .ok_or(ApiError::Unauthorized)?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// 認証任意のガード
///
/// ヘッダーがあれば検証し、不正なら拒否する。
pub async fn optional_auth(
    State(state): State<AuthGuardState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(context) = authenticate(state.token_service.as_ref(), &request)? {
        request.extensions_mut().insert(context);
    }
    Ok(next.run(request).await)
}

/// ヘッダーがなければ `Ok(None)`
fn authenticate(
    token_service: &dyn TokenService,
    request: &Request<Body>,
) -> Result<Option<AuthContext>, ApiError> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::InvalidToken)?;

    token_service.verify(token).map(Some).map_err(|e| {
        match e {
            TokenError::Expired => tracing::debug!("期限切れのトークンを拒否しました"),
            TokenError::InvalidSignature => tracing::debug!("署名が不正なトークンを拒否しました"),
        }
        ApiError::InvalidToken
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        Router,
        http::StatusCode,
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use saferoute_domain::{role::Role, user::UserId};
    use saferoute_infra::JwtTokenService;
    use tower::ServiceExt;

    use super::*;

    const SECRET: &str = "test-secret";

    async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
        auth.subject().to_string()
    }

    async fn maybe_whoami(auth: Option<Extension<AuthContext>>) -> String {
        auth.map_or_else(|| "anonymous".to_string(), |Extension(a)| a.subject().to_string())
    }

    fn guard_state() -> AuthGuardState {
        AuthGuardState {
            token_service: Arc::new(JwtTokenService::new(SECRET, Duration::days(30))),
        }
    }

    fn app() -> Router {
        let state = guard_state();
        Router::new()
            .route(
                "/required",
                get(whoami).layer(from_fn_with_state(state.clone(), require_auth)),
            )
            .route(
                "/optional",
                get(maybe_whoami).layer(from_fn_with_state(state, optional_auth)),
            )
    }

    fn issue(subject: &UserId) -> String {
        JwtTokenService::new(SECRET, Duration::days(30))
            .issue(subject, Role::User, Utc::now())
            .unwrap()
    }

    async fn call(uri: &str, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_ヘッダーなしはunauthorized() {
        let (status, body) = call("/required", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("\"unauthorized\""));
    }

    #[tokio::test]
    async fn test_有効なトークンでsubjectが渡る() {
        let user_id = UserId::new();
        let token = issue(&user_id);

        let (status, body) = call("/required", Some(&format!("Bearer {token}"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user_id.to_string());
    }

    #[tokio::test]
    async fn test_別の鍵で署名されたトークンはinvalid_token() {
        let token = JwtTokenService::new("other-secret", Duration::days(30))
            .issue(&UserId::new(), Role::Admin, Utc::now())
            .unwrap();

        let (status, body) = call("/required", Some(&format!("Bearer {token}"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("\"invalid_token\""));
    }

    #[tokio::test]
    async fn test_bearer以外の形式はinvalid_token() {
        let (status, body) = call("/required", Some("Basic YWxpY2U6c2VjcmV0")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("\"invalid_token\""));
    }

    #[tokio::test]
    async fn test_任意認証はヘッダーなしで匿名として通過する() {
        let (status, body) = call("/optional", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_任意認証でも不正なトークンは拒否する() {
        let (status, _) = call("/optional", Some("Bearer garbage")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
