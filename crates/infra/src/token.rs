//! # ベアラートークン
//!
//! HS256 で署名した自己完結型トークンを発行・検証する。
//! サーバー側にセッション状態は持たない。
//!
//! ## クレーム
//!
//! | クレーム | 内容 |
//! |---------|------|
//! | `sub` | ユーザー ID（UUID 文字列） |
//! | `role` | `USER` / `ADMIN` / `SUSPENDED` |
//! | `iat` | 発行日時（UNIX 秒） |
//! | `exp` | 有効期限（UNIX 秒） |
//!
//! 署名・有効期限・クレーム形式のいずれかが不正なトークンは、
//! 一部のクレームだけを信頼することなく全体を拒否する。

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm,
    DecodingKey,
    EncodingKey,
    Header,
    Validation,
    decode,
    encode,
    errors::ErrorKind,
};
use saferoute_domain::{
    role::{AuthContext, Role},
    user::UserId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::InfraError;

/// トークンのデフォルト有効期間（日）
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// トークン検証の失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// 有効期限切れ
    #[error("トークンの有効期限が切れています")]
    Expired,
    /// 署名不一致、形式不正、クレーム不正
    #[error("トークンの署名が不正です")]
    InvalidSignature,
}

/// トークンに含めるクレーム
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub:  String,
    pub role: String,
    pub iat:  i64,
    pub exp:  i64,
}

/// トークンの発行・検証を担当するトレイト
pub trait TokenService: Send + Sync {
    /// `{subject, role}` を署名したトークンを発行する
    fn issue(&self, subject: &UserId, role: Role, now: DateTime<Utc>)
    -> Result<String, InfraError>;

    /// トークンを検証し、認証済みコンテキストを復元する
    fn verify(&self, token: &str) -> Result<AuthContext, TokenError>;
}

/// HS256 による実装
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl:          Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        subject: &UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, InfraError> {
        let claims = TokenClaims {
            sub:  subject.to_string(),
            role: role.to_string(),
            iat:  now.timestamp(),
            exp:  (now + self.ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    fn verify(&self, token: &str) -> Result<AuthContext, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &Self::validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            })?;

        let subject = Uuid::parse_str(&data.claims.sub)
            .map(UserId::from_uuid)
            .map_err(|_| TokenError::InvalidSignature)?;
        let role = data
            .claims
            .role
            .parse::<Role>()
            .map_err(|_| TokenError::InvalidSignature)?;

        Ok(AuthContext::new(subject, role))
    }
}
