//! # パスワードハッシュ
//!
//! Argon2id によるパスワードのハッシュ化と検証を提供する。
//!
//! Argon2 は意図的に CPU とメモリを消費するため、
//! 計算は `tokio::task::spawn_blocking` でブロッキングスレッドに逃がし、
//! 非同期ランタイムのワーカーを占有しない。

use argon2::{
    Argon2,
    Params,
    PasswordHasher as _,
    PasswordVerifier as _,
    password_hash::{PasswordHash as Argon2PasswordHash, SaltString},
};
use async_trait::async_trait;
use saferoute_domain::password::{PasswordHash, PasswordVerifyResult, PlainPassword};

use crate::InfraError;

/// 存在しないユーザーのログイン時に検証へ使うハッシュ
///
/// 既存ユーザーと同じコストの検証を行い、応答時間からユーザーの存在を推測させない。
pub const TIMING_DUMMY_HASH: &str = "$argon2id$v=19$m=65536,t=1,p=1$olntqw+EoVpwH4B1vUAI0A$5yCA1izLODgz8nQOInDGwbuQB/AS0sIQDwpmIilve5M";

/// パスワードのハッシュ化を担当するトレイト
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// ソルト付きの一方向ハッシュを生成する
    async fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError>;
}

/// パスワード検証を担当するトレイト
#[async_trait]
pub trait PasswordChecker: Send + Sync {
    /// パスワードを検証する
    ///
    /// 不一致はエラーではなく `PasswordVerifyResult::Mismatch` として返す。
    ///
    /// # Errors
    ///
    /// - 不正なハッシュ形式の場合
    async fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError>;
}

/// Argon2id による実装
///
/// OWASP 推奨パラメータ（RFC 9106）を使用:
/// - Memory: 64 MB
/// - Iterations: 1
/// - Parallelism: 1
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// # Errors
    ///
    /// Argon2 パラメータが不正な場合
    pub fn new() -> Result<Self, InfraError> {
        let params = Params::new(
            65536, // memory (KB) = 64 MB
            1,     // iterations
            1,     // parallelism
            None,  // output length (default: 32)
        )
        .map_err(|e| InfraError::unexpected(format!("Argon2 パラメータが不正です: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        })
    }

    fn hash_blocking(argon2: &Argon2<'_>, password: &str) -> Result<String, InfraError> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| InfraError::unexpected(format!("ソルトの生成に失敗しました: {e}")))?;

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| InfraError::unexpected(format!("ハッシュ化に失敗しました: {e}")))
    }

    fn verify_blocking(
        argon2: &Argon2<'_>,
        password: &str,
        hash: &str,
    ) -> Result<bool, InfraError> {
        let parsed = Argon2PasswordHash::new(hash)
            .map_err(|e| InfraError::unexpected(format!("不正なハッシュ形式: {e}")))?;

        Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError> {
        let argon2 = self.argon2.clone();
        let password = password.as_str().to_string();

        let hash = tokio::task::spawn_blocking(move || Self::hash_blocking(&argon2, &password))
            .await
            .map_err(|e| InfraError::unexpected(format!("ハッシュ化タスクが失敗しました: {e}")))??;

        Ok(PasswordHash::new(hash))
    }
}

#[async_trait]
impl PasswordChecker for Argon2PasswordHasher {
    async fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError> {
        let argon2 = self.argon2.clone();
        let password = password.as_str().to_string();
        let hash = hash.as_str().to_string();

        let matched =
            tokio::task::spawn_blocking(move || Self::verify_blocking(&argon2, &password, &hash))
                .await
                .map_err(|e| InfraError::unexpected(format!("検証タスクが失敗しました: {e}")))??;

        Ok(PasswordVerifyResult::from(matched))
    }
}
