//! # ロールと認証済みコンテキスト
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`Role`] | ロール | `USER` / `ADMIN` / `SUSPENDED` の閉じた列挙 |
//! | [`AuthContext`] | 認証済みコンテキスト | トークンから 1 リクエストにつき 1 回だけ復元される呼び出し元 |
//! | [`Capability`] | 要求能力 | 操作ごとに宣言する認可条件 |
//!
//! ## 設計方針
//!
//! - `AuthContext` は不変値としてハンドラからユースケースへ明示的に渡す
//! - 認可判定は永続化アクセスより前に行う
//! - `SUSPENDED` はデータを保持したまま書き込み権限のみを失う

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, user::UserId};

/// ユーザーロール
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 一般ユーザー
    User,
    /// 管理者（レポート検証、施設・ユーザー管理）
    Admin,
    /// 利用停止中（閲覧のみ）
    Suspended,
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "SUSPENDED" => Ok(Self::Suspended),
            _ => Err(DomainError::Validation(format!("不正なロール: {}", s))),
        }
    }
}

impl Role {
    /// 書き込み操作（レポート投稿、コメント、投票など）が可能か
    pub fn can_write(self) -> bool {
        !matches!(self, Self::Suspended)
    }
}

/// 操作が要求する認可条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<'a> {
    /// 認証済みであればよい
    Authenticated,
    /// 書き込み権限を持つ（`SUSPENDED` 以外）
    Writer,
    /// 管理者
    Admin,
    /// リソースの所有者または管理者
    OwnerOrAdmin(&'a UserId),
}

/// 認証済みの呼び出し元
///
/// 署名検証済みトークンの `{subject, role}` から構築される。
/// フィールドは非公開で、構築後に変更できない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    subject: UserId,
    role:    Role,
}

impl AuthContext {
    pub fn new(subject: UserId, role: Role) -> Self {
        Self { subject, role }
    }

    pub fn subject(&self) -> &UserId {
        &self.subject
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 要求能力を満たすか検証する
    ///
    /// # Errors
    ///
    /// 満たさない場合は `DomainError::Forbidden`
    pub fn authorize(&self, capability: Capability<'_>) -> Result<(), DomainError> {
        let allowed = match capability {
            Capability::Authenticated => true,
            Capability::Writer => self.role.can_write(),
            Capability::Admin => self.is_admin(),
            Capability::OwnerOrAdmin(owner) => self.is_admin() || &self.subject == owner,
        };

        if allowed {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "ロール {} ではこの操作を実行できません",
                self.role
            )))
        }
    }
}
