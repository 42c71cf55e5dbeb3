//! # ユーザー
//!
//! ユーザーエンティティとロール遷移を定義する。
//!
//! ## ロール遷移表
//!
//! | 操作 | 遷移 | 実行者 |
//! |------|------|--------|
//! | `promote` | `USER → ADMIN` | ADMIN |
//! | `suspend` | `USER / ADMIN → SUSPENDED` | ADMIN |
//! | `unsuspend` | `SUSPENDED → USER` | ADMIN |
//! | `soft_delete` | 削除フラグを立てる（一方向） | 本人または ADMIN |
//!
//! 降格（`ADMIN → USER`）の経路は存在しない。
//! 削除済みユーザーに対するロール遷移はすべて `InvalidTransition` になる。
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use saferoute_domain::{
//!     role::Role,
//!     user::{NewUser, User, UserId, Username},
//! };
//!
//! let now = chrono::Utc::now();
//! let user = User::new(
//!     NewUser {
//!         id:            UserId::new(),
//!         username:      Username::new("alice")?,
//!         email:         None,
//!         phone:         None,
//!         password_hash: None,
//!     },
//!     now,
//! );
//!
//! let admin = user.promote(now)?;
//! assert_eq!(admin.role(), Role::Admin);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};

use crate::{DomainError, password::PasswordHash, role::Role, value_objects::Email};

define_uuid_id! {
    /// ユーザー ID
    pub struct UserId;
}

define_validated_string! {
    /// ユーザー名（一意、3〜50 文字）
    pub struct Username {
        label: "ユーザー名",
        min_length: 3,
        max_length: 50,
    }
}

define_validated_string! {
    /// 電話番号（一意）
    pub struct Phone {
        label: "電話番号",
        min_length: 3,
        max_length: 32,
        redact,
    }
}

/// ユーザー作成時の入力
pub struct NewUser {
    pub id:            UserId,
    pub username:      Username,
    pub email:         Option<Email>,
    pub phone:         Option<Phone>,
    pub password_hash: Option<PasswordHash>,
}

/// ユーザーエンティティ
///
/// # 不変条件
///
/// - `username` は一意。`email` / `phone` は指定されていれば一意
/// - 物理削除されない（`deleted_at` による論理削除のみ）
/// - `SUSPENDED` のユーザーもデータはすべて保持する
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    username: Username,
    email: Option<Email>,
    phone: Option<Phone>,
    password_hash: Option<PasswordHash>,
    role: Role,
    trust_score: i32,
    reports_count: i32,
    suspension_reason: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// 新規登録ユーザーを作成する（ロールは `USER`）
    pub fn new(input: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: input.id,
            username: input.username,
            email: input.email,
            phone: input.phone,
            password_hash: input.password_hash,
            role: Role::User,
            trust_score: 0,
            reports_count: 0,
            suspension_reason: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータからユーザーを復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: UserId,
        username: Username,
        email: Option<Email>,
        phone: Option<Phone>,
        password_hash: Option<PasswordHash>,
        role: Role,
        trust_score: i32,
        reports_count: i32,
        suspension_reason: Option<String>,
        deleted_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            phone,
            password_hash,
            role,
            trust_score,
            reports_count,
            suspension_reason,
            deleted_at,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn phone(&self) -> Option<&Phone> {
        self.phone.as_ref()
    }

    pub fn password_hash(&self) -> Option<&PasswordHash> {
        self.password_hash.as_ref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn trust_score(&self) -> i32 {
        self.trust_score
    }

    pub fn reports_count(&self) -> i32 {
        self.reports_count
    }

    pub fn suspension_reason(&self) -> Option<&str> {
        self.suspension_reason.as_deref()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// ログイン可能か（削除済みでないこと）
    ///
    /// `SUSPENDED` でもログインは可能。書き込み権限のみを失う。
    pub fn can_login(&self) -> bool {
        !self.is_deleted()
    }

    /// 管理者に昇格した新しいインスタンスを返す
    ///
    /// # Errors
    ///
    /// `USER` 以外、または削除済みの場合は `DomainError::InvalidTransition`
    pub fn promote(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_not_deleted("promote")?;
        match self.role {
            Role::User => Ok(Self {
                role: Role::Admin,
                updated_at: now,
                ..self
            }),
            Role::Admin | Role::Suspended => Err(DomainError::invalid_transition(
                "User",
                self.role.to_string(),
                "promote",
            )),
        }
    }

    /// 利用停止にした新しいインスタンスを返す
    ///
    /// # Errors
    ///
    /// 既に `SUSPENDED`、または削除済みの場合は `DomainError::InvalidTransition`
    pub fn suspend(self, reason: Option<String>, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_not_deleted("suspend")?;
        match self.role {
            Role::User | Role::Admin => Ok(Self {
                role: Role::Suspended,
                suspension_reason: reason,
                updated_at: now,
                ..self
            }),
            Role::Suspended => Err(DomainError::invalid_transition(
                "User",
                self.role.to_string(),
                "suspend",
            )),
        }
    }

    /// 利用停止を解除した新しいインスタンスを返す（ロールは `USER` に戻る）
    ///
    /// # Errors
    ///
    /// `SUSPENDED` 以外、または削除済みの場合は `DomainError::InvalidTransition`
    pub fn unsuspend(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_not_deleted("unsuspend")?;
        match self.role {
            Role::Suspended => Ok(Self {
                role: Role::User,
                suspension_reason: None,
                updated_at: now,
                ..self
            }),
            Role::User | Role::Admin => Err(DomainError::invalid_transition(
                "User",
                self.role.to_string(),
                "unsuspend",
            )),
        }
    }

    /// 論理削除した新しいインスタンスを返す
    ///
    /// # Errors
    ///
    /// 既に削除済みの場合は `DomainError::InvalidTransition`
    pub fn soft_deleted(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_not_deleted("delete")?;
        Ok(Self {
            deleted_at: Some(now),
            updated_at: now,
            ..self
        })
    }

    fn ensure_not_deleted(&self, action: &'static str) -> Result<(), DomainError> {
        if self.is_deleted() {
            return Err(DomainError::invalid_transition("User", "DELETED", action));
        }
        Ok(())
    }
}
