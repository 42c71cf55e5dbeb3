//! # 認証ユースケース
//!
//! ユーザー登録とログインを扱う。
//!
//! ## タイミング攻撃対策
//!
//! ユーザーが存在しない場合もダミーハッシュで Argon2 検証を実行し、
//! 応答時間からユーザーの存在を推測できないようにする。

use std::sync::Arc;

use saferoute_domain::{
    clock::Clock,
    password::{PasswordHash, PlainPassword},
    user::{NewUser, Phone, User, UserId, Username},
    value_objects::Email,
};
use saferoute_infra::{
    PasswordChecker,
    PasswordHasher,
    TokenService,
    password::TIMING_DUMMY_HASH,
    repository::UserRepository,
};

use crate::{error::ApiError, usecase::helpers::non_blank};

/// ユーザー登録の入力
pub struct RegisterInput {
    pub username: String,
    pub email:    Option<String>,
    pub phone:    Option<String>,
    pub password: Option<String>,
}

/// 認証成功時の結果
pub struct AuthOutput {
    pub user:  User,
    pub token: String,
}

/// 認証ユースケースの実装
pub struct AuthUseCaseImpl {
    user_repository:  Arc<dyn UserRepository>,
    password_hasher:  Arc<dyn PasswordHasher>,
    password_checker: Arc<dyn PasswordChecker>,
    token_service:    Arc<dyn TokenService>,
    clock:            Arc<dyn Clock>,
}

impl AuthUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        password_checker: Arc<dyn PasswordChecker>,
        token_service: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            password_checker,
            token_service,
            clock,
        }
    }

    /// ユーザーを登録し、トークンを発行する
    ///
    /// パスワードは任意。省略した場合はパスワードレスのアカウントになる。
    /// ユーザー名・メールアドレス・電話番号のいずれかが既存と重複する場合は
    /// `ApiError::UserExists`。
    pub async fn register(&self, input: RegisterInput) -> Result<AuthOutput, ApiError> {
        let username = Username::new(input.username)?;
        let email = non_blank(input.email).map(Email::new).transpose()?;
        let phone = non_blank(input.phone).map(Phone::new).transpose()?;
        let password = PlainPassword::for_registration(input.password)?;

        let password_hash = match password {
            Some(password) => Some(self.password_hasher.hash(&password).await?),
            None => None,
        };

        let now = self.clock.now();
        let user = User::new(
            NewUser {
                id: UserId::new(),
                username,
                email,
                phone,
                password_hash,
            },
            now,
        );

        self.user_repository.insert(&user).await.map_err(|e| {
            if e.as_conflict().is_some() {
                ApiError::UserExists
            } else {
                e.into()
            }
        })?;

        let token = self.token_service.issue(user.id(), user.role(), now)?;

        tracing::info!(user_id = %user.id(), "ユーザーを登録しました");

        Ok(AuthOutput { user, token })
    }

    /// ユーザー名とパスワードでログインする
    ///
    /// ## エラー
    ///
    /// - 存在しない、削除済み、パスワード不一致: `ApiError::InvalidCredentials`
    /// - パスワード未設定: `ApiError::NoPasswordSet`
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthOutput, ApiError> {
        let password = PlainPassword::new(password);

        let user = match Username::new(username) {
            Ok(username) => self.user_repository.find_by_username(&username).await?,
            Err(_) => None,
        };

        let user = match user {
            Some(user) if user.can_login() => user,
            _ => {
                self.dummy_verification(&password).await;
                return Err(ApiError::InvalidCredentials);
            }
        };

        let Some(hash) = user.password_hash() else {
            return Err(ApiError::NoPasswordSet);
        };

        let result = self.password_checker.verify(&password, hash).await?;
        if result.is_mismatch() {
            tracing::info!(user_id = %user.id(), "パスワードが一致しませんでした");
            return Err(ApiError::InvalidCredentials);
        }

        let token = self
            .token_service
            .issue(user.id(), user.role(), self.clock.now())?;

        Ok(AuthOutput { user, token })
    }

    /// ダミーハッシュで検証を実行する
    ///
    /// 結果とエラーはどちらも使わない。
    async fn dummy_verification(&self, password: &PlainPassword) {
        let dummy_hash = PasswordHash::new(TIMING_DUMMY_HASH);
        let _ = self.password_checker.verify(password, &dummy_hash).await;
    }
}
