//! # ミドルウェア
//!
//! - [`auth`]: ベアラートークンの検証と `AuthContext` の付与
//! - [`authz`]: ルート単位のロール検証
//! - [`timeout`]: リクエスト単位のタイムアウト

mod auth;
mod authz;
mod timeout;

pub use auth::{AuthGuardState, optional_auth, require_auth};
pub use authz::{RequiredRole, require_role};
pub use timeout::request_timeout;
