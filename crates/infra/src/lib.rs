//! # SafeRoute インフラ層
//!
//! ドメイン層が定義する概念を、PostgreSQL と暗号プリミティブの上に実装する。
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プールとスキーマのブートストラップ
//! - [`error`] - インフラ層エラー
//! - [`password`] - Argon2id によるパスワードハッシュ・検証
//! - [`token`] - 署名付きベアラートークンの発行・検証
//! - [`repository`] - 各エンティティのリポジトリ
//! - `mock` - テスト用のインメモリ実装（`test-utils` feature）
//!
//! ## 書き込みの原則
//!
//! すべての書き込みは主キーをキーとした単一ステートメントで行う。
//! 状態遷移は `UPDATE ... WHERE <id> AND <期待する状態>` の条件付き書き込みで、
//! 更新行数 0 は「他のリクエストが先に遷移させた」ことを意味する。

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod password;
pub mod repository;
pub mod token;

pub use error::{InfraError, InfraErrorKind};
pub use password::{Argon2PasswordHasher, PasswordChecker, PasswordHasher};
pub use token::{JwtTokenService, TokenError, TokenService};
