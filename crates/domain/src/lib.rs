//! # SafeRoute ドメイン層
//!
//! 市民による危険・安全レポートの投稿、管理者による検証、公共施設、
//! ユーザー通知を扱うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（Report, User, Facility, Notification）
//! - **値オブジェクト**: 生成時に検証される不変オブジェクト（Username, GeoPoint など）
//! - **状態遷移**: 各エンティティは遷移表にない操作を `InvalidTransition` で拒否する
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、暗号プリミティブ）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメインエラー
//! - [`role`] - ロールと認証済みコンテキスト
//! - [`user`] - ユーザー
//! - [`report`] - レポートと投票
//! - [`comment`] - レポートへのコメント
//! - [`facility`] - 公共施設
//! - [`notification`] - ユーザー通知
//! - [`value_objects`] - 共通の値オブジェクト
//! - [`password`] - パスワード関連の値オブジェクト
//! - [`clock`] - 時刻プロバイダ

#[macro_use]
mod macros;

pub mod clock;
pub mod comment;
pub mod error;
pub mod facility;
pub mod notification;
pub mod password;
pub mod report;
pub mod role;
pub mod user;
pub mod value_objects;

pub use error::DomainError;
