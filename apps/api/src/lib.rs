//! # SafeRoute API
//!
//! 市民がインシデント（冠水、道路の危険など）を報告し、管理者が審査する
//! バックエンドの HTTP 層とユースケース層。
//!
//! ## レイヤー構成
//!
//! ```text
//! handler  ─▶  usecase  ─▶  saferoute_infra::repository  ─▶  PostgreSQL
//!    │            │
//!    └────────────┴─▶  saferoute_domain（エンティティ・状態遷移・認可）
//! ```
//!
//! ## モジュール構成
//!
//! - [`app_builder`] - 依存の組み立てとルーター構築
//! - [`config`] - アプリケーション設定（環境変数からの読み込み）
//! - [`error`] - API エラー定義と HTTP レスポンスへの変換
//! - [`extract`] - 検証付きリクエスト抽出器
//! - [`handler`] - HTTP リクエストハンドラ
//! - [`middleware`] - 認証ガード、リクエストタイムアウト
//! - [`usecase`] - ビジネスロジック
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use saferoute_api::app_builder::{AppDependencies, build_app};
//!
//! let app = build_app(deps);
//! axum::serve(listener, app).await?;
//! ```

pub mod app_builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod middleware;
pub mod usecase;
