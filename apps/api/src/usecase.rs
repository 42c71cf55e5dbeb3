//! # ユースケース層
//!
//! SafeRoute API のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリと時刻を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **認可を先に**: 要求能力の検証は永続化アクセスより前に行う
//!
//! ## モジュール構成
//!
//! - `auth`: 登録・ログイン
//! - `report`: レポート、コメント、投票、通報
//! - `admin`: レポート審査と統計
//! - `facility`: 公共施設
//! - `user`: ユーザー管理とダッシュボード
//! - `notification`: ユーザー通知

pub(crate) mod helpers;

pub mod admin;
pub mod auth;
pub mod facility;
pub mod notification;
pub mod report;
pub mod user;

pub use admin::AdminUseCaseImpl;
pub use auth::{AuthOutput, AuthUseCaseImpl, RegisterInput};
pub use facility::{CreateFacilityInput, FacilityDetailsInput, FacilityUseCaseImpl};
pub use notification::NotificationUseCaseImpl;
pub use report::{CreateReportInput, ReportUseCaseImpl};
pub use user::{DashboardSummary, UserUseCaseImpl};
