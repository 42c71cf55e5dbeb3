//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはリソースごとのサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲
//! - 成功レスポンスはすべて `200 OK` と `{ "data": ... }`
//!
//! ## モジュール構成
//!
//! ```text
//! handler.rs              # 親モジュール（re-export）
//! └── handler/
//!     ├── health.rs       # ヘルスチェック・サービス情報
//!     ├── auth.rs         # 登録・ログイン
//!     ├── report.rs       # レポート・コメント・投票・通報
//!     ├── admin.rs        # レポート審査
//!     ├── facility.rs     # 公共施設
//!     ├── user.rs         # ユーザー管理
//!     └── notification.rs # 通知
//! ```

use serde::Serialize;

pub mod admin;
pub mod auth;
pub mod facility;
pub mod health;
pub mod notification;
pub mod report;
pub mod user;

pub use admin::{AdminState, list_pending, reject_report, report_stats, verify_report};
pub use auth::{AuthState, login, register};
pub use facility::{
    FacilityState,
    create_facility,
    delete_facility,
    get_facility,
    list_facilities,
    update_facility,
};
pub use health::{health_check, service_info};
pub use notification::{
    NotificationState,
    delete_notification,
    list_notifications,
    mark_notification_read,
};
pub use report::{
    ReportState,
    create_comment,
    create_report,
    flag_report,
    get_report,
    list_comments,
    list_reports,
    vote_report,
};
pub use user::{
    UserState,
    dashboard,
    delete_user,
    get_user,
    list_users,
    promote_user,
    suspend_user,
    unsuspend_user,
};

/// 削除系エンドポイントの結果
#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub deleted: bool,
}
