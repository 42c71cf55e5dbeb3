//! # リポジトリ
//!
//! 各エンティティの永続化を担当する。トレイトをユースケース層に公開し、
//! PostgreSQL 実装をインフラ層で提供する。
//!
//! ## 条件付き書き込み
//!
//! 状態遷移を伴う更新は、期待する現在状態を `WHERE` 句に含める。
//! 戻り値の `bool` は「この書き込みが適用されたか」を表し、
//! `false` は同じ行に対する別の遷移が先にコミットされたことを意味する。

pub mod comment_repository;
pub mod facility_repository;
pub mod notification_repository;
pub mod report_repository;
pub mod user_repository;

use saferoute_domain::DomainError;

pub use comment_repository::{CommentRepository, PostgresCommentRepository};
pub use facility_repository::{FacilityFilter, FacilityRepository, PostgresFacilityRepository};
pub use notification_repository::{NotificationRepository, PostgresNotificationRepository};
pub use report_repository::{
    PostgresReportRepository,
    ReportRepository,
    ReportStatusCounts,
    VoteCounts,
};
pub use user_repository::{PostgresUserRepository, UserRepository};

use crate::InfraError;

/// DB から読み出した値がドメインの制約を満たさない場合のエラー
pub(crate) fn corrupted(e: DomainError) -> InfraError {
    InfraError::unexpected(format!("不正な永続化データ: {e}"))
}
