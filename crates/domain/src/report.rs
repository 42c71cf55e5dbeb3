//! # レポート
//!
//! 市民が投稿する危険・安全レポートと、その検証状態を定義する。
//!
//! ## 状態遷移
//!
//! ```text
//! PENDING_VERIFICATION --verify(ADMIN)--> VERIFIED
//! PENDING_VERIFICATION --reject(ADMIN, reason)--> REJECTED
//! ```
//!
//! `VERIFIED` / `REJECTED` は終端状態。投票は状態遷移ではなく、
//! どの状態でもカウンタを 1 増やす副作用として扱う。
//!
//! ## 状態ごとのフィールド
//!
//! 審査者・審査日時・メモ／却下理由は審査済みの状態にだけ存在する。
//! [`ReportState`] の各バリアントが必要なフィールドだけを持つため、
//! 「PENDING なのに審査者がいる」ような不整合は型レベルで表現できない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    user::UserId,
    value_objects::{County, GeoPoint},
};

define_uuid_id! {
    /// レポート ID
    pub struct ReportId;
}

define_validated_string! {
    /// レポートのタイトル（3〜200 文字）
    pub struct ReportTitle {
        label: "タイトル",
        min_length: 3,
        max_length: 200,
    }
}

define_validated_string! {
    /// レポート種別（例: `flooding`, `road_hazard`）
    pub struct ReportType {
        label: "レポート種別",
        min_length: 1,
        max_length: 50,
    }
}

/// 深刻度
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// 審査待ち一覧の並び順に使う順位（大きいほど優先）
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(DomainError::Validation(format!("不正な深刻度: {}", s))),
        }
    }
}

/// レポートの検証ステータス（永続化用の平坦な表現）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    PendingVerification,
    Verified,
    Rejected,
}

impl std::str::FromStr for ReportStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_VERIFICATION" => Ok(Self::PendingVerification),
            "VERIFIED" => Ok(Self::Verified),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(DomainError::Validation(format!(
                "不正なレポートステータス: {}",
                s
            ))),
        }
    }
}

/// 投票種別
///
/// 列挙外の値は `InvalidInput` として扱う（バリデーションエラーとは区別する）。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl std::str::FromStr for VoteType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPVOTE" => Ok(Self::Upvote),
            "DOWNVOTE" => Ok(Self::Downvote),
            _ => Err(DomainError::InvalidInput(format!(
                "vote_type は UPVOTE または DOWNVOTE である必要があります: {}",
                s
            ))),
        }
    }
}

/// 審査済みの状態が持つ情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub reviewed_by: UserId,
    pub reviewed_at: DateTime<Utc>,
}

/// レポートの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportState {
    PendingVerification,
    Verified {
        review: Review,
        notes:  Option<String>,
    },
    Rejected {
        review: Review,
        reason: String,
    },
}

impl ReportState {
    pub fn status(&self) -> ReportStatus {
        match self {
            Self::PendingVerification => ReportStatus::PendingVerification,
            Self::Verified { .. } => ReportStatus::Verified,
            Self::Rejected { .. } => ReportStatus::Rejected,
        }
    }

    pub fn review(&self) -> Option<&Review> {
        match self {
            Self::PendingVerification => None,
            Self::Verified { review, .. } | Self::Rejected { review, .. } => Some(review),
        }
    }

    /// 永続化された列から状態を復元する
    ///
    /// # Errors
    ///
    /// 審査済みステータスなのに審査者・審査日時が欠けている、
    /// または `REJECTED` なのに理由が欠けている場合は `DomainError::Validation`
    pub fn from_columns(
        status: ReportStatus,
        reviewed_by: Option<UserId>,
        reviewed_at: Option<DateTime<Utc>>,
        notes: Option<String>,
        rejection_reason: Option<String>,
    ) -> Result<Self, DomainError> {
        let review = || match (reviewed_by.clone(), reviewed_at) {
            (Some(reviewed_by), Some(reviewed_at)) => Ok(Review {
                reviewed_by,
                reviewed_at,
            }),
            _ => Err(DomainError::Validation(format!(
                "ステータス {} には審査者と審査日時が必要です",
                status
            ))),
        };

        match status {
            ReportStatus::PendingVerification => Ok(Self::PendingVerification),
            ReportStatus::Verified => Ok(Self::Verified {
                review: review()?,
                notes,
            }),
            ReportStatus::Rejected => {
                let reason = rejection_reason.ok_or_else(|| {
                    DomainError::Validation("REJECTED には却下理由が必要です".to_string())
                })?;
                Ok(Self::Rejected {
                    review: review()?,
                    reason,
                })
            }
        }
    }
}

/// レポート作成時の入力
pub struct NewReport {
    pub id:          ReportId,
    pub reporter_id: Option<UserId>,
    pub report_type: ReportType,
    pub severity:    Severity,
    pub title:       ReportTitle,
    pub description: Option<String>,
    pub location:    Option<GeoPoint>,
    pub county:      Option<County>,
}

/// レポートエンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    id: ReportId,
    reporter_id: Option<UserId>,
    report_type: ReportType,
    severity: Severity,
    title: ReportTitle,
    description: Option<String>,
    location: Option<GeoPoint>,
    county: Option<County>,
    state: ReportState,
    upvotes: i32,
    downvotes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Report {
    /// 新しいレポートを作成する（初期状態は `PENDING_VERIFICATION`）
    pub fn new(input: NewReport, now: DateTime<Utc>) -> Self {
        Self {
            id: input.id,
            reporter_id: input.reporter_id,
            report_type: input.report_type,
            severity: input.severity,
            title: input.title,
            description: input.description,
            location: input.location,
            county: input.county,
            state: ReportState::PendingVerification,
            upvotes: 0,
            downvotes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータからレポートを復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: ReportId,
        reporter_id: Option<UserId>,
        report_type: ReportType,
        severity: Severity,
        title: ReportTitle,
        description: Option<String>,
        location: Option<GeoPoint>,
        county: Option<County>,
        state: ReportState,
        upvotes: i32,
        downvotes: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            reporter_id,
            report_type,
            severity,
            title,
            description,
            location,
            county,
            state,
            upvotes,
            downvotes,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &ReportId {
        &self.id
    }

    pub fn reporter_id(&self) -> Option<&UserId> {
        self.reporter_id.as_ref()
    }

    pub fn report_type(&self) -> &ReportType {
        &self.report_type
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn title(&self) -> &ReportTitle {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn county(&self) -> Option<&County> {
        self.county.as_ref()
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    pub fn status(&self) -> ReportStatus {
        self.state.status()
    }

    pub fn upvotes(&self) -> i32 {
        self.upvotes
    }

    pub fn downvotes(&self) -> i32 {
        self.downvotes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // 状態遷移メソッド

    /// 検証済みにした新しいインスタンスを返す
    ///
    /// # Errors
    ///
    /// `PENDING_VERIFICATION` 以外の場合は `DomainError::InvalidTransition`
    pub fn verify(
        self,
        reviewer: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        self.ensure_pending("verify")?;
        Ok(Self {
            state: ReportState::Verified {
                review: Review {
                    reviewed_by: reviewer,
                    reviewed_at: now,
                },
                notes,
            },
            updated_at: now,
            ..self
        })
    }

    /// 却下した新しいインスタンスを返す
    ///
    /// # Errors
    ///
    /// - 理由が空の場合は `DomainError::Validation`
    /// - `PENDING_VERIFICATION` 以外の場合は `DomainError::InvalidTransition`
    pub fn reject(
        self,
        reviewer: UserId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let reason = reason.into().trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::Validation("却下理由は必須です".to_string()));
        }
        self.ensure_pending("reject")?;
        Ok(Self {
            state: ReportState::Rejected {
                review: Review {
                    reviewed_by: reviewer,
                    reviewed_at: now,
                },
                reason,
            },
            updated_at: now,
            ..self
        })
    }

    fn ensure_pending(&self, action: &'static str) -> Result<(), DomainError> {
        match self.state {
            ReportState::PendingVerification => Ok(()),
            ReportState::Verified { .. } | ReportState::Rejected { .. } => Err(
                DomainError::invalid_transition("Report", self.status().to_string(), action),
            ),
        }
    }
}
