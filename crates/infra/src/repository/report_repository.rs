//! # ReportRepository
//!
//! レポートと、それに付随する投票・通報の永続化を担当するリポジトリ。
//!
//! 座標は `latitude` / `longitude` の数値列として保存する。
//! 片方だけが NULL になる行はスキーマの CHECK 制約で拒否される。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use saferoute_domain::{
    report::{
        Report,
        ReportId,
        ReportState,
        ReportStatus,
        ReportTitle,
        ReportType,
        Severity,
        VoteType,
    },
    user::UserId,
    value_objects::{County, GeoPoint, ListLimit},
};
use sqlx::PgPool;
use uuid::Uuid;

use super::corrupted;
use crate::error::InfraError;

/// 投票後のカウンタ
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct VoteCounts {
    pub upvotes:   i32,
    pub downvotes: i32,
}

/// ステータスごとのレポート件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStatusCounts {
    pub verified: i64,
    pub pending:  i64,
    pub rejected: i64,
}

impl ReportStatusCounts {
    pub fn total(&self) -> i64 {
        self.verified + self.pending + self.rejected
    }
}

/// レポートリポジトリトレイト
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn insert(&self, report: &Report) -> Result<(), InfraError>;

    async fn find_by_id(&self, id: &ReportId) -> Result<Option<Report>, InfraError>;

    /// 新しい順にレポートを取得
    async fn list_recent(&self, limit: ListLimit) -> Result<Vec<Report>, InfraError>;

    /// 検証待ちのレポートを取得
    ///
    /// 深刻度の高い順、同じ深刻度の中では古い順。
    async fn list_pending(&self, limit: ListLimit) -> Result<Vec<Report>, InfraError>;

    /// 審査結果を条件付きで書き込む
    ///
    /// 現在のステータスが `PENDING_VERIFICATION` の場合のみ更新する。
    async fn update_review(&self, report: &Report) -> Result<bool, InfraError>;

    /// 投票カウンタを 1 増やし、更新後のカウンタを返す
    ///
    /// レポートが存在しない場合は `None`（行は変更されない）。
    async fn vote(&self, id: &ReportId, vote: VoteType)
    -> Result<Option<VoteCounts>, InfraError>;

    /// 通報を記録する
    ///
    /// レポートが存在しない場合は何も書き込まず `false` を返す。
    async fn add_flag(
        &self,
        id: &ReportId,
        flagged_by: Option<&UserId>,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError>;

    async fn count_by_status(&self) -> Result<ReportStatusCounts, InfraError>;
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    report_id: Uuid,
    reporter_id: Option<Uuid>,
    report_type: String,
    severity: String,
    title: String,
    description: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    county: Option<String>,
    status: String,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    verification_notes: Option<String>,
    rejection_reason: Option<String>,
    upvotes: i32,
    downvotes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for Report {
    type Error = InfraError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ReportStatus>().map_err(corrupted)?;
        let state = ReportState::from_columns(
            status,
            row.reviewed_by.map(UserId::from_uuid),
            row.reviewed_at,
            row.verification_notes,
            row.rejection_reason,
        )
        .map_err(corrupted)?;

        Ok(Report::from_db(
            ReportId::from_uuid(row.report_id),
            row.reporter_id.map(UserId::from_uuid),
            ReportType::new(row.report_type).map_err(corrupted)?,
            row.severity.parse::<Severity>().map_err(corrupted)?,
            ReportTitle::new(row.title).map_err(corrupted)?,
            row.description,
            GeoPoint::from_pair(row.latitude, row.longitude).map_err(corrupted)?,
            row.county.map(County::new).transpose().map_err(corrupted)?,
            state,
            row.upvotes,
            row.downvotes,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装の ReportRepository
#[derive(Debug, Clone)]
pub struct PostgresReportRepository {
    pool: PgPool,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(report_id = %report.id()))]
    async fn insert(&self, report: &Report) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO reports (
                report_id, reporter_id, report_type, severity, title, description,
                latitude, longitude, county, status, upvotes, downvotes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(report.id().as_uuid())
        .bind(report.reporter_id().map(UserId::as_uuid))
        .bind(report.report_type().as_str())
        .bind(<&'static str>::from(report.severity()))
        .bind(report.title().as_str())
        .bind(report.description())
        .bind(report.location().map(|p| p.latitude()))
        .bind(report.location().map(|p| p.longitude()))
        .bind(report.county().map(County::as_str))
        .bind(<&'static str>::from(report.status()))
        .bind(report.upvotes())
        .bind(report.downvotes())
        .bind(report.created_at())
        .bind(report.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(report_id = %id))]
    async fn find_by_id(&self, id: &ReportId) -> Result<Option<Report>, InfraError> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT
                report_id, reporter_id, report_type, severity, title, description,
                latitude, longitude, county, status, reviewed_by, reviewed_at,
                verification_notes, rejection_reason, upvotes, downvotes,
                created_at, updated_at
            FROM reports
            WHERE report_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Report::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_recent(&self, limit: ListLimit) -> Result<Vec<Report>, InfraError> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT
                report_id, reporter_id, report_type, severity, title, description,
                latitude, longitude, county, status, reviewed_by, reviewed_at,
                verification_notes, rejection_reason, upvotes, downvotes,
                created_at, updated_at
            FROM reports
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Report::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_pending(&self, limit: ListLimit) -> Result<Vec<Report>, InfraError> {
        // 文字列の辞書順では深刻度の順位にならないため CASE で順位に変換する
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT
                report_id, reporter_id, report_type, severity, title, description,
                latitude, longitude, county, status, reviewed_by, reviewed_at,
                verification_notes, rejection_reason, upvotes, downvotes,
                created_at, updated_at
            FROM reports
            WHERE status = 'PENDING_VERIFICATION'
            ORDER BY
                CASE severity
                    WHEN 'CRITICAL' THEN 4
                    WHEN 'HIGH' THEN 3
                    WHEN 'MEDIUM' THEN 2
                    ELSE 1
                END DESC,
                created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Report::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(report_id = %report.id()))]
    async fn update_review(&self, report: &Report) -> Result<bool, InfraError> {
        let (notes, reason) = match report.state() {
            ReportState::PendingVerification => {
                return Err(InfraError::invalid_input(
                    "審査結果のないレポートは書き込めません",
                ));
            }
            ReportState::Verified { notes, .. } => (notes.as_deref(), None),
            ReportState::Rejected { reason, .. } => (None, Some(reason.as_str())),
        };
        let review = report.state().review();

        let result = sqlx::query(
            r#"
            UPDATE reports
            SET status = $2,
                reviewed_by = $3,
                reviewed_at = $4,
                verification_notes = $5,
                rejection_reason = $6,
                updated_at = $7
            WHERE report_id = $1 AND status = 'PENDING_VERIFICATION'
            "#,
        )
        .bind(report.id().as_uuid())
        .bind(<&'static str>::from(report.status()))
        .bind(review.map(|r| *r.reviewed_by.as_uuid()))
        .bind(review.map(|r| r.reviewed_at))
        .bind(notes)
        .bind(reason)
        .bind(report.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(report_id = %id, vote = %vote))]
    async fn vote(
        &self,
        id: &ReportId,
        vote: VoteType,
    ) -> Result<Option<VoteCounts>, InfraError> {
        // 列名は呼び出し元の入力から組み立てず、投票種別ごとに固定の文を使う
        let sql = match vote {
            VoteType::Upvote => {
                r#"
                UPDATE reports SET upvotes = upvotes + 1
                WHERE report_id = $1
                RETURNING upvotes, downvotes
                "#
            }
            VoteType::Downvote => {
                r#"
                UPDATE reports SET downvotes = downvotes + 1
                WHERE report_id = $1
                RETURNING upvotes, downvotes
                "#
            }
        };

        let counts = sqlx::query_as::<_, VoteCounts>(sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(counts)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(report_id = %id))]
    async fn add_flag(
        &self,
        id: &ReportId,
        flagged_by: Option<&UserId>,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            INSERT INTO report_flags (flag_id, report_id, user_id, reason, created_at)
            SELECT $1, report_id, $3, $4, $5
            FROM reports
            WHERE report_id = $2
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(id.as_uuid())
        .bind(flagged_by.map(UserId::as_uuid))
        .bind(reason)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn count_by_status(&self) -> Result<ReportStatusCounts, InfraError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM reports GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = ReportStatusCounts::default();
        for (status, count) in rows {
            match status.parse::<ReportStatus>().map_err(corrupted)? {
                ReportStatus::Verified => counts.verified = count,
                ReportStatus::PendingVerification => counts.pending = count,
                ReportStatus::Rejected => counts.rejected = count,
            }
        }

        Ok(counts)
    }
}
