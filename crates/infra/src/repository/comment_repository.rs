//! # CommentRepository
//!
//! レポートへのコメントの永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use saferoute_domain::{
    comment::{Comment, CommentId, CommentText},
    report::ReportId,
    user::UserId,
    value_objects::ListLimit,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::corrupted;
use crate::error::InfraError;

/// コメントリポジトリトレイト
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// コメントを登録する
    ///
    /// 対象のレポートが存在しない場合は何も書き込まず `false` を返す。
    async fn insert(&self, comment: &Comment) -> Result<bool, InfraError>;

    /// レポートのコメントを新しい順に取得する
    async fn list_by_report(
        &self,
        report_id: &ReportId,
        limit: ListLimit,
    ) -> Result<Vec<Comment>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    comment_id:   Uuid,
    report_id:    Uuid,
    user_id:      Option<Uuid>,
    comment_text: String,
    upvotes:      i32,
    downvotes:    i32,
    created_at:   DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = InfraError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Comment::from_db(
            CommentId::from_uuid(row.comment_id),
            ReportId::from_uuid(row.report_id),
            row.user_id.map(UserId::from_uuid),
            CommentText::new(row.comment_text).map_err(corrupted)?,
            row.upvotes,
            row.downvotes,
            row.created_at,
        ))
    }
}

/// PostgreSQL 実装の CommentRepository
#[derive(Debug, Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(report_id = %comment.report_id()))]
    async fn insert(&self, comment: &Comment) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (
                comment_id, report_id, user_id, comment_text, upvotes, downvotes, created_at
            )
            SELECT $1, report_id, $3, $4, $5, $6, $7
            FROM reports
            WHERE report_id = $2
            "#,
        )
        .bind(comment.id().as_uuid())
        .bind(comment.report_id().as_uuid())
        .bind(comment.author_id().map(UserId::as_uuid))
        .bind(comment.text().as_str())
        .bind(comment.upvotes())
        .bind(comment.downvotes())
        .bind(comment.created_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(report_id = %report_id))]
    async fn list_by_report(
        &self,
        report_id: &ReportId,
        limit: ListLimit,
    ) -> Result<Vec<Comment>, InfraError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT comment_id, report_id, user_id, comment_text, upvotes, downvotes, created_at
            FROM comments
            WHERE report_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(report_id.as_uuid())
        .bind(limit.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Comment::try_from).collect()
    }
}
