//! # コメント
//!
//! レポートに付くコメント。作成後は変更されない。

use chrono::{DateTime, Utc};

use crate::{report::ReportId, user::UserId};

define_uuid_id! {
    /// コメント ID
    pub struct CommentId;
}

define_validated_string! {
    /// コメント本文（1〜500 文字）
    pub struct CommentText {
        label: "コメント本文",
        min_length: 1,
        max_length: 500,
    }
}

/// コメントエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    id: CommentId,
    report_id: ReportId,
    author_id: Option<UserId>,
    text: CommentText,
    upvotes: i32,
    downvotes: i32,
    created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        id: CommentId,
        report_id: ReportId,
        author_id: Option<UserId>,
        text: CommentText,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            report_id,
            author_id,
            text,
            upvotes: 0,
            downvotes: 0,
            created_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: CommentId,
        report_id: ReportId,
        author_id: Option<UserId>,
        text: CommentText,
        upvotes: i32,
        downvotes: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            report_id,
            author_id,
            text,
            upvotes,
            downvotes,
            created_at,
        }
    }

    pub fn id(&self) -> &CommentId {
        &self.id
    }

    pub fn report_id(&self) -> &ReportId {
        &self.report_id
    }

    pub fn author_id(&self) -> Option<&UserId> {
        self.author_id.as_ref()
    }

    pub fn text(&self) -> &CommentText {
        &self.text
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
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", false)]
    #[case("ok", true)]
    fn test_コメント本文は1文字以上(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(CommentText::new(input).is_ok(), valid);
    }

    #[rstest]
    fn test_コメント本文は500文字以内() {
        assert!(CommentText::new("あ".repeat(500)).is_ok());
        assert!(CommentText::new("あ".repeat(501)).is_err());
    }

    #[rstest]
    fn test_新規コメントの投票数は0() {
        let comment = Comment::new(
            CommentId::new(),
            ReportId::new(),
            None,
            CommentText::new("Still flooded this morning").unwrap(),
            Utc::now(),
        );

        assert_eq!(comment.upvotes(), 0);
        assert_eq!(comment.downvotes(), 0);
        assert!(comment.author_id().is_none());
    }
}
