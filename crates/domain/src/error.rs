//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `InvalidTransition` | 400 Bad Request | 現在の状態では許可されない遷移 |
//! | `InvalidInput` | 400 Bad Request | 列挙値の範囲外など、解釈できない入力 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 一意制約違反 |
//! | `Forbidden` | 403 Forbidden | 権限不足 |
//!
//! ## 使用例
//!
//! ```rust
//! use saferoute_domain::DomainError;
//!
//! fn validate_title(title: &str) -> Result<(), DomainError> {
//!     if title.chars().count() < 3 {
//!         return Err(DomainError::Validation("タイトルは 3 文字以上です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_title("ab").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"Report", "User" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 不正な状態遷移
    ///
    /// エンティティは存在するが、現在の状態に対して操作が遷移表に存在しない場合。
    /// 存在チェック（`NotFound`）の後に評価される。
    #[error("{entity_type} は状態 {from} から {action} できません")]
    InvalidTransition {
        /// エンティティの種類
        entity_type: &'static str,
        /// 現在の状態
        from:        String,
        /// 試みた操作
        action:      &'static str,
    },

    /// 解釈できない入力
    ///
    /// 形式としては正しいが、列挙された値のいずれにも一致しない場合に使用する
    /// （例: 投票種別に `UPVOTE` / `DOWNVOTE` 以外が指定された）。
    #[error("入力値が不正です: {0}")]
    InvalidInput(String),

    /// 競合エラー（一意制約違反など）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 権限エラー
    ///
    /// 認証（誰か）ではなく認可（何ができるか）の失敗を表す。
    #[error("権限がありません: {0}")]
    Forbidden(String),
}

impl DomainError {
    /// 不正な状態遷移エラーを作成する
    pub fn invalid_transition(
        entity_type: &'static str,
        from: impl Into<String>,
        action: &'static str,
    ) -> Self {
        Self::InvalidTransition {
            entity_type,
            from: from.into(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_invalid_transitionのメッセージに状態と操作が含まれる() {
        let err = DomainError::invalid_transition("Report", "VERIFIED", "verify");

        assert_eq!(err.to_string(), "Report は状態 VERIFIED から verify できません");
    }

    #[test]
    fn test_not_foundのメッセージ() {
        let err = DomainError::NotFound {
            entity_type: "Facility",
            id:          "abc".to_string(),
        };

        assert_eq!(err.to_string(), "Facility が見つかりません: abc");
    }
}
