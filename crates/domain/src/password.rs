//! # パスワード
//!
//! パスワード関連の値オブジェクトを定義する。
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`PlainPassword`] | 平文パスワード | 登録・ログイン時の入力値 |
//! | [`PasswordHash`] | パスワードハッシュ | 永続化用のハッシュ値 |
//! | [`PasswordVerifyResult`] | 検証結果 | パスワード検証の成否 |
//!
//! パスワードを持たないアカウント（パスワードレス）も許容するため、
//! ユーザーは `Option<PasswordHash>` を保持する。

use crate::DomainError;

/// 登録時に要求するパスワードの最小文字数
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// 平文パスワード
///
/// Debug 出力ではパスワードの値をマスクする。
#[derive(Clone)]
pub struct PlainPassword(String);

impl std::fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PlainPassword").field(&"[REDACTED]").finish()
    }
}

impl PlainPassword {
    /// 検証なしでラップする（ログイン時の入力値）
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 登録用のパスワードを作成する
    ///
    /// 空文字列は「パスワードなし」として `Ok(None)` を返す。
    /// アカウントはパスワードレスのまま作成される。
    pub fn for_registration(value: Option<String>) -> Result<Option<Self>, DomainError> {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return Ok(None);
        };

        if value.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::Validation(format!(
                "パスワードは {MIN_PASSWORD_LENGTH} 文字以上である必要があります"
            )));
        }

        Ok(Some(Self(value)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// パスワードハッシュ（PHC 文字列形式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// パスワード検証結果
///
/// bool ではなく専用の型を使うことで、呼び出し側の意図を明確にする。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerifyResult {
    Match,
    Mismatch,
}

impl PasswordVerifyResult {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch)
    }
}

impl From<bool> for PasswordVerifyResult {
    fn from(matched: bool) -> Self {
        if matched { Self::Match } else { Self::Mismatch }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_平文パスワードのdebug出力はマスクされる() {
        let password = PlainPassword::new("secret1");
        let debug = format!("{:?}", password);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret1"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    fn test_未指定または空のパスワードはパスワードレス扱い(#[case] input: Option<String>) {
        let result = PlainPassword::for_registration(input).unwrap();
        assert!(result.is_none());
    }

    #[rstest]
    fn test_6文字未満のパスワードは登録できない() {
        let result = PlainPassword::for_registration(Some("12345".to_string()));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[rstest]
    fn test_6文字以上のパスワードは登録できる() {
        let result = PlainPassword::for_registration(Some("secret1".to_string())).unwrap();
        assert_eq!(result.map(|p| p.as_str().to_string()), Some("secret1".to_string()));
    }

    #[rstest]
    #[case(true, PasswordVerifyResult::Match)]
    #[case(false, PasswordVerifyResult::Mismatch)]
    fn test_boolからの変換(#[case] input: bool, #[case] expected: PasswordVerifyResult) {
        assert_eq!(PasswordVerifyResult::from(input), expected);
        assert_eq!(expected.is_match(), input);
        assert_eq!(expected.is_mismatch(), !input);
    }
}
