//! ユースケース層の共通ヘルパー

use std::fmt::Display;

use saferoute_domain::DomainError;
use saferoute_infra::InfraError;

use crate::error::ApiError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, ApiError>` に変換する
///
/// ```ignore
/// let report = self.report_repository.find_by_id(&id).await
///     .or_not_found("Report", &id)?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `ApiError::NotFound`
    fn or_not_found(self, entity_type: &'static str, id: impl Display) -> Result<T, ApiError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_type: &'static str, id: impl Display) -> Result<T, ApiError> {
        self?.ok_or_else(|| not_found(entity_type, id))
    }
}

pub(crate) fn not_found(entity_type: &'static str, id: impl Display) -> ApiError {
    DomainError::NotFound {
        entity_type,
        id: id.to_string(),
    }
    .into()
}

/// 条件付き書き込みが適用されなかった場合のエラー
///
/// 読み出しから書き込みまでの間に、同じ行が別のリクエストで遷移済みになっている。
pub(crate) fn lost_transition_race(
    entity_type: &'static str,
    id: impl Display,
    action: &'static str,
) -> ApiError {
    tracing::warn!(
        entity_type,
        id = %id,
        action,
        "競合する状態遷移が先に適用されました"
    );
    ApiError::InvalidTransition(format!(
        "{entity_type} {id} は他のリクエストによって既に更新されています（{action}）"
    ))
}

/// 空白のみの文字列を `None` として扱う
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_noneはnot_foundに変換される() {
        let result: Result<Option<i32>, InfraError> = Ok(None);

        let error = result.or_not_found("Report", "abc").unwrap_err();

        assert_eq!(error.code(), "not_found");
        assert_eq!(error.to_string(), "Report が見つかりません: abc");
    }

    #[test]
    fn test_someは値を返す() {
        let result: Result<Option<i32>, InfraError> = Ok(Some(42));

        assert_eq!(result.or_not_found("Report", "abc").unwrap(), 42);
    }

    #[test]
    fn test_インフラエラーはserver_errorのまま伝播する() {
        let result: Result<Option<i32>, InfraError> = Err(InfraError::unexpected("boom"));

        assert_eq!(
            result.or_not_found("Report", "abc").unwrap_err().code(),
            "server_error"
        );
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("   "), None)]
    #[case(Some(" pothole "), Some("pothole"))]
    fn test_non_blank(#[case] input: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(
            non_blank(input.map(str::to_string)),
            expected.map(str::to_string)
        );
    }
}
