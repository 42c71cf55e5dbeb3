/// UUID v7 をラップする ID 型を定義する
///
/// 生成されるもの: `new()` / `from_uuid()` / `as_uuid()`、`Default`、
/// `Display`（ハイフン付き UUID 表記）、serde の透過的な (de)serialize。
///
/// ```rust
/// use saferoute_domain::report::ReportId;
///
/// let id = ReportId::new();
/// assert_eq!(ReportId::from_uuid(*id.as_uuid()), id);
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// 文字数制約付きの文字列型を定義する
///
/// `new()` は前後の空白を除いたうえで `min_length..=max_length`（文字数）を検証する。
/// 範囲外は `DomainError::Validation`。
///
/// `redact` を付けると `Debug` は値を出力せず、`Display` も実装しない。
/// ログに載せたくない連絡先などに使う。
///
/// ```rust
/// use saferoute_domain::user::Username;
///
/// assert_eq!(Username::new("  alice ").unwrap().as_str(), "alice");
/// assert!(Username::new("ab").is_err());
/// ```
macro_rules! define_validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            min_length: $min:expr,
            max_length: $max:expr,
            redact $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl std::fmt::Debug for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}(***)", stringify!($Name))
            }
        }

        define_validated_string!(@impl $Name, $label, $min, $max);
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            min_length: $min:expr,
            max_length: $max:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[serde(transparent)]
        $vis struct $Name(String);

        define_validated_string!(@impl $Name, $label, $min, $max);
    };
    (@impl $Name:ident, $label:expr, $min:expr, $max:expr) => {
        impl $Name {
            pub const MIN_LENGTH: usize = $min;
            pub const MAX_LENGTH: usize = $max;

            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into();
                let trimmed = value.trim();
                let length = trimmed.chars().count();

                if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は {}〜{} 文字で入力してください（{} 文字）",
                        $label,
                        Self::MIN_LENGTH,
                        Self::MAX_LENGTH,
                        length
                    )));
                }

                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }
    };
}
