//! # 共通の値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! - [`GeoPoint`]: WGS84 の緯度経度
//! - [`County`]: 郡（地域区分）
//! - [`Email`]: メールアドレス（ユーザー・施設で共有）
//! - [`ListLimit`]: 一覧取得の件数上限

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 地理座標（WGS84）
///
/// 緯度は -90〜90、経度は -180〜180 の有限値でなければならない。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude:  f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::Validation(format!(
                "緯度は -90 から 90 の範囲で指定してください: {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::Validation(format!(
                "経度は -180 から 180 の範囲で指定してください: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// リクエストの `lat` / `lng` の組から座標を作成する
    ///
    /// 両方未指定なら `None`。片方だけの指定はバリデーションエラー。
    pub fn from_pair(lat: Option<f64>, lng: Option<f64>) -> Result<Option<Self>, DomainError> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).map(Some),
            (None, None) => Ok(None),
            _ => Err(DomainError::Validation(
                "lat と lng は同時に指定してください".to_string(),
            )),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

define_validated_string! {
    /// 郡（地域区分）
    pub struct County {
        label: "郡",
        min_length: 1,
        max_length: 100,
    }
}

/// メールアドレス
///
/// `local@domain` の形式で、最大 255 文字。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一覧取得の件数上限
///
/// 一覧系の操作は必ず上限付きで実行する。指定値は `1..=max` に丸める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimit(i64);

impl ListLimit {
    /// 指定値を `1..=max` に丸めて作成する。未指定なら `max`。
    pub fn clamped(requested: Option<i64>, max: i64) -> Self {
        Self(requested.unwrap_or(max).clamp(1, max))
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(0)
    }
}
