//! # 公共施設
//!
//! 保健所・消防署・郡役所などの公共施設。管理者のみが作成・更新・無効化できる。
//!
//! ## 状態遷移
//!
//! ```text
//! active --deactivate(ADMIN)--> inactive
//! ```
//!
//! 再有効化の経路はない。無効化された施設は一覧から除外されるが、
//! ID 指定の取得では `is_active = false` として返る。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    user::Phone,
    value_objects::{County, Email, GeoPoint},
};

define_uuid_id! {
    /// 施設 ID
    pub struct FacilityId;
}

define_validated_string! {
    /// 施設名（1〜200 文字）
    pub struct FacilityName {
        label: "施設名",
        min_length: 1,
        max_length: 200,
    }
}

/// 施設種別
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityType {
    HealthCenter,
    FireStation,
    CountyOffice,
}

impl std::str::FromStr for FacilityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HEALTH_CENTER" => Ok(Self::HealthCenter),
            "FIRE_STATION" => Ok(Self::FireStation),
            "COUNTY_OFFICE" => Ok(Self::CountyOffice),
            _ => Err(DomainError::Validation(format!("不正な施設種別: {}", s))),
        }
    }
}

/// 更新可能な施設情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityDetails {
    pub name:    FacilityName,
    pub address: Option<String>,
    pub phone:   Option<Phone>,
    pub email:   Option<Email>,
}

/// 施設作成時の入力
pub struct NewFacility {
    pub id:            FacilityId,
    pub details:       FacilityDetails,
    pub facility_type: FacilityType,
    pub county:        County,
    pub location:      Option<GeoPoint>,
}

/// 施設エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    id: FacilityId,
    details: FacilityDetails,
    facility_type: FacilityType,
    county: County,
    location: Option<GeoPoint>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Facility {
    pub fn new(input: NewFacility, now: DateTime<Utc>) -> Self {
        Self {
            id: input.id,
            details: input.details,
            facility_type: input.facility_type,
            county: input.county,
            location: input.location,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: FacilityId,
        details: FacilityDetails,
        facility_type: FacilityType,
        county: County,
        location: Option<GeoPoint>,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            details,
            facility_type,
            county,
            location,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &FacilityId {
        &self.id
    }

    pub fn details(&self) -> &FacilityDetails {
        &self.details
    }

    pub fn name(&self) -> &FacilityName {
        &self.details.name
    }

    pub fn facility_type(&self) -> FacilityType {
        self.facility_type
    }

    pub fn county(&self) -> &County {
        &self.county
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 施設情報を更新した新しいインスタンスを返す
    ///
    /// # Errors
    ///
    /// 無効化済みの場合は `DomainError::InvalidTransition`
    pub fn update_details(
        self,
        details: FacilityDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        self.ensure_active("update")?;
        Ok(Self {
            details,
            updated_at: now,
            ..self
        })
    }

    /// 無効化した新しいインスタンスを返す
    ///
    /// # Errors
    ///
    /// 既に無効化済みの場合は `DomainError::InvalidTransition`
    pub fn deactivate(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_active("deactivate")?;
        Ok(Self {
            is_active: false,
            updated_at: now,
            ..self
        })
    }

    fn ensure_active(&self, action: &'static str) -> Result<(), DomainError> {
        if self.is_active {
            Ok(())
        } else {
            Err(DomainError::invalid_transition("Facility", "INACTIVE", action))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn facility() -> Facility {
        Facility::new(
            NewFacility {
                id:            FacilityId::new(),
                details:       FacilityDetails {
                    name:    FacilityName::new("City Clinic").unwrap(),
                    address: None,
                    phone:   None,
                    email:   None,
                },
                facility_type: FacilityType::HealthCenter,
                county:        County::new("Nairobi").unwrap(),
                location:      None,
            },
            Utc::now(),
        )
    }

    #[rstest]
    #[case("HEALTH_CENTER", FacilityType::HealthCenter)]
    #[case("FIRE_STATION", FacilityType::FireStation)]
    #[case("COUNTY_OFFICE", FacilityType::CountyOffice)]
    fn test_施設種別をパースできる(#[case] input: &str, #[case] expected: FacilityType) {
        assert_eq!(input.parse::<FacilityType>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    fn test_未知の施設種別はバリデーションエラー() {
        assert!(matches!(
            "HOSPITAL".parse::<FacilityType>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[rstest]
    fn test_新規施設は有効(facility: Facility) {
        assert!(facility.is_active());
    }

    #[rstest]
    fn test_施設を無効化できる(facility: Facility) {
        let deactivated = facility.deactivate(Utc::now()).unwrap();

        assert!(!deactivated.is_active());
        assert_eq!(deactivated.name().as_str(), "City Clinic");
    }

    #[rstest]
    fn test_無効化済みの施設は再度無効化できない(facility: Facility) {
        let deactivated = facility.deactivate(Utc::now()).unwrap();

        assert!(matches!(
            deactivated.deactivate(Utc::now()),
            Err(DomainError::InvalidTransition { action: "deactivate", .. })
        ));
    }

    #[rstest]
    fn test_施設情報を更新できる(facility: Facility) {
        let details = FacilityDetails {
            name:    FacilityName::new("City Clinic East").unwrap(),
            address: Some("Moi Avenue 12".to_string()),
            phone:   None,
            email:   Some(Email::new("clinic@example.org").unwrap()),
        };

        let updated = facility.update_details(details.clone(), Utc::now()).unwrap();

        assert_eq!(updated.details(), &details);
    }

    #[rstest]
    fn test_無効化済みの施設は更新できない(facility: Facility) {
        let details = facility.details().clone();
        let deactivated = facility.deactivate(Utc::now()).unwrap();

        assert!(deactivated.update_details(details, Utc::now()).is_err());
    }
}
