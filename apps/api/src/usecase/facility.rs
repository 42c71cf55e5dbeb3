//! # 公共施設ユースケース
//!
//! 閲覧は誰でも可能。作成・更新・無効化は `ADMIN` のみ。
//! 削除は `is_active` を落とす論理削除で、再有効化の経路はない。

use std::sync::Arc;

use saferoute_domain::{
    clock::Clock,
    facility::{Facility, FacilityDetails, FacilityId, FacilityName, FacilityType, NewFacility},
    role::{AuthContext, Capability},
    user::Phone,
    value_objects::{County, Email, GeoPoint, ListLimit},
};
use saferoute_infra::repository::{FacilityFilter, FacilityRepository};

use crate::{
    error::ApiError,
    usecase::helpers::{FindResultExt, lost_transition_race, non_blank},
};

pub const FACILITY_LIST_LIMIT: i64 = 100;

/// 施設の連絡先情報の入力
#[derive(Debug, Default)]
pub struct FacilityDetailsInput {
    pub name:    String,
    pub address: Option<String>,
    pub phone:   Option<String>,
    pub email:   Option<String>,
}

impl FacilityDetailsInput {
    fn into_details(self) -> Result<FacilityDetails, ApiError> {
        Ok(FacilityDetails {
            name:    FacilityName::new(self.name)?,
            address: non_blank(self.address),
            phone:   non_blank(self.phone).map(Phone::new).transpose()?,
            email:   non_blank(self.email).map(Email::new).transpose()?,
        })
    }
}

/// 施設作成の入力
#[derive(Debug, Default)]
pub struct CreateFacilityInput {
    pub details:       FacilityDetailsInput,
    pub facility_type: String,
    pub county:        String,
    pub lat:           Option<f64>,
    pub lng:           Option<f64>,
}

/// 施設ユースケースの実装
pub struct FacilityUseCaseImpl {
    facility_repository: Arc<dyn FacilityRepository>,
    clock:               Arc<dyn Clock>,
}

impl FacilityUseCaseImpl {
    pub fn new(facility_repository: Arc<dyn FacilityRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            facility_repository,
            clock,
        }
    }

    /// 有効な施設を名前順に取得する
    ///
    /// フィルタは等価比較のみ。未知の種別は `validation_error`。
    pub async fn list_facilities(
        &self,
        facility_type: Option<String>,
        county: Option<String>,
    ) -> Result<Vec<Facility>, ApiError> {
        let filter = FacilityFilter {
            facility_type: non_blank(facility_type)
                .map(|t| t.parse::<FacilityType>())
                .transpose()?,
            county:        non_blank(county).map(County::new).transpose()?,
        };

        let limit = ListLimit::clamped(None, FACILITY_LIST_LIMIT);
        Ok(self.facility_repository.list_active(&filter, limit).await?)
    }

    /// 施設を取得する（無効化済みも含む）
    pub async fn get_facility(&self, id: &FacilityId) -> Result<Facility, ApiError> {
        self.facility_repository
            .find_by_id(id)
            .await
            .or_not_found("Facility", id)
    }

    pub async fn create_facility(
        &self,
        caller: &AuthContext,
        input: CreateFacilityInput,
    ) -> Result<Facility, ApiError> {
        caller.authorize(Capability::Admin)?;

        let facility = Facility::new(
            NewFacility {
                id:            FacilityId::new(),
                details:       input.details.into_details()?,
                facility_type: input.facility_type.trim().parse()?,
                county:        County::new(input.county)?,
                location:      GeoPoint::from_pair(input.lat, input.lng)?,
            },
            self.clock.now(),
        );

        self.facility_repository.insert(&facility).await?;

        tracing::info!(facility_id = %facility.id(), "施設を登録しました");

        Ok(facility)
    }

    /// 名前・住所・連絡先を更新する
    pub async fn update_facility(
        &self,
        caller: &AuthContext,
        id: &FacilityId,
        input: FacilityDetailsInput,
    ) -> Result<Facility, ApiError> {
        caller.authorize(Capability::Admin)?;
        let details = input.into_details()?;

        let facility = self
            .facility_repository
            .find_by_id(id)
            .await
            .or_not_found("Facility", id)?;

        let updated = facility.update_details(details, self.clock.now())?;

        if !self.facility_repository.update_details(&updated).await? {
            return Err(lost_transition_race("Facility", id, "update"));
        }

        Ok(updated)
    }

    /// 施設を無効化する
    pub async fn deactivate_facility(
        &self,
        caller: &AuthContext,
        id: &FacilityId,
    ) -> Result<Facility, ApiError> {
        caller.authorize(Capability::Admin)?;

        let facility = self
            .facility_repository
            .find_by_id(id)
            .await
            .or_not_found("Facility", id)?;

        let now = self.clock.now();
        let deactivated = facility.deactivate(now)?;

        if !self.facility_repository.deactivate(id, now).await? {
            return Err(lost_transition_race("Facility", id, "deactivate"));
        }

        tracing::info!(facility_id = %id, "施設を無効化しました");

        Ok(deactivated)
    }
}
