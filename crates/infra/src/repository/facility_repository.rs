//! # FacilityRepository
//!
//! 公共施設の永続化を担当するリポジトリ。
//!
//! 無効化（`is_active = FALSE`）された施設は一覧から除外されるが、
//! ID 指定の取得では返す。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use saferoute_domain::{
    facility::{Facility, FacilityDetails, FacilityId, FacilityName, FacilityType},
    user::Phone,
    value_objects::{County, Email, GeoPoint, ListLimit},
};
use sqlx::PgPool;
use uuid::Uuid;

use super::corrupted;
use crate::error::InfraError;

/// 施設一覧の絞り込み条件（いずれも等値条件）
#[derive(Debug, Clone, Default)]
pub struct FacilityFilter {
    pub facility_type: Option<FacilityType>,
    pub county:        Option<County>,
}

/// 施設リポジトリトレイト
#[async_trait]
pub trait FacilityRepository: Send + Sync {
    async fn insert(&self, facility: &Facility) -> Result<(), InfraError>;

    /// ID で施設を検索（無効化済みも含む）
    async fn find_by_id(&self, id: &FacilityId) -> Result<Option<Facility>, InfraError>;

    /// 有効な施設を名前順に取得
    async fn list_active(
        &self,
        filter: &FacilityFilter,
        limit: ListLimit,
    ) -> Result<Vec<Facility>, InfraError>;

    /// 施設情報を条件付きで更新する（有効な場合のみ）
    async fn update_details(&self, facility: &Facility) -> Result<bool, InfraError>;

    /// 施設を条件付きで無効化する（有効な場合のみ）
    async fn deactivate(&self, id: &FacilityId, at: DateTime<Utc>) -> Result<bool, InfraError>;

    async fn count_active(&self) -> Result<i64, InfraError>;
}

#[derive(sqlx::FromRow)]
struct FacilityRow {
    facility_id:   Uuid,
    name:          String,
    facility_type: String,
    address:       Option<String>,
    county:        String,
    phone:         Option<String>,
    email:         Option<String>,
    latitude:      Option<f64>,
    longitude:     Option<f64>,
    is_active:     bool,
    created_at:    DateTime<Utc>,
    updated_at:    DateTime<Utc>,
}

impl TryFrom<FacilityRow> for Facility {
    type Error = InfraError;

    fn try_from(row: FacilityRow) -> Result<Self, Self::Error> {
        Ok(Facility::from_db(
            FacilityId::from_uuid(row.facility_id),
            FacilityDetails {
                name:    FacilityName::new(row.name).map_err(corrupted)?,
                address: row.address,
                phone:   row.phone.map(Phone::new).transpose().map_err(corrupted)?,
                email:   row.email.map(Email::new).transpose().map_err(corrupted)?,
            },
            row.facility_type
                .parse::<FacilityType>()
                .map_err(corrupted)?,
            County::new(row.county).map_err(corrupted)?,
            GeoPoint::from_pair(row.latitude, row.longitude).map_err(corrupted)?,
            row.is_active,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装の FacilityRepository
#[derive(Debug, Clone)]
pub struct PostgresFacilityRepository {
    pool: PgPool,
}

impl PostgresFacilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FacilityRepository for PostgresFacilityRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(facility_id = %facility.id()))]
    async fn insert(&self, facility: &Facility) -> Result<(), InfraError> {
        let details = facility.details();
        sqlx::query(
            r#"
            INSERT INTO public_facilities (
                facility_id, name, facility_type, address, county, phone, email,
                latitude, longitude, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(facility.id().as_uuid())
        .bind(details.name.as_str())
        .bind(<&'static str>::from(facility.facility_type()))
        .bind(details.address.as_deref())
        .bind(facility.county().as_str())
        .bind(details.phone.as_ref().map(Phone::as_str))
        .bind(details.email.as_ref().map(Email::as_str))
        .bind(facility.location().map(|p| p.latitude()))
        .bind(facility.location().map(|p| p.longitude()))
        .bind(facility.is_active())
        .bind(facility.created_at())
        .bind(facility.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(facility_id = %id))]
    async fn find_by_id(&self, id: &FacilityId) -> Result<Option<Facility>, InfraError> {
        let row = sqlx::query_as::<_, FacilityRow>(
            r#"
            SELECT
                facility_id, name, facility_type, address, county, phone, email,
                latitude, longitude, is_active, created_at, updated_at
            FROM public_facilities
            WHERE facility_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Facility::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_active(
        &self,
        filter: &FacilityFilter,
        limit: ListLimit,
    ) -> Result<Vec<Facility>, InfraError> {
        let rows = sqlx::query_as::<_, FacilityRow>(
            r#"
            SELECT
                facility_id, name, facility_type, address, county, phone, email,
                latitude, longitude, is_active, created_at, updated_at
            FROM public_facilities
            WHERE is_active = TRUE
              AND ($1::TEXT IS NULL OR facility_type = $1)
              AND ($2::TEXT IS NULL OR county = $2)
            ORDER BY name ASC, facility_id ASC
            LIMIT $3
            "#,
        )
        .bind(filter.facility_type.map(<&'static str>::from))
        .bind(filter.county.as_ref().map(County::as_str))
        .bind(limit.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Facility::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(facility_id = %facility.id()))]
    async fn update_details(&self, facility: &Facility) -> Result<bool, InfraError> {
        let details = facility.details();
        let result = sqlx::query(
            r#"
            UPDATE public_facilities
            SET name = $2, address = $3, phone = $4, email = $5, updated_at = $6
            WHERE facility_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(facility.id().as_uuid())
        .bind(details.name.as_str())
        .bind(details.address.as_deref())
        .bind(details.phone.as_ref().map(Phone::as_str))
        .bind(details.email.as_ref().map(Email::as_str))
        .bind(facility.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(facility_id = %id))]
    async fn deactivate(&self, id: &FacilityId, at: DateTime<Utc>) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE public_facilities
            SET is_active = FALSE, updated_at = $2
            WHERE facility_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn count_active(&self) -> Result<i64, InfraError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM public_facilities WHERE is_active = TRUE")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
