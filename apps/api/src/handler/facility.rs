//! # 公共施設ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/facilities?type=&county=` - 有効な施設の一覧
//! - `GET /api/v1/facilities/{facility_id}` - 施設取得（無効化済みも返す）
//! - `POST /api/v1/facilities` - 施設作成（管理者）
//! - `PUT /api/v1/facilities/{facility_id}` - 施設情報の更新（管理者）
//! - `DELETE /api/v1/facilities/{facility_id}` - 無効化（管理者）
//!
//! 読み取りは匿名で可能。書き込みは [`Authenticated`] を要求する。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use saferoute_domain::facility::{Facility, FacilityId};
use saferoute_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiPath, ApiQuery, Authenticated, ValidatedJson},
    handler::DeletedDto,
    usecase::{CreateFacilityInput, FacilityDetailsInput, FacilityUseCaseImpl},
};

/// 施設 API の共有状態
pub struct FacilityState {
    pub usecase: FacilityUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 施設一覧のフィルタ
#[derive(Debug, Deserialize)]
pub struct FacilityListQuery {
    #[serde(rename = "type")]
    pub facility_type: Option<String>,
    pub county:        Option<String>,
}

/// 施設作成リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFacilityRequest {
    #[validate(length(min = 1, max = 200))]
    pub name:          String,
    pub facility_type: String,
    #[validate(length(min = 1, max = 100))]
    pub county:        String,
    pub address:       Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone:         Option<String>,
    #[validate(email)]
    pub email:         Option<String>,
    pub lat:           Option<f64>,
    pub lng:           Option<f64>,
}

/// 施設更新リクエスト
///
/// 名前・住所・連絡先を置き換える。種別・郡・座標は変更できない。
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFacilityRequest {
    #[validate(length(min = 1, max = 200))]
    pub name:    String,
    pub address: Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone:   Option<String>,
    #[validate(email)]
    pub email:   Option<String>,
}

/// 施設 DTO
#[derive(Debug, Serialize)]
pub struct FacilityDto {
    pub facility_id:   Uuid,
    pub name:          String,
    pub facility_type: String,
    pub address:       Option<String>,
    pub county:        String,
    pub phone:         Option<String>,
    pub email:         Option<String>,
    pub lat:           Option<f64>,
    pub lng:           Option<f64>,
    pub is_active:     bool,
    pub created_at:    String,
    pub updated_at:    String,
}

impl From<&Facility> for FacilityDto {
    fn from(facility: &Facility) -> Self {
        let details = facility.details();
        Self {
            facility_id:   *facility.id().as_uuid(),
            name:          details.name.as_str().to_string(),
            facility_type: facility.facility_type().to_string(),
            address:       details.address.clone(),
            county:        facility.county().as_str().to_string(),
            phone:         details.phone.as_ref().map(|p| p.as_str().to_string()),
            email:         details.email.as_ref().map(|e| e.as_str().to_string()),
            lat:           facility.location().map(|p| p.latitude()),
            lng:           facility.location().map(|p| p.longitude()),
            is_active:     facility.is_active(),
            created_at:    facility.created_at().to_rfc3339(),
            updated_at:    facility.updated_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// GET /api/v1/facilities
///
/// 名前順に最大 100 件。フィルタは完全一致。
#[tracing::instrument(skip_all)]
pub async fn list_facilities(
    State(state): State<Arc<FacilityState>>,
    ApiQuery(query): ApiQuery<FacilityListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let facilities = state
        .usecase
        .list_facilities(query.facility_type, query.county)
        .await?;

    let items: Vec<FacilityDto> = facilities.iter().map(FacilityDto::from).collect();

    let response = ApiResponse::new(items);
    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/facilities/{facility_id}
#[tracing::instrument(skip_all, fields(%facility_id))]
pub async fn get_facility(
    State(state): State<Arc<FacilityState>>,
    ApiPath(facility_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let facility = state
        .usecase
        .get_facility(&FacilityId::from_uuid(facility_id))
        .await?;

    let response = ApiResponse::new(FacilityDto::from(&facility));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/facilities
///
/// ## レスポンス
///
/// - `200 OK`: 作成した施設
/// - `400 Bad Request`: バリデーションエラー、未知の施設種別
/// - `401 Unauthorized`: 未認証
/// - `403 Forbidden`: 管理者以外
#[tracing::instrument(skip_all)]
pub async fn create_facility(
    State(state): State<Arc<FacilityState>>,
    Authenticated(caller): Authenticated,
    ValidatedJson(req): ValidatedJson<CreateFacilityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateFacilityInput {
        details:       FacilityDetailsInput {
            name:    req.name,
            address: req.address,
            phone:   req.phone,
            email:   req.email,
        },
        facility_type: req.facility_type,
        county:        req.county,
        lat:           req.lat,
        lng:           req.lng,
    };

    let facility = state.usecase.create_facility(&caller, input).await?;

    let response = ApiResponse::new(FacilityDto::from(&facility));
    Ok((StatusCode::OK, Json(response)))
}

/// PUT /api/v1/facilities/{facility_id}
///
/// 無効化済みの施設は更新できない（`invalid_transition`）。
#[tracing::instrument(skip_all, fields(%facility_id))]
pub async fn update_facility(
    State(state): State<Arc<FacilityState>>,
    Authenticated(caller): Authenticated,
    ApiPath(facility_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateFacilityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = FacilityDetailsInput {
        name:    req.name,
        address: req.address,
        phone:   req.phone,
        email:   req.email,
    };

    let facility = state
        .usecase
        .update_facility(&caller, &FacilityId::from_uuid(facility_id), input)
        .await?;

    let response = ApiResponse::new(FacilityDto::from(&facility));
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /api/v1/facilities/{facility_id}
///
/// 論理削除。以後は一覧に現れないが、ID 指定の取得は `is_active=false` で返る。
#[tracing::instrument(skip_all, fields(%facility_id))]
pub async fn delete_facility(
    State(state): State<Arc<FacilityState>>,
    Authenticated(caller): Authenticated,
    ApiPath(facility_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .usecase
        .deactivate_facility(&caller, &FacilityId::from_uuid(facility_id))
        .await?;

    let response = ApiResponse::new(DeletedDto { deleted: true });
    Ok((StatusCode::OK, Json(response)))
}
