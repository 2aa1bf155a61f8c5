use crate::config::geo::GeoConfig;
use crate::error::{AppError, AppResult};
use crate::models::{factory, image, report_record, Factory, Image, ReportRecord};
use crate::response::ApiResponse;
use crate::services::aggregate::AggregateLoader;
use crate::services::factory::{CreateFactoryInput, FactoryService, UpdateFactoryInput};
use crate::services::geo::{bound_results, GeoService};
use crate::services::land::LandLookupService;
use crate::services::view::{assemble, FactoryView, ImageView};
use axum::{
    extract::{ConnectInfo, Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema)]
pub struct NearbyQuery {
    /// Query latitude (degrees)
    pub lat: Option<String>,
    /// Query longitude (degrees)
    pub lng: Option<String>,
    /// Search radius in km
    pub range: Option<String>,
}

// Absent optional fields are skipped on re-serialization so the audit copy
// on the report record stays faithful to what the reporter actually sent.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateFactoryRequest {
    /// Factory name
    #[validate(length(max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Factory type code (optional)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub factory_type: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Ids of pre-uploaded images to attach
    #[serde(default)]
    pub images: Vec<Uuid>,
    /// Reporter nickname (optional)
    #[validate(length(max = 64))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Reporter contact (optional)
    #[validate(length(max = 64))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Free-text note
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub others: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateFactoryRequest {
    #[validate(length(max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub factory_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cet_report_status: Option<String>,
    /// Present only to be rejected: position is immutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[validate(length(max = 64))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[validate(length(max = 64))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[validate(length(max = 1024))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub others: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportRecordResponse {
    pub id: i32,
    pub factory_id: Uuid,
    pub user_ip: Option<String>,
    pub action_type: String,
    pub action_body: serde_json::Value,
    pub nickname: Option<String>,
    pub contact: Option<String>,
    pub others: String,
    pub created_at: String,
    pub images: Vec<ImageView>,
}

/// Load and assemble the public views for a bounded id set. One batch per
/// related entity type regardless of how many factories are requested.
async fn assemble_views(db: &DatabaseConnection, ids: &[Uuid]) -> AppResult<Vec<FactoryView>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut aggregates = AggregateLoader::new(db.clone()).load(ids).await?;
    let factories = Factory::active()
        .filter(factory::Column::Id.is_in(ids.iter().copied()))
        .order_by_asc(factory::Column::Id)
        .all(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();
    Ok(factories
        .into_iter()
        .map(|f| {
            let agg = aggregates.remove(&f.id).unwrap_or_default();
            assemble(f, agg, now)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/factories",
    params(
        ("lat" = String, Query, description = "Query latitude"),
        ("lng" = String, Query, description = "Query longitude"),
        ("range" = String, Query, description = "Search radius in km"),
    ),
    responses(
        (status = 200, description = "Factories within the radius", body = ApiResponse<Vec<FactoryView>>),
        (status = 400, description = "Missing or invalid query parameter", body = AppError),
    ),
    tag = "factories"
)]
pub async fn get_nearby_factories(
    Extension(db): Extension<DatabaseConnection>,
    Extension(geo): Extension<GeoConfig>,
    Query(params): Query<NearbyQuery>,
) -> AppResult<impl IntoResponse> {
    let mut missing = Vec::new();
    if params.lat.is_none() {
        missing.push("lat");
    }
    if params.lng.is_none() {
        missing.push("lng");
    }
    if params.range.is_none() {
        missing.push("range");
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing query parameter: {}.",
            missing.join(", ")
        )));
    }

    let lat = parse_number("lat", params.lat.as_deref().unwrap_or_default())?;
    let lng = parse_number("lng", params.lng.as_deref().unwrap_or_default())?;
    let range = parse_number("range", params.range.as_deref().unwrap_or_default())?;

    if !geo.contains(lat, lng) {
        return Err(AppError::Validation(geo.out_of_bounds_message()));
    }
    if !geo.radius_valid(range) {
        return Err(AppError::Validation(format!(
            "`range` should be within {} to {} km, but got {}",
            geo.min_radius_km, geo.max_radius_km, range
        )));
    }

    let candidates = GeoService::new(db.clone())
        .find_within_radius(lat, lng, range)
        .await?;
    let bounded = bound_results(candidates, geo.max_query_results);
    let views = assemble_views(&db, &bounded).await?;

    Ok(ApiResponse::ok(views))
}

fn parse_number(name: &str, raw: &str) -> AppResult<f64> {
    raw.trim().parse().map_err(|_| {
        AppError::Validation(format!("`{}` should be a number, but got {}", name, raw))
    })
}

#[utoipa::path(
    post,
    path = "/api/factories",
    request_body = CreateFactoryRequest,
    responses(
        (status = 200, description = "Factory created", body = ApiResponse<FactoryView>),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "factories"
)]
pub async fn create_factory(
    Extension(db): Extension<DatabaseConnection>,
    Extension(geo): Extension<GeoConfig>,
    Extension(land): Extension<LandLookupService>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<CreateFactoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let action_body =
        serde_json::to_value(&payload).map_err(|e| AppError::Internal(e.into()))?;

    let service = FactoryService::new(db.clone());
    let created = service
        .create(
            &geo,
            CreateFactoryInput {
                name: payload.name,
                factory_type: payload.factory_type,
                lat: payload.lat,
                lng: payload.lng,
                images: payload.images,
                nickname: payload.nickname,
                contact: payload.contact,
                others: payload.others,
                user_ip: Some(addr.ip().to_string()),
                action_body,
            },
        )
        .await?;

    tracing::info!(
        "Factory {} created as No.{} at ({}, {})",
        created.id,
        created.display_number,
        created.lat,
        created.lng
    );

    // Cadastral enrichment happens in the background; the response never
    // waits on the land lookup.
    land.spawn_resolve(db.clone(), created.id, created.lat, created.lng);

    let view = assemble_views(&db, &[created.id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("created factory has no view")))?;

    Ok(ApiResponse::ok(view))
}

#[utoipa::path(
    get,
    path = "/api/factories/{id}",
    params(("id" = Uuid, Path, description = "Factory ID")),
    responses(
        (status = 200, description = "Factory details", body = ApiResponse<FactoryView>),
        (status = 404, description = "Factory not found", body = AppError),
    ),
    tag = "factories"
)]
pub async fn get_factory(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let found = FactoryService::new(db.clone()).get(id).await?;
    let view = assemble_views(&db, &[found.id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("factory has no view")))?;

    Ok(ApiResponse::ok(view))
}

#[utoipa::path(
    put,
    path = "/api/factories/{id}",
    params(("id" = Uuid, Path, description = "Factory ID")),
    request_body = UpdateFactoryRequest,
    responses(
        (status = 200, description = "Factory updated", body = ApiResponse<FactoryView>),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Factory not found", body = AppError),
    ),
    tag = "factories"
)]
pub async fn update_factory(
    Extension(db): Extension<DatabaseConnection>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFactoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let action_body =
        serde_json::to_value(&payload).map_err(|e| AppError::Internal(e.into()))?;

    let service = FactoryService::new(db.clone());
    let updated = service
        .update_attributes(
            id,
            UpdateFactoryInput {
                name: payload.name,
                factory_type: payload.factory_type,
                cet_report_status: payload.cet_report_status,
                lat: payload.lat,
                lng: payload.lng,
                nickname: payload.nickname,
                contact: payload.contact,
                others: payload.others,
                user_ip: Some(addr.ip().to_string()),
                action_body,
            },
        )
        .await?;

    tracing::info!("Factory {} attributes updated", updated.id);

    let view = assemble_views(&db, &[updated.id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("factory has no view")))?;

    Ok(ApiResponse::ok(view))
}

#[utoipa::path(
    get,
    path = "/api/factories/{id}/report_records",
    params(("id" = Uuid, Path, description = "Factory ID")),
    responses(
        (status = 200, description = "Report records, oldest first", body = ApiResponse<Vec<ReportRecordResponse>>),
        (status = 404, description = "Factory not found", body = AppError),
    ),
    tag = "factories"
)]
pub async fn get_factory_report_records(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    FactoryService::new(db.clone()).get(id).await?;

    let records = ReportRecord::active()
        .filter(report_record::Column::FactoryId.eq(id))
        .order_by_asc(report_record::Column::CreatedAt)
        .all(&db)
        .await?;

    let record_ids: Vec<i32> = records.iter().map(|r| r.id).collect();
    let mut images_by_record: HashMap<i32, Vec<ImageView>> = HashMap::new();
    if !record_ids.is_empty() {
        let images = Image::active()
            .filter(image::Column::ReportRecordId.is_in(record_ids))
            .all(&db)
            .await?;
        for img in images {
            if let Some(record_id) = img.report_record_id {
                images_by_record.entry(record_id).or_default().push(ImageView {
                    id: img.id,
                    image_path: img.image_path.clone(),
                    url: img.image_path,
                });
            }
        }
    }

    let items: Vec<ReportRecordResponse> = records
        .into_iter()
        .map(|r| ReportRecordResponse {
            id: r.id,
            factory_id: r.factory_id,
            user_ip: r.user_ip,
            action_type: r.action_type,
            action_body: r.action_body,
            nickname: r.nickname,
            contact: r.contact,
            others: r.others,
            created_at: r.created_at.to_string(),
            images: images_by_record.remove(&r.id).unwrap_or_default(),
        })
        .collect();

    Ok(ApiResponse::ok(items))
}
