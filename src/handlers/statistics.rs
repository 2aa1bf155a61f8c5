use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::statistics::{FactoryCountQuery, StatisticsService, StatisticsTotals};
use axum::{extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct FactoryCountParams {
    /// Town-name prefix, e.g. 臺南市 or 臺南市善化區
    pub townname: Option<String>,
    /// G (government import) or U (user submission)
    pub source: Option<String>,
    /// Current document display status (numeric)
    pub display_status: Option<i16>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FactoryCountResponse {
    pub count: u64,
}

#[utoipa::path(
    get,
    path = "/api/statistics/total",
    responses(
        (status = 200, description = "Dataset counters", body = ApiResponse<StatisticsTotals>),
        (status = 500, description = "Database error", body = AppError),
    ),
    tag = "statistics"
)]
pub async fn get_statistics_total(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let totals = StatisticsService::new(db).totals().await?;
    Ok(ApiResponse::ok(totals))
}

#[utoipa::path(
    get,
    path = "/api/statistics/factories",
    params(
        ("townname" = Option<String>, Query, description = "Town-name prefix"),
        ("source" = Option<String>, Query, description = "G or U"),
        ("display_status" = Option<i16>, Query, description = "Current document display status"),
    ),
    responses(
        (status = 200, description = "Factory count for the filters", body = ApiResponse<FactoryCountResponse>),
        (status = 400, description = "Invalid filter", body = AppError),
    ),
    tag = "statistics"
)]
pub async fn get_factories_count(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<FactoryCountParams>,
) -> AppResult<impl IntoResponse> {
    let count = StatisticsService::new(db)
        .count_factories(FactoryCountQuery {
            townname: params.townname,
            source: params.source,
            display_status: params.display_status,
        })
        .await?;

    Ok(ApiResponse::ok(FactoryCountResponse { count }))
}
