use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::image::{parse_exif_datetime, CreateImageInput, ImageService};
use axum::{
    extract::{ConnectInfo, Path},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PostImageRequest {
    /// URL of the already-uploaded image
    #[validate(url, length(max = 256))]
    pub url: String,
    /// EXIF latitude of the photo, if the client extracted it
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    /// EXIF longitude of the photo, if the client extracted it
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    /// EXIF DateTimeOriginal, "%Y:%m:%d %H:%M:%S"
    #[serde(rename = "DateTimeOriginal")]
    pub datetime_original: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostImageResponse {
    /// Image id, referenced later from factory creation
    pub token: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    pub factory_id: Option<Uuid>,
    pub image_path: String,
    pub url: String,
}

impl PostImageRequest {
    fn into_input(self) -> CreateImageInput {
        let orig_time = self
            .datetime_original
            .as_deref()
            .and_then(parse_exif_datetime);
        CreateImageInput {
            image_path: self.url,
            orig_time,
            orig_lat: self.latitude,
            orig_lng: self.longitude,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/images",
    request_body = PostImageRequest,
    responses(
        (status = 200, description = "Image registered", body = ApiResponse<PostImageResponse>),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "images"
)]
pub async fn post_image(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<PostImageRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = ImageService::new(db).create(payload.into_input()).await?;
    tracing::info!("Image {} registered at {}", created.id, created.image_path);

    Ok(ApiResponse::ok(PostImageResponse { token: created.id }))
}

#[utoipa::path(
    post,
    path = "/api/factories/{id}/images",
    params(("id" = Uuid, Path, description = "Factory ID")),
    request_body = PostImageRequest,
    responses(
        (status = 200, description = "Image attached", body = ApiResponse<ImageResponse>),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Factory not found", body = AppError),
    ),
    tag = "images"
)]
pub async fn post_factory_image(
    Extension(db): Extension<DatabaseConnection>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(factory_id): Path<Uuid>,
    Json(payload): Json<PostImageRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = ImageService::new(db)
        .attach_to_factory(
            factory_id,
            payload.into_input(),
            Some(addr.ip().to_string()),
        )
        .await?;
    tracing::info!("Image {} attached to factory {}", created.id, factory_id);

    Ok(ApiResponse::ok(ImageResponse {
        id: created.id,
        factory_id: created.factory_id,
        url: created.image_path.clone(),
        image_path: created.image_path,
    }))
}
