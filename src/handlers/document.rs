use crate::error::{AppError, AppResult};
use crate::models::{DisplayStatus, DocumentModel, FollowUpModel};
use crate::response::ApiResponse;
use crate::services::document::{CreateDocumentInput, CreateFollowUpInput, DocumentService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDocumentRequest {
    /// Assigned handler at the NGO
    #[validate(length(max = 100))]
    pub cet_staff: Option<String>,
    /// Staff account creating the document
    #[validate(length(max = 100))]
    pub creator: Option<String>,
    pub note: Option<String>,
    /// Initial lifecycle status, defaults to reported (0)
    pub display_status: Option<i16>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDocumentStatusRequest {
    pub display_status: i16,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFollowUpRequest {
    #[validate(length(min = 1))]
    pub note: String,
    /// Surface this note on the public factory view
    #[serde(default)]
    pub for_user: bool,
    #[validate(length(max = 100))]
    pub staff: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: i32,
    pub code: String,
    pub factory_id: Uuid,
    pub display_status: i16,
    pub display_status_label: Option<String>,
    pub cet_staff: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
}

impl From<DocumentModel> for DocumentResponse {
    fn from(d: DocumentModel) -> Self {
        let display_status_label =
            DisplayStatus::from_i16(d.display_status).map(|s| s.label().to_string());
        Self {
            id: d.id,
            code: d.code,
            factory_id: d.factory_id,
            display_status: d.display_status,
            display_status_label,
            cet_staff: d.cet_staff,
            note: d.note,
            created_at: d.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowUpResponse {
    pub id: i32,
    pub document_id: i32,
    pub staff: Option<String>,
    pub note: String,
    pub for_user: bool,
    pub created_at: String,
}

impl From<FollowUpModel> for FollowUpResponse {
    fn from(f: FollowUpModel) -> Self {
        Self {
            id: f.id,
            document_id: f.document_id,
            staff: f.staff,
            note: f.note,
            for_user: f.for_user,
            created_at: f.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/factories/{id}/documents",
    params(("id" = Uuid, Path, description = "Factory ID")),
    request_body = CreateDocumentRequest,
    responses(
        (status = 200, description = "Document created", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Factory not found", body = AppError),
    ),
    tag = "documents"
)]
pub async fn create_document(
    Extension(db): Extension<DatabaseConnection>,
    Path(factory_id): Path<Uuid>,
    Json(payload): Json<CreateDocumentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = DocumentService::new(db)
        .create(
            factory_id,
            CreateDocumentInput {
                cet_staff: payload.cet_staff,
                creator: payload.creator,
                note: payload.note,
                display_status: payload.display_status,
            },
        )
        .await?;
    tracing::info!("Document {} opened for factory {}", created.code, factory_id);

    Ok(ApiResponse::ok(DocumentResponse::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/documents/{id}/status",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = UpdateDocumentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Invalid status", body = AppError),
        (status = 404, description = "Document not found", body = AppError),
    ),
    tag = "documents"
)]
pub async fn update_document_status(
    Extension(db): Extension<DatabaseConnection>,
    Path(document_id): Path<i32>,
    Json(payload): Json<UpdateDocumentStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let updated = DocumentService::new(db)
        .update_display_status(document_id, payload.display_status)
        .await?;

    Ok(ApiResponse::ok(DocumentResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/api/documents/{id}/follow_ups",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = CreateFollowUpRequest,
    responses(
        (status = 200, description = "Follow-up appended", body = ApiResponse<FollowUpResponse>),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Document not found", body = AppError),
    ),
    tag = "documents"
)]
pub async fn create_follow_up(
    Extension(db): Extension<DatabaseConnection>,
    Path(document_id): Path<i32>,
    Json(payload): Json<CreateFollowUpRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = DocumentService::new(db)
        .add_follow_up(
            document_id,
            CreateFollowUpInput {
                note: payload.note,
                for_user: payload.for_user,
                staff: payload.staff,
            },
        )
        .await?;

    Ok(ApiResponse::ok(FollowUpResponse::from(created)))
}
