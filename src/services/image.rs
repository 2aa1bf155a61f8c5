use crate::{
    error::{AppError, AppResult},
    models::{
        factory, image, report_record, report_record::ACTION_POST_IMAGE, Factory, ImageModel,
    },
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, QueryFilter,
    TransactionTrait,
};
use uuid::Uuid;

/// EXIF timestamps arrive as "2020:03:11 11:22:33".
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Lenient EXIF timestamp parse; anything unreadable is treated as absent.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), EXIF_DATETIME_FORMAT).ok()
}

#[derive(Debug, Clone)]
pub struct CreateImageInput {
    pub image_path: String,
    pub orig_time: Option<NaiveDateTime>,
    pub orig_lat: Option<f64>,
    pub orig_lng: Option<f64>,
}

pub struct ImageService {
    db: DatabaseConnection,
}

impl ImageService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register an already-hosted image. The row floats free (no factory,
    /// no report record) until a later create/attach call links it.
    pub async fn create(&self, input: CreateImageInput) -> AppResult<ImageModel> {
        let now = chrono::Utc::now().naive_utc();
        let new_image = image::ActiveModel {
            id: Set(Uuid::new_v4()),
            image_path: Set(input.image_path),
            orig_time: Set(input.orig_time),
            orig_lat: Set(input.orig_lat),
            orig_lng: Set(input.orig_lng),
            created_at: Set(now),
            ..Default::default()
        };
        Ok(new_image.insert(&self.db).await?)
    }

    /// Attach a new image to an existing factory. Creates the POST_IMAGE
    /// report record and the linked image row in one transaction.
    pub async fn attach_to_factory(
        &self,
        factory_id: Uuid,
        input: CreateImageInput,
        user_ip: Option<String>,
    ) -> AppResult<ImageModel> {
        Factory::active()
            .filter(factory::Column::Id.eq(factory_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Factory ID {} does not exist.", factory_id))
            })?;

        let now = chrono::Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let report = report_record::ActiveModel {
            factory_id: Set(factory_id),
            user_ip: Set(user_ip),
            action_type: Set(ACTION_POST_IMAGE.to_string()),
            action_body: Set(serde_json::json!({})),
            others: Set(String::new()),
            created_at: Set(now),
            ..Default::default()
        };
        let report = report.insert(&txn).await?;

        let new_image = image::ActiveModel {
            id: Set(Uuid::new_v4()),
            factory_id: Set(Some(factory_id)),
            report_record_id: Set(Some(report.id)),
            image_path: Set(input.image_path),
            orig_time: Set(input.orig_time),
            orig_lat: Set(input.orig_lat),
            orig_lng: Set(input.orig_lng),
            created_at: Set(now),
            ..Default::default()
        };
        let created = new_image.insert(&txn).await?;

        txn.commit().await?;
        Ok(created)
    }
}
