use crate::{
    config::geo::GeoConfig,
    error::{AppError, AppResult},
    models::{
        factory,
        factory::{
            is_valid_factory_type, CET_REPORT_STATUS_LIST, FACTORY_TYPE_LIST, SOURCE_USER,
        },
        image, report_record,
        report_record::{ACTION_POST, ACTION_UPDATE},
        Factory, FactoryModel, Image,
    },
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, SqlErr, Statement,
    TransactionTrait,
};
use uuid::Uuid;

/// Serializes display-number allocation across concurrent creators.
/// Backstopped by the unique index either way.
const DISPLAY_NUMBER_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(747001)";

#[derive(Debug, Clone)]
pub struct CreateFactoryInput {
    pub name: Option<String>,
    pub factory_type: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub images: Vec<Uuid>,
    pub nickname: Option<String>,
    pub contact: Option<String>,
    pub others: String,
    pub user_ip: Option<String>,
    /// Verbatim request payload, kept on the report record for audit.
    pub action_body: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct UpdateFactoryInput {
    pub name: Option<String>,
    pub factory_type: Option<String>,
    pub cet_report_status: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub nickname: Option<String>,
    pub contact: Option<String>,
    pub others: Option<String>,
    pub user_ip: Option<String>,
    pub action_body: serde_json::Value,
}

pub struct FactoryService {
    db: DatabaseConnection,
}

impl FactoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<FactoryModel> {
        Factory::active()
            .filter(factory::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Factory id {} not existed.", id)))
    }

    /// Create a factory together with its originating report record and
    /// image links, all in one transaction. The public display number is
    /// max-over-all-rows + 1 (soft-deleted included), computed inside the
    /// same transaction so concurrent creates cannot collide; a unique-index
    /// race is retried once with a fresh number.
    pub async fn create(
        &self,
        geo: &GeoConfig,
        input: CreateFactoryInput,
    ) -> AppResult<FactoryModel> {
        validate_position(geo, input.lat, input.lng)?;
        if let Some(factory_type) = &input.factory_type {
            validate_factory_type(factory_type)?;
        }

        let mut image_ids = input.images.clone();
        image_ids.sort_unstable();
        image_ids.dedup();
        self.ensure_images_exist(&image_ids).await?;

        for attempt in 0..2 {
            match self.try_create(&input, &image_ids).await {
                Ok(created) => return Ok(created),
                Err(AppError::Database(err)) if attempt == 0 && is_unique_violation(&err) => {
                    tracing::warn!("display_number allocation raced, retrying once");
                }
                Err(err) => return Err(err),
            }
        }
        Err(AppError::Conflict(
            "factory number allocation raced, please retry".to_string(),
        ))
    }

    async fn try_create(
        &self,
        input: &CreateFactoryInput,
        image_ids: &[Uuid],
    ) -> AppResult<FactoryModel> {
        let now = chrono::Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        txn.execute(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            DISPLAY_NUMBER_LOCK_SQL.to_string(),
        ))
        .await?;

        let next_number = self.next_display_number(&txn).await?;

        let new_factory = factory::ActiveModel {
            id: Set(Uuid::new_v4()),
            display_number: Set(next_number),
            lat: Set(input.lat),
            lng: Set(input.lng),
            name: Set(input.name.clone()),
            factory_type: Set(input.factory_type.clone()),
            before_release: Set(false),
            source: Set(SOURCE_USER.to_string()),
            cet_review_status: Set("A".to_string()),
            cet_report_status: Set("A".to_string()),
            status_time: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = new_factory.insert(&txn).await?;

        let report = report_record::ActiveModel {
            factory_id: Set(created.id),
            user_ip: Set(input.user_ip.clone()),
            action_type: Set(ACTION_POST.to_string()),
            action_body: Set(input.action_body.clone()),
            nickname: Set(input.nickname.clone()),
            contact: Set(input.contact.clone()),
            others: Set(input.others.clone()),
            created_at: Set(now),
            ..Default::default()
        };
        let report = report.insert(&txn).await?;

        if !image_ids.is_empty() {
            Image::update_many()
                .col_expr(image::Column::FactoryId, Expr::value(created.id))
                .col_expr(image::Column::ReportRecordId, Expr::value(report.id))
                .filter(image::Column::Id.is_in(image_ids.iter().copied()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(created)
    }

    async fn next_display_number<C: ConnectionTrait>(&self, conn: &C) -> AppResult<i32> {
        // Deliberately scans all rows: soft-deleted factories keep their
        // number reserved forever, so the sequence never reuses one.
        let row = conn
            .query_one(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                "SELECT COALESCE(MAX(display_number), 0) + 1 AS next_number FROM factories"
                    .to_string(),
            ))
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("display_number query returned no row"))
            })?;
        let next_number: i32 = row.try_get_by_index(0)?;
        Ok(next_number)
    }

    async fn ensure_images_exist(&self, image_ids: &[Uuid]) -> AppResult<()> {
        if image_ids.is_empty() {
            return Ok(());
        }
        let found = Image::active()
            .filter(image::Column::Id.is_in(image_ids.iter().copied()))
            .count(&self.db)
            .await?;
        if found != image_ids.len() as u64 {
            return Err(AppError::Validation(
                "please check if every image id exist".to_string(),
            ));
        }
        Ok(())
    }

    /// Attribute update from a user report. Position is immutable; every
    /// accepted update appends an UPDATE report record with the verbatim
    /// payload in the same transaction.
    pub async fn update_attributes(
        &self,
        id: Uuid,
        input: UpdateFactoryInput,
    ) -> AppResult<FactoryModel> {
        if input.lat.is_some() || input.lng.is_some() {
            return Err(AppError::Validation(
                "Factory position cannot be modified.".to_string(),
            ));
        }
        if let Some(factory_type) = &input.factory_type {
            validate_factory_type(factory_type)?;
        }
        if let Some(status) = &input.cet_report_status {
            if !CET_REPORT_STATUS_LIST.contains(&status.as_str()) {
                return Err(AppError::Validation(format!(
                    "cet_report_status \"{}\" is not one of the permitted values: {}",
                    status,
                    CET_REPORT_STATUS_LIST.join(", ")
                )));
            }
        }

        let existing = self.get(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let txn = self.db.begin().await?;

        let mut active: factory::ActiveModel = existing.into();
        if let Some(name) = input.name.clone() {
            active.name = Set(Some(name));
        }
        if let Some(factory_type) = input.factory_type.clone() {
            active.factory_type = Set(Some(factory_type));
        }
        if let Some(status) = input.cet_report_status.clone() {
            active.cet_report_status = Set(status);
            active.status_time = Set(now);
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let report = report_record::ActiveModel {
            factory_id: Set(updated.id),
            user_ip: Set(input.user_ip.clone()),
            action_type: Set(ACTION_UPDATE.to_string()),
            action_body: Set(input.action_body.clone()),
            nickname: Set(input.nickname.clone()),
            contact: Set(input.contact.clone()),
            others: Set(input.others.clone().unwrap_or_default()),
            created_at: Set(now),
            ..Default::default()
        };
        report.insert(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Soft delete: the row keeps its display number and stays visible to
    /// the raw and recycled views.
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<FactoryModel> {
        let existing = self.get(id).await?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: factory::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        Ok(active.update(&self.db).await?)
    }
}

pub fn validate_position(geo: &GeoConfig, lat: f64, lng: f64) -> AppResult<()> {
    if lat < geo.min_lat || lat > geo.max_lat {
        return Err(AppError::Validation(format!(
            "latitude should be within {} ~ {}, but got {}",
            geo.min_lat, geo.max_lat, lat
        )));
    }
    if lng < geo.min_lng || lng > geo.max_lng {
        return Err(AppError::Validation(format!(
            "longitude should be within {} ~ {}, but got {}",
            geo.min_lng, geo.max_lng, lng
        )));
    }
    Ok(())
}

pub fn validate_factory_type(value: &str) -> AppResult<()> {
    if !is_valid_factory_type(value) {
        let permitted: Vec<&str> = FACTORY_TYPE_LIST.iter().map(|(code, _)| *code).collect();
        return Err(AppError::Validation(format!(
            "Factory Type \"{}\" is not one of the permitted values: {}",
            value,
            permitted.join(", ")
        )));
    }
    Ok(())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
