use crate::{
    error::{AppError, AppResult},
    models::{
        document, factory, follow_up, Document, DocumentModel, DisplayStatus, Factory,
        FollowUpModel,
    },
};
use chrono::{Datelike, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    QueryFilter, SqlErr, Statement, TransactionTrait,
};
use uuid::Uuid;

/// Serializes per-year document code allocation, same scheme as the factory
/// display number.
const DOCUMENT_CODE_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(747002)";

/// 公文號 uses the Taiwan (Minguo) calendar year.
pub fn taiwan_year(date: NaiveDate) -> i32 {
    date.year() - 1911
}

/// Code format: three-digit Taiwan year + four-digit serial, e.g. "1130042".
pub fn document_code(taiwan_year: i32, serial: i64) -> String {
    format!("{:03}{:04}", taiwan_year, serial)
}

#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    pub cet_staff: Option<String>,
    pub creator: Option<String>,
    pub note: Option<String>,
    pub display_status: Option<i16>,
}

#[derive(Debug, Clone)]
pub struct CreateFollowUpInput {
    pub note: String,
    pub for_user: bool,
    pub staff: Option<String>,
}

pub struct DocumentService {
    db: DatabaseConnection,
}

impl DocumentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: i32) -> AppResult<DocumentModel> {
        Document::active()
            .filter(document::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document id {} not existed.", id)))
    }

    /// Open a complaint document for a factory. The serial part of the code
    /// continues from the highest serial already issued this Taiwan year and
    /// resets each new year; allocation is guarded like display_number
    /// (advisory lock + unique index + one retry).
    pub async fn create(
        &self,
        factory_id: Uuid,
        input: CreateDocumentInput,
    ) -> AppResult<DocumentModel> {
        Factory::active()
            .filter(factory::Column::Id.eq(factory_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Factory id {} not existed.", factory_id)))?;

        let display_status = match input.display_status {
            Some(raw) => validate_display_status(raw)?,
            None => DisplayStatus::Reported,
        };

        for attempt in 0..2 {
            match self.try_create(factory_id, &input, display_status).await {
                Ok(created) => return Ok(created),
                Err(AppError::Database(err)) if attempt == 0 && is_unique_violation(&err) => {
                    tracing::warn!("document code allocation raced, retrying once");
                }
                Err(err) => return Err(err),
            }
        }
        Err(AppError::Conflict(
            "document code allocation raced, please retry".to_string(),
        ))
    }

    async fn try_create(
        &self,
        factory_id: Uuid,
        input: &CreateDocumentInput,
        display_status: DisplayStatus,
    ) -> AppResult<DocumentModel> {
        let now = chrono::Utc::now().naive_utc();
        let year = taiwan_year(now.date());

        let txn = self.db.begin().await?;

        txn.execute(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            DOCUMENT_CODE_LOCK_SQL.to_string(),
        ))
        .await?;

        // Serials are scoped to the year prefix; the code column keeps them
        // reserved even for soft-deleted documents.
        let row = txn
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "SELECT COALESCE(MAX(CAST(SUBSTRING(code FROM 4) AS INTEGER)), 0) + 1 \
                 FROM documents WHERE code LIKE $1",
                vec![format!("{:03}%", year).into()],
            ))
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("document code query returned no row"))
            })?;
        let serial: i64 = row.try_get_by_index::<i32>(0)? as i64;

        let new_document = document::ActiveModel {
            code: Set(document_code(year, serial)),
            factory_id: Set(factory_id),
            display_status: Set(display_status.as_i16()),
            cet_staff: Set(input.cet_staff.clone()),
            creator: Set(input.creator.clone()),
            note: Set(input.note.clone()),
            created_at: Set(now),
            ..Default::default()
        };
        let created = new_document.insert(&txn).await?;

        txn.commit().await?;
        Ok(created)
    }

    pub async fn update_display_status(&self, id: i32, raw_status: i16) -> AppResult<DocumentModel> {
        let status = validate_display_status(raw_status)?;
        let existing = self.get(id).await?;

        let mut active: document::ActiveModel = existing.into();
        active.display_status = Set(status.as_i16());
        Ok(active.update(&self.db).await?)
    }

    /// Append a progress note. Notes are immutable once written.
    pub async fn add_follow_up(
        &self,
        document_id: i32,
        input: CreateFollowUpInput,
    ) -> AppResult<FollowUpModel> {
        self.get(document_id).await?;

        let now = chrono::Utc::now().naive_utc();
        let new_follow_up = follow_up::ActiveModel {
            document_id: Set(document_id),
            staff: Set(input.staff),
            note: Set(input.note),
            for_user: Set(input.for_user),
            created_at: Set(now),
            ..Default::default()
        };
        Ok(new_follow_up.insert(&self.db).await?)
    }
}

fn validate_display_status(raw: i16) -> AppResult<DisplayStatus> {
    DisplayStatus::from_i16(raw).ok_or_else(|| {
        let permitted: Vec<String> = DisplayStatus::ALL
            .iter()
            .map(|s| format!("{} ({})", s.as_i16(), s.label()))
            .collect();
        AppError::Validation(format!(
            "display_status {} is not one of the permitted values: {}",
            raw,
            permitted.join(", ")
        ))
    })
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
