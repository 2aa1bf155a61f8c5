use crate::{
    error::{AppError, AppResult},
    models::{
        factory,
        factory::{SOURCE_GOV, SOURCE_USER},
        DisplayStatus, Document, Factory, Image, ReportRecord,
    },
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, PaginatorTrait, QueryFilter, Statement,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatisticsTotals {
    pub factories: u64,
    pub government_factories: u64,
    pub user_factories: u64,
    pub recycled_factories: u64,
    pub report_records: u64,
    pub images: u64,
    pub documents: u64,
}

pub struct StatisticsService {
    db: DatabaseConnection,
}

impl StatisticsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn totals(&self) -> AppResult<StatisticsTotals> {
        let factories = Factory::active().count(&self.db).await?;
        let government_factories = Factory::active()
            .filter(factory::Column::Source.eq(SOURCE_GOV))
            .count(&self.db)
            .await?;
        let user_factories = Factory::active()
            .filter(factory::Column::Source.eq(SOURCE_USER))
            .count(&self.db)
            .await?;
        let recycled_factories = Factory::recycled().count(&self.db).await?;
        let report_records = ReportRecord::active().count(&self.db).await?;
        let images = Image::active().count(&self.db).await?;
        let documents = Document::active().count(&self.db).await?;

        Ok(StatisticsTotals {
            factories,
            government_factories,
            user_factories,
            recycled_factories,
            report_records,
            images,
            documents,
        })
    }

    /// Count factories matching any combination of town-name prefix, source
    /// and current document status. Filters compose on one select instead of
    /// being assembled as SQL strings.
    pub async fn count_factories(&self, query: FactoryCountQuery) -> AppResult<u64> {
        let mut select = Factory::active();

        if let Some(townname) = &query.townname {
            // Colloquial 台 and formal 臺 are interchangeable in addresses;
            // stored names use the formal form.
            let townname = townname.replace('台', "臺");
            select = select.filter(factory::Column::Townname.starts_with(townname.as_str()));
        }

        if let Some(source) = &query.source {
            if source.as_str() != SOURCE_GOV && source.as_str() != SOURCE_USER {
                return Err(AppError::Validation("source: ['G' or 'U']".to_string()));
            }
            select = select.filter(factory::Column::Source.eq(source.as_str()));
        }

        if let Some(raw) = query.display_status {
            let status = DisplayStatus::from_i16(raw).ok_or_else(|| {
                AppError::Validation(format!(
                    "display_status {} is not one of the permitted values: 0 ~ {}",
                    raw,
                    DisplayStatus::NotTracked.as_i16()
                ))
            })?;
            let ids = self.factories_with_current_status(status).await?;
            if ids.is_empty() {
                return Ok(0);
            }
            select = select.filter(factory::Column::Id.is_in(ids));
        }

        Ok(select.count(&self.db).await?)
    }

    /// Factories whose most recently created live document carries the given
    /// status. Older documents of the same factory do not count.
    async fn factories_with_current_status(
        &self,
        status: DisplayStatus,
    ) -> AppResult<Vec<Uuid>> {
        let rows = self
            .db
            .query_all(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "SELECT factory_id FROM ( \
                     SELECT DISTINCT ON (factory_id) factory_id, display_status \
                     FROM documents WHERE deleted_at IS NULL \
                     ORDER BY factory_id, created_at DESC, id DESC \
                 ) latest WHERE latest.display_status = $1",
                vec![status.as_i16().into()],
            ))
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get_by_index(0)?);
        }
        Ok(ids)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FactoryCountQuery {
    pub townname: Option<String>,
    pub source: Option<String>,
    pub display_status: Option<i16>,
}
