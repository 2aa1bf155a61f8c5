use crate::{
    error::AppResult,
    models::{
        document, follow_up, image, report_record, Document, DocumentModel, FollowUp,
        FollowUpModel, Image, ImageModel, ReportRecord, ReportRecordModel,
    },
};
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, QueryOrder};
use std::collections::HashMap;
use uuid::Uuid;

/// Everything related to one factory, loaded in bulk.
#[derive(Debug, Clone, Default)]
pub struct FactoryAggregate {
    pub reports: Vec<ReportRecordModel>,
    pub images: Vec<ImageModel>,
    pub documents: Vec<DocumentModel>,
    pub follow_ups: Vec<FollowUpModel>,
}

/// Batch loader for the related record streams of a bounded factory id set.
///
/// Issues one `factory_id IN (...)` query per entity type (plus one for
/// follow-ups scoped to the loaded documents) no matter how many factories
/// are requested. Fetching per factory instead would turn the map view into
/// O(N) round-trips, which is exactly what this loader exists to avoid.
pub struct AggregateLoader {
    db: DatabaseConnection,
}

impl AggregateLoader {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load aggregates for the given factories. Every requested id gets an
    /// entry (empty when nothing references it). Any failed fetch fails the
    /// whole load; views are never assembled from partial data.
    pub async fn load(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, FactoryAggregate>> {
        let mut map: HashMap<Uuid, FactoryAggregate> = ids
            .iter()
            .map(|id| (*id, FactoryAggregate::default()))
            .collect();
        if map.is_empty() {
            return Ok(map);
        }

        let reports = ReportRecord::active()
            .filter(report_record::Column::FactoryId.is_in(ids.iter().copied()))
            .order_by_asc(report_record::Column::CreatedAt)
            .all(&self.db)
            .await?;
        for report in reports {
            if let Some(agg) = map.get_mut(&report.factory_id) {
                agg.reports.push(report);
            }
        }

        let images = Image::active()
            .filter(image::Column::FactoryId.is_in(ids.iter().copied()))
            .order_by_asc(image::Column::CreatedAt)
            .all(&self.db)
            .await?;
        for img in images {
            if let Some(agg) = img.factory_id.and_then(|fid| map.get_mut(&fid)) {
                agg.images.push(img);
            }
        }

        let documents = Document::active()
            .filter(document::Column::FactoryId.is_in(ids.iter().copied()))
            .order_by_asc(document::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let document_owner: HashMap<i32, Uuid> =
            documents.iter().map(|d| (d.id, d.factory_id)).collect();
        for doc in documents {
            if let Some(agg) = map.get_mut(&doc.factory_id) {
                agg.documents.push(doc);
            }
        }

        if !document_owner.is_empty() {
            let follow_ups = FollowUp::active()
                .filter(follow_up::Column::DocumentId.is_in(document_owner.keys().copied()))
                .order_by_asc(follow_up::Column::CreatedAt)
                .all(&self.db)
                .await?;
            for fu in follow_ups {
                if let Some(agg) = document_owner
                    .get(&fu.document_id)
                    .and_then(|fid| map.get_mut(fid))
                {
                    agg.follow_ups.push(fu);
                }
            }
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn report(id: i32, factory_id: Uuid) -> ReportRecordModel {
        ReportRecordModel {
            id,
            factory_id,
            user_ip: None,
            action_type: "POST".to_string(),
            action_body: serde_json::json!({}),
            nickname: None,
            contact: None,
            others: String::new(),
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 9, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            deleted_at: None,
        }
    }

    fn document_row(id: i32, factory_id: Uuid) -> DocumentModel {
        DocumentModel {
            id,
            code: format!("113{:04}", id),
            factory_id,
            display_status: 0,
            cet_staff: None,
            creator: None,
            note: None,
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 9, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            deleted_at: None,
        }
    }

    fn follow_up_row(id: i32, document_id: i32) -> FollowUpModel {
        FollowUpModel {
            id,
            document_id,
            staff: Some("staff-a".to_string()),
            note: "called the county".to_string(),
            for_user: true,
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 9, 3)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn empty_id_set_issues_no_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let loader = AggregateLoader::new(db.clone());

        let map = loader.load(&[]).await.unwrap();

        assert!(map.is_empty());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn fifty_factories_load_in_three_queries() {
        let ids: Vec<Uuid> = (1..=50).map(Uuid::from_u128).collect();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ReportRecordModel>::new()])
            .append_query_results([Vec::<ImageModel>::new()])
            .append_query_results([Vec::<DocumentModel>::new()])
            .into_connection();
        let loader = AggregateLoader::new(db.clone());

        let map = loader.load(&ids).await.unwrap();

        assert_eq!(map.len(), 50);
        assert!(map.values().all(|agg| agg.reports.is_empty()
            && agg.images.is_empty()
            && agg.documents.is_empty()
            && agg.follow_ups.is_empty()));
        // One batch per entity type; the follow-up batch is skipped because
        // no documents loaded. Never 50 × 3.
        assert_eq!(db.into_transaction_log().len(), 3);
    }

    #[tokio::test]
    async fn related_rows_group_under_their_factory() {
        let f1 = Uuid::from_u128(1);
        let f2 = Uuid::from_u128(2);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![report(10, f1), report(11, f1), report(12, f2)]])
            .append_query_results([Vec::<ImageModel>::new()])
            .append_query_results([vec![document_row(20, f2)]])
            .append_query_results([vec![follow_up_row(30, 20)]])
            .into_connection();
        let loader = AggregateLoader::new(db.clone());

        let map = loader.load(&[f1, f2]).await.unwrap();

        assert_eq!(map[&f1].reports.len(), 2);
        assert_eq!(map[&f2].reports.len(), 1);
        assert_eq!(map[&f1].documents.len(), 0);
        assert_eq!(map[&f2].documents.len(), 1);
        assert_eq!(map[&f2].follow_ups.len(), 1);
        // Documents loaded, so the follow-up batch runs too: four queries.
        assert_eq!(db.into_transaction_log().len(), 4);
    }
}
