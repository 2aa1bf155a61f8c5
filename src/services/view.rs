use crate::models::{
    factory::REVIEW_STATUS_NO_REPORT, DisplayStatus, FactoryModel,
};
use crate::services::aggregate::FactoryAggregate;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A report is considered fresh for one year; older factories need a new
/// report before their data counts as complete again.
const REPORT_FRESHNESS_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageView {
    pub id: Uuid,
    pub image_path: String,
    pub url: String,
}

/// Follow-up note as shown to the public: note and time only, never the
/// staff member who wrote it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FollowUpView {
    pub note: String,
    pub created_at: NaiveDateTime,
}

/// Public projection of a factory with its computed fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FactoryView {
    pub id: Uuid,
    pub display_number: i32,
    pub lat: f64,
    pub lng: f64,
    pub name: Option<String>,
    pub landcode: Option<String>,
    pub towncode: Option<String>,
    pub townname: Option<String>,
    pub sectcode: Option<String>,
    pub sectname: Option<String>,
    #[serde(rename = "type")]
    pub factory_type: Option<String>,
    pub before_release: bool,
    pub source: String,
    pub cet_report_status: String,
    pub images: Vec<ImageView>,
    pub reported_at: Option<NaiveDateTime>,
    pub data_complete: bool,
    pub document_display_status: Option<String>,
    pub follow_ups: Vec<FollowUpView>,
    pub wont_fix: bool,
}

/// Derive the public view of one factory from its loaded aggregate.
/// Pure; `now` is injected so freshness rules stay deterministic.
pub fn assemble(factory: FactoryModel, agg: FactoryAggregate, now: NaiveDateTime) -> FactoryView {
    let reported_at = agg.reports.iter().map(|r| r.created_at).max();

    let has_photo = !agg.images.is_empty();
    let freshness_floor = now - Duration::days(REPORT_FRESHNESS_DAYS);
    let reported_within_year = reported_at.map(|t| t > freshness_floor).unwrap_or(false);
    let data_complete = if factory.before_release {
        has_photo && reported_within_year && factory.factory_type.is_some()
    } else {
        has_photo && reported_within_year
    };

    // Current status is carried by the most recently created document;
    // equal timestamps fall back to the higher id.
    let document_display_status = agg
        .documents
        .iter()
        .max_by_key(|d| (d.created_at, d.id))
        .and_then(|d| DisplayStatus::from_i16(d.display_status))
        .map(|s| s.label().to_string());

    let follow_ups = agg
        .follow_ups
        .iter()
        .filter(|f| f.for_user)
        .map(|f| FollowUpView {
            note: f.note.clone(),
            created_at: f.created_at,
        })
        .collect();

    let images = agg
        .images
        .iter()
        .map(|img| ImageView {
            id: img.id,
            image_path: img.image_path.clone(),
            url: img.image_path.clone(),
        })
        .collect();

    let wont_fix = factory.cet_review_status == REVIEW_STATUS_NO_REPORT;

    FactoryView {
        id: factory.id,
        display_number: factory.display_number,
        lat: factory.lat,
        lng: factory.lng,
        name: factory.name,
        landcode: factory.landcode,
        towncode: factory.towncode,
        townname: factory.townname,
        sectcode: factory.sectcode,
        sectname: factory.sectname,
        factory_type: factory.factory_type,
        before_release: factory.before_release,
        source: factory.source,
        cet_report_status: factory.cet_report_status,
        images,
        reported_at,
        data_complete,
        document_display_status,
        follow_ups,
        wont_fix,
    }
}
