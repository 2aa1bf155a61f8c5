use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, QueryFilter, Select};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A photo attached to a factory. Uploaded and hosted elsewhere; this row
/// only records the URL. Both refs stay null until the image is linked to a
/// factory/report, which may happen well after the upload.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub factory_id: Option<Uuid>,
    pub report_record_id: Option<i32>,
    #[sea_orm(column_type = "String(StringLen::N(256))")]
    pub image_path: String,
    /// EXIF DateTimeOriginal of the photo, when the client supplied it.
    pub orig_time: Option<DateTime>,
    pub orig_lat: Option<f64>,
    pub orig_lng: Option<f64>,
    pub created_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::factory::Entity",
        from = "Column::FactoryId",
        to = "super::factory::Column::Id"
    )]
    Factory,
    #[sea_orm(
        belongs_to = "super::report_record::Entity",
        from = "Column::ReportRecordId",
        to = "super::report_record::Column::Id"
    )]
    ReportRecord,
}

impl Related<super::factory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Factory.def()
    }
}

impl Related<super::report_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    pub fn active() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }
}
