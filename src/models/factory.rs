use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, QueryFilter, Select};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Land plots suspected of hosting unpermitted industrial activity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "factories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Public sequential number, unique across all ever-created factories
    /// (soft-deleted included) and never reused.
    #[sea_orm(unique)]
    pub display_number: i32,
    pub lat: f64,
    pub lng: f64,
    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub landcode: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub towncode: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub townname: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub sectcode: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub sectname: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub name: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(3))", nullable)]
    pub factory_type: Option<String>,
    /// True for rows seeded from the historical government import; those
    /// additionally need a factory_type to count as data-complete.
    pub before_release: bool,
    #[sea_orm(column_type = "String(StringLen::N(1))")]
    pub source: String,
    #[sea_orm(column_type = "String(StringLen::N(1))")]
    pub cet_review_status: String,
    #[sea_orm(column_type = "String(StringLen::N(1))")]
    pub cet_report_status: String,
    pub status_time: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::report_record::Entity")]
    ReportRecords,
    #[sea_orm(has_many = "super::image::Entity")]
    Images,
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
}

impl Related<super::report_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportRecords.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Source of a factory record: government import or user submission.
pub const SOURCE_GOV: &str = "G";
pub const SOURCE_USER: &str = "U";

/// cet_review_status value meaning "reviewed, will not be reported".
pub const REVIEW_STATUS_NO_REPORT: &str = "O";

pub const FACTORY_TYPE_LIST: &[(&str, &str)] = &[
    ("2-1", "沖床、銑床、車床、鏜孔"),
    ("2-2", "焊接、鑄造、熱處理"),
    ("2-3", "金屬表面處理、噴漆"),
    ("3", "塑膠加工、射出"),
    ("4", "橡膠加工"),
    ("5", "非金屬礦物（石材）"),
    ("6", "食品"),
    ("7", "皮革"),
    ("8", "紡織"),
    ("9", "其他"),
];

pub const CET_REPORT_STATUS_LIST: &[&str] = &["A", "O", "P", "Q", "X", "Y", "Z", "B"];

pub fn is_valid_factory_type(value: &str) -> bool {
    FACTORY_TYPE_LIST.iter().any(|(code, _)| *code == value)
}

impl Entity {
    /// Live rows only. The soft-delete marker hides rows from every public
    /// query path; `Entity::find()` stays the raw all-rows view.
    pub fn active() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }

    /// Soft-deleted rows only.
    pub fn recycled() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_not_null())
    }
}
