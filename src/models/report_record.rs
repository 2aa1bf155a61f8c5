use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, QueryFilter, Select};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One user action against a factory. Staff periodically filter the most
/// recent records out to chase offenders, so rows are immutable once written
/// and `action_body` keeps the triggering request verbatim for audit.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "report_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub factory_id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(45))", nullable)]
    pub user_ip: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(10))")]
    pub action_type: String,
    pub action_body: Json,
    #[sea_orm(column_type = "String(StringLen::N(64))", nullable)]
    pub nickname: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(64))", nullable)]
    pub contact: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(1024))")]
    pub others: String,
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
    #[sea_orm(has_many = "super::image::Entity")]
    Images,
}

impl Related<super::factory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Factory.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const ACTION_POST: &str = "POST";
pub const ACTION_UPDATE: &str = "UPDATE";
pub const ACTION_POST_IMAGE: &str = "POST_IMAGE";

impl Entity {
    pub fn active() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }
}
