use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, QueryFilter, Select};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Progress note on a complaint document, appended by staff. Rows flagged
/// `for_user` surface on the public factory view without the staff name.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "follow_ups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub document_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(100))", nullable)]
    pub staff: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub note: String,
    pub for_user: bool,
    pub created_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::document::Entity",
        from = "Column::DocumentId",
        to = "super::document::Column::Id"
    )]
    Document,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    pub fn active() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }
}
