use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, QueryFilter, Select};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A formal complaint letter sent for one factory, tracked through its
/// enforcement lifecycle. A factory accumulates documents over time; the
/// most recently created one carries the factory's current status.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 公文號, per-year serial: Taiwan calendar year + 4-digit sequence.
    #[sea_orm(column_type = "String(StringLen::N(100))", unique)]
    pub code: String,
    pub factory_id: Uuid,
    pub display_status: i16,
    #[sea_orm(column_type = "String(StringLen::N(100))", nullable)]
    pub cet_staff: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(100))", nullable)]
    pub creator: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
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
    #[sea_orm(has_many = "super::follow_up::Entity")]
    FollowUps,
}

impl Related<super::factory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Factory.def()
    }
}

impl Related<super::follow_up::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FollowUps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Enforcement lifecycle of a complaint document, in escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DisplayStatus {
    Reported,
    AuditScheduled,
    CommunicationPeriod,
    WorkStopped,
    PowerOuting,
    DemolitionScheduled,
    Demolished,
    NotTracked,
}

impl DisplayStatus {
    pub const ALL: &'static [DisplayStatus] = &[
        DisplayStatus::Reported,
        DisplayStatus::AuditScheduled,
        DisplayStatus::CommunicationPeriod,
        DisplayStatus::WorkStopped,
        DisplayStatus::PowerOuting,
        DisplayStatus::DemolitionScheduled,
        DisplayStatus::Demolished,
        DisplayStatus::NotTracked,
    ];

    pub const fn as_i16(self) -> i16 {
        match self {
            DisplayStatus::Reported => 0,
            DisplayStatus::AuditScheduled => 1,
            DisplayStatus::CommunicationPeriod => 2,
            DisplayStatus::WorkStopped => 3,
            DisplayStatus::PowerOuting => 4,
            DisplayStatus::DemolitionScheduled => 5,
            DisplayStatus::Demolished => 6,
            DisplayStatus::NotTracked => 7,
        }
    }

    pub const fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(DisplayStatus::Reported),
            1 => Some(DisplayStatus::AuditScheduled),
            2 => Some(DisplayStatus::CommunicationPeriod),
            3 => Some(DisplayStatus::WorkStopped),
            4 => Some(DisplayStatus::PowerOuting),
            5 => Some(DisplayStatus::DemolitionScheduled),
            6 => Some(DisplayStatus::Demolished),
            7 => Some(DisplayStatus::NotTracked),
            _ => None,
        }
    }

    /// Human-readable label shown on the public factory view.
    pub const fn label(self) -> &'static str {
        match self {
            DisplayStatus::Reported => "已檢舉",
            DisplayStatus::AuditScheduled => "已排程稽查",
            DisplayStatus::CommunicationPeriod => "陳述意見期",
            DisplayStatus::WorkStopped => "已勒令停工",
            DisplayStatus::PowerOuting => "已發函斷電",
            DisplayStatus::DemolitionScheduled => "已排程拆除",
            DisplayStatus::Demolished => "已拆除",
            DisplayStatus::NotTracked => "不再追蹤",
        }
    }
}

impl Entity {
    pub fn active() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }
}
