use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One residence interval of a serialized unit.
///
/// Exactly one of `machine_id`, `warehouse_id`, `worker_id` is set.
/// `ended_at = NULL` marks the unit's current location; the location
/// service guarantees at most one open row per unit.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "location_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_unit_id: i32,
    pub machine_id: Option<i32>,
    pub warehouse_id: Option<i32>,
    pub worker_id: Option<i32>,
    pub work_order_id: Option<i32>,
    /// Unit state at the time the interval opened
    pub state: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item_unit::Entity",
        from = "Column::ItemUnitId",
        to = "super::item_unit::Column::Id"
    )]
    ItemUnit,
    #[sea_orm(
        belongs_to = "super::machine::Entity",
        from = "Column::MachineId",
        to = "super::machine::Column::Id"
    )]
    Machine,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
    #[sea_orm(
        belongs_to = "super::worker::Entity",
        from = "Column::WorkerId",
        to = "super::worker::Column::Id"
    )]
    Worker,
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
}

impl Related<super::item_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemUnit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
