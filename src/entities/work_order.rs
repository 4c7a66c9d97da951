use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderStatus {
    Pendiente,
    EnProceso,
    Finalizado,
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pendiente => "PENDIENTE",
            WorkOrderStatus::EnProceso => "EN_PROCESO",
            WorkOrderStatus::Finalizado => "FINALIZADO",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDIENTE" => Some(WorkOrderStatus::Pendiente),
            "EN_PROCESO" => Some(WorkOrderStatus::EnProceso),
            "FINALIZADO" => Some(WorkOrderStatus::Finalizado),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Urgente,
    Emergencia,
    Regular,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgente => "URGENTE",
            Priority::Emergencia => "EMERGENCIA",
            Priority::Regular => "REGULAR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "URGENTE" => Some(Priority::Urgente),
            "EMERGENCIA" => Some(Priority::Emergencia),
            "REGULAR" => Some(Priority::Regular),
            _ => None,
        }
    }
}

/// Operational state of the machine recorded at order close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentState {
    Operativo,
    Inoperativo,
}

impl EquipmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentState::Operativo => "OPERATIVO",
            EquipmentState::Inoperativo => "INOPERATIVO",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OPERATIVO" => Some(EquipmentState::Operativo),
            "INOPERATIVO" => Some(EquipmentState::Inoperativo),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub machine_id: i32,
    pub scheduled_date: NaiveDate,
    pub priority: String,
    pub status: String, // Storing as string in DB, but will convert to/from enum
    pub started_time: Option<NaiveTime>,
    pub ended_time: Option<NaiveTime>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub hour_meter: Option<Decimal>,
    pub equipment_state: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn order_status(&self) -> Option<WorkOrderStatus> {
        WorkOrderStatus::from_str(&self.status)
    }

    pub fn is_finalized(&self) -> bool {
        self.order_status() == Some(WorkOrderStatus::Finalizado)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::machine::Entity",
        from = "Column::MachineId",
        to = "super::machine::Column::Id"
    )]
    Machine,
    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
}

impl Related<super::machine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machine.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
