use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    Mantenimiento,
    Revision,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Mantenimiento => "MANTENIMIENTO",
            ActivityType::Revision => "REVISION",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MANTENIMIENTO" => Some(ActivityType::Mantenimiento),
            "REVISION" => Some(ActivityType::Revision),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceType {
    Preventivo,
    Correctivo,
    Predictivo,
}

impl MaintenanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceType::Preventivo => "PREVENTIVO",
            MaintenanceType::Correctivo => "CORRECTIVO",
            MaintenanceType::Predictivo => "PREDICTIVO",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PREVENTIVO" => Some(MaintenanceType::Preventivo),
            "CORRECTIVO" => Some(MaintenanceType::Correctivo),
            "PREDICTIVO" => Some(MaintenanceType::Predictivo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceSubtype {
    Pm1,
    Pm2,
    Pm3,
    Pm4,
    Leve,
    Mediano,
    Grave,
}

impl MaintenanceSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceSubtype::Pm1 => "PM1",
            MaintenanceSubtype::Pm2 => "PM2",
            MaintenanceSubtype::Pm3 => "PM3",
            MaintenanceSubtype::Pm4 => "PM4",
            MaintenanceSubtype::Leve => "LEVE",
            MaintenanceSubtype::Mediano => "MEDIANO",
            MaintenanceSubtype::Grave => "GRAVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PM1" => Some(MaintenanceSubtype::Pm1),
            "PM2" => Some(MaintenanceSubtype::Pm2),
            "PM3" => Some(MaintenanceSubtype::Pm3),
            "PM4" => Some(MaintenanceSubtype::Pm4),
            "LEVE" => Some(MaintenanceSubtype::Leve),
            "MEDIANO" => Some(MaintenanceSubtype::Mediano),
            "GRAVE" => Some(MaintenanceSubtype::Grave),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_id: i32,
    pub activity_type: String,
    pub maintenance_type: Option<String>,
    pub subtype: Option<String>,
    pub description: Option<String>,
    /// Planned activities are forecasts; they never deplete stock
    pub is_planned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
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
