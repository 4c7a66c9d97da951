use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a serialized physical unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitState {
    Nuevo,
    Usado,
    Inoperativo,
    Reparado,
}

impl UnitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::Nuevo => "NUEVO",
            UnitState::Usado => "USADO",
            UnitState::Inoperativo => "INOPERATIVO",
            UnitState::Reparado => "REPARADO",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NUEVO" => Some(UnitState::Nuevo),
            "USADO" => Some(UnitState::Usado),
            "INOPERATIVO" => Some(UnitState::Inoperativo),
            "REPARADO" => Some(UnitState::Reparado),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_units")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_id: i32,
    /// Line that minted this unit; null for units predating cost tracking
    pub purchase_line_id: Option<i32>,
    pub serial: String,
    pub state: String, // Storing as string in DB, but will convert to/from enum
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn unit_state(&self) -> Option<UnitState> {
        UnitState::from_str(&self.state)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::purchase_line::Entity",
        from = "Column::PurchaseLineId",
        to = "super::purchase_line::Column::Id"
    )]
    PurchaseLine,
    #[sea_orm(has_many = "super::location_history::Entity")]
    LocationHistory,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::location_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationHistory.def()
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
