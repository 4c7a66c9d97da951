use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Catalog item kind: serialized spare part vs bulk consumable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Repuesto,
    Consumible,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Repuesto => "REPUESTO",
            ItemType::Consumible => "CONSUMIBLE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "REPUESTO" => Some(ItemType::Repuesto),
            "CONSUMIBLE" => Some(ItemType::Consumible),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub name: String,
    pub item_type: String, // Storing as string in DB, but will convert to/from enum
    pub dimension_id: Option<i32>,
    pub unit_id: Option<i32>,
    /// Memoized stock; recomputed by the stock service whenever it drifts
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub stock: Decimal,
    /// Per-item serial sequence; incremented in-database, never in memory
    pub last_serial: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn kind(&self) -> Option<ItemType> {
        ItemType::from_str(&self.item_type)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dimension::Entity",
        from = "Column::DimensionId",
        to = "super::dimension::Column::Id"
    )]
    Dimension,
    #[sea_orm(
        belongs_to = "super::unit_of_measure::Entity",
        from = "Column::UnitId",
        to = "super::unit_of_measure::Column::Id"
    )]
    UnitOfMeasure,
    #[sea_orm(has_many = "super::item_unit::Entity")]
    ItemUnits,
}

impl Related<super::item_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemUnits.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(Utc::now());
            }
        }
        if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
