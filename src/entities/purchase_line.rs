use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed Peruvian VAT (IGV) factor applied on top of pre-tax values.
pub const VAT_FACTOR: Decimal = dec!(1.18);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub purchase_id: i32,
    pub item_id: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub quantity: Decimal,
    pub unit_id: i32,
    pub currency: String,
    /// Pre-tax unit price
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_value: Decimal,
}

impl Model {
    /// Unit price with VAT
    pub fn unit_cost(&self) -> Decimal {
        self.unit_value * VAT_FACTOR
    }

    /// Pre-tax line total
    pub fn line_value(&self) -> Decimal {
        self.quantity * self.unit_value
    }

    /// Line total with VAT
    pub fn line_cost(&self) -> Decimal {
        self.line_value() * VAT_FACTOR
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::purchase::Column::Id"
    )]
    Purchase,
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::unit_of_measure::Entity",
        from = "Column::UnitId",
        to = "super::unit_of_measure::Column::Id"
    )]
    UnitOfMeasure,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
