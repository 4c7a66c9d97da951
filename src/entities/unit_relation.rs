use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed conversion edge: 1 base unit = `factor` related units.
///
/// Every write through the conversion service keeps the reverse edge
/// (related → base) in step; rows never exist in one direction only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "unit_relations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dimension_id: i32,
    pub base_unit_id: i32,
    pub related_unit_id: i32,
    #[sea_orm(column_type = "Decimal(Some((30, 12)))")]
    pub factor: Decimal,
    pub active: bool,
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
        from = "Column::BaseUnitId",
        to = "super::unit_of_measure::Column::Id"
    )]
    BaseUnit,
    #[sea_orm(
        belongs_to = "super::unit_of_measure::Entity",
        from = "Column::RelatedUnitId",
        to = "super::unit_of_measure::Column::Id"
    )]
    RelatedUnit,
}

impl Related<super::dimension::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dimension.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
