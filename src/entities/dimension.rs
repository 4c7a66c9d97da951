use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Code of the canonical counting dimension serialized items live in.
pub const CANTIDAD_CODE: &str = "CANTIDAD";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dimensions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub name: String,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::unit_of_measure::Entity")]
    UnitsOfMeasure,
}

impl Related<super::unit_of_measure::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnitsOfMeasure.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
