use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the canonical counting unit inside the CANTIDAD dimension.
pub const UNIDAD_NAME: &str = "UNIDAD";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "units_of_measure")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dimension_id: i32,
    pub name: String,
    pub symbol: Option<String>,
    pub is_base: bool,
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
}

impl Related<super::dimension::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dimension.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
