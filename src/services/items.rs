use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        dimension::{self, Entity as Dimension, CANTIDAD_CODE},
        item::{self, Entity as Item, ItemType},
        unit_of_measure::{self, Entity as UnitOfMeasure, UNIDAD_NAME},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub code: String,
    pub name: String,
    pub item_type: ItemType,
    pub dimension_id: Option<i32>,
    pub unit_id: Option<i32>,
}

/// Catalog service for items. Serialized items are always measured in the
/// canonical CANTIDAD/UNIDAD pair regardless of what the caller sends.
#[derive(Clone)]
pub struct ItemService {
    db: Arc<DatabaseConnection>,
}

impl ItemService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, new_item), fields(code = %new_item.code))]
    pub async fn create_item(&self, new_item: NewItem) -> Result<item::Model, ServiceError> {
        let db = &*self.db;

        let duplicate = Item::find()
            .filter(item::Column::Code.eq(new_item.code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::conflict(format!(
                "item code {} already exists",
                new_item.code
            )));
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let (dimension_id, unit_id) = match new_item.item_type {
            ItemType::Repuesto => {
                let (dim, unit) = canonical_pair_on(&txn).await?;
                (Some(dim.id), Some(unit.id))
            }
            ItemType::Consumible => {
                resolve_measure(&txn, new_item.dimension_id, new_item.unit_id).await?
            }
        };

        let created = item::ActiveModel {
            code: Set(new_item.code.clone()),
            name: Set(new_item.name),
            item_type: Set(new_item.item_type.as_str().to_string()),
            dimension_id: Set(dimension_id),
            unit_id: Set(unit_id),
            stock: Set(Decimal::ZERO),
            last_serial: Set(0),
            ..Default::default()
        };
        let created = created.insert(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            "Item {} created as {}",
            created.code,
            new_item.item_type.as_str()
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: i32) -> Result<item::Model, ServiceError> {
        Item::find_by_id(item_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Item {} not found", item_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_item_by_code(&self, code: &str) -> Result<item::Model, ServiceError> {
        Item::find()
            .filter(item::Column::Code.eq(code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Item {} not found", code)))
    }
}

/// Validates a consumable's dimension/unit combination, deriving the
/// dimension from the unit when only the unit was given.
async fn resolve_measure<C: ConnectionTrait>(
    conn: &C,
    dimension_id: Option<i32>,
    unit_id: Option<i32>,
) -> Result<(Option<i32>, Option<i32>), ServiceError> {
    let Some(unit_id) = unit_id else {
        return Ok((dimension_id, None));
    };

    let unit = UnitOfMeasure::find_by_id(unit_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found(format!("Unit of measure {} not found", unit_id)))?;

    if let Some(declared) = dimension_id {
        if unit.dimension_id != declared {
            return Err(ServiceError::validation(format!(
                "unit {} does not belong to dimension {}",
                unit.name, declared
            )));
        }
    }

    Ok((Some(unit.dimension_id), Some(unit_id)))
}

/// Returns the CANTIDAD dimension and its UNIDAD base unit, creating
/// either on first use.
pub(crate) async fn canonical_pair_on<C: ConnectionTrait>(
    conn: &C,
) -> Result<(dimension::Model, unit_of_measure::Model), ServiceError> {
    let dim = match Dimension::find()
        .filter(dimension::Column::Code.eq(CANTIDAD_CODE))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
    {
        Some(found) => found,
        None => {
            let created = dimension::ActiveModel {
                code: Set(CANTIDAD_CODE.to_string()),
                name: Set("Cantidad".to_string()),
                active: Set(true),
                ..Default::default()
            };
            created.insert(conn).await.map_err(ServiceError::db_error)?
        }
    };

    let unit = match UnitOfMeasure::find()
        .filter(unit_of_measure::Column::DimensionId.eq(dim.id))
        .filter(unit_of_measure::Column::Name.eq(UNIDAD_NAME))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
    {
        Some(found) => found,
        None => {
            let created = unit_of_measure::ActiveModel {
                dimension_id: Set(dim.id),
                name: Set(UNIDAD_NAME.to_string()),
                symbol: Set(Some("und".to_string())),
                is_base: Set(true),
                active: Set(true),
                ..Default::default()
            };
            created.insert(conn).await.map_err(ServiceError::db_error)?
        }
    };

    Ok((dim, unit))
}
