use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QuerySelect, RelationTrait,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    entities::{
        activity,
        consumable_movement::{self, Entity as ConsumableMovement},
        dimension::{Entity as Dimension, CANTIDAD_CODE},
        item::{self, Entity as Item, ItemType},
        item_unit::{self, Entity as ItemUnit, UnitState},
        location_history::{self, Entity as LocationHistory},
        part_movement::{self, Entity as PartMovement},
        purchase_line::{self, Entity as PurchaseLine},
        unit_of_measure::{Entity as UnitOfMeasure, UNIDAD_NAME},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::units::conversion_factor_on,
};

/// How an item's stock is derived; decided once per computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StockModel {
    /// Serialized item counted by physical units sitting in a warehouse
    SerializedCanonical,
    /// Serialized item on a non-canonical unit: purchases minus draws
    SerializedLegacy,
    /// Bulk item: converted purchases minus converted draws
    Bulk,
}

/// Computes current stock per item and memoizes it on the item row.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Recomputes the item's stock, persisting the cached value when it
    /// changed. Reading twice without intervening writes is a no-op.
    #[instrument(skip(self))]
    pub async fn compute_stock(&self, item_id: i32) -> Result<Decimal, ServiceError> {
        let (stock, changed) = refresh_stock_on(&*self.db, item_id).await?;

        if changed {
            if let Some(sender) = &self.event_sender {
                sender
                    .send_or_log(Event::StockRecalculated { item_id, stock })
                    .await;
            }
        }

        Ok(stock)
    }
}

/// Recomputes stock on the given connection, updating the cached column
/// only when the value drifted. Returns `(stock, changed)`.
pub(crate) async fn refresh_stock_on<C: ConnectionTrait>(
    conn: &C,
    item_id: i32,
) -> Result<(Decimal, bool), ServiceError> {
    let item = Item::find_by_id(item_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found(format!("Item {} not found", item_id)))?;

    let stock = compute_stock_on(conn, &item).await?;

    let changed = stock != item.stock;
    if changed {
        debug!(
            "Stock cache for item {} drifted: {} -> {}",
            item.code, item.stock, stock
        );
        let mut active_item: item::ActiveModel = item.into();
        active_item.stock = Set(stock);
        active_item
            .update(conn)
            .await
            .map_err(ServiceError::db_error)?;
    }

    Ok((stock, changed))
}

pub(crate) async fn compute_stock_on<C: ConnectionTrait>(
    conn: &C,
    item: &item::Model,
) -> Result<Decimal, ServiceError> {
    let stock = match classify(conn, item).await? {
        StockModel::SerializedCanonical => serialized_canonical_stock(conn, item).await?,
        StockModel::SerializedLegacy => serialized_legacy_stock(conn, item).await?,
        StockModel::Bulk => bulk_stock(conn, item).await?,
    };

    Ok(stock.max(Decimal::ZERO))
}

async fn classify<C: ConnectionTrait>(
    conn: &C,
    item: &item::Model,
) -> Result<StockModel, ServiceError> {
    match item.kind() {
        Some(ItemType::Consumible) => Ok(StockModel::Bulk),
        Some(ItemType::Repuesto) => {
            let canonical = match item.unit_id {
                None => true,
                Some(unit_id) => {
                    let unit = UnitOfMeasure::find_by_id(unit_id)
                        .one(conn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::not_found(format!("Unit of measure {} not found", unit_id))
                        })?;
                    let dimension = Dimension::find_by_id(unit.dimension_id)
                        .one(conn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::not_found(format!(
                                "Dimension {} not found",
                                unit.dimension_id
                            ))
                        })?;
                    dimension.code == CANTIDAD_CODE && unit.name == UNIDAD_NAME
                }
            };
            if canonical {
                Ok(StockModel::SerializedCanonical)
            } else {
                Ok(StockModel::SerializedLegacy)
            }
        }
        None => Err(ServiceError::validation(format!(
            "Item {} has unknown type {}",
            item.code, item.item_type
        ))),
    }
}

/// Physical count: operable units whose open residence is a warehouse.
async fn serialized_canonical_stock<C: ConnectionTrait>(
    conn: &C,
    item: &item::Model,
) -> Result<Decimal, ServiceError> {
    let unit_ids: Vec<i32> = ItemUnit::find()
        .filter(item_unit::Column::ItemId.eq(item.id))
        .filter(item_unit::Column::State.ne(UnitState::Inoperativo.as_str()))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|u| u.id)
        .collect();

    if unit_ids.is_empty() {
        return Ok(Decimal::ZERO);
    }

    // At most one open record per unit, so the row count is the unit count.
    let count = LocationHistory::find()
        .filter(location_history::Column::ItemUnitId.is_in(unit_ids))
        .filter(location_history::Column::EndedAt.is_null())
        .filter(location_history::Column::WarehouseId.is_not_null())
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(Decimal::from(count))
}

/// Legacy serialized items share one sequence, so no conversion applies:
/// total purchased minus actual draws.
async fn serialized_legacy_stock<C: ConnectionTrait>(
    conn: &C,
    item: &item::Model,
) -> Result<Decimal, ServiceError> {
    let purchased: Decimal = PurchaseLine::find()
        .filter(purchase_line::Column::ItemId.eq(item.id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .iter()
        .map(|line| line.quantity)
        .sum();

    let consumed = PartMovement::find()
        .join(JoinType::InnerJoin, part_movement::Relation::ItemUnit.def())
        .join(JoinType::InnerJoin, part_movement::Relation::Activity.def())
        .filter(item_unit::Column::ItemId.eq(item.id))
        .filter(activity::Column::IsPlanned.eq(false))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(purchased - Decimal::from(consumed))
}

/// Bulk stock in the item's own unit: converted inflow minus converted
/// non-planned outflow. A missing conversion edge fails the whole
/// computation rather than silently skipping the line.
async fn bulk_stock<C: ConnectionTrait>(
    conn: &C,
    item: &item::Model,
) -> Result<Decimal, ServiceError> {
    let mut total = Decimal::ZERO;

    let lines = PurchaseLine::find()
        .filter(purchase_line::Column::ItemId.eq(item.id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    for line in lines {
        total += convert_quantity(conn, line.quantity, Some(line.unit_id), item).await?;
    }

    let movements = ConsumableMovement::find()
        .join(
            JoinType::InnerJoin,
            consumable_movement::Relation::Activity.def(),
        )
        .filter(consumable_movement::Column::ItemId.eq(item.id))
        .filter(activity::Column::IsPlanned.eq(false))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    for movement in movements {
        total -= convert_quantity(conn, movement.quantity, movement.unit_id, item).await?;
    }

    Ok(total)
}

async fn convert_quantity<C: ConnectionTrait>(
    conn: &C,
    quantity: Decimal,
    from_unit_id: Option<i32>,
    item: &item::Model,
) -> Result<Decimal, ServiceError> {
    let (from, to) = match (from_unit_id, item.unit_id) {
        // No unit recorded, or no target unit: the quantity is already in
        // the item's terms.
        (None, _) | (_, None) => return Ok(quantity),
        (Some(from), Some(to)) => (from, to),
    };

    if from == to {
        return Ok(quantity);
    }

    let factor = conversion_factor_on(conn, from, to).await?;
    Ok(quantity * factor)
}
