use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        activity::{self, Entity as Activity},
        consumable_movement,
        item::{self, Entity as Item, ItemType},
        item_unit::{self, Entity as ItemUnit, UnitState},
        location_history::{self, Entity as LocationHistory},
        part_movement::{self, Entity as PartMovement},
        unit_of_measure::Entity as UnitOfMeasure,
        work_order::{self, Entity as WorkOrder},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::locations::{move_unit_on, Destination},
    services::stock::refresh_stock_on,
};

/// Registers consumption against work-order activities: serialized unit
/// installations (with the implicit replacement choreography) and bulk
/// consumable draws.
#[derive(Clone)]
pub struct MovementService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl MovementService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Installs a serialized unit into the activity's machine.
    ///
    /// For non-planned activities the machine's current unit of the same
    /// item (if any) is retired in place before the incoming unit takes
    /// over; planned activities only record the forecast movement.
    #[instrument(skip(self))]
    pub async fn register_part_movement(
        &self,
        activity_id: i32,
        item_unit_id: i32,
    ) -> Result<part_movement::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let (act, order) = load_open_activity(&txn, activity_id).await?;

        let unit = ItemUnit::find_by_id(item_unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Item unit {} not found", item_unit_id))
            })?;

        let unit_item = Item::find_by_id(unit.item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Item {} not found", unit.item_id)))?;

        if unit_item.kind() != Some(ItemType::Repuesto) {
            return Err(ServiceError::validation(format!(
                "item {} is not serialized; use a consumable movement",
                unit_item.code
            )));
        }

        let state = unit.unit_state().ok_or_else(|| {
            ServiceError::validation(format!("unit {} has unknown state {}", unit.serial, unit.state))
        })?;
        if state == UnitState::Inoperativo {
            return Err(ServiceError::validation(format!(
                "unit {} is out of service and cannot be installed",
                unit.serial
            )));
        }

        if !act.is_planned {
            self.install_with_replacement(&txn, &act, &order, &unit, &unit_item, state)
                .await?;
        }

        let movement = part_movement::ActiveModel {
            activity_id: Set(act.id),
            item_unit_id: Set(unit.id),
            ..Default::default()
        };
        let movement = movement.insert(&txn).await.map_err(ServiceError::db_error)?;

        refresh_stock_on(&txn, unit_item.id).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::PartMovementRecorded {
                    activity_id: act.id,
                    item_unit_id: unit.id,
                })
                .await;
        }

        info!(
            "Unit {} consumed by activity {} on order {}",
            unit.serial, act.id, order.code
        );

        Ok(movement)
    }

    /// Records a bulk consumable draw.
    #[instrument(skip(self))]
    pub async fn register_consumable_movement(
        &self,
        activity_id: i32,
        item_id: i32,
        quantity: Decimal,
        unit_id: Option<i32>,
    ) -> Result<consumable_movement::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let (act, order) = load_open_activity(&txn, activity_id).await?;

        let target_item = Item::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Item {} not found", item_id)))?;

        if target_item.kind() != Some(ItemType::Consumible) {
            return Err(ServiceError::validation(format!(
                "item {} is serialized; use a part movement",
                target_item.code
            )));
        }

        if quantity <= Decimal::ZERO {
            return Err(ServiceError::validation(
                "consumed quantity must be positive",
            ));
        }

        if let Some(declared) = unit_id {
            let unit = UnitOfMeasure::find_by_id(declared)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::not_found(format!("Unit of measure {} not found", declared))
                })?;
            if let Some(dimension_id) = target_item.dimension_id {
                if unit.dimension_id != dimension_id {
                    return Err(ServiceError::validation(format!(
                        "unit {} is outside item {}'s dimension",
                        unit.name, target_item.code
                    )));
                }
            }
        }

        let movement = consumable_movement::ActiveModel {
            activity_id: Set(act.id),
            item_id: Set(target_item.id),
            quantity: Set(quantity),
            unit_id: Set(unit_id),
            ..Default::default()
        };
        let movement = movement.insert(&txn).await.map_err(ServiceError::db_error)?;

        refresh_stock_on(&txn, target_item.id).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ConsumableMovementRecorded {
                    activity_id: act.id,
                    item_id: target_item.id,
                    quantity,
                })
                .await;
        }

        info!(
            "{} of item {} consumed by activity {} on order {}",
            quantity, target_item.code, act.id, order.code
        );

        Ok(movement)
    }

    /// Retires the machine's oldest resident unit of the same item (if one
    /// exists outside this activity), then seats the incoming unit.
    async fn install_with_replacement<C: ConnectionTrait>(
        &self,
        conn: &C,
        act: &activity::Model,
        order: &work_order::Model,
        unit: &item_unit::Model,
        unit_item: &item::Model,
        state: UnitState,
    ) -> Result<(), ServiceError> {
        let machine_id = order.machine_id;

        let already_moved: Vec<i32> = PartMovement::find()
            .filter(part_movement::Column::ActivityId.eq(act.id))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|m| m.item_unit_id)
            .collect();

        let mut resident_query = LocationHistory::find()
            .join(JoinType::InnerJoin, location_history::Relation::ItemUnit.def())
            .filter(location_history::Column::MachineId.eq(machine_id))
            .filter(location_history::Column::EndedAt.is_null())
            .filter(item_unit::Column::ItemId.eq(unit_item.id));
        if !already_moved.is_empty() {
            resident_query = resident_query
                .filter(location_history::Column::ItemUnitId.is_not_in(already_moved));
        }
        let resident = resident_query
            .order_by_asc(location_history::Column::StartedAt)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;

        if let Some(resident) = resident {
            let old_unit = ItemUnit::find_by_id(resident.item_unit_id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::not_found(format!(
                        "Item unit {} not found",
                        resident.item_unit_id
                    ))
                })?;

            move_unit_on(
                conn,
                &old_unit,
                Destination::Machine(machine_id),
                UnitState::Inoperativo,
                Utc::now(),
                Some(order.id),
            )
            .await?;
        }

        // A factory-new unit becomes used the moment it is installed.
        let installed_state = if state == UnitState::Nuevo {
            UnitState::Usado
        } else {
            state
        };

        move_unit_on(
            conn,
            unit,
            Destination::Machine(machine_id),
            installed_state,
            Utc::now(),
            Some(order.id),
        )
        .await?;

        Ok(())
    }
}

/// Loads an activity and its order, rejecting consumption on closed orders.
async fn load_open_activity<C: ConnectionTrait>(
    conn: &C,
    activity_id: i32,
) -> Result<(activity::Model, work_order::Model), ServiceError> {
    let act = Activity::find_by_id(activity_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found(format!("Activity {} not found", activity_id)))?;

    let order = WorkOrder::find_by_id(act.work_order_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::not_found(format!("Work order {} not found", act.work_order_id))
        })?;

    if order.is_finalized() {
        return Err(ServiceError::validation(format!(
            "work order {} is finalized; no further consumption can be registered",
            order.code
        )));
    }

    Ok((act, order))
}
