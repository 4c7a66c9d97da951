use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        item_unit::{self, Entity as ItemUnit, UnitState},
        location_history::{self, Entity as LocationHistory},
        machine::Entity as Machine,
        warehouse::Entity as Warehouse,
        worker::Entity as Worker,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Where a serialized unit can reside. Resolved once at the boundary so
/// the rest of the code never re-checks option combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Machine(i32),
    Warehouse(i32),
    Worker(i32),
}

/// Raw caller input: exactly one of the three ids must be present.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RelocationTarget {
    pub machine_id: Option<i32>,
    pub warehouse_id: Option<i32>,
    pub worker_id: Option<i32>,
}

impl RelocationTarget {
    pub fn resolve(&self) -> Result<Destination, ServiceError> {
        match (self.machine_id, self.warehouse_id, self.worker_id) {
            (Some(id), None, None) => Ok(Destination::Machine(id)),
            (None, Some(id), None) => Ok(Destination::Warehouse(id)),
            (None, None, Some(id)) => Ok(Destination::Worker(id)),
            _ => Err(ServiceError::AmbiguousDestination(
                "exactly one of machine, warehouse or worker must be given".to_string(),
            )),
        }
    }
}

/// Append-only ledger of unit residencies with a single open row per unit.
#[derive(Clone)]
pub struct LocationService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl LocationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Moves a unit to a new destination, closing its current open record
    /// and updating its state in the same transaction.
    #[instrument(skip(self))]
    pub async fn relocate(
        &self,
        item_unit_id: i32,
        target: RelocationTarget,
        new_state: UnitState,
    ) -> Result<location_history::Model, ServiceError> {
        let destination = target.resolve()?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let unit = ItemUnit::find_by_id(item_unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Item unit {} not found", item_unit_id))
            })?;

        ensure_destination_exists(&txn, destination).await?;

        let record =
            move_unit_on(&txn, &unit, destination, new_state, Utc::now(), None).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::UnitRelocated {
                    item_unit_id,
                    history_id: record.id,
                })
                .await;
        }

        info!(
            "Unit {} relocated to {:?} as {}",
            unit.serial,
            destination,
            new_state.as_str()
        );

        Ok(record)
    }

    /// Returns the unit's open residence record, if any.
    #[instrument(skip(self))]
    pub async fn current_location(
        &self,
        item_unit_id: i32,
    ) -> Result<Option<location_history::Model>, ServiceError> {
        LocationHistory::find()
            .filter(location_history::Column::ItemUnitId.eq(item_unit_id))
            .filter(location_history::Column::EndedAt.is_null())
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Full residence timeline for every unit of an item, newest first.
    #[instrument(skip(self))]
    pub async fn unit_history(
        &self,
        item_id: i32,
    ) -> Result<Vec<location_history::Model>, ServiceError> {
        LocationHistory::find()
            .join(JoinType::InnerJoin, location_history::Relation::ItemUnit.def())
            .filter(item_unit::Column::ItemId.eq(item_id))
            .order_by_desc(location_history::Column::StartedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }
}

async fn ensure_destination_exists<C: ConnectionTrait>(
    conn: &C,
    destination: Destination,
) -> Result<(), ServiceError> {
    let found = match destination {
        Destination::Machine(id) => Machine::find_by_id(id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .is_some(),
        Destination::Warehouse(id) => Warehouse::find_by_id(id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .is_some(),
        Destination::Worker(id) => Worker::find_by_id(id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .is_some(),
    };

    if found {
        Ok(())
    } else {
        Err(ServiceError::not_found(format!(
            "Destination {:?} not found",
            destination
        )))
    }
}

/// The one atomic transition: close the open record, sync the unit state,
/// open the new record. Callers own the transaction.
pub(crate) async fn move_unit_on<C: ConnectionTrait>(
    conn: &C,
    unit: &item_unit::Model,
    destination: Destination,
    new_state: UnitState,
    started_at: DateTime<Utc>,
    work_order_id: Option<i32>,
) -> Result<location_history::Model, ServiceError> {
    LocationHistory::update_many()
        .col_expr(location_history::Column::EndedAt, Expr::value(Utc::now()))
        .filter(location_history::Column::ItemUnitId.eq(unit.id))
        .filter(location_history::Column::EndedAt.is_null())
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if unit.state != new_state.as_str() {
        let mut active_unit: item_unit::ActiveModel = unit.clone().into();
        active_unit.state = Set(new_state.as_str().to_string());
        active_unit
            .update(conn)
            .await
            .map_err(ServiceError::db_error)?;
    }

    let (machine_id, warehouse_id, worker_id) = match destination {
        Destination::Machine(id) => (Some(id), None, None),
        Destination::Warehouse(id) => (None, Some(id), None),
        Destination::Worker(id) => (None, None, Some(id)),
    };

    let record = location_history::ActiveModel {
        item_unit_id: Set(unit.id),
        machine_id: Set(machine_id),
        warehouse_id: Set(warehouse_id),
        worker_id: Set(worker_id),
        work_order_id: Set(work_order_id),
        state: Set(new_state.as_str().to_string()),
        started_at: Set(started_at),
        ended_at: Set(None),
        ..Default::default()
    };

    record.insert(conn).await.map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_with_single_id_resolves() {
        let target = RelocationTarget {
            warehouse_id: Some(3),
            ..Default::default()
        };
        assert_eq!(target.resolve().unwrap(), Destination::Warehouse(3));
    }

    #[test]
    fn target_with_no_id_is_ambiguous() {
        let err = RelocationTarget::default().resolve().unwrap_err();
        assert!(matches!(err, ServiceError::AmbiguousDestination(_)));
    }

    #[test]
    fn target_with_two_ids_is_ambiguous() {
        let target = RelocationTarget {
            machine_id: Some(1),
            worker_id: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            target.resolve().unwrap_err(),
            ServiceError::AmbiguousDestination(_)
        ));
    }
}
