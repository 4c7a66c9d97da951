use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        activity::{self, ActivityType, MaintenanceSubtype, MaintenanceType},
        machine::Entity as Machine,
        work_order::{self, Entity as WorkOrder, EquipmentState, Priority, WorkOrderStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkOrder {
    pub machine_id: i32,
    pub scheduled_date: NaiveDate,
    pub priority: Priority,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
    pub work_order_id: i32,
    pub activity_type: ActivityType,
    pub maintenance_type: Option<MaintenanceType>,
    pub subtype: Option<MaintenanceSubtype>,
    pub description: Option<String>,
    pub is_planned: bool,
}

/// Everything a work order must carry before it can close.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FinalizeWorkOrder {
    pub started_time: NaiveTime,
    pub ended_time: NaiveTime,
    pub hour_meter: Decimal,
    pub equipment_state: EquipmentState,
}

/// Service for managing work orders
#[derive(Clone)]
pub struct WorkOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl WorkOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a work order with the next `OT-{year}-{seq}` code.
    #[instrument(skip(self))]
    pub async fn create_work_order(
        &self,
        new_order: NewWorkOrder,
    ) -> Result<work_order::Model, ServiceError> {
        let db = &*self.db;

        Machine::find_by_id(new_order.machine_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Machine {} not found", new_order.machine_id))
            })?;

        let code = next_order_code(db).await?;

        let order = work_order::ActiveModel {
            code: Set(code.clone()),
            machine_id: Set(new_order.machine_id),
            scheduled_date: Set(new_order.scheduled_date),
            priority: Set(new_order.priority.as_str().to_string()),
            status: Set(WorkOrderStatus::Pendiente.as_str().to_string()),
            notes: Set(new_order.notes),
            ..Default::default()
        };
        let order = order.insert(db).await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::WorkOrderCreated(order.id)).await;
        }

        info!("Work order {} created", code);
        Ok(order)
    }

    /// Attaches an activity. Revisions carry no maintenance typing;
    /// maintenance requires both type and subtype.
    #[instrument(skip(self))]
    pub async fn add_activity(
        &self,
        new_activity: NewActivity,
    ) -> Result<activity::Model, ServiceError> {
        let db = &*self.db;

        WorkOrder::find_by_id(new_activity.work_order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::not_found(format!(
                    "Work order {} not found",
                    new_activity.work_order_id
                ))
            })?;

        let (maintenance_type, subtype) = match new_activity.activity_type {
            ActivityType::Revision => (None, None),
            ActivityType::Mantenimiento => {
                match (new_activity.maintenance_type, new_activity.subtype) {
                    (Some(mt), Some(st)) => (Some(mt), Some(st)),
                    _ => {
                        return Err(ServiceError::validation(
                            "maintenance activities require a type and a subtype",
                        ))
                    }
                }
            }
        };

        let act = activity::ActiveModel {
            work_order_id: Set(new_activity.work_order_id),
            activity_type: Set(new_activity.activity_type.as_str().to_string()),
            maintenance_type: Set(maintenance_type.map(|m| m.as_str().to_string())),
            subtype: Set(subtype.map(|s| s.as_str().to_string())),
            description: Set(new_activity.description),
            is_planned: Set(new_activity.is_planned),
            ..Default::default()
        };

        act.insert(db).await.map_err(ServiceError::db_error)
    }

    /// Closes a work order. Once finalized it accepts no more consumption.
    #[instrument(skip(self))]
    pub async fn finalize_work_order(
        &self,
        order_id: i32,
        close: FinalizeWorkOrder,
    ) -> Result<work_order::Model, ServiceError> {
        let db = &*self.db;

        let order = WorkOrder::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Work order {} not found", order_id)))?;

        if order.is_finalized() {
            return Err(ServiceError::InvalidOperation(format!(
                "work order {} is already finalized",
                order.code
            )));
        }

        let code = order.code.clone();
        let mut active_order: work_order::ActiveModel = order.into();
        active_order.started_time = Set(Some(close.started_time));
        active_order.ended_time = Set(Some(close.ended_time));
        active_order.hour_meter = Set(Some(close.hour_meter));
        active_order.equipment_state = Set(Some(close.equipment_state.as_str().to_string()));
        active_order.status = Set(WorkOrderStatus::Finalizado.as_str().to_string());

        let updated = active_order
            .update(db)
            .await
            .map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::WorkOrderFinalized(updated.id))
                .await;
        }

        info!("Work order {} finalized", code);
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_work_order(&self, order_id: i32) -> Result<work_order::Model, ServiceError> {
        WorkOrder::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Work order {} not found", order_id)))
    }
}

/// Order codes restart their sequence every calendar year.
async fn next_order_code(db: &DatabaseConnection) -> Result<String, ServiceError> {
    let year = Utc::now().year();
    let prefix = format!("OT-{}-", year);

    // Codes are zero-padded, so the lexicographic maximum is the latest.
    let last = WorkOrder::find()
        .filter(work_order::Column::Code.starts_with(prefix.clone()))
        .order_by_desc(work_order::Column::Code)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?;

    let sequence = match last {
        Some(order) => order
            .code
            .rsplit('-')
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .map(|n| n + 1)
            .ok_or_else(|| {
                ServiceError::InternalError(format!("malformed work order code {}", order.code))
            })?,
        None => 1,
    };

    Ok(format!("{}{:05}", prefix, sequence))
}
