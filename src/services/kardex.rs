use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    entities::{
        activity::{self, Entity as Activity},
        consumable_movement::{self, Entity as ConsumableMovement},
        item::Entity as Item,
        item_unit::{self, Entity as ItemUnit},
        machine::{self, Entity as Machine},
        part_movement::{self, Entity as PartMovement},
        purchase::{self, Entity as Purchase},
        purchase_line::{self, Entity as PurchaseLine},
        work_order::{self, Entity as WorkOrder},
    },
    errors::ServiceError,
};

/// Machine a ledger event is attributable to, via its work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineRef {
    pub id: i32,
    pub code: String,
    pub name: String,
}

/// One kardex ledger row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KardexRow {
    pub timestamp: DateTime<Utc>,
    /// Voucher label for entries, work-order code for exits
    pub reference: String,
    pub opening_qty: Decimal,
    pub entry_qty: Decimal,
    pub exit_qty: Decimal,
    /// Moving average for entries and bulk exits; the unit's own
    /// acquisition cost for discrete exits
    pub unit_cost: Decimal,
    pub closing_qty: Decimal,
    pub closing_cost: Decimal,
    pub machine: Option<MachineRef>,
}

/// How an event affects the running valuation.
enum Effect {
    /// Inbound purchase at a known unit cost
    Entry { unit_cost: Decimal },
    /// Outbound serialized unit at its own acquisition cost
    /// (zero when the unit predates cost tracking)
    ExitSpecific { unit_cost: Decimal },
    /// Outbound bulk quantity at the current moving average
    ExitAverage,
}

struct KardexEvent {
    timestamp: DateTime<Utc>,
    reference: String,
    quantity: Decimal,
    effect: Effect,
    machine: Option<MachineRef>,
}

/// Chronological weighted-average-cost ledger per item: moving average for
/// bulk items, specific identification for serialized units.
#[derive(Clone)]
pub struct KardexService {
    db: Arc<DatabaseConnection>,
}

impl KardexService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn build_kardex(&self, item_id: i32) -> Result<Vec<KardexRow>, ServiceError> {
        let db = &*self.db;

        Item::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Item {} not found", item_id)))?;

        let mut events = Vec::new();
        self.collect_entries(item_id, &mut events).await?;
        self.collect_part_exits(item_id, &mut events).await?;
        self.collect_consumable_exits(item_id, &mut events).await?;

        // Stable sort keeps the collection order as the tiebreak for
        // simultaneous events.
        events.sort_by_key(|e| e.timestamp);

        Ok(replay(events))
    }

    /// Purchases enter the ledger at the start of their purchase date.
    async fn collect_entries(
        &self,
        item_id: i32,
        events: &mut Vec<KardexEvent>,
    ) -> Result<(), ServiceError> {
        let lines = PurchaseLine::find()
            .find_also_related(Purchase)
            .filter(purchase_line::Column::ItemId.eq(item_id))
            .order_by_asc(purchase::Column::PurchaseDate)
            .order_by_asc(purchase_line::Column::Id)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        for (line, header) in lines {
            let Some(header) = header else { continue };
            events.push(KardexEvent {
                timestamp: header.purchase_date.and_time(NaiveTime::MIN).and_utc(),
                reference: header.voucher_label(),
                quantity: line.quantity,
                effect: Effect::Entry {
                    unit_cost: line.unit_cost(),
                },
                machine: None,
            });
        }

        Ok(())
    }

    async fn collect_part_exits(
        &self,
        item_id: i32,
        events: &mut Vec<KardexEvent>,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;

        let movements = PartMovement::find()
            .join(JoinType::InnerJoin, part_movement::Relation::ItemUnit.def())
            .join(JoinType::InnerJoin, part_movement::Relation::Activity.def())
            .filter(item_unit::Column::ItemId.eq(item_id))
            .filter(activity::Column::IsPlanned.eq(false))
            .order_by_asc(part_movement::Column::CreatedAt)
            .order_by_asc(part_movement::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let unit_ids: Vec<i32> = movements.iter().map(|m| m.item_unit_id).collect();
        let units: HashMap<i32, item_unit::Model> = ItemUnit::find()
            .filter(item_unit::Column::Id.is_in(unit_ids.clone()))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let line_ids: Vec<i32> = units
            .values()
            .filter_map(|u| u.purchase_line_id)
            .collect();
        let lines: HashMap<i32, purchase_line::Model> = PurchaseLine::find()
            .filter(purchase_line::Column::Id.is_in(line_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let order_context = self
            .order_context(movements.iter().map(|m| m.activity_id).collect())
            .await?;

        for movement in movements {
            let (reference, machine) = order_context
                .get(&movement.activity_id)
                .cloned()
                .unwrap_or((String::from("OT"), None));

            // A unit with no originating line costs out at zero; it must
            // not disturb the average of cost-tracked stock.
            let unit_cost = units
                .get(&movement.item_unit_id)
                .and_then(|u| u.purchase_line_id)
                .and_then(|line_id| lines.get(&line_id))
                .map(|line| line.unit_cost())
                .unwrap_or(Decimal::ZERO);

            events.push(KardexEvent {
                timestamp: movement.created_at,
                reference,
                quantity: Decimal::ONE,
                effect: Effect::ExitSpecific { unit_cost },
                machine,
            });
        }

        Ok(())
    }

    async fn collect_consumable_exits(
        &self,
        item_id: i32,
        events: &mut Vec<KardexEvent>,
    ) -> Result<(), ServiceError> {
        let movements = ConsumableMovement::find()
            .join(
                JoinType::InnerJoin,
                consumable_movement::Relation::Activity.def(),
            )
            .filter(consumable_movement::Column::ItemId.eq(item_id))
            .filter(activity::Column::IsPlanned.eq(false))
            .order_by_asc(consumable_movement::Column::CreatedAt)
            .order_by_asc(consumable_movement::Column::Id)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let order_context = self
            .order_context(movements.iter().map(|m| m.activity_id).collect())
            .await?;

        for movement in movements {
            let (reference, machine) = order_context
                .get(&movement.activity_id)
                .cloned()
                .unwrap_or((String::from("OT"), None));

            events.push(KardexEvent {
                timestamp: movement.created_at,
                reference,
                quantity: movement.quantity,
                effect: Effect::ExitAverage,
                machine,
            });
        }

        Ok(())
    }

    /// Maps activity ids to their order code and machine.
    async fn order_context(
        &self,
        activity_ids: Vec<i32>,
    ) -> Result<HashMap<i32, (String, Option<MachineRef>)>, ServiceError> {
        let db = &*self.db;

        if activity_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let activities: Vec<activity::Model> = Activity::find()
            .filter(activity::Column::Id.is_in(activity_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let order_ids: Vec<i32> = activities.iter().map(|a| a.work_order_id).collect();
        let orders: HashMap<i32, work_order::Model> = WorkOrder::find()
            .filter(work_order::Column::Id.is_in(order_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();

        let machine_ids: Vec<i32> = orders.values().map(|o| o.machine_id).collect();
        let machines: HashMap<i32, machine::Model> = Machine::find()
            .filter(machine::Column::Id.is_in(machine_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut context = HashMap::new();
        for act in activities {
            let order = orders.get(&act.work_order_id);
            let reference = order
                .map(|o| o.code.clone())
                .unwrap_or_else(|| String::from("OT"));
            let machine = order
                .and_then(|o| machines.get(&o.machine_id))
                .map(|m| MachineRef {
                    id: m.id,
                    code: m.code.clone(),
                    name: m.name.clone(),
                });
            context.insert(act.id, (reference, machine));
        }

        Ok(context)
    }
}

/// Replays the sorted event stream into ledger rows.
fn replay(events: Vec<KardexEvent>) -> Vec<KardexRow> {
    let mut rows = Vec::with_capacity(events.len());
    let mut stock = Decimal::ZERO;
    let mut cost_total = Decimal::ZERO;
    let mut average = Decimal::ZERO;

    for event in events {
        let opening_qty = stock;
        let (entry_qty, exit_qty, row_unit_cost) = match event.effect {
            Effect::Entry { unit_cost } => {
                cost_total += event.quantity * unit_cost;
                stock += event.quantity;
                average = if stock > Decimal::ZERO {
                    cost_total / stock
                } else {
                    Decimal::ZERO
                };
                (event.quantity, Decimal::ZERO, average)
            }
            Effect::ExitSpecific { unit_cost } => {
                cost_total -= unit_cost * event.quantity;
                stock -= event.quantity;
                (Decimal::ZERO, event.quantity, unit_cost)
            }
            Effect::ExitAverage => {
                cost_total -= average * event.quantity;
                stock -= event.quantity;
                (Decimal::ZERO, event.quantity, average)
            }
        };

        rows.push(KardexRow {
            timestamp: event.timestamp,
            reference: event.reference,
            opening_qty,
            entry_qty,
            exit_qty,
            unit_cost: round2(row_unit_cost),
            closing_qty: stock,
            closing_cost: round2(cost_total),
            machine: event.machine,
        });
    }

    rows
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
