use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::{
    entities::{
        exchange_rate::{self, Entity as ExchangeRate},
        item::{self, Entity as Item},
        item_unit::{self, Entity as ItemUnit},
        location_history::{self, Entity as LocationHistory},
        machine::Entity as Machine,
        purchase::{self, Entity as Purchase},
        purchase_line::{self, Entity as PurchaseLine},
    },
    errors::ServiceError,
};

/// One serialized unit currently seated in a machine.
#[derive(Debug, Clone, Serialize)]
pub struct InstalledUnit {
    pub item_unit_id: i32,
    pub item_code: String,
    pub item_name: String,
    pub serial: String,
    /// Unit state as recorded on the open residence interval
    pub state: String,
    /// Acquisition cost with VAT in the purchase currency; zero when the
    /// unit has no originating purchase line
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MachineInventory {
    pub machine_id: i32,
    pub machine_code: String,
    pub machine_name: String,
    pub units: Vec<InstalledUnit>,
    /// Sum of acquisition costs converted to the base currency
    pub cost_center: Decimal,
}

/// Reports what a machine currently holds and what that inventory cost.
#[derive(Clone)]
pub struct MachineService {
    db: Arc<DatabaseConnection>,
    base_currency: String,
}

impl MachineService {
    pub fn new(db: Arc<DatabaseConnection>, base_currency: impl Into<String>) -> Self {
        Self {
            db,
            base_currency: base_currency.into(),
        }
    }

    /// Total acquisition cost of the units currently in the machine,
    /// converted to the base currency with the exchange rate of each
    /// purchase date. Missing rates contribute zero instead of failing:
    /// the aggregate is informational and must stay available.
    #[instrument(skip(self))]
    pub async fn cost_center(&self, machine_id: i32) -> Result<Decimal, ServiceError> {
        let inventory = self.installed_units(machine_id).await?;
        Ok(inventory.cost_center)
    }

    /// Lists the machine's resident units with their acquisition costs.
    #[instrument(skip(self))]
    pub async fn installed_units(
        &self,
        machine_id: i32,
    ) -> Result<MachineInventory, ServiceError> {
        let db = &*self.db;

        let found_machine = Machine::find_by_id(machine_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Machine {} not found", machine_id)))?;

        let residences = LocationHistory::find()
            .filter(location_history::Column::MachineId.eq(machine_id))
            .filter(location_history::Column::EndedAt.is_null())
            .order_by_asc(location_history::Column::StartedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let unit_ids: Vec<i32> = residences.iter().map(|r| r.item_unit_id).collect();
        let units: HashMap<i32, item_unit::Model> = ItemUnit::find()
            .filter(item_unit::Column::Id.is_in(unit_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let item_ids: Vec<i32> = units.values().map(|u| u.item_id).collect();
        let items: HashMap<i32, item::Model> = Item::find()
            .filter(item::Column::Id.is_in(item_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let line_ids: Vec<i32> = units.values().filter_map(|u| u.purchase_line_id).collect();
        let lines: HashMap<i32, purchase_line::Model> = PurchaseLine::find()
            .filter(purchase_line::Column::Id.is_in(line_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let purchase_ids: Vec<i32> = lines.values().map(|l| l.purchase_id).collect();
        let purchases: HashMap<i32, purchase::Model> = Purchase::find()
            .filter(purchase::Column::Id.is_in(purchase_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut listed = Vec::with_capacity(residences.len());
        let mut cost_center = Decimal::ZERO;

        for residence in residences {
            let Some(unit) = units.get(&residence.item_unit_id) else {
                continue;
            };
            let Some(owning_item) = items.get(&unit.item_id) else {
                continue;
            };

            let line = unit.purchase_line_id.and_then(|id| lines.get(&id));
            let unit_cost = line.map(|l| l.unit_cost()).unwrap_or(Decimal::ZERO);

            if let Some(line) = line {
                cost_center += self
                    .cost_in_base_currency(line, purchases.get(&line.purchase_id))
                    .await?;
            }

            listed.push(InstalledUnit {
                item_unit_id: unit.id,
                item_code: owning_item.code.clone(),
                item_name: owning_item.name.clone(),
                serial: unit.serial.clone(),
                state: residence.state,
                unit_cost: round2(unit_cost),
            });
        }

        Ok(MachineInventory {
            machine_id: found_machine.id,
            machine_code: found_machine.code,
            machine_name: found_machine.name,
            units: listed,
            cost_center: round2(cost_center),
        })
    }

    /// Converts one line's unit cost to the base currency using the rate
    /// dated on the purchase. A missing rate is logged and contributes
    /// zero; the rest of the aggregate survives.
    async fn cost_in_base_currency(
        &self,
        line: &purchase_line::Model,
        header: Option<&purchase::Model>,
    ) -> Result<Decimal, ServiceError> {
        let cost = line.unit_cost();

        if line.currency == self.base_currency {
            return Ok(cost);
        }

        let Some(header) = header else {
            return Ok(Decimal::ZERO);
        };

        let rate = ExchangeRate::find()
            .filter(exchange_rate::Column::Currency.eq(line.currency.clone()))
            .filter(exchange_rate::Column::RateDate.eq(header.purchase_date))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        match rate {
            Some(rate) => Ok(cost * rate.rate),
            None => {
                warn!(
                    "No {} rate for {}; purchase line {} contributes zero to the cost center",
                    line.currency, header.purchase_date, line.id
                );
                Ok(Decimal::ZERO)
            }
        }
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
