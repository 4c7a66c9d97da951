use chrono::{NaiveDate, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        item::{self, Entity as Item, ItemType},
        item_unit::{self, UnitState},
        purchase::{self, Currency, Entity as Purchase, VoucherType},
        purchase_line::{self, Entity as PurchaseLine, VAT_FACTOR},
        supplier::Entity as Supplier,
        unit_of_measure::Entity as UnitOfMeasure,
        warehouse::{self, Entity as Warehouse},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::locations::{move_unit_on, Destination},
    services::stock::refresh_stock_on,
};

/// Which of the four amounts the caller supplied for a purchase line.
/// Everything is normalized to the pre-tax unit value at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostBasis {
    /// Pre-tax price per unit
    UnitValue,
    /// Tax-inclusive price per unit
    UnitCost,
    /// Pre-tax line total
    LineTotal,
    /// Tax-inclusive line total
    LineCost,
}

impl CostBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostBasis::UnitValue => "UNIT_VALUE",
            CostBasis::UnitCost => "UNIT_COST",
            CostBasis::LineTotal => "LINE_TOTAL",
            CostBasis::LineCost => "LINE_COST",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "UNIT_VALUE" => Some(CostBasis::UnitValue),
            "UNIT_COST" => Some(CostBasis::UnitCost),
            "LINE_TOTAL" => Some(CostBasis::LineTotal),
            "LINE_COST" => Some(CostBasis::LineCost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchase {
    pub voucher_type: VoucherType,
    pub voucher_number: String,
    pub supplier_id: Option<i32>,
    pub currency: Currency,
    pub purchase_date: NaiveDate,
    pub lines: Vec<NewPurchaseLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchaseLine {
    pub item_id: i32,
    pub quantity: Decimal,
    /// Unit the quantity is expressed in; defaults to the item's unit
    pub unit_id: Option<i32>,
    pub currency: Currency,
    pub cost_basis: CostBasis,
    pub amount: Decimal,
}

/// Average pre-tax price paid to one supplier in one currency.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierPrice {
    pub supplier_id: i32,
    pub supplier_name: String,
    pub supplier_tax_id: String,
    pub currency: String,
    pub average_unit_value: Decimal,
}

/// Ingests purchases: header + lines + minted units + opening locations,
/// all or nothing.
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
    default_warehouse: String,
}

impl PurchaseService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Option<EventSender>,
        default_warehouse: impl Into<String>,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_warehouse: default_warehouse.into(),
        }
    }

    #[instrument(skip(self, new_purchase), fields(voucher = %new_purchase.voucher_number))]
    pub async fn intake(&self, new_purchase: NewPurchase) -> Result<purchase::Model, ServiceError> {
        if new_purchase.lines.is_empty() {
            return Err(ServiceError::validation(
                "a purchase requires at least one line",
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let duplicate = Purchase::find()
            .filter(purchase::Column::VoucherType.eq(new_purchase.voucher_type.as_str()))
            .filter(purchase::Column::VoucherNumber.eq(new_purchase.voucher_number.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::conflict(format!(
                "voucher {} {} already registered",
                new_purchase.voucher_type.as_str(),
                new_purchase.voucher_number
            )));
        }

        if let Some(supplier_id) = new_purchase.supplier_id {
            Supplier::find_by_id(supplier_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::not_found(format!("Supplier {} not found", supplier_id))
                })?;
        }

        let header = purchase::ActiveModel {
            voucher_type: Set(new_purchase.voucher_type.as_str().to_string()),
            voucher_number: Set(new_purchase.voucher_number.clone()),
            supplier_id: Set(new_purchase.supplier_id),
            currency: Set(new_purchase.currency.as_str().to_string()),
            purchase_date: Set(new_purchase.purchase_date),
            ..Default::default()
        };
        let header = header.insert(&txn).await.map_err(ServiceError::db_error)?;

        let intake_warehouse = ensure_warehouse(&txn, &self.default_warehouse).await?;

        // Serialized units enter inventory as of the purchase date, not the
        // moment the voucher was keyed in.
        let opening_time = new_purchase
            .purchase_date
            .and_time(NaiveTime::MIN)
            .and_utc();

        let mut touched_items = BTreeSet::new();
        let mut minted_units = 0usize;

        for line in &new_purchase.lines {
            let item = Item::find_by_id(line.item_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::not_found(format!("Item {} not found", line.item_id))
                })?;

            if line.quantity <= Decimal::ZERO {
                return Err(ServiceError::validation(format!(
                    "quantity for item {} must be positive",
                    item.code
                )));
            }
            if line.amount <= Decimal::ZERO {
                return Err(ServiceError::validation(format!(
                    "amount for item {} must be positive",
                    item.code
                )));
            }

            let unit_id = resolve_line_unit(&txn, &item, line.unit_id).await?;
            let unit_value = derive_unit_value(line.cost_basis, line.amount, line.quantity);

            let persisted_line = purchase_line::ActiveModel {
                purchase_id: Set(header.id),
                item_id: Set(item.id),
                quantity: Set(line.quantity),
                unit_id: Set(unit_id),
                currency: Set(line.currency.as_str().to_string()),
                unit_value: Set(unit_value),
                ..Default::default()
            };
            let persisted_line = persisted_line
                .insert(&txn)
                .await
                .map_err(ServiceError::db_error)?;

            if item.kind() == Some(ItemType::Repuesto) {
                minted_units += mint_units(
                    &txn,
                    &item,
                    &persisted_line,
                    intake_warehouse.id,
                    opening_time,
                )
                .await?;
            }

            touched_items.insert(item.id);
        }

        for item_id in touched_items {
            refresh_stock_on(&txn, item_id).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::PurchaseRecorded {
                    purchase_id: header.id,
                    voucher: header.voucher_label(),
                    line_count: new_purchase.lines.len(),
                    minted_units,
                })
                .await;
        }

        info!(
            "Purchase {} recorded: {} lines, {} units minted",
            header.voucher_label(),
            new_purchase.lines.len(),
            minted_units
        );

        Ok(header)
    }

    /// Average pre-tax unit value per supplier and currency for an item.
    #[instrument(skip(self))]
    pub async fn supplier_price_summary(
        &self,
        item_id: i32,
    ) -> Result<Vec<SupplierPrice>, ServiceError> {
        let db = &*self.db;

        let lines = PurchaseLine::find()
            .find_also_related(Purchase)
            .filter(purchase_line::Column::ItemId.eq(item_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut grouped: std::collections::BTreeMap<(i32, String), Vec<Decimal>> =
            std::collections::BTreeMap::new();
        for (line, header) in lines {
            let Some(header) = header else { continue };
            let Some(supplier_id) = header.supplier_id else {
                continue;
            };
            grouped
                .entry((supplier_id, line.currency.clone()))
                .or_default()
                .push(line.unit_value);
        }

        let mut summary = Vec::with_capacity(grouped.len());
        for ((supplier_id, currency), values) in grouped {
            let supplier = Supplier::find_by_id(supplier_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::not_found(format!("Supplier {} not found", supplier_id))
                })?;

            let total: Decimal = values.iter().copied().sum();
            let average = (total / Decimal::from(values.len() as i64))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

            summary.push(SupplierPrice {
                supplier_id,
                supplier_name: supplier.name,
                supplier_tax_id: supplier.tax_id,
                currency,
                average_unit_value: average,
            });
        }

        Ok(summary)
    }
}

/// Normalizes any of the four supported amounts to the pre-tax unit value,
/// rounded to 2 decimals half-up.
fn derive_unit_value(basis: CostBasis, amount: Decimal, quantity: Decimal) -> Decimal {
    let unit_value = match basis {
        CostBasis::UnitValue => amount,
        CostBasis::UnitCost => amount / VAT_FACTOR,
        CostBasis::LineTotal => amount / quantity,
        CostBasis::LineCost => amount / VAT_FACTOR / quantity,
    };
    unit_value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

async fn resolve_line_unit<C: ConnectionTrait>(
    conn: &C,
    item: &item::Model,
    declared_unit_id: Option<i32>,
) -> Result<i32, ServiceError> {
    match item.kind() {
        Some(ItemType::Repuesto) => {
            let item_unit_id = item.unit_id.ok_or_else(|| {
                ServiceError::validation(format!("item {} has no unit configured", item.code))
            })?;
            if let Some(declared) = declared_unit_id {
                if declared != item_unit_id {
                    return Err(ServiceError::validation(format!(
                        "serialized item {} only accepts its own unit",
                        item.code
                    )));
                }
            }
            Ok(item_unit_id)
        }
        Some(ItemType::Consumible) => match declared_unit_id {
            Some(declared) => {
                let unit = UnitOfMeasure::find_by_id(declared)
                    .one(conn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::not_found(format!("Unit of measure {} not found", declared))
                    })?;
                if let Some(dimension_id) = item.dimension_id {
                    if unit.dimension_id != dimension_id {
                        return Err(ServiceError::validation(format!(
                            "unit {} is outside item {}'s dimension",
                            unit.name, item.code
                        )));
                    }
                }
                Ok(declared)
            }
            None => item.unit_id.ok_or_else(|| {
                ServiceError::validation(format!(
                    "item {} has no unit configured and none was given",
                    item.code
                ))
            }),
        },
        None => Err(ServiceError::validation(format!(
            "Item {} has unknown type {}",
            item.code, item.item_type
        ))),
    }
}

/// Mints one physical unit per purchased count, each with its opening
/// warehouse residence. The serial sequence lives on the item row and is
/// advanced in-database so concurrent intakes cannot collide.
async fn mint_units<C: ConnectionTrait>(
    conn: &C,
    item: &item::Model,
    line: &purchase_line::Model,
    warehouse_id: i32,
    opening_time: chrono::DateTime<chrono::Utc>,
) -> Result<usize, ServiceError> {
    if !line.quantity.fract().is_zero() {
        return Err(ServiceError::validation(format!(
            "serialized item {} requires a whole-number quantity, got {}",
            item.code, line.quantity
        )));
    }
    let count = line.quantity.to_u32().ok_or_else(|| {
        ServiceError::validation(format!(
            "quantity {} for item {} is out of range",
            line.quantity, item.code
        ))
    })?;

    for _ in 0..count {
        Item::update_many()
            .col_expr(
                item::Column::LastSerial,
                Expr::col(item::Column::LastSerial).add(1),
            )
            .filter(item::Column::Id.eq(item.id))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;

        let sequence = Item::find_by_id(item.id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Item {} not found", item.id)))?
            .last_serial;

        let unit = item_unit::ActiveModel {
            item_id: Set(item.id),
            purchase_line_id: Set(Some(line.id)),
            serial: Set(format!("{}-{:05}", item.code, sequence)),
            state: Set(UnitState::Nuevo.as_str().to_string()),
            ..Default::default()
        };
        let unit = unit.insert(conn).await.map_err(ServiceError::db_error)?;

        move_unit_on(
            conn,
            &unit,
            Destination::Warehouse(warehouse_id),
            UnitState::Nuevo,
            opening_time,
            None,
        )
        .await?;
    }

    Ok(count as usize)
}

/// Finds the intake warehouse by name, creating it on first use.
pub(crate) async fn ensure_warehouse<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<warehouse::Model, ServiceError> {
    let existing = Warehouse::find()
        .filter(warehouse::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    match existing {
        Some(found) => Ok(found),
        None => {
            let created = warehouse::ActiveModel {
                name: Set(name.to_string()),
                ..Default::default()
            };
            created.insert(conn).await.map_err(ServiceError::db_error)
        }
    }
}
