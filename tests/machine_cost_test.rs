mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use common::{date, seed_exchange_rate, seed_machine, setup_state};
use fleetmaint_api::{
    entities::{
        item::ItemType,
        item_unit::{self, Entity as ItemUnit, UnitState},
        purchase::{Currency, VoucherType},
    },
    services::items::NewItem,
    services::locations::RelocationTarget,
    services::purchases::{CostBasis, NewPurchase, NewPurchaseLine},
    AppState,
};

async fn buy_and_install(
    state: &AppState,
    machine_id: i32,
    code: &str,
    voucher: &str,
    currency: Currency,
    unit_value: rust_decimal::Decimal,
    day: u32,
) -> i32 {
    let item = state
        .items
        .create_item(NewItem {
            code: code.to_string(),
            name: format!("Part {}", code),
            item_type: ItemType::Repuesto,
            dimension_id: None,
            unit_id: None,
        })
        .await
        .expect("create item");

    state
        .purchases
        .intake(NewPurchase {
            voucher_type: VoucherType::Factura,
            voucher_number: voucher.to_string(),
            supplier_id: None,
            currency,
            purchase_date: date(2024, 6, day),
            lines: vec![NewPurchaseLine {
                item_id: item.id,
                quantity: dec!(1),
                unit_id: None,
                currency,
                cost_basis: CostBasis::UnitValue,
                amount: unit_value,
            }],
        })
        .await
        .expect("intake");

    let unit = ItemUnit::find()
        .filter(item_unit::Column::ItemId.eq(item.id))
        .order_by_desc(item_unit::Column::Id)
        .one(state.db.as_ref())
        .await
        .expect("load unit")
        .expect("unit exists");

    state
        .locations
        .relocate(
            unit.id,
            RelocationTarget {
                machine_id: Some(machine_id),
                ..Default::default()
            },
            UnitState::Usado,
        )
        .await
        .expect("install");

    unit.id
}

#[tokio::test]
async fn cost_center_sums_vat_inclusive_costs_in_base_currency() {
    let state = setup_state("cost_center_base").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "DRL-01", "Drill rig").await;

    // 100.00 pre-tax -> 118.00 with VAT, already in PEN.
    buy_and_install(
        &state,
        machine.id,
        "CC-PEN",
        "F030-001",
        Currency::Pen,
        dec!(100.00),
        1,
    )
    .await;

    // 100.00 USD pre-tax -> 118.00 USD, converted at 3.80 on the purchase
    // date -> 448.40 PEN.
    seed_exchange_rate(db, "USD", date(2024, 6, 2), dec!(3.80)).await;
    buy_and_install(
        &state,
        machine.id,
        "CC-USD",
        "F030-002",
        Currency::Usd,
        dec!(100.00),
        2,
    )
    .await;

    let total = state
        .machines
        .cost_center(machine.id)
        .await
        .expect("cost center");
    assert_eq!(total, dec!(566.40));
}

#[tokio::test]
async fn missing_rate_contributes_zero_not_an_error() {
    let state = setup_state("cost_center_missing_rate").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "DRL-02", "Drill rig").await;

    buy_and_install(
        &state,
        machine.id,
        "CC-PEN2",
        "F030-003",
        Currency::Pen,
        dec!(50.00),
        1,
    )
    .await;

    // EUR purchase with no registered rate: listed, but costed at zero in
    // the aggregate.
    buy_and_install(
        &state,
        machine.id,
        "CC-EUR",
        "F030-004",
        Currency::Eur,
        dec!(80.00),
        2,
    )
    .await;

    let inventory = state
        .machines
        .installed_units(machine.id)
        .await
        .expect("inventory");

    assert_eq!(inventory.units.len(), 2);
    // 50.00 * 1.18 = 59.00; the EUR unit contributes nothing.
    assert_eq!(inventory.cost_center, dec!(59.00));

    // The listing still shows each unit's cost in its own currency.
    let eur_unit = inventory
        .units
        .iter()
        .find(|u| u.item_code == "CC-EUR")
        .expect("EUR unit listed");
    assert_eq!(eur_unit.unit_cost, dec!(94.40));
}

#[tokio::test]
async fn only_open_residencies_count() {
    let state = setup_state("cost_center_open_only").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "DRL-03", "Drill rig").await;
    let other = seed_machine(db, "DRL-04", "Second rig").await;

    let unit_id = buy_and_install(
        &state,
        machine.id,
        "CC-MOVE",
        "F030-005",
        Currency::Pen,
        dec!(100.00),
        1,
    )
    .await;

    // The unit moves on to another machine; the first machine's center
    // drops back to zero.
    state
        .locations
        .relocate(
            unit_id,
            RelocationTarget {
                machine_id: Some(other.id),
                ..Default::default()
            },
            UnitState::Usado,
        )
        .await
        .expect("move along");

    let total = state
        .machines
        .cost_center(machine.id)
        .await
        .expect("cost center");
    assert_eq!(total, rust_decimal::Decimal::ZERO);

    let total_other = state
        .machines
        .cost_center(other.id)
        .await
        .expect("cost center");
    assert_eq!(total_other, dec!(118.00));
}
