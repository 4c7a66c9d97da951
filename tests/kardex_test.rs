mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use common::{date, seed_dimension, seed_machine, seed_unit, setup_state};
use fleetmaint_api::{
    entities::{
        activity::ActivityType,
        item::ItemType,
        item_unit::{self, Entity as ItemUnit},
        purchase::{Currency, VoucherType},
        work_order::Priority,
    },
    services::items::NewItem,
    services::purchases::{CostBasis, NewPurchase, NewPurchaseLine},
    services::work_orders::{NewActivity, NewWorkOrder},
    AppState,
};

async fn non_planned_activity(state: &AppState, machine_id: i32) -> (i32, String) {
    let order = state
        .work_orders
        .create_work_order(NewWorkOrder {
            machine_id,
            scheduled_date: date(2024, 3, 15),
            priority: Priority::Urgente,
            notes: None,
        })
        .await
        .expect("create order");

    let act = state
        .work_orders
        .add_activity(NewActivity {
            work_order_id: order.id,
            activity_type: ActivityType::Revision,
            maintenance_type: None,
            subtype: None,
            description: None,
            is_planned: false,
        })
        .await
        .expect("create activity");

    (act.id, order.code)
}

fn one_line_purchase(
    item_id: i32,
    quantity: rust_decimal::Decimal,
    amount: rust_decimal::Decimal,
    voucher: &str,
    day: u32,
) -> NewPurchase {
    NewPurchase {
        voucher_type: VoucherType::Factura,
        voucher_number: voucher.to_string(),
        supplier_id: None,
        currency: Currency::Pen,
        purchase_date: date(2024, 3, day),
        lines: vec![NewPurchaseLine {
            item_id,
            quantity,
            unit_id: None,
            currency: Currency::Pen,
            cost_basis: CostBasis::UnitValue,
            amount,
        }],
    }
}

#[tokio::test]
async fn first_entry_row_carries_vat_inclusive_cost() {
    let state = setup_state("kardex_first_entry").await;
    let db = state.db.as_ref();

    let volumen = seed_dimension(db, "VOLUMEN", "Volumen").await;
    let litro = seed_unit(db, volumen.id, "LITRO", true).await;

    let item = state
        .items
        .create_item(NewItem {
            code: "OIL-200".to_string(),
            name: "Motor oil".to_string(),
            item_type: ItemType::Consumible,
            dimension_id: Some(volumen.id),
            unit_id: Some(litro.id),
        })
        .await
        .expect("create item");

    state
        .purchases
        .intake(one_line_purchase(item.id, dec!(10), dec!(5.00), "F020-001", 1))
        .await
        .expect("intake");

    let rows = state.kardex.build_kardex(item.id).await.expect("kardex");

    assert_eq!(rows.len(), 1);
    let first = &rows[0];
    assert_eq!(first.opening_qty, dec!(0));
    assert_eq!(first.entry_qty.round_dp(2), dec!(10));
    assert_eq!(first.exit_qty, dec!(0));
    assert_eq!(first.unit_cost, dec!(5.90));
    assert_eq!(first.closing_qty.round_dp(2), dec!(10));
    assert_eq!(first.closing_cost, dec!(59.00));
    assert_eq!(first.reference, "FACTURA F020-001");
    assert!(first.machine.is_none());
}

#[tokio::test]
async fn bulk_exits_cost_at_the_moving_average() {
    let state = setup_state("kardex_bulk_exit").await;
    let db = state.db.as_ref();

    let volumen = seed_dimension(db, "VOLUMEN", "Volumen").await;
    let litro = seed_unit(db, volumen.id, "LITRO", true).await;
    let machine = seed_machine(db, "TRK-01", "Dump truck").await;

    let item = state
        .items
        .create_item(NewItem {
            code: "OIL-201".to_string(),
            name: "Gear oil".to_string(),
            item_type: ItemType::Consumible,
            dimension_id: Some(volumen.id),
            unit_id: Some(litro.id),
        })
        .await
        .expect("create item");

    // Two entries at different prices: average lands between them.
    state
        .purchases
        .intake(one_line_purchase(item.id, dec!(10), dec!(10.00), "F020-002", 1))
        .await
        .expect("first intake");
    state
        .purchases
        .intake(one_line_purchase(item.id, dec!(10), dec!(20.00), "F020-003", 2))
        .await
        .expect("second intake");

    let (activity_id, order_code) = non_planned_activity(&state, machine.id).await;
    state
        .movements
        .register_consumable_movement(activity_id, item.id, dec!(4), None)
        .await
        .expect("consume");

    let rows = state.kardex.build_kardex(item.id).await.expect("kardex");
    assert_eq!(rows.len(), 3);

    // Average after both entries: (10*11.80 + 10*23.60) / 20 = 17.70
    assert_eq!(rows[1].unit_cost, dec!(17.70));

    let exit = &rows[2];
    assert_eq!(exit.opening_qty.round_dp(2), dec!(20));
    assert_eq!(exit.exit_qty.round_dp(2), dec!(4));
    assert_eq!(exit.unit_cost, dec!(17.70));
    assert_eq!(exit.closing_qty.round_dp(2), dec!(16));
    // 354.00 - 4 * 17.70 = 283.20
    assert_eq!(exit.closing_cost, dec!(283.20));
    assert_eq!(exit.reference, order_code);
    let machine_ref = exit.machine.as_ref().expect("exit is tied to a machine");
    assert_eq!(machine_ref.code, "TRK-01");
}

#[tokio::test]
async fn serialized_exits_use_the_units_own_cost() {
    let state = setup_state("kardex_specific_cost").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "TRK-02", "Dump truck").await;

    let item = state
        .items
        .create_item(NewItem {
            code: "ALT-001".to_string(),
            name: "Alternator".to_string(),
            item_type: ItemType::Repuesto,
            dimension_id: None,
            unit_id: None,
        })
        .await
        .expect("create item");

    // Batch one at 100.00 pre-tax, batch two at 200.00 pre-tax.
    state
        .purchases
        .intake(one_line_purchase(item.id, dec!(2), dec!(100.00), "F020-004", 1))
        .await
        .expect("first intake");
    state
        .purchases
        .intake(one_line_purchase(item.id, dec!(2), dec!(200.00), "F020-005", 2))
        .await
        .expect("second intake");

    // Pick a unit minted by the second (expensive) batch.
    let expensive_unit = ItemUnit::find()
        .filter(item_unit::Column::ItemId.eq(item.id))
        .order_by_desc(item_unit::Column::Id)
        .one(db)
        .await
        .expect("load unit")
        .expect("unit exists");

    let (activity_id, _) = non_planned_activity(&state, machine.id).await;
    state
        .movements
        .register_part_movement(activity_id, expensive_unit.id)
        .await
        .expect("install unit");

    let rows = state.kardex.build_kardex(item.id).await.expect("kardex");
    assert_eq!(rows.len(), 3);

    // Moving average would be 177.00; specific identification says 236.00.
    let exit = &rows[2];
    assert_eq!(exit.exit_qty.round_dp(2), dec!(1));
    assert_eq!(exit.unit_cost, dec!(236.00));
    // 708.00 - 236.00
    assert_eq!(exit.closing_cost, dec!(472.00));
    assert_eq!(exit.closing_qty.round_dp(2), dec!(3));
}

#[tokio::test]
async fn planned_consumption_never_reaches_the_ledger() {
    let state = setup_state("kardex_planned").await;
    let db = state.db.as_ref();

    let volumen = seed_dimension(db, "VOLUMEN", "Volumen").await;
    let litro = seed_unit(db, volumen.id, "LITRO", true).await;
    let machine = seed_machine(db, "TRK-03", "Dump truck").await;

    let item = state
        .items
        .create_item(NewItem {
            code: "OIL-202".to_string(),
            name: "Brake fluid".to_string(),
            item_type: ItemType::Consumible,
            dimension_id: Some(volumen.id),
            unit_id: Some(litro.id),
        })
        .await
        .expect("create item");

    state
        .purchases
        .intake(one_line_purchase(item.id, dec!(8), dec!(12.00), "F020-006", 1))
        .await
        .expect("intake");

    let order = state
        .work_orders
        .create_work_order(NewWorkOrder {
            machine_id: machine.id,
            scheduled_date: date(2024, 4, 1),
            priority: Priority::Regular,
            notes: None,
        })
        .await
        .expect("create order");
    let planned = state
        .work_orders
        .add_activity(NewActivity {
            work_order_id: order.id,
            activity_type: ActivityType::Revision,
            maintenance_type: None,
            subtype: None,
            description: None,
            is_planned: true,
        })
        .await
        .expect("create activity");

    state
        .movements
        .register_consumable_movement(planned.id, item.id, dec!(3), None)
        .await
        .expect("planned consumption");

    let rows = state.kardex.build_kardex(item.id).await.expect("kardex");
    // Only the purchase row: the forecast draw is invisible to valuation.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].closing_qty.round_dp(2), dec!(8));
}
