mod common;

use chrono::NaiveTime;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use common::{date, seed_dimension, seed_machine, seed_unit, setup_state};
use fleetmaint_api::{
    entities::{
        activity::ActivityType,
        item::ItemType,
        item_unit::{self, Entity as ItemUnit},
        location_history::{self, Entity as LocationHistory},
        purchase::{Currency, VoucherType},
        work_order::{EquipmentState, Priority},
    },
    errors::ServiceError,
    services::items::NewItem,
    services::purchases::{CostBasis, NewPurchase, NewPurchaseLine},
    services::work_orders::{FinalizeWorkOrder, NewActivity, NewWorkOrder},
    AppState,
};

async fn activity_on_new_order(state: &AppState, machine_id: i32, is_planned: bool) -> (i32, i32) {
    let order = state
        .work_orders
        .create_work_order(NewWorkOrder {
            machine_id,
            scheduled_date: date(2024, 5, 1),
            priority: Priority::Regular,
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
            is_planned,
        })
        .await
        .expect("create activity");

    (order.id, act.id)
}

async fn spare_part_with_units(
    state: &AppState,
    code: &str,
    quantity: rust_decimal::Decimal,
) -> (i32, Vec<item_unit::Model>) {
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
            voucher_number: format!("F-{}", code),
            supplier_id: None,
            currency: Currency::Pen,
            purchase_date: date(2024, 4, 1),
            lines: vec![NewPurchaseLine {
                item_id: item.id,
                quantity,
                unit_id: None,
                currency: Currency::Pen,
                cost_basis: CostBasis::UnitValue,
                amount: dec!(75.00),
            }],
        })
        .await
        .expect("intake");

    let units = ItemUnit::find()
        .filter(item_unit::Column::ItemId.eq(item.id))
        .order_by_asc(item_unit::Column::Id)
        .all(state.db.as_ref())
        .await
        .expect("load units");

    (item.id, units)
}

#[tokio::test]
async fn installing_a_unit_seats_it_in_the_machine() {
    let state = setup_state("mov_install").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "EXC-20", "Excavator").await;
    let (item_id, units) = spare_part_with_units(&state, "STR-001", dec!(2)).await;

    let (order_id, activity_id) = activity_on_new_order(&state, machine.id, false).await;

    state
        .movements
        .register_part_movement(activity_id, units[0].id)
        .await
        .expect("install");

    // Factory-new becomes used on installation.
    let installed = ItemUnit::find_by_id(units[0].id)
        .one(db)
        .await
        .expect("reload")
        .expect("exists");
    assert_eq!(installed.state, "USADO");

    let open = LocationHistory::find()
        .filter(location_history::Column::ItemUnitId.eq(units[0].id))
        .filter(location_history::Column::EndedAt.is_null())
        .one(db)
        .await
        .expect("query")
        .expect("open record exists");
    assert_eq!(open.machine_id, Some(machine.id));
    assert_eq!(open.work_order_id, Some(order_id));

    // One unit left the warehouse; the cache follows.
    let item = state.items.get_item(item_id).await.expect("reload item");
    assert_eq!(item.stock.round_dp(2), dec!(1));
}

#[tokio::test]
async fn replacement_retires_the_resident_unit() {
    let state = setup_state("mov_replace").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "EXC-21", "Excavator").await;
    let (item_id, units) = spare_part_with_units(&state, "STR-002", dec!(2)).await;

    let (_, first_activity) = activity_on_new_order(&state, machine.id, false).await;
    state
        .movements
        .register_part_movement(first_activity, units[0].id)
        .await
        .expect("first install");

    // A later order swaps the part: the resident unit goes out of service.
    let (second_order, second_activity) = activity_on_new_order(&state, machine.id, false).await;
    state
        .movements
        .register_part_movement(second_activity, units[1].id)
        .await
        .expect("replacement install");

    let retired = ItemUnit::find_by_id(units[0].id)
        .one(db)
        .await
        .expect("reload")
        .expect("exists");
    assert_eq!(retired.state, "INOPERATIVO");

    // The retired unit stays at the machine, but on a fresh interval tied
    // to the order that retired it.
    let retired_open = LocationHistory::find()
        .filter(location_history::Column::ItemUnitId.eq(units[0].id))
        .filter(location_history::Column::EndedAt.is_null())
        .one(db)
        .await
        .expect("query")
        .expect("open record exists");
    assert_eq!(retired_open.machine_id, Some(machine.id));
    assert_eq!(retired_open.work_order_id, Some(second_order));
    assert_eq!(retired_open.state, "INOPERATIVO");

    let replacement = ItemUnit::find_by_id(units[1].id)
        .one(db)
        .await
        .expect("reload")
        .expect("exists");
    assert_eq!(replacement.state, "USADO");

    // Both units are out of the warehouse now.
    let item = state.items.get_item(item_id).await.expect("reload item");
    assert_eq!(item.stock, rust_decimal::Decimal::ZERO);
}

#[tokio::test]
async fn planned_installation_is_only_a_forecast() {
    let state = setup_state("mov_planned").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "EXC-22", "Excavator").await;
    let (item_id, units) = spare_part_with_units(&state, "STR-003", dec!(1)).await;

    let (_, activity_id) = activity_on_new_order(&state, machine.id, true).await;

    state
        .movements
        .register_part_movement(activity_id, units[0].id)
        .await
        .expect("planned movement");

    // The unit never moved: still NUEVO, still in the warehouse.
    let unit = ItemUnit::find_by_id(units[0].id)
        .one(db)
        .await
        .expect("reload")
        .expect("exists");
    assert_eq!(unit.state, "NUEVO");

    let open = LocationHistory::find()
        .filter(location_history::Column::ItemUnitId.eq(units[0].id))
        .filter(location_history::Column::EndedAt.is_null())
        .one(db)
        .await
        .expect("query")
        .expect("open record exists");
    assert!(open.warehouse_id.is_some());

    let item = state.items.get_item(item_id).await.expect("reload item");
    assert_eq!(item.stock.round_dp(2), dec!(1));
}

#[tokio::test]
async fn finalized_orders_reject_all_consumption() {
    let state = setup_state("mov_finalized").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "EXC-23", "Excavator").await;
    let (_, units) = spare_part_with_units(&state, "STR-004", dec!(1)).await;

    let volumen = seed_dimension(db, "VOLUMEN", "Volumen").await;
    let litro = seed_unit(db, volumen.id, "LITRO", true).await;
    let consumable = state
        .items
        .create_item(NewItem {
            code: "OIL-300".to_string(),
            name: "Oil".to_string(),
            item_type: ItemType::Consumible,
            dimension_id: Some(volumen.id),
            unit_id: Some(litro.id),
        })
        .await
        .expect("create consumable");

    let (order_id, activity_id) = activity_on_new_order(&state, machine.id, false).await;

    state
        .work_orders
        .finalize_work_order(
            order_id,
            FinalizeWorkOrder {
                started_time: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
                ended_time: NaiveTime::from_hms_opt(12, 30, 0).expect("valid time"),
                hour_meter: dec!(1520.5),
                equipment_state: EquipmentState::Operativo,
            },
        )
        .await
        .expect("finalize");

    let err = state
        .movements
        .register_part_movement(activity_id, units[0].id)
        .await
        .expect_err("closed order must reject part movements");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = state
        .movements
        .register_consumable_movement(activity_id, consumable.id, dec!(2), None)
        .await
        .expect_err("closed order must reject consumable movements");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn item_kind_gates_each_movement_api() {
    let state = setup_state("mov_kind_gate").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "EXC-24", "Excavator").await;
    let (spare_item_id, units) = spare_part_with_units(&state, "STR-005", dec!(1)).await;

    let (_, activity_id) = activity_on_new_order(&state, machine.id, false).await;

    // A serialized item cannot be drawn as a consumable.
    let err = state
        .movements
        .register_consumable_movement(activity_id, spare_item_id, dec!(1), None)
        .await
        .expect_err("serialized item must be rejected");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // An out-of-service unit cannot be installed.
    state
        .locations
        .relocate(
            units[0].id,
            fleetmaint_api::services::locations::RelocationTarget {
                machine_id: Some(machine.id),
                ..Default::default()
            },
            item_unit::UnitState::Inoperativo,
        )
        .await
        .expect("retire unit");

    let err = state
        .movements
        .register_part_movement(activity_id, units[0].id)
        .await
        .expect_err("out-of-service unit must be rejected");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
