mod common;

use chrono::{Datelike, NaiveTime, Utc};
use rust_decimal_macros::dec;

use common::{date, seed_machine, setup_state};
use fleetmaint_api::{
    entities::{
        activity::{ActivityType, MaintenanceSubtype, MaintenanceType},
        work_order::{EquipmentState, Priority, WorkOrderStatus},
    },
    errors::ServiceError,
    services::work_orders::{FinalizeWorkOrder, NewActivity, NewWorkOrder},
};

fn order_request(machine_id: i32) -> NewWorkOrder {
    NewWorkOrder {
        machine_id,
        scheduled_date: date(2024, 7, 1),
        priority: Priority::Regular,
        notes: None,
    }
}

#[tokio::test]
async fn order_codes_are_sequential_within_the_year() {
    let state = setup_state("wo_codes").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "LDR-01", "Loader").await;

    let first = state
        .work_orders
        .create_work_order(order_request(machine.id))
        .await
        .expect("first order");
    let second = state
        .work_orders
        .create_work_order(order_request(machine.id))
        .await
        .expect("second order");

    let year = Utc::now().year();
    assert_eq!(first.code, format!("OT-{}-00001", year));
    assert_eq!(second.code, format!("OT-{}-00002", year));
    assert_eq!(first.order_status(), Some(WorkOrderStatus::Pendiente));
}

#[tokio::test]
async fn orders_require_an_existing_machine() {
    let state = setup_state("wo_machine_check").await;

    let err = state
        .work_orders
        .create_work_order(order_request(999))
        .await
        .expect_err("unknown machine must fail");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn maintenance_activities_require_full_typing() {
    let state = setup_state("wo_activity_typing").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "LDR-02", "Loader").await;
    let order = state
        .work_orders
        .create_work_order(order_request(machine.id))
        .await
        .expect("create order");

    let err = state
        .work_orders
        .add_activity(NewActivity {
            work_order_id: order.id,
            activity_type: ActivityType::Mantenimiento,
            maintenance_type: Some(MaintenanceType::Preventivo),
            subtype: None,
            description: None,
            is_planned: false,
        })
        .await
        .expect_err("maintenance without subtype must fail");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let act = state
        .work_orders
        .add_activity(NewActivity {
            work_order_id: order.id,
            activity_type: ActivityType::Mantenimiento,
            maintenance_type: Some(MaintenanceType::Preventivo),
            subtype: Some(MaintenanceSubtype::Pm2),
            description: Some("250h service".to_string()),
            is_planned: false,
        })
        .await
        .expect("well-typed maintenance");
    assert_eq!(act.maintenance_type.as_deref(), Some("PREVENTIVO"));
    assert_eq!(act.subtype.as_deref(), Some("PM2"));
}

#[tokio::test]
async fn revision_activities_shed_maintenance_typing() {
    let state = setup_state("wo_revision").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "LDR-03", "Loader").await;
    let order = state
        .work_orders
        .create_work_order(order_request(machine.id))
        .await
        .expect("create order");

    // Revision with stray maintenance fields: they are dropped, not kept.
    let act = state
        .work_orders
        .add_activity(NewActivity {
            work_order_id: order.id,
            activity_type: ActivityType::Revision,
            maintenance_type: Some(MaintenanceType::Correctivo),
            subtype: Some(MaintenanceSubtype::Grave),
            description: None,
            is_planned: false,
        })
        .await
        .expect("revision is accepted");
    assert!(act.maintenance_type.is_none());
    assert!(act.subtype.is_none());
}

#[tokio::test]
async fn finalize_stamps_closing_data_and_locks_the_order() {
    let state = setup_state("wo_finalize").await;
    let db = state.db.as_ref();

    let machine = seed_machine(db, "LDR-04", "Loader").await;
    let order = state
        .work_orders
        .create_work_order(order_request(machine.id))
        .await
        .expect("create order");

    let close = FinalizeWorkOrder {
        started_time: NaiveTime::from_hms_opt(7, 30, 0).expect("valid time"),
        ended_time: NaiveTime::from_hms_opt(16, 0, 0).expect("valid time"),
        hour_meter: dec!(2450.75),
        equipment_state: EquipmentState::Operativo,
    };

    let closed = state
        .work_orders
        .finalize_work_order(order.id, close)
        .await
        .expect("finalize");

    assert!(closed.is_finalized());
    assert_eq!(closed.equipment_state.as_deref(), Some("OPERATIVO"));
    assert_eq!(
        closed.hour_meter.map(|h| h.round_dp(2)),
        Some(dec!(2450.75))
    );

    let err = state
        .work_orders
        .finalize_work_order(order.id, close)
        .await
        .expect_err("double finalize must fail");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}
