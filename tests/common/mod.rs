#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;

use fleetmaint_api::{
    config::AppConfig,
    db::run_migrations,
    entities::{dimension, exchange_rate, machine, supplier, unit_of_measure, warehouse},
    AppState,
};

pub const TEST_WAREHOUSE: &str = "Central Warehouse";

/// Connects to a private in-memory SQLite database and applies the
/// embedded migrations. A single pooled connection keeps the database
/// alive for the duration of the test and isolates parallel tests from
/// each other. The name only labels the pool for debugging.
pub async fn setup_db(_name: &str) -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("Failed to connect to test database");

    run_migrations(&db)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        environment: "test".to_string(),
        log_level: "warn".to_string(),
        log_json: false,
        auto_migrate: true,
        default_warehouse: TEST_WAREHOUSE.to_string(),
        base_currency: "PEN".to_string(),
        db_max_connections: 5,
        db_min_connections: 1,
        db_connect_timeout_secs: 30,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 8,
    }
}

/// Full service graph over a fresh test database, no event consumer.
pub async fn setup_state(name: &str) -> AppState {
    let db = Arc::new(setup_db(name).await);
    AppState::new(db, test_config(), None)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

// Seed helpers

pub async fn seed_dimension(db: &DatabaseConnection, code: &str, name: &str) -> dimension::Model {
    dimension::ActiveModel {
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed dimension")
}

pub async fn seed_unit(
    db: &DatabaseConnection,
    dimension_id: i32,
    name: &str,
    is_base: bool,
) -> unit_of_measure::Model {
    unit_of_measure::ActiveModel {
        dimension_id: Set(dimension_id),
        name: Set(name.to_string()),
        symbol: Set(None),
        is_base: Set(is_base),
        active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed unit of measure")
}

pub async fn seed_machine(db: &DatabaseConnection, code: &str, name: &str) -> machine::Model {
    machine::ActiveModel {
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed machine")
}

pub async fn seed_warehouse(db: &DatabaseConnection, name: &str) -> warehouse::Model {
    warehouse::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed warehouse")
}

pub async fn seed_supplier(db: &DatabaseConnection, name: &str, tax_id: &str) -> supplier::Model {
    supplier::ActiveModel {
        name: Set(name.to_string()),
        tax_id: Set(tax_id.to_string()),
        address: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed supplier")
}

pub async fn seed_exchange_rate(
    db: &DatabaseConnection,
    currency: &str,
    rate_date: NaiveDate,
    rate: rust_decimal::Decimal,
) -> exchange_rate::Model {
    exchange_rate::ActiveModel {
        currency: Set(currency.to_string()),
        rate_date: Set(rate_date),
        rate: Set(rate),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed exchange rate")
}
