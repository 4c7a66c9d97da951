//! Fleet Maintenance API Library
//!
//! Core engine for maintenance work orders, spare-part and consumable
//! inventory, unit-of-measure conversions and kardex cost accounting.
//! The HTTP surface lives outside this crate and calls in through the
//! services wired up in [`AppState`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::{
    items::ItemService, kardex::KardexService, locations::LocationService,
    machines::MachineService, movements::MovementService, purchases::PurchaseService,
    stock::StockService, units::UnitConversionService, work_orders::WorkOrderService,
    workers::WorkerService,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Option<events::EventSender>,
    pub units: UnitConversionService,
    pub stock: StockService,
    pub locations: LocationService,
    pub purchases: PurchaseService,
    pub kardex: KardexService,
    pub movements: MovementService,
    pub work_orders: WorkOrderService,
    pub machines: MachineService,
    pub items: ItemService,
    pub workers: WorkerService,
}

impl AppState {
    /// Wires every service onto one shared pool. Pass an event sender to
    /// receive domain events; `None` runs the core silently.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Option<events::EventSender>,
    ) -> Self {
        Self {
            units: UnitConversionService::new(db.clone(), event_sender.clone()),
            stock: StockService::new(db.clone(), event_sender.clone()),
            locations: LocationService::new(db.clone(), event_sender.clone()),
            purchases: PurchaseService::new(
                db.clone(),
                event_sender.clone(),
                config.default_warehouse.clone(),
            ),
            kardex: KardexService::new(db.clone()),
            movements: MovementService::new(db.clone(), event_sender.clone()),
            work_orders: WorkOrderService::new(db.clone(), event_sender.clone()),
            machines: MachineService::new(db.clone(), config.base_currency.clone()),
            items: ItemService::new(db.clone()),
            workers: WorkerService::new(db.clone()),
            db,
            config,
            event_sender,
        }
    }
}
