// Core services
pub mod kardex;
pub mod locations;
pub mod purchases;
pub mod stock;
pub mod units;

// Consumption and work-order services
pub mod movements;
pub mod work_orders;

// Fleet and catalog services
pub mod items;
pub mod machines;
pub mod workers;
