use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// Handle services use to publish domain events after commit.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when no consumer is
    /// attached. Events are notifications, never part of the transaction.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Unit conversion graph events
    UnitRelationUpserted {
        relation_id: i32,
        inverse_relation_id: i32,
        dimension_id: i32,
    },

    // Inventory events
    StockRecalculated {
        item_id: i32,
        stock: Decimal,
    },
    PurchaseRecorded {
        purchase_id: i32,
        voucher: String,
        line_count: usize,
        minted_units: usize,
    },
    UnitRelocated {
        item_unit_id: i32,
        history_id: i32,
    },

    // Consumption events
    PartMovementRecorded {
        activity_id: i32,
        item_unit_id: i32,
    },
    ConsumableMovementRecorded {
        activity_id: i32,
        item_id: i32,
        quantity: Decimal,
    },

    // Work order events
    WorkOrderCreated(i32),
    WorkOrderFinalized(i32),
}
