use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::models::order::OrderStatus;

/// The events the engine can emit.
///
/// Customer notification delivery lives outside the engine; transitions
/// whose side effect is "notify customer" emit one of these and the
/// surrounding application decides how (or whether) to deliver it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order lifecycle
    OrderCreated(u64),
    OrderStatusChanged {
        order_id: u64,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderApproved(u64),
    OrderRejected(u64),
    OrderScheduled {
        order_id: u64,
        scheduled_for: NaiveDate,
    },
    OrderDelivered {
        order_id: u64,
        delivered_on: NaiveDate,
    },
    OrderArchived {
        order_id: u64,
        archived: bool,
    },
    OrderEditRequested(u64),
    OrderUpdated(u64),
    PriceOverrideChanged {
        order_id: u64,
        override_price: Option<Decimal>,
    },
    ReviewSubmitted {
        order_id: u64,
        rating: u8,
    },

    // Inventory
    StockReceived {
        material: String,
        quantity_m2: Decimal,
    },
    StockConsumed {
        material: String,
        quantity_m2: Decimal,
    },
}

/// An event wrapped with its identity and emission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(event: Event) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }
}

/// Sending half of the engine's event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<EventEnvelope>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<EventEnvelope>) -> Self {
        Self { sender }
    }

    /// Creates a bounded event channel and its sender.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    /// Sends an event, wrapping it in a fresh envelope.
    pub async fn send(&self, event: Event) -> Result<(), crate::errors::ServiceError> {
        self.sender
            .send(EventEnvelope::new(event))
            .await
            .map_err(|e| crate::errors::ServiceError::EventError(e.to_string()))
    }
}

/// Drains an event receiver into the log.
///
/// Stand-in subscriber for environments without a real notification
/// collaborator wired up (tests, local runs).
pub fn spawn_log_subscriber(mut rx: mpsc::Receiver<EventEnvelope>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            info!(
                event_id = %envelope.event_id,
                occurred_at = %envelope.occurred_at,
                event = ?envelope.event,
                "event emitted"
            );
        }
    })
}
