//! Domain events and role-targeted notifications.
//!
//! Authoritative state transitions commit first; event fan-out runs after
//! and is best-effort. A dropped event never fails the triggering workflow —
//! the reconciliation sweep covers routing, and notifications are advisory.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Roles that receive workflow notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Procurement,
    Shipping,
    Transport,
    Dispatch,
    Export,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    QuotationCreated(Uuid),
    QuotationApproved(Uuid),
    QuotationRejected {
        quotation_id: Uuid,
        reason: Option<String>,
    },
    QuotationConverted {
        quotation_id: Uuid,
        sales_order_id: Uuid,
    },
    SalesOrderCreated(Uuid),
    PaymentRecorded {
        sales_order_id: Uuid,
        amount: Decimal,
        balance: Decimal,
    },
    JobOrderCreated {
        job_id: Uuid,
        job_number: String,
    },
    JobStatusChanged {
        job_id: Uuid,
        old_status: String,
        new_status: String,
    },
    MaterialShortageDetected {
        material_id: Uuid,
        quotation_id: Option<Uuid>,
        job_id: Option<Uuid>,
        required: Decimal,
        available: Decimal,
        shortage: Decimal,
    },
    ProcurementRequired {
        job_id: Uuid,
        reason: String,
    },
    ShippingBookingCreated {
        job_id: Uuid,
        booking_id: Uuid,
        booking_number: String,
    },
    TransportOutwardCreated {
        job_id: Uuid,
        outward_id: Uuid,
        outward_number: String,
    },
    InventoryAdjusted {
        product_id: Uuid,
        delta: Decimal,
        on_hand: Decimal,
    },
    Notification {
        roles: Vec<Role>,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Best-effort send for side-effecting fan-out after a committed state
    /// change. Failures are logged, never propagated.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!(error = %e, "Dropping event");
        }
    }

    pub async fn notify(&self, roles: Vec<Role>, message: impl Into<String>) {
        self.send_or_log(Event::Notification {
            roles,
            message: message.into(),
        })
        .await;
    }
}

/// Creates the event channel and its sender handle.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Handlers implementing this trait process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

/// Drains the event channel, logging each event and forwarding to the
/// registered handlers. Runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, handlers: Vec<Box<dyn EventHandler>>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::Notification { roles, message } => {
                info!(?roles, message = %message, "Notification");
            }
            other => {
                info!(event = ?other, "Received event");
            }
        }

        for handler in &handlers {
            if let Err(e) = handler.handle_event(event.clone()).await {
                error!(error = %e, "Event handler failed");
            }
        }
    }

    info!("Event processing loop stopped");
}
