//! Inventory balances and reservations.
//!
//! The balance record is the single source of truth for stock. Mutations
//! are per-document atomic increments, never read-modify-write in service
//! code, so concurrent GRN postings and production completions cannot lose
//! updates. The legacy `product.current_stock` field is written through on
//! every mutation but never read back.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{InventoryBalance, InventoryReservation};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct InventoryService {
    store: Arc<Store>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(store: Arc<Store>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Atomically applies `on_hand += delta`, creating the balance row on
    /// first receipt. Returns the new on-hand figure.
    #[instrument(skip(self))]
    pub async fn adjust_on_hand(&self, product_id: Uuid, delta: Decimal) -> Decimal {
        let balance = self.store.inventory_balances.upsert(
            product_id,
            || InventoryBalance::zero(product_id),
            |balance| {
                balance.on_hand += delta;
                balance.updated_at = Utc::now();
            },
        );

        // Legacy cache write-through; the balance row stays authoritative.
        self.store.products.update(&product_id, |product| {
            product.current_stock = balance.on_hand;
        });

        info!(%product_id, %delta, on_hand = %balance.on_hand, "Inventory adjusted");
        self.event_sender
            .send_or_log(Event::InventoryAdjusted {
                product_id,
                delta,
                on_hand: balance.on_hand,
            })
            .await;
        balance.on_hand
    }

    /// `on_hand - reserved`, the only figure safe to allocate against new
    /// demand.
    pub fn available(&self, product_id: Uuid) -> Decimal {
        let on_hand = self
            .store
            .inventory_balances
            .get(&product_id)
            .map(|balance| balance.on_hand)
            .unwrap_or(Decimal::ZERO);
        let reserved: Decimal = self
            .store
            .inventory_reservations
            .find(|reservation| reservation.product_id == product_id)
            .iter()
            .map(|reservation| reservation.quantity)
            .sum();
        on_hand - reserved
    }

    pub fn reserve(
        &self,
        product_id: Uuid,
        quantity: Decimal,
        reference_id: Uuid,
        reference_type: &str,
    ) -> Result<InventoryReservation, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "reservation quantity must be positive".into(),
            ));
        }
        let reservation = InventoryReservation {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            reference_id,
            reference_type: reference_type.to_string(),
            created_at: Utc::now(),
        };
        self.store.inventory_reservations.insert(reservation.clone());
        Ok(reservation)
    }

    pub fn release_reservation(&self, reservation_id: Uuid) -> Result<(), ServiceError> {
        self.store
            .inventory_reservations
            .remove(&reservation_id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found("Reservation", reservation_id))
    }
}
