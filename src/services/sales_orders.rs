//! Sales orders: derivation from approved quotations and payment events.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Payment, PaymentStatus, QuotationStatus, SalesOrder};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct SalesOrderService {
    store: Arc<Store>,
    event_sender: EventSender,
}

impl SalesOrderService {
    pub fn new(store: Arc<Store>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Derives a sales order 1:1 from an approved quotation, copying its
    /// items and total. Marks the quotation converted — terminal — via a
    /// conditional update, so a quotation converts at most once.
    #[instrument(skip(self))]
    pub async fn create_from_quotation(
        &self,
        quotation_id: Uuid,
    ) -> Result<SalesOrder, ServiceError> {
        let quotation = self
            .store
            .quotations
            .get(&quotation_id)
            .ok_or_else(|| ServiceError::not_found("Quotation", quotation_id))?;

        let sales_order_id = Uuid::new_v4();
        let now = Utc::now();
        let sales_order = SalesOrder {
            id: sales_order_id,
            spa_number: self.store.next_number("SPA", "sales_order"),
            quotation_id,
            customer_id: quotation.customer_id,
            customer_name: quotation.customer_name.clone(),
            currency: quotation.currency.clone(),
            items: quotation.items.clone(),
            total: quotation.total,
            amount_paid: Decimal::ZERO,
            balance: quotation.total,
            payment_status: PaymentStatus::Pending,
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        // Flip the quotation first; a concurrent converter loses here and
        // never inserts a duplicate order.
        self.store
            .quotations
            .update(&quotation_id, |quotation| match quotation.status {
                QuotationStatus::Approved => {
                    quotation.status = QuotationStatus::Converted;
                    quotation.sales_order_id = Some(sales_order_id);
                    quotation.updated_at = Utc::now();
                    Ok(())
                }
                QuotationStatus::Converted => Err(ServiceError::Conflict(
                    "quotation is already converted".into(),
                )),
                other => Err(ServiceError::InvalidOperation(format!(
                    "only approved quotations can be converted; this one is {}",
                    other
                ))),
            })
            .ok_or_else(|| ServiceError::not_found("Quotation", quotation_id))??;

        self.store.sales_orders.insert(sales_order.clone());

        info!(spa = %sales_order.spa_number, %quotation_id, "Sales order created");
        self.event_sender
            .send_or_log(Event::QuotationConverted {
                quotation_id,
                sales_order_id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::SalesOrderCreated(sales_order_id))
            .await;
        Ok(sales_order)
    }

    /// Appends a payment. Payments monotonically increase `amount_paid`
    /// and decrease `balance`; a payment that would drive the balance
    /// negative is rejected.
    #[instrument(skip(self))]
    pub async fn record_payment(
        &self,
        sales_order_id: Uuid,
        amount: Decimal,
        reference: Option<String>,
    ) -> Result<SalesOrder, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "payment amount must be positive".into(),
            ));
        }

        let updated = self
            .store
            .sales_orders
            .update(&sales_order_id, |order| {
                if amount > order.balance {
                    return Err(ServiceError::ValidationError(format!(
                        "payment {} exceeds open balance {}",
                        amount, order.balance
                    )));
                }
                order.payments.push(Payment {
                    id: Uuid::new_v4(),
                    amount,
                    reference: reference.clone(),
                    received_at: Utc::now(),
                });
                order.amount_paid += amount;
                order.balance -= amount;
                order.payment_status = if order.balance == Decimal::ZERO {
                    PaymentStatus::Paid
                } else {
                    PaymentStatus::Partial
                };
                order.updated_at = Utc::now();
                Ok(order.clone())
            })
            .ok_or_else(|| ServiceError::not_found("Sales order", sales_order_id))??;

        self.event_sender
            .send_or_log(Event::PaymentRecorded {
                sales_order_id,
                amount,
                balance: updated.balance,
            })
            .await;
        Ok(updated)
    }
}
