use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::store::Document;

use super::quotation::QuotationItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

/// An appended payment event. Payments only ever increase `amount_paid`;
/// they are never edited or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Derived 1:1 from an approved quotation; carries a point-in-time copy of
/// the quotation's items and total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: Uuid,
    /// Sales order business identifier.
    pub spa_number: String,
    pub quotation_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub currency: String,
    pub items: Vec<QuotationItem>,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub payment_status: PaymentStatus,
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for SalesOrder {
    fn id(&self) -> Uuid {
        self.id
    }
}
