use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Shipped,
    Cancelled,
}

/// Export shipping booking. One booking can aggregate several jobs headed
/// for the same vessel/destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingBooking {
    pub id: Uuid,
    pub booking_number: String,
    pub job_ids: Vec<Uuid>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl ShippingBooking {
    pub fn covers_job(&self, job_id: Uuid) -> bool {
        self.job_ids.contains(&job_id)
    }
}

impl Document for ShippingBooking {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutwardStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
}

/// Local transport-outward record. Carries display copies of product /
/// quantity / packaging / customer so dispatch staff never need to walk the
/// job -> sales-order chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportOutward {
    pub id: Uuid,
    pub outward_number: String,
    pub job_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub packaging: String,
    pub customer_name: String,
    /// Actual charge recorded by dispatch after the trip; preferred over
    /// rate-table estimates when costing local orders.
    pub transport_charge: Option<Decimal>,
    pub status: OutwardStatus,
    pub created_at: DateTime<Utc>,
}

impl Document for TransportOutward {
    fn id(&self) -> Uuid {
        self.id
    }
}
