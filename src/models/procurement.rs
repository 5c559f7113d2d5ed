use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PurchaseOrderStatus {
    Draft,
    Approved,
    Received,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_number: String,
    pub supplier_name: String,
    pub status: PurchaseOrderStatus,
    pub ordered_at: DateTime<Utc>,
}

impl Document for PurchaseOrder {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// The purchase-order line is the price authority: receipt lines carry
/// quantities only and point back here for the unit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Document for PurchaseOrderLine {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Goods Received Note line: inbound receipt of purchased material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrnItem {
    pub id: Uuid,
    pub grn_number: String,
    pub purchase_order_line_id: Uuid,
    pub item_id: Uuid,
    pub quantity_received: Decimal,
    pub received_at: DateTime<Utc>,
}

impl Document for GrnItem {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ShortageStatus {
    Pending,
    Ordered,
    Resolved,
}

/// A persisted shortage raised for the procurement role. Deduplicated by
/// (material, quotation) while PENDING so repeated quotation approvals do
/// not create duplicate RFQ entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialShortage {
    pub id: Uuid,
    pub material_id: Uuid,
    pub material_name: String,
    pub quotation_id: Option<Uuid>,
    pub job_order_id: Option<Uuid>,
    pub required_qty: Decimal,
    pub available_qty: Decimal,
    pub shortage_qty: Decimal,
    pub unit: String,
    pub status: ShortageStatus,
    pub created_at: DateTime<Utc>,
}

impl Document for MaterialShortage {
    fn id(&self) -> Uuid {
        self.id
    }
}
