use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::store::Document;

use super::is_bulk_packaging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OrderType {
    Local,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TransportMode {
    Road,
    #[strum(serialize = "sea", serialize = "ocean")]
    Sea,
    Air,
}

/// Trade terms relevant to costing and dispatch routing. FOB/CFR/CIF/CIP
/// route to export shipping; EXW/DDP route to local transport-outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Incoterm {
    Fob,
    Cfr,
    Cif,
    Cip,
    Exw,
    Ddp,
}

impl Incoterm {
    pub fn is_export_routing(&self) -> bool {
        matches!(self, Incoterm::Fob | Incoterm::Cfr | Incoterm::Cif | Incoterm::Cip)
    }

    /// Ocean freight is borne by the seller only under CFR/CIF.
    pub fn bears_ocean_freight(&self) -> bool {
        matches!(self, Incoterm::Cfr | Incoterm::Cif)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ContainerType {
    #[serde(rename = "20ft")]
    #[strum(serialize = "20ft")]
    TwentyFt,
    #[serde(rename = "40ft")]
    #[strum(serialize = "40ft")]
    FortyFt,
}

/// Sub-type of a local order, selecting the costing sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LocalOrderType {
    DirectToCustomer,
    BulkToPlant,
    PackagedToPlant,
    GccRoadBulk,
    GccRoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum QuotationStatus {
    Pending,
    Approved,
    Rejected,
    /// A sales order has been created from this quotation. Terminal.
    Converted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationItem {
    pub product_id: Uuid,
    pub product_name: String,
    /// Units for packaged goods (drums, IBCs); metric tons for bulk.
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Free-text packaging name; blank or "bulk" means bulk.
    pub packaging: String,
    /// Net weight per packaged unit in kg. Always `None` for bulk lines —
    /// never a numeric default.
    pub net_weight_kg: Option<Decimal>,
    pub line_total: Decimal,
}

impl QuotationItem {
    pub fn is_bulk(&self) -> bool {
        is_bulk_packaging(&self.packaging)
    }

    /// Line weight in metric tons: bulk quantities already are MT; packaged
    /// lines convert via net weight per unit. Unknown weight reports zero.
    pub fn weight_mt(&self) -> Decimal {
        if self.is_bulk() {
            self.quantity
        } else {
            match self.net_weight_kg {
                Some(net) => self.quantity * net / Decimal::from(1000),
                None => Decimal::ZERO,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    pub id: Uuid,
    /// Proforma invoice number, the quotation's business identifier.
    pub pfi_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub currency: String,
    pub order_type: OrderType,
    pub incoterm: Option<Incoterm>,
    pub transport_mode: Option<TransportMode>,
    pub local_type: Option<LocalOrderType>,
    pub container_type: Option<ContainerType>,
    pub container_count: u32,
    pub is_dg: bool,
    pub destination_country: Option<String>,
    pub destination_port: Option<String>,
    pub include_vat: bool,
    pub items: Vec<QuotationItem>,
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub status: QuotationStatus,
    pub rejection_reason: Option<String>,
    pub sales_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quotation {
    pub fn total_quantity(&self) -> Decimal {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// True when every line is bulk; packaging cost is skipped entirely.
    pub fn is_all_bulk(&self) -> bool {
        self.items.iter().all(|item| item.is_bulk())
    }
}

impl Document for Quotation {
    fn id(&self) -> Uuid {
        self.id
    }
}
