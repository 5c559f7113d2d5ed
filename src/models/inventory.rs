use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemType {
    RawMaterial,
    Packaging,
    FinishedGood,
}

/// Finished-product master record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit: String,
    /// Legacy stock cache. Written through on every balance mutation, but
    /// never read by the core — the balance record is authoritative.
    pub current_stock: Decimal,
}

impl Document for Product {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Raw-material / packaging item master record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub item_type: ItemType,
    pub unit: String,
}

impl Document for InventoryItem {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Authoritative stock figure per material/product id. The document id is
/// the material id itself, so increments address the row directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryBalance {
    pub product_id: Uuid,
    pub on_hand: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl InventoryBalance {
    pub fn zero(product_id: Uuid) -> Self {
        Self {
            product_id,
            on_hand: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }
}

impl Document for InventoryBalance {
    fn id(&self) -> Uuid {
        self.product_id
    }
}

/// Outstanding reservation against a material. `available = on_hand - Σ
/// active reservations` is the only figure safe to allocate against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReservation {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub reference_id: Uuid,
    pub reference_type: String,
    pub created_at: DateTime<Utc>,
}

impl Document for InventoryReservation {
    fn id(&self) -> Uuid {
        self.id
    }
}
