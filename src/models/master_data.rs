use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::store::Document;

use super::quotation::ContainerType;

/// Rate-table row for a transport lane. Lookup takes the most recent active
/// row; vehicle type narrows the match when supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRoute {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub vehicle_type: Option<String>,
    pub rate: Decimal,
    pub effective_date: NaiveDate,
    pub is_active: bool,
}

impl Document for TransportRoute {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ChargeType {
    /// Terminal handling charge; the only charge type with container-type
    /// and DG-specific rows.
    Thc,
    Isps,
    Documentation,
    BillOfLading,
}

/// Fixed-charge schedule row. THC rows may carry container type and DG
/// qualifiers; lookup prefers the specific row and falls back to the
/// unqualified one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedCharge {
    pub id: Uuid,
    pub charge_type: ChargeType,
    pub container_type: Option<ContainerType>,
    pub is_dg: Option<bool>,
    pub amount: Decimal,
    pub effective_date: NaiveDate,
    pub is_active: bool,
}

impl Document for FixedCharge {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Dedicated packaging catalog entry (drums, IBCs, bags). Purchase-order
/// lines reference it by `id` like any other item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Packaging {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub unit: String,
}

impl Document for Packaging {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Active bill-of-materials header for a finished product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductBom {
    pub id: Uuid,
    pub product_id: Uuid,
    pub is_active: bool,
}

impl Document for ProductBom {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Ratio-based recipe line: kg of material per kg of finished product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductBomItem {
    pub id: Uuid,
    pub bom_id: Uuid,
    pub material_id: Uuid,
    pub qty_per_kg: Decimal,
    pub unit: String,
}

impl Document for ProductBomItem {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Parallel BOM keyed by packaging type, quantity per packaged unit
/// (e.g. one drum plus one label per drum).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingBom {
    pub id: Uuid,
    pub packaging_name: String,
    pub is_active: bool,
}

impl Document for PackagingBom {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingBomItem {
    pub id: Uuid,
    pub packaging_bom_id: Uuid,
    pub material_id: Uuid,
    pub qty_per_unit: Decimal,
    pub unit: String,
}

impl Document for PackagingBomItem {
    fn id(&self) -> Uuid {
        self.id
    }
}
