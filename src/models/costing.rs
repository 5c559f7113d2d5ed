use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::quotation::Quotation;

/// The closed set of costing sheets. A classification label on a
/// calculation result, not a stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CostingType {
    ExportGccRoad,
    ExportRoad,
    ExportBulk,
    ExportContainerized,
    #[serde(rename = "EXPORT_20FT_DG")]
    #[strum(serialize = "EXPORT_20FT_DG")]
    Export20FtDg,
    #[serde(rename = "EXPORT_20FT_NON_DG")]
    #[strum(serialize = "EXPORT_20FT_NON_DG")]
    Export20FtNonDg,
    #[serde(rename = "EXPORT_40FT_DG")]
    #[strum(serialize = "EXPORT_40FT_DG")]
    Export40FtDg,
    #[serde(rename = "EXPORT_40FT_NON_DG")]
    #[strum(serialize = "EXPORT_40FT_NON_DG")]
    Export40FtNonDg,
    LocalPurchaseSale,
    LocalBulkToPlant,
    LocalDrumToPlant,
    LocalDispatch,
}

impl CostingType {
    /// Costing sheets that price a container move (and therefore scale
    /// fixed charges by container count).
    pub fn involves_container(&self) -> bool {
        matches!(
            self,
            CostingType::ExportContainerized
                | CostingType::Export20FtDg
                | CostingType::Export20FtNonDg
                | CostingType::Export40FtDg
                | CostingType::Export40FtNonDg
        )
    }
}

/// Raw order attributes the classifier decides on. Kept as free-form
/// strings because they arrive from loosely validated documents; the
/// classifier is total over any input and case-insensitive throughout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostingAttributes {
    pub order_type: Option<String>,
    pub packaging: Option<String>,
    pub incoterm: Option<String>,
    pub destination_country: Option<String>,
    pub transport_mode: Option<String>,
    pub local_type: Option<String>,
    pub container_type: Option<String>,
    pub is_dg: bool,
}

impl From<&Quotation> for CostingAttributes {
    fn from(quotation: &Quotation) -> Self {
        Self {
            order_type: Some(quotation.order_type.to_string()),
            packaging: quotation.items.first().map(|item| item.packaging.clone()),
            incoterm: quotation.incoterm.map(|i| i.to_string()),
            destination_country: quotation.destination_country.clone(),
            transport_mode: quotation.transport_mode.map(|m| m.to_string()),
            local_type: quotation.local_type.map(|l| l.to_string()),
            container_type: quotation.container_type.map(|c| c.to_string()),
            is_dg: quotation.is_dg,
        }
    }
}

/// Where a cost bucket's figure came from, for Finance audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CostSource {
    /// Quantity-weighted average over recent goods receipts.
    InventoryAverage,
    /// Most recent purchase-order line price.
    LatestPurchase,
    /// Transport rate table.
    RateTable,
    /// Actual charges recorded on linked transport-outward records.
    RecordedActual,
    /// Fixed-charge schedule.
    FixedChargeTable,
    /// Caller-supplied figure (no lookup performed).
    Manual,
    /// Manual override applied as the final step.
    Override,
    /// No master data found; contributed zero, needs Finance review.
    Missing,
    /// Bucket does not apply to this costing type.
    NotApplicable,
}

/// One cost bucket with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostComponent {
    pub amount: Decimal,
    pub source: CostSource,
    pub note: Option<String>,
}

impl CostComponent {
    pub fn new(amount: Decimal, source: CostSource) -> Self {
        Self {
            amount,
            source,
            note: None,
        }
    }

    pub fn with_note(amount: Decimal, source: CostSource, note: impl Into<String>) -> Self {
        Self {
            amount,
            source,
            note: Some(note.into()),
        }
    }

    pub fn not_applicable() -> Self {
        Self::new(Decimal::ZERO, CostSource::NotApplicable)
    }

    /// Manual overrides always win, applied last per bucket.
    pub fn apply_override(self, value: Option<Decimal>) -> Self {
        match value {
            Some(amount) => Self::new(amount, CostSource::Override),
            None => self,
        }
    }
}

/// How the raw-material bucket should be sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// Sum per-line inventory-average costs.
    #[default]
    System,
    /// Caller enters the figure; lookup yields zero until overridden.
    Manual,
}

/// Per-bucket manual overrides. Finance can correct any single bucket
/// without recomputing the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostOverrides {
    pub raw_material: Option<Decimal>,
    pub packaging: Option<Decimal>,
    pub transport: Option<Decimal>,
    pub fixed_charges: Option<Decimal>,
    pub ocean_freight: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostingInputs {
    pub raw_material_basis: CostBasis,
    /// Explicit raw-material figure; takes precedence over the basis but
    /// still loses to an override.
    pub raw_material_value: Option<Decimal>,
    pub overrides: CostOverrides,
}

/// Uniform calculation result: every bucket present (zeroed where not
/// applicable to the costing type) with provenance per bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub quotation_id: Uuid,
    pub costing_type: CostingType,
    pub raw_material: CostComponent,
    pub packaging: CostComponent,
    pub transport: CostComponent,
    pub fixed_charges: CostComponent,
    pub ocean_freight: CostComponent,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub margin_amount: Decimal,
    pub margin_percentage: Decimal,
    pub total_quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_cost: Decimal,
    pub unit_margin: Decimal,
    pub calculated_at: DateTime<Utc>,
}
