//! Cost calculation engine.
//!
//! Assembles a full cost breakdown and margin for a quotation under a given
//! costing type. Four calculation paths cover the sheets: containerized
//! export, bulk export, road export (GCC and other), and local dispatch;
//! the DG/size-specific container variants reuse the containerized path
//! with container-type and DG-aware fixed-charge lookup.
//!
//! Missing master data degrades to a zero contribution with a provenance
//! note instead of failing, and manual overrides always win, applied as the
//! final step per bucket.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    ChargeType, ContainerType, CostBasis, CostBreakdown, CostComponent, CostSource,
    CostingInputs, CostingType, Quotation,
};
use crate::store::Store;

use super::master_data::{MasterDataService, RawMaterialSource};

/// Charge types priced per container on export sheets.
const CONTAINER_CHARGES: [ChargeType; 4] = [
    ChargeType::Thc,
    ChargeType::Isps,
    ChargeType::Documentation,
    ChargeType::BillOfLading,
];

#[derive(Debug, Clone)]
pub struct CostingService {
    store: Arc<Store>,
    master_data: MasterDataService,
    plant_origin: String,
    loading_port: String,
}

impl CostingService {
    pub fn new(
        store: Arc<Store>,
        master_data: MasterDataService,
        plant_origin: String,
        loading_port: String,
    ) -> Self {
        Self {
            store,
            master_data,
            plant_origin,
            loading_port,
        }
    }

    /// Produces the costed margin report for a quotation.
    #[instrument(skip(self, inputs))]
    pub fn calculate_cost(
        &self,
        quotation_id: Uuid,
        costing_type: CostingType,
        inputs: CostingInputs,
    ) -> Result<CostBreakdown, ServiceError> {
        let quotation = self
            .store
            .quotations
            .get(&quotation_id)
            .ok_or_else(|| ServiceError::not_found("Quotation", quotation_id))?;

        let raw_material = self
            .raw_material_component(&quotation, &inputs)
            .apply_override(inputs.overrides.raw_material);
        let packaging = self
            .packaging_component(&quotation)
            .apply_override(inputs.overrides.packaging);
        let transport = self
            .transport_component(&quotation, costing_type)
            .apply_override(inputs.overrides.transport);
        let fixed_charges = self
            .fixed_charge_component(&quotation, costing_type)
            .apply_override(inputs.overrides.fixed_charges);
        let ocean_freight = self
            .ocean_freight_component(&quotation, costing_type)
            .apply_override(inputs.overrides.ocean_freight);

        let total_cost = raw_material.amount
            + packaging.amount
            + transport.amount
            + fixed_charges.amount
            + ocean_freight.amount;

        // Margins against the ex-VAT subtotal; VAT is a pass-through.
        let selling_price = quotation.subtotal;
        let total_quantity = quotation.total_quantity();
        let margin_amount = selling_price - total_cost;
        let margin_percentage = if selling_price > Decimal::ZERO {
            margin_amount / selling_price * Decimal::from(100)
        } else {
            Decimal::ZERO
        };
        let (unit_price, unit_cost) = if total_quantity > Decimal::ZERO {
            (selling_price / total_quantity, total_cost / total_quantity)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        let unit_margin = unit_price - unit_cost;

        Ok(CostBreakdown {
            quotation_id,
            costing_type,
            raw_material,
            packaging,
            transport,
            fixed_charges,
            ocean_freight,
            total_cost,
            selling_price,
            margin_amount,
            margin_percentage,
            total_quantity,
            unit_price,
            unit_cost,
            unit_margin,
            calculated_at: Utc::now(),
        })
    }

    fn raw_material_component(
        &self,
        quotation: &Quotation,
        inputs: &CostingInputs,
    ) -> CostComponent {
        if let Some(value) = inputs.raw_material_value {
            return CostComponent::new(value, CostSource::Manual);
        }
        match inputs.raw_material_basis {
            CostBasis::Manual => CostComponent::with_note(
                Decimal::ZERO,
                CostSource::Manual,
                "manual basis selected; override expected",
            ),
            CostBasis::System => {
                let mut total = Decimal::ZERO;
                let mut unpriced = 0usize;
                for item in &quotation.items {
                    let result = self.master_data.raw_material_cost(
                        item.product_id,
                        item.quantity,
                        RawMaterialSource::InventoryAvg,
                    );
                    if result.cost == Decimal::ZERO {
                        unpriced += 1;
                    }
                    total += result.cost;
                }
                if unpriced > 0 {
                    CostComponent::with_note(
                        total,
                        CostSource::InventoryAverage,
                        format!("{} line(s) had no receipt history", unpriced),
                    )
                } else {
                    CostComponent::new(total, CostSource::InventoryAverage)
                }
            }
        }
    }

    /// Skipped entirely when the quotation is bulk throughout; otherwise
    /// each non-bulk line contributes its drum cost times quantity. A line
    /// with no approved purchase history contributes zero.
    fn packaging_component(&self, quotation: &Quotation) -> CostComponent {
        if quotation.is_all_bulk() {
            return CostComponent::not_applicable();
        }

        let mut total = Decimal::ZERO;
        let mut unpriced: Vec<&str> = Vec::new();
        for item in quotation.items.iter().filter(|item| !item.is_bulk()) {
            match self.master_data.drum_cost(&item.packaging, None) {
                Some(unit_cost) => total += unit_cost * item.quantity,
                None => unpriced.push(item.packaging.as_str()),
            }
        }

        if !unpriced.is_empty() {
            CostComponent::with_note(
                total,
                if total == Decimal::ZERO {
                    CostSource::Missing
                } else {
                    CostSource::LatestPurchase
                },
                format!("no approved purchase history for: {}", unpriced.join(", ")),
            )
        } else {
            CostComponent::new(total, CostSource::LatestPurchase)
        }
    }

    fn transport_component(
        &self,
        quotation: &Quotation,
        costing_type: CostingType,
    ) -> CostComponent {
        match costing_type {
            // Inland haulage from the plant to the port of loading.
            CostingType::ExportContainerized
            | CostingType::Export20FtDg
            | CostingType::Export20FtNonDg
            | CostingType::Export40FtDg
            | CostingType::Export40FtNonDg
            | CostingType::ExportBulk => {
                let port = self.loading_port.clone();
                self.rate_table_component(&port)
            }

            // Road haulage all the way to the destination.
            CostingType::ExportGccRoad | CostingType::ExportRoad => {
                let destination = quotation
                    .destination_country
                    .clone()
                    .or_else(|| quotation.destination_port.clone())
                    .unwrap_or_default();
                self.rate_table_component(&destination)
            }

            // Local delivery: prefer charges actually recorded on linked
            // transport-outward records over the rate-table estimate.
            CostingType::LocalDispatch
            | CostingType::LocalPurchaseSale
            | CostingType::LocalBulkToPlant
            | CostingType::LocalDrumToPlant => {
                let recorded = self.recorded_outward_charges(quotation);
                if recorded > Decimal::ZERO {
                    return CostComponent::new(recorded, CostSource::RecordedActual);
                }
                let destination = quotation
                    .destination_port
                    .clone()
                    .or_else(|| quotation.destination_country.clone())
                    .unwrap_or_default();
                self.rate_table_component(&destination)
            }
        }
    }

    fn rate_table_component(&self, destination: &str) -> CostComponent {
        if destination.is_empty() {
            return CostComponent::with_note(
                Decimal::ZERO,
                CostSource::Missing,
                "no destination to rate against",
            );
        }
        match self
            .master_data
            .transport_cost(&self.plant_origin, destination, None)
        {
            Some(route) => CostComponent::with_note(
                route.rate,
                CostSource::RateTable,
                format!("{} -> {}", route.origin, route.destination),
            ),
            None => CostComponent::with_note(
                Decimal::ZERO,
                CostSource::Missing,
                format!("no rate for {} -> {}", self.plant_origin, destination),
            ),
        }
    }

    /// Sums actual transport charges across outward records reached through
    /// the sales-order -> job-order chain of this quotation.
    fn recorded_outward_charges(&self, quotation: &Quotation) -> Decimal {
        let sales_orders = self
            .store
            .sales_orders
            .find(|so| so.quotation_id == quotation.id);
        let mut total = Decimal::ZERO;
        for sales_order in &sales_orders {
            let jobs = self
                .store
                .job_orders
                .find(|job| job.sales_order_id == sales_order.id);
            for job in &jobs {
                if let Some(outward_id) = job.transport_outward_id {
                    if let Some(outward) = self.store.transport_outward.get(&outward_id) {
                        if let Some(charge) = outward.transport_charge {
                            total += charge;
                        }
                    }
                }
            }
        }
        total
    }

    fn fixed_charge_component(
        &self,
        quotation: &Quotation,
        costing_type: CostingType,
    ) -> CostComponent {
        if !costing_type.involves_container() {
            return CostComponent::not_applicable();
        }
        let (container_type, is_dg) = container_params(costing_type, quotation);
        let amount = self.master_data.fixed_charges(
            &CONTAINER_CHARGES,
            quotation.container_count,
            container_type,
            is_dg,
        );
        CostComponent::new(amount, CostSource::FixedChargeTable)
    }

    /// Ocean freight is borne by the seller only under CFR/CIF, and is a
    /// manual entry since carrier-negotiated rates live in no master table.
    fn ocean_freight_component(
        &self,
        quotation: &Quotation,
        costing_type: CostingType,
    ) -> CostComponent {
        let sea_export = costing_type.involves_container() || costing_type == CostingType::ExportBulk;
        if !sea_export {
            return CostComponent::not_applicable();
        }
        match quotation.incoterm {
            Some(incoterm) if incoterm.bears_ocean_freight() => CostComponent::with_note(
                Decimal::ZERO,
                CostSource::Missing,
                format!("manual entry required under {}", incoterm),
            ),
            _ => CostComponent::with_note(
                Decimal::ZERO,
                CostSource::NotApplicable,
                "buyer bears ocean freight",
            ),
        }
    }
}

/// Container parameters for the fixed-charge lookup. The size/DG-specific
/// costing types carry their own; generic containerized falls back to the
/// quotation's fields.
fn container_params(
    costing_type: CostingType,
    quotation: &Quotation,
) -> (Option<ContainerType>, Option<bool>) {
    match costing_type {
        CostingType::Export20FtDg => (Some(ContainerType::TwentyFt), Some(true)),
        CostingType::Export20FtNonDg => (Some(ContainerType::TwentyFt), Some(false)),
        CostingType::Export40FtDg => (Some(ContainerType::FortyFt), Some(true)),
        CostingType::Export40FtNonDg => (Some(ContainerType::FortyFt), Some(false)),
        _ => (quotation.container_type, Some(quotation.is_dg)),
    }
}
