//! Read-only master-data lookups.
//!
//! Resolves unit costs for raw materials, packaging, transport lanes and
//! fixed charges from independent master-data sources. Missing master data
//! is never an error here: lookups return zero or `None` with a provenance
//! note and Finance reviews the result.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::{
    ChargeType, ContainerType, ItemType, PurchaseOrderStatus, TransportRoute,
};
use crate::store::Store;

/// How many recent goods receipts feed the weighted average.
const INVENTORY_AVG_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawMaterialSource {
    /// Quantity-weighted average unit price over recent goods receipts.
    InventoryAvg,
    /// Most recent purchase-order line price, regardless of receipts.
    LatestPo,
    /// Caller supplies the figure; lookup yields zero.
    Manual,
}

/// Raw-material cost with an audit trail of how it was derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterialCost {
    pub cost: Decimal,
    pub unit_cost: Decimal,
    pub source: RawMaterialSource,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct MasterDataService {
    store: Arc<Store>,
}

impl MasterDataService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Resolves the cost of `qty` of a raw material.
    #[instrument(skip(self))]
    pub fn raw_material_cost(
        &self,
        product_id: Uuid,
        qty: Decimal,
        source: RawMaterialSource,
    ) -> RawMaterialCost {
        match source {
            RawMaterialSource::InventoryAvg => self.inventory_average_cost(product_id, qty),
            RawMaterialSource::LatestPo => self.latest_po_cost(product_id, qty),
            RawMaterialSource::Manual => RawMaterialCost {
                cost: Decimal::ZERO,
                unit_cost: Decimal::ZERO,
                source: RawMaterialSource::Manual,
                details: json!({ "method": "manual", "note": "caller must override" }),
            },
        }
    }

    /// Quantity-weighted average over the most recent receipts, each
    /// matched back to the purchase-order line that set its price.
    fn inventory_average_cost(&self, product_id: Uuid, qty: Decimal) -> RawMaterialCost {
        let mut receipts = self
            .store
            .grn_items
            .find(|grn| grn.item_id == product_id);
        receipts.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        receipts.truncate(INVENTORY_AVG_WINDOW);

        let mut weighted_total = Decimal::ZERO;
        let mut received_total = Decimal::ZERO;
        let mut priced_receipts = 0usize;

        for receipt in &receipts {
            let line = self
                .store
                .purchase_order_lines
                .get(&receipt.purchase_order_line_id);
            if let Some(line) = line {
                weighted_total += line.unit_price * receipt.quantity_received;
                received_total += receipt.quantity_received;
                priced_receipts += 1;
            }
        }

        if received_total <= Decimal::ZERO {
            debug!(%product_id, "No priced receipts found; cost falls back to zero");
            return RawMaterialCost {
                cost: Decimal::ZERO,
                unit_cost: Decimal::ZERO,
                source: RawMaterialSource::InventoryAvg,
                details: json!({
                    "method": "inventory_weighted_average",
                    "receipts_considered": receipts.len(),
                    "note": "no goods receipts found",
                }),
            };
        }

        let unit_cost = weighted_total / received_total;
        RawMaterialCost {
            cost: unit_cost * qty,
            unit_cost,
            source: RawMaterialSource::InventoryAvg,
            details: json!({
                "method": "inventory_weighted_average",
                "receipts_considered": priced_receipts,
                "received_quantity": received_total,
            }),
        }
    }

    fn latest_po_cost(&self, product_id: Uuid, qty: Decimal) -> RawMaterialCost {
        let mut lines = self
            .store
            .purchase_order_lines
            .find(|line| line.item_id == product_id);
        lines.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        match lines.first() {
            Some(line) => RawMaterialCost {
                cost: line.unit_price * qty,
                unit_cost: line.unit_price,
                source: RawMaterialSource::LatestPo,
                details: json!({
                    "method": "latest_purchase_order",
                    "purchase_order_line_id": line.id,
                    "unit_price": line.unit_price,
                }),
            },
            None => RawMaterialCost {
                cost: Decimal::ZERO,
                unit_cost: Decimal::ZERO,
                source: RawMaterialSource::LatestPo,
                details: json!({
                    "method": "latest_purchase_order",
                    "note": "no purchase history",
                }),
            },
        }
    }

    /// Resolves the unit cost of a packaging item (drum, IBC, bag) from its
    /// most recent APPROVED purchase. Returns `None` when no approved
    /// purchase history exists — a price is never fabricated.
    #[instrument(skip(self))]
    pub fn drum_cost(&self, packaging_name: &str, sku: Option<&str>) -> Option<Decimal> {
        let item_id = self.resolve_packaging_item(packaging_name, sku)?;

        let mut lines = self
            .store
            .purchase_order_lines
            .find(|line| line.item_id == item_id);
        lines.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        lines
            .iter()
            .find(|line| {
                self.store
                    .purchase_orders
                    .get(&line.purchase_order_id)
                    .map(|po| po.status == PurchaseOrderStatus::Approved)
                    .unwrap_or(false)
            })
            .map(|line| line.unit_price)
    }

    /// Tries the dedicated packaging catalog first, then the generic
    /// inventory-items catalog filtered to packaging type. SKU matches
    /// exactly; names match by case-insensitive substring.
    fn resolve_packaging_item(&self, name: &str, sku: Option<&str>) -> Option<Uuid> {
        let name_lower = name.trim().to_ascii_lowercase();

        let from_catalog = self.store.packaging.find_one(|p| {
            if let Some(sku) = sku {
                if p.sku.as_deref() == Some(sku) {
                    return true;
                }
            }
            !name_lower.is_empty() && p.name.to_ascii_lowercase().contains(&name_lower)
        });
        if let Some(packaging) = from_catalog {
            return Some(packaging.id);
        }

        self.store
            .inventory_items
            .find_one(|item| {
                item.item_type == ItemType::Packaging
                    && (sku.map(|s| item.sku == s).unwrap_or(false)
                        || (!name_lower.is_empty()
                            && item.name.to_ascii_lowercase().contains(&name_lower)))
            })
            .map(|item| item.id)
    }

    /// Most recent active rate for a lane, optionally narrowed by vehicle
    /// type. `None` when the rate table has no match.
    #[instrument(skip(self))]
    pub fn transport_cost(
        &self,
        origin: &str,
        destination: &str,
        vehicle_type: Option<&str>,
    ) -> Option<TransportRoute> {
        let mut routes = self.store.transport_routes.find(|route| {
            route.is_active
                && route.origin.eq_ignore_ascii_case(origin)
                && route.destination.eq_ignore_ascii_case(destination)
                && match vehicle_type {
                    Some(vehicle) => route
                        .vehicle_type
                        .as_deref()
                        .map(|v| v.eq_ignore_ascii_case(vehicle))
                        .unwrap_or(false),
                    None => true,
                }
        });
        routes.sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
        routes.into_iter().next()
    }

    /// Sums fixed charges scaled by container count. THC is looked up with
    /// the container-type and DG qualifiers first, falling back to the
    /// unqualified row; a missing charge type contributes zero.
    #[instrument(skip(self))]
    pub fn fixed_charges(
        &self,
        charge_types: &[ChargeType],
        container_count: u32,
        container_type: Option<ContainerType>,
        is_dg: Option<bool>,
    ) -> Decimal {
        let count = Decimal::from(container_count);
        charge_types
            .iter()
            .map(|&charge_type| {
                let unit = self
                    .resolve_fixed_charge(charge_type, container_type, is_dg)
                    .unwrap_or(Decimal::ZERO);
                unit * count
            })
            .sum()
    }

    fn resolve_fixed_charge(
        &self,
        charge_type: ChargeType,
        container_type: Option<ContainerType>,
        is_dg: Option<bool>,
    ) -> Option<Decimal> {
        if charge_type == ChargeType::Thc {
            let specific = self.latest_active_charge(|charge| {
                charge.charge_type == ChargeType::Thc
                    && charge.container_type == container_type
                    && charge.is_dg == is_dg
            });
            if let Some(amount) = specific {
                return Some(amount);
            }
            // Fall back to the unqualified THC row, never to a row
            // qualified for a different container/DG combination.
            return self.latest_active_charge(|charge| {
                charge.charge_type == ChargeType::Thc
                    && charge.container_type.is_none()
                    && charge.is_dg.is_none()
            });
        }
        self.latest_active_charge(|charge| charge.charge_type == charge_type)
    }

    fn latest_active_charge(
        &self,
        predicate: impl Fn(&crate::models::FixedCharge) -> bool,
    ) -> Option<Decimal> {
        let mut charges = self
            .store
            .fixed_charges
            .find(|charge| charge.is_active && predicate(charge));
        charges.sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
        charges.first().map(|charge| charge.amount)
    }
}
