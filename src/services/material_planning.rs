//! Material requirement planning.
//!
//! Explodes a finished product's active BOM against live inventory balances
//! (on-hand minus reserved) to produce requirement/availability/shortage
//! records. Runs at quotation approval, to surface shortages to procurement
//! early, and at job-order creation, to decide production feasibility.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender, Role};
use crate::models::{
    is_bulk_packaging, MaterialRequirement, MaterialShortage, Quotation, ShortageStatus,
};
use crate::store::Store;

use super::inventory::InventoryService;

/// Kilograms per metric ton; bulk quantities are denominated in MT.
const KG_PER_MT: i64 = 1000;

/// Result of exploding one product's BOM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialPlan {
    pub total_required_kg: Decimal,
    pub requirements: Vec<MaterialRequirement>,
    /// No active BOM exists for the product. Itself a shortage condition.
    pub missing_bom: bool,
}

impl MaterialPlan {
    pub fn has_shortages(&self) -> bool {
        self.missing_bom || self.requirements.iter().any(|r| r.has_shortage())
    }

    pub fn shortages(&self) -> Vec<MaterialRequirement> {
        self.requirements
            .iter()
            .filter(|r| r.has_shortage())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub has_shortages: bool,
    pub shortages: Vec<MaterialRequirement>,
}

#[derive(Debug, Clone)]
pub struct MaterialPlanningService {
    store: Arc<Store>,
    inventory: InventoryService,
    event_sender: EventSender,
}

impl MaterialPlanningService {
    pub fn new(store: Arc<Store>, inventory: InventoryService, event_sender: EventSender) -> Self {
        Self {
            store,
            inventory,
            event_sender,
        }
    }

    /// Finished-product kilograms a line translates to. Bulk lines are
    /// quoted in metric tons; packaged lines need an explicit net weight —
    /// there is no silent per-unit default.
    pub fn required_kg(
        quantity: Decimal,
        packaging: &str,
        net_weight_kg: Option<Decimal>,
    ) -> Result<Decimal, ServiceError> {
        if is_bulk_packaging(packaging) {
            return Ok(quantity * Decimal::from(KG_PER_MT));
        }
        match net_weight_kg {
            Some(net) if net > Decimal::ZERO => Ok(quantity * net),
            Some(_) => Err(ServiceError::ValidationError(
                "net_weight_kg must be positive".into(),
            )),
            None => Err(ServiceError::ValidationError(format!(
                "explicit net_weight_kg required for non-bulk packaging '{}'",
                packaging
            ))),
        }
    }

    /// `on_hand - reserved`, the only stock figure safe to allocate
    /// against new demand.
    pub fn available(&self, material_id: Uuid) -> Decimal {
        self.inventory.available(material_id)
    }

    /// Explodes the product's active BOM for `total_required_kg` of
    /// finished product.
    #[instrument(skip(self))]
    pub fn explode_product_bom(&self, product_id: Uuid, total_required_kg: Decimal) -> MaterialPlan {
        let active_bom = self
            .store
            .product_boms
            .find_one(|bom| bom.product_id == product_id && bom.is_active);

        let Some(bom) = active_bom else {
            return MaterialPlan {
                total_required_kg,
                requirements: Vec::new(),
                missing_bom: true,
            };
        };

        let requirements = self
            .store
            .product_bom_items
            .find(|item| item.bom_id == bom.id)
            .into_iter()
            .map(|item| {
                let required = total_required_kg * item.qty_per_kg;
                self.requirement(item.material_id, required, item.unit)
            })
            .collect();

        MaterialPlan {
            total_required_kg,
            requirements,
            missing_bom: false,
        }
    }

    /// Explodes the packaging BOM for a packaging type: quantities per
    /// packaged unit (e.g. per drum), scaled by unit count.
    pub fn explode_packaging_bom(&self, packaging_name: &str, units: Decimal) -> Vec<MaterialRequirement> {
        let active_bom = self.store.packaging_boms.find_one(|bom| {
            bom.is_active && bom.packaging_name.eq_ignore_ascii_case(packaging_name)
        });
        let Some(bom) = active_bom else {
            return Vec::new();
        };

        self.store
            .packaging_bom_items
            .find(|item| item.packaging_bom_id == bom.id)
            .into_iter()
            .map(|item| {
                let required = units * item.qty_per_unit;
                self.requirement(item.material_id, required, item.unit)
            })
            .collect()
    }

    fn requirement(&self, material_id: Uuid, required: Decimal, unit: String) -> MaterialRequirement {
        let available = self.available(material_id);
        let shortage = (required - available).max(Decimal::ZERO);
        let material_name = self
            .store
            .inventory_items
            .get(&material_id)
            .map(|item| item.name)
            .unwrap_or_else(|| material_id.to_string());
        MaterialRequirement {
            material_id,
            material_name,
            required_qty: required,
            available_qty: available,
            shortage_qty: shortage,
            unit,
        }
    }

    /// Approval-time availability check for a whole quotation, including
    /// the nested packaging-BOM explosion for drum/pack materials. Persists
    /// one PENDING shortage row per (material, quotation) so repeated
    /// approvals never duplicate RFQ entries.
    #[instrument(skip(self, quotation), fields(quotation_id = %quotation.id))]
    pub async fn check_material_availability(
        &self,
        quotation: &Quotation,
    ) -> Result<AvailabilityReport, ServiceError> {
        let mut shortages: Vec<MaterialRequirement> = Vec::new();

        for item in &quotation.items {
            let total_kg =
                Self::required_kg(item.quantity, &item.packaging, item.net_weight_kg)?;

            let plan = self.explode_product_bom(item.product_id, total_kg);
            if plan.missing_bom {
                shortages.push(MaterialRequirement {
                    material_id: item.product_id,
                    material_name: format!("{} (no BOM configured)", item.product_name),
                    required_qty: total_kg,
                    available_qty: Decimal::ZERO,
                    shortage_qty: total_kg,
                    unit: "kg".into(),
                });
            } else {
                shortages.extend(plan.shortages());
            }

            if !item.is_bulk() {
                let packaging_requirements =
                    self.explode_packaging_bom(&item.packaging, item.quantity);
                shortages.extend(
                    packaging_requirements
                        .into_iter()
                        .filter(|r| r.has_shortage()),
                );
            }
        }

        let has_shortages = !shortages.is_empty();
        if has_shortages {
            self.persist_shortages(quotation.id, &shortages).await;
            self.event_sender
                .notify(
                    vec![Role::Procurement],
                    format!(
                        "Quotation {} approved with {} material shortage(s)",
                        quotation.pfi_number,
                        shortages.len()
                    ),
                )
                .await;
        }

        Ok(AvailabilityReport {
            has_shortages,
            shortages,
        })
    }

    /// Inserts shortage rows, skipping materials that already have a
    /// PENDING row for this quotation.
    async fn persist_shortages(&self, quotation_id: Uuid, shortages: &[MaterialRequirement]) {
        for shortage in shortages {
            let exists = self.store.material_shortages.find_one(|row| {
                row.material_id == shortage.material_id
                    && row.quotation_id == Some(quotation_id)
                    && row.status == ShortageStatus::Pending
            });
            if exists.is_some() {
                continue;
            }

            let row = MaterialShortage {
                id: Uuid::new_v4(),
                material_id: shortage.material_id,
                material_name: shortage.material_name.clone(),
                quotation_id: Some(quotation_id),
                job_order_id: None,
                required_qty: shortage.required_qty,
                available_qty: shortage.available_qty,
                shortage_qty: shortage.shortage_qty,
                unit: shortage.unit.clone(),
                status: ShortageStatus::Pending,
                created_at: Utc::now(),
            };
            self.store.material_shortages.insert(row);
            info!(material = %shortage.material_name, shortage = %shortage.shortage_qty, "Shortage recorded");

            self.event_sender
                .send_or_log(Event::MaterialShortageDetected {
                    material_id: shortage.material_id,
                    quotation_id: Some(quotation_id),
                    job_id: None,
                    required: shortage.required_qty,
                    available: shortage.available_qty,
                    shortage: shortage.shortage_qty,
                })
                .await;
        }
    }
}
