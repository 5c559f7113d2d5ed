//! Quotation lifecycle: creation, totals, approval, rejection, revision.
//!
//! Approval triggers the material availability check so shortages reach
//! procurement before a sales order ever exists. Conversion to a sales
//! order is owned by the sales-order service and is terminal.

use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{
    is_bulk_packaging, ContainerType, Incoterm, LocalOrderType, OrderType, Quotation,
    QuotationItem, QuotationStatus, TransportMode,
};
use crate::store::Store;

use super::material_planning::{AvailabilityReport, MaterialPlanningService};

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuotationItem {
    pub product_id: Uuid,
    #[validate(custom = "validate_positive")]
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[validate(length(max = 64))]
    pub packaging: String,
    pub net_weight_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuotationInput {
    pub customer_id: Uuid,
    #[validate(length(min = 1))]
    pub customer_name: String,
    pub currency: Option<String>,
    pub order_type: OrderType,
    pub incoterm: Option<Incoterm>,
    pub transport_mode: Option<TransportMode>,
    pub local_type: Option<LocalOrderType>,
    pub container_type: Option<ContainerType>,
    #[serde(default)]
    pub container_count: u32,
    #[serde(default)]
    pub is_dg: bool,
    pub destination_country: Option<String>,
    pub destination_port: Option<String>,
    #[serde(default)]
    pub include_vat: bool,
    #[validate]
    pub items: Vec<CreateQuotationItem>,
}

#[derive(Debug, Clone)]
pub struct QuotationService {
    store: Arc<Store>,
    event_sender: EventSender,
    planner: MaterialPlanningService,
    vat_rate: Decimal,
    default_currency: String,
}

impl QuotationService {
    pub fn new(
        store: Arc<Store>,
        event_sender: EventSender,
        planner: MaterialPlanningService,
        vat_rate: f64,
        default_currency: String,
    ) -> Self {
        Self {
            store,
            event_sender,
            planner,
            vat_rate: Decimal::from_f64(vat_rate).unwrap_or(Decimal::ZERO),
            default_currency,
        }
    }

    #[instrument(skip(self, input), fields(customer = %input.customer_name))]
    pub async fn create_quotation(
        &self,
        input: CreateQuotationInput,
    ) -> Result<Quotation, ServiceError> {
        input.validate()?;
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "at least one line item is required".into(),
            ));
        }

        let items = self.build_items(&input.items)?;
        let (subtotal, vat_amount, total) =
            self.totals(&items, input.order_type, input.include_vat);

        let now = Utc::now();
        let quotation = Quotation {
            id: Uuid::new_v4(),
            pfi_number: self.store.next_number("PFI", "quotation"),
            customer_id: input.customer_id,
            customer_name: input.customer_name,
            currency: input
                .currency
                .unwrap_or_else(|| self.default_currency.clone()),
            order_type: input.order_type,
            incoterm: input.incoterm,
            transport_mode: input.transport_mode,
            local_type: input.local_type,
            container_type: input.container_type,
            container_count: input.container_count,
            is_dg: input.is_dg,
            destination_country: input.destination_country,
            destination_port: input.destination_port,
            include_vat: input.include_vat,
            items,
            subtotal,
            vat_amount,
            total,
            status: QuotationStatus::Pending,
            rejection_reason: None,
            sales_order_id: None,
            created_at: now,
            updated_at: now,
        };
        let id = self.store.quotations.insert(quotation.clone());

        info!(%id, pfi = %quotation.pfi_number, "Quotation created");
        self.event_sender.send_or_log(Event::QuotationCreated(id)).await;
        Ok(quotation)
    }

    /// Approves a pending quotation and runs the availability check, which
    /// may raise shortages to procurement.
    #[instrument(skip(self))]
    pub async fn approve_quotation(
        &self,
        quotation_id: Uuid,
    ) -> Result<(Quotation, AvailabilityReport), ServiceError> {
        let quotation = self
            .store
            .quotations
            .update(&quotation_id, |quotation| {
                if quotation.status != QuotationStatus::Pending {
                    return Err(ServiceError::InvalidOperation(format!(
                        "cannot approve a {} quotation",
                        quotation.status
                    )));
                }
                quotation.status = QuotationStatus::Approved;
                quotation.updated_at = Utc::now();
                Ok(quotation.clone())
            })
            .ok_or_else(|| ServiceError::not_found("Quotation", quotation_id))??;

        self.event_sender
            .send_or_log(Event::QuotationApproved(quotation_id))
            .await;

        let report = self.planner.check_material_availability(&quotation).await?;
        Ok((quotation, report))
    }

    #[instrument(skip(self))]
    pub async fn reject_quotation(
        &self,
        quotation_id: Uuid,
        reason: Option<String>,
    ) -> Result<Quotation, ServiceError> {
        let quotation = self
            .store
            .quotations
            .update(&quotation_id, |quotation| {
                if quotation.status != QuotationStatus::Pending {
                    return Err(ServiceError::InvalidOperation(format!(
                        "cannot reject a {} quotation",
                        quotation.status
                    )));
                }
                quotation.status = QuotationStatus::Rejected;
                quotation.rejection_reason = reason.clone();
                quotation.updated_at = Utc::now();
                Ok(quotation.clone())
            })
            .ok_or_else(|| ServiceError::not_found("Quotation", quotation_id))??;

        self.event_sender
            .send_or_log(Event::QuotationRejected {
                quotation_id,
                reason: quotation.rejection_reason.clone(),
            })
            .await;
        Ok(quotation)
    }

    /// Re-edits a pending or rejected quotation in place, resetting it to
    /// pending with recomputed totals.
    #[instrument(skip(self, items))]
    pub async fn update_items(
        &self,
        quotation_id: Uuid,
        items: Vec<CreateQuotationItem>,
    ) -> Result<Quotation, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "at least one line item is required".into(),
            ));
        }
        let built = self.build_items(&items)?;

        self.store
            .quotations
            .update(&quotation_id, |quotation| {
                if !matches!(
                    quotation.status,
                    QuotationStatus::Pending | QuotationStatus::Rejected
                ) {
                    return Err(ServiceError::InvalidOperation(format!(
                        "cannot edit a {} quotation",
                        quotation.status
                    )));
                }
                let (subtotal, vat_amount, total) =
                    self.totals(&built, quotation.order_type, quotation.include_vat);
                quotation.items = built.clone();
                quotation.subtotal = subtotal;
                quotation.vat_amount = vat_amount;
                quotation.total = total;
                quotation.status = QuotationStatus::Pending;
                quotation.rejection_reason = None;
                quotation.updated_at = Utc::now();
                Ok(quotation.clone())
            })
            .ok_or_else(|| ServiceError::not_found("Quotation", quotation_id))?
    }

    /// Revises a rejected quotation into a fresh pending one under a new
    /// PFI number.
    #[instrument(skip(self))]
    pub async fn revise_quotation(&self, quotation_id: Uuid) -> Result<Quotation, ServiceError> {
        let original = self
            .store
            .quotations
            .get(&quotation_id)
            .ok_or_else(|| ServiceError::not_found("Quotation", quotation_id))?;
        if original.status != QuotationStatus::Rejected {
            return Err(ServiceError::InvalidOperation(format!(
                "only rejected quotations can be revised; this one is {}",
                original.status
            )));
        }

        let now = Utc::now();
        let revision = Quotation {
            id: Uuid::new_v4(),
            pfi_number: self.store.next_number("PFI", "quotation"),
            status: QuotationStatus::Pending,
            rejection_reason: None,
            sales_order_id: None,
            created_at: now,
            updated_at: now,
            ..original
        };
        self.store.quotations.insert(revision.clone());
        self.event_sender
            .send_or_log(Event::QuotationCreated(revision.id))
            .await;
        Ok(revision)
    }

    fn build_items(
        &self,
        items: &[CreateQuotationItem],
    ) -> Result<Vec<QuotationItem>, ServiceError> {
        items
            .iter()
            .map(|item| {
                item.validate()?;
                let product = self
                    .store
                    .products
                    .get(&item.product_id)
                    .ok_or_else(|| ServiceError::not_found("Product", item.product_id))?;

                let is_bulk = is_bulk_packaging(&item.packaging);
                // Net weight must be explicit for packaged lines and is
                // canonically null for bulk, whatever the caller sent.
                let net_weight_kg = if is_bulk {
                    None
                } else {
                    match item.net_weight_kg {
                        Some(net) if net > Decimal::ZERO => Some(net),
                        _ => {
                            return Err(ServiceError::ValidationError(format!(
                                "explicit net_weight_kg required for non-bulk packaging '{}'",
                                item.packaging
                            )))
                        }
                    }
                };

                Ok(QuotationItem {
                    product_id: item.product_id,
                    product_name: product.name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    packaging: item.packaging.clone(),
                    net_weight_kg,
                    line_total: item.quantity * item.unit_price,
                })
            })
            .collect()
    }

    /// `total = Σ line totals + VAT`, VAT applying only to local orders
    /// with `include_vat` set.
    fn totals(
        &self,
        items: &[QuotationItem],
        order_type: OrderType,
        include_vat: bool,
    ) -> (Decimal, Decimal, Decimal) {
        let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();
        let vat_amount = if order_type == OrderType::Local && include_vat {
            subtotal * self.vat_rate
        } else {
            Decimal::ZERO
        };
        (subtotal, vat_amount, subtotal + vat_amount)
    }
}
