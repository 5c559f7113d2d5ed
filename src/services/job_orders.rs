//! Job orders: creation contract, status machine, deferred auto-advance.
//!
//! One job number spans one job-order record per product line, since each
//! product needs its own BOM explosion and its own dispatch routing. The
//! authoritative status change always commits first; routing, inventory
//! postings and notifications fan out afterwards and are independently
//! retryable.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::errors::ServiceError;
use crate::events::{Event, EventSender, Role};
use crate::models::{is_bulk_packaging, JobOrder, JobStatus, Reschedule};
use crate::store::Store;

use super::dispatch::DispatchService;
use super::inventory::InventoryService;
use super::material_planning::MaterialPlanningService;

fn validate_positive(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("quantity_must_be_positive"))
    }
}

/// One requested production line for a sales order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateJobOrderLine {
    pub product_id: Uuid,
    #[validate(custom = "validate_positive")]
    pub quantity: Decimal,
    #[validate(length(max = 64))]
    pub packaging: String,
    /// Required for non-bulk lines; must be absent for bulk.
    pub net_weight_kg: Option<Decimal>,
}

/// Optional payload accompanying a status transition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransitionRequest {
    pub reschedule_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct JobOrderService {
    store: Arc<Store>,
    event_sender: EventSender,
    planner: MaterialPlanningService,
    inventory: InventoryService,
    dispatch: DispatchService,
    auto_advance_delay: Duration,
    /// Deferred auto-advance tasks keyed by job id, aborted whenever the
    /// job transitions through the normal path.
    timers: Arc<DashMap<Uuid, JoinHandle<()>>>,
}

impl JobOrderService {
    pub fn new(
        store: Arc<Store>,
        event_sender: EventSender,
        planner: MaterialPlanningService,
        inventory: InventoryService,
        dispatch: DispatchService,
        auto_advance_delay: Duration,
    ) -> Self {
        Self {
            store,
            event_sender,
            planner,
            inventory,
            dispatch,
            auto_advance_delay,
            timers: Arc::new(DashMap::new()),
        }
    }

    /// Creates one job-order record per line item, all sharing a job
    /// number. Validation runs for every line before anything is inserted.
    #[instrument(skip(self, lines))]
    pub async fn create_job_orders(
        &self,
        sales_order_id: Uuid,
        lines: Vec<CreateJobOrderLine>,
    ) -> Result<Vec<JobOrder>, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "at least one line item is required".into(),
            ));
        }

        let sales_order = self
            .store
            .sales_orders
            .get(&sales_order_id)
            .ok_or_else(|| ServiceError::not_found("Sales order", sales_order_id))?;
        let incoterm = self
            .store
            .quotations
            .get(&sales_order.quotation_id)
            .and_then(|quotation| quotation.incoterm);

        // Validate everything up front so a bad line commits no side effects.
        let mut prepared = Vec::with_capacity(lines.len());
        for line in &lines {
            line.validate()?;
            let product = self
                .store
                .products
                .get(&line.product_id)
                .ok_or_else(|| ServiceError::not_found("Product", line.product_id))?;
            let required_kg = MaterialPlanningService::required_kg(
                line.quantity,
                &line.packaging,
                line.net_weight_kg,
            )?;
            prepared.push((line.clone(), product, required_kg));
        }

        let job_number = self.store.next_number("JOB", "job_order");
        let mut created = Vec::with_capacity(prepared.len());

        for (line, product, required_kg) in prepared {
            let is_bulk = is_bulk_packaging(&line.packaging);
            let finished_available = self.planner.available(line.product_id);
            let finished_sufficient = finished_available >= line.quantity;

            // BOM snapshot is taken regardless of finished stock, so the
            // job carries its material picture either way.
            let plan = self.planner.explode_product_bom(line.product_id, required_kg);

            let (status, procurement_required, reason) = if plan.missing_bom {
                (
                    JobStatus::Pending,
                    true,
                    Some("no BOM configured".to_string()),
                )
            } else if plan.has_shortages() {
                let names: Vec<String> = plan
                    .shortages()
                    .iter()
                    .map(|s| s.material_name.clone())
                    .collect();
                (
                    JobStatus::Pending,
                    true,
                    Some(format!("material shortage: {}", names.join(", "))),
                )
            } else if finished_sufficient {
                // Stock already covers the order; no production needed.
                (JobStatus::ReadyForDispatch, false, None)
            } else {
                (JobStatus::Pending, false, None)
            };

            let now = Utc::now();
            let job = JobOrder {
                id: Uuid::new_v4(),
                job_number: job_number.clone(),
                sales_order_id,
                product_id: line.product_id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                packaging: line.packaging.clone(),
                // Bulk stays None no matter what the caller sent.
                net_weight_kg: if is_bulk { None } else { line.net_weight_kg },
                incoterm,
                status,
                procurement_required,
                procurement_reason: reason.clone(),
                bom_snapshot: plan.requirements.clone(),
                transport_outward_id: None,
                shipping_booking_id: None,
                reschedule: None,
                created_at: now,
                updated_at: now,
            };
            let job_id = self.store.job_orders.insert(job.clone());

            info!(%job_id, %job_number, status = %status, "Job order created");
            self.event_sender
                .send_or_log(Event::JobOrderCreated {
                    job_id,
                    job_number: job_number.clone(),
                })
                .await;

            if procurement_required {
                let reason = reason.unwrap_or_default();
                for shortage in plan.shortages() {
                    self.event_sender
                        .send_or_log(Event::MaterialShortageDetected {
                            material_id: shortage.material_id,
                            quotation_id: None,
                            job_id: Some(job_id),
                            required: shortage.required_qty,
                            available: shortage.available_qty,
                            shortage: shortage.shortage_qty,
                        })
                        .await;
                }
                self.event_sender
                    .send_or_log(Event::ProcurementRequired {
                        job_id,
                        reason: reason.clone(),
                    })
                    .await;
                self.event_sender
                    .notify(
                        vec![Role::Procurement],
                        format!("Job {} needs procurement: {}", job_number, reason),
                    )
                    .await;
            }

            if status == JobStatus::ReadyForDispatch {
                self.dispatch.ensure_dispatch_routing(job_id).await;
            }

            // Re-read: routing may have linked a record onto the job.
            created.push(self.store.job_orders.get(&job_id).unwrap_or(job));
        }

        Ok(created)
    }

    /// Transitions a job's status. The status string is validated against
    /// the enumerated set, the transition against the state machine; the
    /// write commits before any side effect runs.
    #[instrument(skip(self, extra))]
    pub async fn transition_status(
        &self,
        job_id: Uuid,
        new_status: &str,
        extra: Option<TransitionRequest>,
    ) -> Result<JobOrder, ServiceError> {
        let status = JobStatus::from_str(new_status.trim())
            .map_err(|_| ServiceError::InvalidStatus(new_status.to_string()))?;
        self.apply_transition(job_id, status, extra).await
    }

    async fn apply_transition(
        &self,
        job_id: Uuid,
        new_status: JobStatus,
        extra: Option<TransitionRequest>,
    ) -> Result<JobOrder, ServiceError> {
        let extra = extra.unwrap_or_default();

        let committed = self
            .store
            .job_orders
            .update(&job_id, |job| {
                if !job.status.can_transition_to(new_status) {
                    return Err(ServiceError::InvalidOperation(format!(
                        "cannot transition job from {} to {}",
                        job.status, new_status
                    )));
                }
                let old_status = job.status;
                job.status = new_status;
                if new_status == JobStatus::Rescheduled {
                    job.reschedule = Some(Reschedule {
                        date: extra.reschedule_date.unwrap_or_else(Utc::now),
                        reason: extra.reason.clone().unwrap_or_default(),
                    });
                }
                job.updated_at = Utc::now();
                Ok((old_status, job.clone()))
            })
            .ok_or_else(|| ServiceError::not_found("Job order", job_id))??;

        let (old_status, job) = committed;

        // Any committed transition supersedes a pending auto-advance.
        self.cancel_auto_advance(job_id);

        self.event_sender
            .send_or_log(Event::JobStatusChanged {
                job_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        match new_status {
            JobStatus::ProductionCompleted => {
                // Finished goods enter stock; the dispatch buffer starts.
                self.inventory
                    .adjust_on_hand(job.product_id, job.quantity)
                    .await;
                self.schedule_auto_advance(job_id);
            }
            JobStatus::ReadyForDispatch => {
                self.dispatch.ensure_dispatch_routing(job_id).await;
            }
            JobStatus::Dispatched => {
                self.inventory
                    .adjust_on_hand(job.product_id, -job.quantity)
                    .await;
            }
            _ => {}
        }

        Ok(self.store.job_orders.get(&job_id).unwrap_or(job))
    }

    /// Schedules the deferred `production_completed -> ready_for_dispatch`
    /// advance: a cancellable timer keyed by job id that re-reads the
    /// current status before writing, never blindly overwriting.
    fn schedule_auto_advance(&self, job_id: Uuid) {
        self.cancel_auto_advance(job_id);
        let service = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(service.auto_advance_delay).await;
            service.timers.remove(&job_id);

            let Some(job) = service.store.job_orders.get(&job_id) else {
                return;
            };
            if job.status != JobStatus::ProductionCompleted {
                // A manual transition got there first.
                return;
            }
            if let Err(e) = service
                .apply_transition(job_id, JobStatus::ReadyForDispatch, None)
                .await
            {
                warn!(%job_id, error = %e, "Auto-advance skipped");
            }
        });
        self.timers.insert(job_id, handle);
    }

    fn cancel_auto_advance(&self, job_id: Uuid) {
        if let Some((_, handle)) = self.timers.remove(&job_id) {
            handle.abort();
        }
    }
}
