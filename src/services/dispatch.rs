//! Dispatch routing.
//!
//! Once a job reaches `ready_for_dispatch`, exactly one downstream
//! logistics record is created: an export shipping booking (FOB/CFR/CIF/CIP)
//! or a local transport-outward (EXW/DDP). Routing is idempotent — the
//! guard checks that both routing references are absent, not the status
//! alone — and best-effort: failures are logged and left for the periodic
//! reconciliation sweep, never raised to the caller.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender, Role};
use crate::models::{
    BookingStatus, Incoterm, JobOrder, JobStatus, OutwardStatus, ShippingBooking,
    TransportOutward,
};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct DispatchService {
    store: Arc<Store>,
    event_sender: EventSender,
}

impl DispatchService {
    pub fn new(store: Arc<Store>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Ensures a `ready_for_dispatch` job has its routing record, creating
    /// one if needed. Returns whether a record was created; never errors.
    #[instrument(skip(self))]
    pub async fn ensure_dispatch_routing(&self, job_id: Uuid) -> bool {
        let Some(job) = self.store.job_orders.get(&job_id) else {
            warn!(%job_id, "Routing requested for unknown job");
            return false;
        };
        if job.status != JobStatus::ReadyForDispatch || job.has_routing() {
            return false;
        }

        match self.route(job_id, &job).await {
            Ok(created) => created,
            Err(e) => {
                // Best effort: the reconciliation sweep retries later.
                error!(%job_id, error = %e, "Dispatch routing failed");
                false
            }
        }
    }

    async fn route(&self, job_id: Uuid, job: &JobOrder) -> Result<bool, ServiceError> {
        let Some(incoterm) = self.resolve_incoterm(job) else {
            // A job may sit ready-for-dispatch until an incoterm exists.
            debug!(%job_id, "No incoterm resolvable; routing deferred");
            return Ok(false);
        };

        if incoterm.is_export_routing() {
            self.route_export(job_id, job).await
        } else {
            self.route_local(job_id, job).await
        }
    }

    /// Incoterm stored on the job wins; otherwise walk sales-order ->
    /// quotation.
    fn resolve_incoterm(&self, job: &JobOrder) -> Option<Incoterm> {
        if let Some(incoterm) = job.incoterm {
            return Some(incoterm);
        }
        let sales_order = self.store.sales_orders.get(&job.sales_order_id)?;
        let quotation = self.store.quotations.get(&sales_order.quotation_id)?;
        quotation.incoterm
    }

    async fn route_export(&self, job_id: Uuid, job: &JobOrder) -> Result<bool, ServiceError> {
        // Bookings can aggregate multiple jobs; reuse one that already
        // covers this job before creating another.
        if let Some(existing) = self
            .store
            .shipping_bookings
            .find_one(|booking| booking.covers_job(job_id))
        {
            self.link_booking(job_id, existing.id);
            return Ok(false);
        }

        let booking = ShippingBooking {
            id: Uuid::new_v4(),
            booking_number: self.store.next_number("SB", "shipping_booking"),
            job_ids: vec![job_id],
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        let booking_id = booking.id;
        let booking_number = booking.booking_number.clone();
        self.store.shipping_bookings.insert(booking);

        if !self.link_booking(job_id, booking_id) {
            // Lost a concurrent race; discard the duplicate record.
            self.store.shipping_bookings.remove(&booking_id);
            return Ok(false);
        }

        info!(%job_id, %booking_number, "Shipping booking created");
        self.event_sender
            .send_or_log(Event::ShippingBookingCreated {
                job_id,
                booking_id,
                booking_number: booking_number.clone(),
            })
            .await;
        self.event_sender
            .notify(
                vec![Role::Shipping, Role::Export, Role::Admin],
                format!(
                    "Job {} ready for export; booking {} raised",
                    job.job_number, booking_number
                ),
            )
            .await;
        Ok(true)
    }

    async fn route_local(&self, job_id: Uuid, job: &JobOrder) -> Result<bool, ServiceError> {
        let customer_name = self
            .store
            .sales_orders
            .get(&job.sales_order_id)
            .map(|so| so.customer_name)
            .unwrap_or_default();

        let outward = TransportOutward {
            id: Uuid::new_v4(),
            outward_number: self.store.next_number("TO", "transport_outward"),
            job_id,
            product_name: job.product_name.clone(),
            quantity: job.quantity,
            packaging: job.packaging.clone(),
            customer_name,
            transport_charge: None,
            status: OutwardStatus::Pending,
            created_at: Utc::now(),
        };
        let outward_id = outward.id;
        let outward_number = outward.outward_number.clone();
        self.store.transport_outward.insert(outward);

        let linked = self
            .store
            .job_orders
            .update(&job_id, |job| {
                if job.status == JobStatus::ReadyForDispatch && !job.has_routing() {
                    job.transport_outward_id = Some(outward_id);
                    job.updated_at = Utc::now();
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false);

        if !linked {
            self.store.transport_outward.remove(&outward_id);
            return Ok(false);
        }

        info!(%job_id, %outward_number, "Transport outward created");
        self.event_sender
            .send_or_log(Event::TransportOutwardCreated {
                job_id,
                outward_id,
                outward_number: outward_number.clone(),
            })
            .await;
        self.event_sender
            .notify(
                vec![Role::Transport, Role::Dispatch, Role::Admin],
                format!(
                    "Job {} ready for local dispatch; outward {} raised",
                    job.job_number, outward_number
                ),
            )
            .await;
        Ok(true)
    }

    /// Conditionally attaches a booking reference. The closure re-checks
    /// the routing guard inside the per-document atomic update, which
    /// closes the concurrent double-routing race.
    fn link_booking(&self, job_id: Uuid, booking_id: Uuid) -> bool {
        self.store
            .job_orders
            .update(&job_id, |job| {
                if job.status == JobStatus::ReadyForDispatch && !job.has_routing() {
                    job.shipping_booking_id = Some(booking_id);
                    job.updated_at = Utc::now();
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false)
    }

    /// Periodic self-healing sweep: re-scan `ready_for_dispatch` jobs
    /// missing both routing references and re-invoke the router. A no-op
    /// most of the time.
    pub fn spawn_reconciliation(&self, interval: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                service.reconcile_once().await;
            }
        })
    }

    /// One sweep pass, exposed for tests.
    pub async fn reconcile_once(&self) -> usize {
        let unrouted = self.store.job_orders.find(|job| {
            job.status == JobStatus::ReadyForDispatch && !job.has_routing()
        });
        let mut routed = 0usize;
        for job in unrouted {
            if self.ensure_dispatch_routing(job.id).await {
                routed += 1;
            }
        }
        if routed > 0 {
            info!(routed, "Reconciliation sweep routed jobs");
        }
        routed
    }
}
