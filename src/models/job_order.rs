use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::store::Document;

use super::quotation::Incoterm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum JobStatus {
    Pending,
    /// Side branch while raw materials are being purchased; returns to
    /// `pending` once covered.
    Procurement,
    Approved,
    InProduction,
    ProductionCompleted,
    ReadyForDispatch,
    Dispatched,
    Rescheduled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Dispatched)
    }

    /// Valid transitions of the job state machine. `rescheduled` is
    /// reachable from any non-terminal state.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if next == JobStatus::Rescheduled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Approved)
                | (JobStatus::Pending, JobStatus::Procurement)
                | (JobStatus::Procurement, JobStatus::Pending)
                | (JobStatus::Approved, JobStatus::InProduction)
                | (JobStatus::InProduction, JobStatus::ProductionCompleted)
                | (JobStatus::ProductionCompleted, JobStatus::ReadyForDispatch)
                | (JobStatus::ReadyForDispatch, JobStatus::Dispatched)
                | (JobStatus::Rescheduled, JobStatus::Pending)
                | (JobStatus::Rescheduled, JobStatus::Approved)
                | (JobStatus::Rescheduled, JobStatus::InProduction)
                | (JobStatus::Rescheduled, JobStatus::Procurement)
        )
    }
}

/// One exploded BOM line: requirement against live availability at the time
/// the job (or availability check) was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub material_id: Uuid,
    pub material_name: String,
    pub required_qty: Decimal,
    pub available_qty: Decimal,
    pub shortage_qty: Decimal,
    pub unit: String,
}

impl MaterialRequirement {
    pub fn has_shortage(&self) -> bool {
        self.shortage_qty > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reschedule {
    pub date: DateTime<Utc>,
    pub reason: String,
}

/// One job-order record per product line. Several records share a job number
/// because each product needs its own BOM explosion and its own dispatch
/// routing. The BOM snapshot is a point-in-time copy owned by the job, not a
/// live reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOrder {
    pub id: Uuid,
    pub job_number: String,
    pub sales_order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub packaging: String,
    /// `None` is the canonical value for bulk packaging, never a default.
    pub net_weight_kg: Option<Decimal>,
    /// Copied from the originating quotation so routing never has to walk
    /// sales-order -> quotation again.
    pub incoterm: Option<Incoterm>,
    pub status: JobStatus,
    pub procurement_required: bool,
    pub procurement_reason: Option<String>,
    pub bom_snapshot: Vec<MaterialRequirement>,
    /// At most one of these is ever set (local vs export routing).
    pub transport_outward_id: Option<Uuid>,
    pub shipping_booking_id: Option<Uuid>,
    pub reschedule: Option<Reschedule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobOrder {
    pub fn has_routing(&self) -> bool {
        self.transport_outward_id.is_some() || self.shipping_booking_id.is_some()
    }
}

impl Document for JobOrder {
    fn id(&self) -> Uuid {
        self.id
    }
}
