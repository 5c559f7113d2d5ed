//! Typed entity models for every collection the core operates on.
//!
//! The source system stored these as loosely validated nested documents;
//! here each entity is an explicit struct with typed enums for the closed
//! vocabularies (statuses, incoterms, costing types). Legacy/optional fields
//! that survive for compatibility are `Option` and documented at the field.

pub mod costing;
pub mod inventory;
pub mod job_order;
pub mod logistics;
pub mod master_data;
pub mod procurement;
pub mod quotation;
pub mod sales_order;

pub use costing::{
    CostBasis, CostBreakdown, CostComponent, CostOverrides, CostSource, CostingAttributes,
    CostingInputs, CostingType,
};
pub use inventory::{InventoryBalance, InventoryItem, InventoryReservation, ItemType, Product};
pub use job_order::{JobOrder, JobStatus, MaterialRequirement, Reschedule};
pub use logistics::{BookingStatus, OutwardStatus, ShippingBooking, TransportOutward};
pub use master_data::{
    ChargeType, FixedCharge, Packaging, PackagingBom, PackagingBomItem, ProductBom,
    ProductBomItem, TransportRoute,
};
pub use procurement::{
    GrnItem, MaterialShortage, PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus,
    ShortageStatus,
};
pub use quotation::{
    ContainerType, Incoterm, LocalOrderType, OrderType, Quotation, QuotationItem, QuotationStatus,
    TransportMode,
};
pub use sales_order::{Payment, PaymentStatus, SalesOrder};

/// Packaging strings are free text on line items; blank or "bulk" (any case)
/// means bulk. Centralized so every module agrees on the rule.
pub fn is_bulk_packaging(packaging: &str) -> bool {
    let trimmed = packaging.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("bulk")
}
