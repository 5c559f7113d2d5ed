//! Service layer. Each service owns one concern and is constructed with an
//! explicit store handle and event sender at startup.

pub mod classifier;
pub mod costing;
pub mod dispatch;
pub mod inventory;
pub mod job_orders;
pub mod master_data;
pub mod material_planning;
pub mod quotations;
pub mod sales_orders;

pub use classifier::classify;
pub use costing::CostingService;
pub use dispatch::DispatchService;
pub use inventory::InventoryService;
pub use job_orders::{CreateJobOrderLine, JobOrderService, TransitionRequest};
pub use master_data::{MasterDataService, RawMaterialCost, RawMaterialSource};
pub use material_planning::{AvailabilityReport, MaterialPlan, MaterialPlanningService};
pub use quotations::{CreateQuotationInput, CreateQuotationItem, QuotationService};
pub use sales_orders::SalesOrderService;
