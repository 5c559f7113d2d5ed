//! chemtrade-core
//!
//! Costing, material-requirement planning and dispatch routing core for a
//! chemical export and local-sales ERP backend. The crate exposes the
//! operation contracts the (external) API layer calls: costing-type
//! classification, cost calculation, material availability checks, job
//! order creation and status transitions, and idempotent dispatch routing.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use config::AppConfig;
use events::{Event, EventSender};
use services::{
    CostingService, DispatchService, InventoryService, JobOrderService, MasterDataService,
    MaterialPlanningService, QuotationService, SalesOrderService,
};
use store::Store;

/// The service set, wired once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub master_data: MasterDataService,
    pub costing: CostingService,
    pub inventory: InventoryService,
    pub material_planning: MaterialPlanningService,
    pub quotations: QuotationService,
    pub sales_orders: SalesOrderService,
    pub job_orders: JobOrderService,
    pub dispatch: DispatchService,
}

/// Application state: explicit store handle, configuration, event channel
/// and services. No ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<Store>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    /// Builds the full state over a fresh store. Returns the event receiver
    /// so the caller can run `events::process_events` (or drain it in
    /// tests).
    pub fn build(config: AppConfig) -> (Self, mpsc::Receiver<Event>) {
        let store = Arc::new(Store::new());
        let (event_sender, receiver) = events::channel(config.event_buffer);

        let master_data = MasterDataService::new(store.clone());
        let inventory = InventoryService::new(store.clone(), event_sender.clone());
        let material_planning = MaterialPlanningService::new(
            store.clone(),
            inventory.clone(),
            event_sender.clone(),
        );
        let costing = CostingService::new(
            store.clone(),
            master_data.clone(),
            config.plant_origin.clone(),
            config.loading_port.clone(),
        );
        let quotations = QuotationService::new(
            store.clone(),
            event_sender.clone(),
            material_planning.clone(),
            config.vat_rate,
            config.default_currency.clone(),
        );
        let sales_orders = SalesOrderService::new(store.clone(), event_sender.clone());
        let dispatch = DispatchService::new(store.clone(), event_sender.clone());
        let job_orders = JobOrderService::new(
            store.clone(),
            event_sender.clone(),
            material_planning.clone(),
            inventory.clone(),
            dispatch.clone(),
            Duration::from_secs(config.auto_advance_secs),
        );

        let services = AppServices {
            master_data,
            costing,
            inventory,
            material_planning,
            quotations,
            sales_orders,
            job_orders,
            dispatch,
        };

        (
            Self {
                config,
                store,
                event_sender,
                services,
            },
            receiver,
        )
    }

    /// Builds state from layered configuration files and environment.
    pub fn from_env() -> anyhow::Result<(Self, mpsc::Receiver<Event>)> {
        let config = config::load_config().context("loading configuration")?;
        Ok(Self::build(config))
    }

    /// Starts the routing reconciliation sweep.
    pub fn start_reconciliation(&self) -> JoinHandle<()> {
        self.services.dispatch.spawn_reconciliation(Duration::from_secs(
            self.config.reconciliation_interval_secs,
        ))
    }
}
