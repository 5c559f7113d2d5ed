//! In-memory document store.
//!
//! The core treats persistence as a generic document store: collections
//! queried by predicate, updated atomically per document, plus a shared
//! atomic counter table for sequence-number generation. The store handle is
//! constructed explicitly at startup and passed into each service — there is
//! no ambient global connection.

use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{
    inventory::{InventoryBalance, InventoryItem, InventoryReservation, Product},
    job_order::JobOrder,
    logistics::{ShippingBooking, TransportOutward},
    master_data::{
        FixedCharge, Packaging, PackagingBom, PackagingBomItem, ProductBom, ProductBomItem,
        TransportRoute,
    },
    procurement::{GrnItem, MaterialShortage, PurchaseOrder, PurchaseOrderLine},
    quotation::Quotation,
    sales_order::SalesOrder,
};

/// A document with a stable identity.
pub trait Document: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
}

/// A typed collection of documents.
///
/// `update` and `upsert` run their closure while holding the shard lock for
/// the key, which makes each call atomic with respect to that document.
/// Cross-document consistency is the caller's concern.
#[derive(Debug)]
pub struct Collection<T: Document> {
    items: DashMap<Uuid, T>,
}

impl<T: Document> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> Collection<T> {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    pub fn insert(&self, doc: T) -> Uuid {
        let id = doc.id();
        self.items.insert(id, doc);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.items.get(id).map(|entry| entry.value().clone())
    }

    /// All documents matching the predicate. Ordering is unspecified;
    /// callers sort when order matters.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.items
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn find_one(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.items
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
    }

    /// Atomically mutate a document in place. Returns the closure's result,
    /// or `None` if the document does not exist.
    pub fn update<R>(&self, id: &Uuid, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.items.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Atomically insert-or-mutate. Used for balance increments, where the
    /// first receipt for a material creates the balance row.
    pub fn upsert(&self, id: Uuid, init: impl FnOnce() -> T, f: impl FnOnce(&mut T)) -> T {
        let mut entry = self.items.entry(id).or_insert_with(init);
        f(entry.value_mut());
        entry.value().clone()
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.items.remove(id).map(|(_, doc)| doc)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Atomic sequence counters keyed by entity type (job numbers, PFI numbers,
/// booking numbers). Each `next` is a single atomic increment-and-read, so
/// values are unique and monotonic across concurrent callers.
#[derive(Debug, Default)]
pub struct Counters {
    values: DashMap<String, u64>,
}

impl Counters {
    pub fn next(&self, key: &str) -> u64 {
        let mut entry = self.values.entry(key.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn current(&self, key: &str) -> u64 {
        self.values.get(key).map(|entry| *entry).unwrap_or(0)
    }
}

/// The full set of collections the core operates on.
#[derive(Debug, Default)]
pub struct Store {
    pub quotations: Collection<Quotation>,
    pub sales_orders: Collection<SalesOrder>,
    pub job_orders: Collection<JobOrder>,
    pub products: Collection<Product>,
    pub inventory_items: Collection<InventoryItem>,
    pub inventory_balances: Collection<InventoryBalance>,
    pub inventory_reservations: Collection<InventoryReservation>,
    pub purchase_orders: Collection<PurchaseOrder>,
    pub purchase_order_lines: Collection<PurchaseOrderLine>,
    pub grn_items: Collection<GrnItem>,
    pub transport_routes: Collection<TransportRoute>,
    pub fixed_charges: Collection<FixedCharge>,
    pub product_boms: Collection<ProductBom>,
    pub product_bom_items: Collection<ProductBomItem>,
    pub packaging: Collection<Packaging>,
    pub packaging_boms: Collection<PackagingBom>,
    pub packaging_bom_items: Collection<PackagingBomItem>,
    pub shipping_bookings: Collection<ShippingBooking>,
    pub transport_outward: Collection<TransportOutward>,
    pub material_shortages: Collection<MaterialShortage>,
    pub counters: Counters,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats the next sequence number for an entity type, e.g.
    /// `next_number("PFI", "pfi") -> "PFI-00042"`.
    pub fn next_number(&self, prefix: &str, counter_key: &str) -> String {
        format!("{}-{:05}", prefix, self.counters.next(counter_key))
    }
}
