//! Shared test harness: an application state over a fresh in-memory store
//! with a drained event channel, plus master-data seeding helpers.
#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use chemtrade_core::config::AppConfig;
use chemtrade_core::models::{
    ChargeType, ContainerType, FixedCharge, GrnItem, Incoterm, InventoryBalance, InventoryItem,
    ItemType, LocalOrderType, OrderType, PackagingBom, PackagingBomItem, Product, ProductBom,
    ProductBomItem, PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus, TransportMode,
    TransportRoute,
};
use chemtrade_core::services::{CreateQuotationInput, CreateQuotationItem};
use chemtrade_core::AppState;

pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.auto_advance_secs = 0;
        customize(&mut config);
        let (state, mut receiver) = AppState::build(config);
        // Drain events so senders never block on a full channel.
        tokio::spawn(async move { while receiver.recv().await.is_some() {} });
        Self { state }
    }

    pub fn seed_product(&self, name: &str) -> Uuid {
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sku: format!("SKU-{}", name.to_uppercase().replace(' ', "-")),
            unit: "kg".into(),
            current_stock: Decimal::ZERO,
        };
        self.state.store.products.insert(product)
    }

    pub fn seed_item(&self, name: &str, item_type: ItemType) -> Uuid {
        let item = InventoryItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sku: format!("ITM-{}", name.to_uppercase().replace(' ', "-")),
            item_type,
            unit: "kg".into(),
        };
        self.state.store.inventory_items.insert(item)
    }

    pub fn set_on_hand(&self, product_id: Uuid, on_hand: Decimal) {
        self.state.store.inventory_balances.insert(InventoryBalance {
            product_id,
            on_hand,
            updated_at: Utc::now(),
        });
    }

    /// Active BOM with `(material_id, kg required per kg finished)` rows.
    pub fn seed_bom(&self, product_id: Uuid, lines: &[(Uuid, Decimal)]) -> Uuid {
        let bom_id = self.state.store.product_boms.insert(ProductBom {
            id: Uuid::new_v4(),
            product_id,
            is_active: true,
        });
        for &(material_id, ratio) in lines {
            self.state.store.product_bom_items.insert(ProductBomItem {
                id: Uuid::new_v4(),
                bom_id,
                material_id,
                qty_per_kg: ratio,
                unit: "kg".into(),
            });
        }
        bom_id
    }

    pub fn seed_packaging_bom(&self, packaging_name: &str, lines: &[(Uuid, Decimal)]) -> Uuid {
        let bom_id = self.state.store.packaging_boms.insert(PackagingBom {
            id: Uuid::new_v4(),
            packaging_name: packaging_name.to_string(),
            is_active: true,
        });
        for &(material_id, per_unit) in lines {
            self.state
                .store
                .packaging_bom_items
                .insert(PackagingBomItem {
                    id: Uuid::new_v4(),
                    packaging_bom_id: bom_id,
                    material_id,
                    qty_per_unit: per_unit,
                    unit: "pcs".into(),
                });
        }
        bom_id
    }

    pub fn seed_route(&self, origin: &str, destination: &str, rate: Decimal, effective: NaiveDate) {
        self.state.store.transport_routes.insert(TransportRoute {
            id: Uuid::new_v4(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            vehicle_type: None,
            rate,
            effective_date: effective,
            is_active: true,
        });
    }

    pub fn seed_fixed_charge(
        &self,
        charge_type: ChargeType,
        container_type: Option<ContainerType>,
        is_dg: Option<bool>,
        amount: Decimal,
    ) {
        self.state.store.fixed_charges.insert(FixedCharge {
            id: Uuid::new_v4(),
            charge_type,
            container_type,
            is_dg,
            amount,
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_active: true,
        });
    }

    /// A purchase-order line plus a goods receipt against it, `days_ago`
    /// back from now. Returns the item's PO line id.
    pub fn seed_purchase_with_receipt(
        &self,
        item_id: Uuid,
        unit_price: Decimal,
        quantity: Decimal,
        days_ago: i64,
        status: PurchaseOrderStatus,
    ) -> Uuid {
        let when = Utc::now() - ChronoDuration::days(days_ago);
        let po_id = self.state.store.purchase_orders.insert(PurchaseOrder {
            id: Uuid::new_v4(),
            po_number: format!("PO-{}", days_ago),
            supplier_name: "Acme Chemicals".into(),
            status,
            ordered_at: when,
        });
        let line_id = self
            .state
            .store
            .purchase_order_lines
            .insert(PurchaseOrderLine {
                id: Uuid::new_v4(),
                purchase_order_id: po_id,
                item_id,
                quantity,
                unit_price,
                created_at: when,
            });
        self.state.store.grn_items.insert(GrnItem {
            id: Uuid::new_v4(),
            grn_number: format!("GRN-{}", days_ago),
            purchase_order_line_id: line_id,
            item_id,
            quantity_received: quantity,
            received_at: when,
        });
        line_id
    }
}

/// A single-line export quotation input; tests adjust fields as needed.
pub fn export_quotation_input(
    product_id: Uuid,
    quantity: Decimal,
    unit_price: Decimal,
    packaging: &str,
    net_weight_kg: Option<Decimal>,
) -> CreateQuotationInput {
    CreateQuotationInput {
        customer_id: Uuid::new_v4(),
        customer_name: "Gulf Trading LLC".into(),
        currency: None,
        order_type: OrderType::Export,
        incoterm: Some(Incoterm::Fob),
        transport_mode: Some(TransportMode::Sea),
        local_type: None,
        container_type: None,
        container_count: 1,
        is_dg: false,
        destination_country: Some("India".into()),
        destination_port: Some("Nhava Sheva".into()),
        include_vat: false,
        items: vec![CreateQuotationItem {
            product_id,
            quantity,
            unit_price,
            packaging: packaging.to_string(),
            net_weight_kg,
        }],
    }
}

/// A single-line local quotation input.
pub fn local_quotation_input(
    product_id: Uuid,
    quantity: Decimal,
    unit_price: Decimal,
    include_vat: bool,
) -> CreateQuotationInput {
    CreateQuotationInput {
        customer_id: Uuid::new_v4(),
        customer_name: "Emirates Industrial".into(),
        currency: None,
        order_type: OrderType::Local,
        incoterm: Some(Incoterm::Ddp),
        transport_mode: Some(TransportMode::Road),
        local_type: Some(LocalOrderType::DirectToCustomer),
        container_type: None,
        container_count: 0,
        is_dg: false,
        destination_country: Some("United Arab Emirates".into()),
        destination_port: None,
        include_vat,
        items: vec![CreateQuotationItem {
            product_id,
            quantity,
            unit_price,
            packaging: "Bulk".into(),
            net_weight_kg: None,
        }],
    }
}
