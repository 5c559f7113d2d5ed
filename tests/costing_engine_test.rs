//! Cost calculation engine: bucket assembly, overrides, margins, and the
//! degrade-don't-fail policy for missing master data.

mod common;

use assert_matches::assert_matches;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use chemtrade_core::errors::ServiceError;
use chemtrade_core::models::{
    ChargeType, ContainerType, CostOverrides, CostSource, CostingInputs, CostingType, Incoterm,
    OrderType, Quotation, QuotationItem, QuotationStatus, TransportMode,
};
use chemtrade_core::services::RawMaterialSource;
use common::{export_quotation_input, TestApp};

fn effective(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
}

#[tokio::test]
async fn missing_quotation_is_not_found() {
    let app = TestApp::new();
    let result = app.state.services.costing.calculate_cost(
        Uuid::new_v4(),
        CostingType::ExportBulk,
        CostingInputs::default(),
    );
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn bulk_export_under_fob_has_zero_ocean_freight_and_no_packaging() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let quotation = app
        .state
        .services
        .quotations
        .create_quotation(export_quotation_input(
            product_id,
            dec!(25),
            dec!(400),
            "Bulk",
            None,
        ))
        .await
        .unwrap();

    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(quotation.id, CostingType::ExportBulk, CostingInputs::default())
        .unwrap();

    assert_eq!(breakdown.packaging.amount, Decimal::ZERO);
    assert_eq!(breakdown.packaging.source, CostSource::NotApplicable);
    assert_eq!(breakdown.ocean_freight.amount, Decimal::ZERO);
    assert_eq!(breakdown.fixed_charges.amount, Decimal::ZERO);
    assert_eq!(breakdown.fixed_charges.source, CostSource::NotApplicable);
}

#[tokio::test]
async fn port_charge_override_wins_on_bulk_export() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let quotation = app
        .state
        .services
        .quotations
        .create_quotation(export_quotation_input(
            product_id,
            dec!(25),
            dec!(400),
            "Bulk",
            None,
        ))
        .await
        .unwrap();

    let without = app
        .state
        .services
        .costing
        .calculate_cost(quotation.id, CostingType::ExportBulk, CostingInputs::default())
        .unwrap();
    assert_eq!(without.fixed_charges.amount, Decimal::ZERO);

    let inputs = CostingInputs {
        overrides: CostOverrides {
            fixed_charges: Some(dec!(850)),
            ..Default::default()
        },
        ..Default::default()
    };
    let with = app
        .state
        .services
        .costing
        .calculate_cost(quotation.id, CostingType::ExportBulk, inputs)
        .unwrap();
    assert_eq!(with.fixed_charges.amount, dec!(850));
    assert_eq!(with.fixed_charges.source, CostSource::Override);
    assert_eq!(with.total_cost, without.total_cost + dec!(850));
}

#[tokio::test]
async fn margin_guards_zero_selling_price_and_zero_quantity() {
    let app = TestApp::new();
    let now = Utc::now();
    let quotation = Quotation {
        id: Uuid::new_v4(),
        pfi_number: "PFI-00099".into(),
        customer_id: Uuid::new_v4(),
        customer_name: "Zero Case".into(),
        currency: "USD".into(),
        order_type: OrderType::Export,
        incoterm: Some(Incoterm::Fob),
        transport_mode: Some(TransportMode::Sea),
        local_type: None,
        container_type: None,
        container_count: 0,
        is_dg: false,
        destination_country: None,
        destination_port: None,
        include_vat: false,
        items: vec![QuotationItem {
            product_id: Uuid::new_v4(),
            product_name: "Nothing".into(),
            quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            packaging: "Bulk".into(),
            net_weight_kg: None,
            line_total: Decimal::ZERO,
        }],
        subtotal: Decimal::ZERO,
        vat_amount: Decimal::ZERO,
        total: Decimal::ZERO,
        status: QuotationStatus::Approved,
        rejection_reason: None,
        sales_order_id: None,
        created_at: now,
        updated_at: now,
    };
    app.state.store.quotations.insert(quotation.clone());

    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(quotation.id, CostingType::ExportBulk, CostingInputs::default())
        .unwrap();

    assert_eq!(breakdown.margin_percentage, Decimal::ZERO);
    assert_eq!(breakdown.unit_cost, Decimal::ZERO);
    assert_eq!(breakdown.unit_price, Decimal::ZERO);
}

#[tokio::test]
async fn raw_material_cost_weights_recent_receipts_by_quantity() {
    let app = TestApp::new();
    let product_id = app.seed_product("Sulphonic Acid");
    app.seed_purchase_with_receipt(
        product_id,
        dec!(10),
        dec!(100),
        5,
        chemtrade_core::models::PurchaseOrderStatus::Approved,
    );
    app.seed_purchase_with_receipt(
        product_id,
        dec!(20),
        dec!(300),
        2,
        chemtrade_core::models::PurchaseOrderStatus::Approved,
    );

    let result = app.state.services.master_data.raw_material_cost(
        product_id,
        dec!(2),
        RawMaterialSource::InventoryAvg,
    );

    // (10*100 + 20*300) / 400 = 17.5 per unit
    assert_eq!(result.unit_cost, dec!(17.5));
    assert_eq!(result.cost, dec!(35.0));
}

#[tokio::test]
async fn raw_material_cost_without_receipts_degrades_to_zero() {
    let app = TestApp::new();
    let result = app.state.services.master_data.raw_material_cost(
        Uuid::new_v4(),
        dec!(5),
        RawMaterialSource::InventoryAvg,
    );
    assert_eq!(result.cost, Decimal::ZERO);
    assert_eq!(result.unit_cost, Decimal::ZERO);
}

#[tokio::test]
async fn drum_cost_requires_an_approved_purchase() {
    let app = TestApp::new();
    let drum_id = app.seed_item("HDPE Drum 200L", chemtrade_core::models::ItemType::Packaging);
    app.seed_purchase_with_receipt(
        drum_id,
        dec!(12),
        dec!(500),
        10,
        chemtrade_core::models::PurchaseOrderStatus::Draft,
    );
    assert_eq!(app.state.services.master_data.drum_cost("drum", None), None);

    app.seed_purchase_with_receipt(
        drum_id,
        dec!(14),
        dec!(500),
        3,
        chemtrade_core::models::PurchaseOrderStatus::Approved,
    );
    assert_eq!(
        app.state.services.master_data.drum_cost("drum", None),
        Some(dec!(14))
    );
}

#[tokio::test]
async fn packaged_line_without_drum_record_contributes_zero_packaging_cost() {
    let app = TestApp::new();
    let product_id = app.seed_product("Sulphonic Acid");
    let quotation = app
        .state
        .services
        .quotations
        .create_quotation(export_quotation_input(
            product_id,
            dec!(10),
            dec!(300),
            "Drum",
            Some(dec!(200)),
        ))
        .await
        .unwrap();

    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(
            quotation.id,
            CostingType::ExportContainerized,
            CostingInputs::default(),
        )
        .unwrap();

    assert_eq!(breakdown.packaging.amount, Decimal::ZERO);
    assert_eq!(breakdown.packaging.source, CostSource::Missing);
}

#[tokio::test]
async fn thc_prefers_container_specific_row_and_scales_by_count() {
    let app = TestApp::new();
    app.seed_fixed_charge(ChargeType::Thc, None, None, dec!(300));
    app.seed_fixed_charge(
        ChargeType::Thc,
        Some(ContainerType::FortyFt),
        Some(true),
        dec!(520),
    );
    app.seed_fixed_charge(ChargeType::Documentation, None, None, dec!(150));

    let charges = app.state.services.master_data.fixed_charges(
        &[ChargeType::Thc, ChargeType::Documentation, ChargeType::Isps],
        2,
        Some(ContainerType::FortyFt),
        Some(true),
    );
    // (520 + 150 + 0 for missing ISPS) * 2 containers
    assert_eq!(charges, dec!(1340));

    // No DG-specific row for 20ft: falls back to the generic THC row.
    let fallback = app.state.services.master_data.fixed_charges(
        &[ChargeType::Thc],
        1,
        Some(ContainerType::TwentyFt),
        Some(false),
    );
    assert_eq!(fallback, dec!(300));
}

#[tokio::test]
async fn gcc_road_costing_rates_plant_to_destination() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    app.seed_route("Plant", "Saudi Arabia", dec!(4200), effective(2023));
    app.seed_route("Plant", "Saudi Arabia", dec!(4650), effective(2024));

    let mut input = export_quotation_input(product_id, dec!(25), dec!(400), "Bulk", None);
    input.transport_mode = Some(TransportMode::Road);
    input.destination_country = Some("Saudi Arabia".into());
    let quotation = app
        .state
        .services
        .quotations
        .create_quotation(input)
        .await
        .unwrap();

    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(
            quotation.id,
            CostingType::ExportGccRoad,
            CostingInputs::default(),
        )
        .unwrap();

    // Most recent active rate wins.
    assert_eq!(breakdown.transport.amount, dec!(4650));
    assert_eq!(breakdown.transport.source, CostSource::RateTable);
}

#[tokio::test]
async fn missing_transport_rate_degrades_to_zero_with_note() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let quotation = app
        .state
        .services
        .quotations
        .create_quotation(export_quotation_input(
            product_id,
            dec!(25),
            dec!(400),
            "Bulk",
            None,
        ))
        .await
        .unwrap();

    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(quotation.id, CostingType::ExportBulk, CostingInputs::default())
        .unwrap();

    assert_eq!(breakdown.transport.amount, Decimal::ZERO);
    assert_eq!(breakdown.transport.source, CostSource::Missing);
    assert!(breakdown.transport.note.is_some());
}

#[tokio::test]
async fn manual_raw_material_value_beats_lookup_and_override_beats_both() {
    let app = TestApp::new();
    let product_id = app.seed_product("Sulphonic Acid");
    app.seed_purchase_with_receipt(
        product_id,
        dec!(10),
        dec!(100),
        1,
        chemtrade_core::models::PurchaseOrderStatus::Approved,
    );
    let quotation = app
        .state
        .services
        .quotations
        .create_quotation(export_quotation_input(
            product_id,
            dec!(10),
            dec!(300),
            "Bulk",
            None,
        ))
        .await
        .unwrap();

    let manual = CostingInputs {
        raw_material_value: Some(dec!(777)),
        ..Default::default()
    };
    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(quotation.id, CostingType::ExportBulk, manual)
        .unwrap();
    assert_eq!(breakdown.raw_material.amount, dec!(777));
    assert_eq!(breakdown.raw_material.source, CostSource::Manual);

    let overridden = CostingInputs {
        raw_material_value: Some(dec!(777)),
        overrides: CostOverrides {
            raw_material: Some(dec!(500)),
            ..Default::default()
        },
        ..Default::default()
    };
    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(quotation.id, CostingType::ExportBulk, overridden)
        .unwrap();
    assert_eq!(breakdown.raw_material.amount, dec!(500));
    assert_eq!(breakdown.raw_material.source, CostSource::Override);
}
