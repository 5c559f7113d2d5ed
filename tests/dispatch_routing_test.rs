//! Dispatch routing: incoterm split, idempotency, deferred routing and the
//! reconciliation sweep.

mod common;

use chrono::Utc;
use rust_decimal_macros::dec;
use uuid::Uuid;

use chemtrade_core::models::{
    BookingStatus, CostSource, CostingInputs, CostingType, Incoterm, JobStatus, ShippingBooking,
};
use chemtrade_core::services::CreateJobOrderLine;
use common::{export_quotation_input, local_quotation_input, TestApp};

/// Stocked product -> quotation -> sales order -> one job order. Returns
/// `(quotation_id, sales_order_id, job_id)`.
async fn routed_job(
    app: &TestApp,
    input: chemtrade_core::services::CreateQuotationInput,
) -> (Uuid, Uuid, Uuid) {
    let product_id = input.items[0].product_id;
    let quantity = input.items[0].quantity;
    let packaging = input.items[0].packaging.clone();
    let net = input.items[0].net_weight_kg;
    app.set_on_hand(product_id, quantity * dec!(2));

    let quotation = app
        .state
        .services
        .quotations
        .create_quotation(input)
        .await
        .unwrap();
    app.state
        .services
        .quotations
        .approve_quotation(quotation.id)
        .await
        .unwrap();
    let sales_order = app
        .state
        .services
        .sales_orders
        .create_from_quotation(quotation.id)
        .await
        .unwrap();
    let jobs = app
        .state
        .services
        .job_orders
        .create_job_orders(
            sales_order.id,
            vec![CreateJobOrderLine {
                product_id,
                quantity,
                packaging,
                net_weight_kg: net,
            }],
        )
        .await
        .unwrap();
    (quotation.id, sales_order.id, jobs[0].id)
}

#[tokio::test]
async fn fob_routes_to_a_shipping_booking() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let (_, _, job_id) = routed_job(
        &app,
        export_quotation_input(product_id, dec!(25), dec!(400), "Bulk", None),
    )
    .await;

    let job = app.state.store.job_orders.get(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::ReadyForDispatch);
    let booking_id = job.shipping_booking_id.unwrap();
    let booking = app.state.store.shipping_bookings.get(&booking_id).unwrap();
    assert!(booking.covers_job(job_id));
    assert!(booking.booking_number.starts_with("SB-"));
}

#[tokio::test]
async fn exw_routes_to_a_transport_outward() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let mut input = export_quotation_input(product_id, dec!(25), dec!(400), "Bulk", None);
    input.incoterm = Some(Incoterm::Exw);
    let (_, _, job_id) = routed_job(&app, input).await;

    let job = app.state.store.job_orders.get(&job_id).unwrap();
    let outward_id = job.transport_outward_id.unwrap();
    assert!(job.shipping_booking_id.is_none());

    let outward = app.state.store.transport_outward.get(&outward_id).unwrap();
    assert_eq!(outward.job_id, job_id);
    assert_eq!(outward.product_name, "Caustic Soda");
    assert_eq!(outward.quantity, dec!(25));
    assert!(outward.outward_number.starts_with("TO-"));
}

#[tokio::test]
async fn routing_is_idempotent() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let (_, _, job_id) = routed_job(
        &app,
        export_quotation_input(product_id, dec!(25), dec!(400), "Bulk", None),
    )
    .await;
    assert_eq!(app.state.store.shipping_bookings.len(), 1);

    // Repeated invocations create nothing further.
    let created = app
        .state
        .services
        .dispatch
        .ensure_dispatch_routing(job_id)
        .await;
    assert!(!created);
    assert_eq!(app.state.store.shipping_bookings.len(), 1);
}

#[tokio::test]
async fn routing_without_an_incoterm_is_deferred() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let mut input = export_quotation_input(product_id, dec!(25), dec!(400), "Bulk", None);
    input.incoterm = None;
    let (_, _, job_id) = routed_job(&app, input).await;

    let job = app.state.store.job_orders.get(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::ReadyForDispatch);
    assert!(!job.has_routing());
    assert!(app.state.store.shipping_bookings.is_empty());
    assert!(app.state.store.transport_outward.is_empty());
}

#[tokio::test]
async fn reconciliation_picks_up_a_deferred_job() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let mut input = export_quotation_input(product_id, dec!(25), dec!(400), "Bulk", None);
    input.incoterm = None;
    let (quotation_id, _, job_id) = routed_job(&app, input).await;

    // The incoterm arrives later on the quotation.
    app.state.store.quotations.update(&quotation_id, |quotation| {
        quotation.incoterm = Some(Incoterm::Fob);
    });

    let routed = app.state.services.dispatch.reconcile_once().await;
    assert_eq!(routed, 1);
    let job = app.state.store.job_orders.get(&job_id).unwrap();
    assert!(job.shipping_booking_id.is_some());

    // A second sweep finds nothing to do.
    assert_eq!(app.state.services.dispatch.reconcile_once().await, 0);
}

#[tokio::test]
async fn an_existing_booking_covering_the_job_is_reused() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    let mut input = export_quotation_input(product_id, dec!(25), dec!(400), "Bulk", None);
    input.incoterm = None;
    let (quotation_id, _, job_id) = routed_job(&app, input).await;

    let booking_id = app.state.store.shipping_bookings.insert(ShippingBooking {
        id: Uuid::new_v4(),
        booking_number: "SB-77777".into(),
        job_ids: vec![job_id, Uuid::new_v4()],
        status: BookingStatus::Pending,
        created_at: Utc::now(),
    });
    app.state.store.quotations.update(&quotation_id, |quotation| {
        quotation.incoterm = Some(Incoterm::Cfr);
    });

    let created = app
        .state
        .services
        .dispatch
        .ensure_dispatch_routing(job_id)
        .await;
    assert!(!created);
    assert_eq!(app.state.store.shipping_bookings.len(), 1);
    let job = app.state.store.job_orders.get(&job_id).unwrap();
    assert_eq!(job.shipping_booking_id, Some(booking_id));
}

#[tokio::test]
async fn jobs_not_ready_for_dispatch_are_never_routed() {
    let app = TestApp::new();
    let product_id = app.seed_product("Mystery Blend");
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
    app.state
        .services
        .quotations
        .approve_quotation(quotation.id)
        .await
        .unwrap();
    let sales_order = app
        .state
        .services
        .sales_orders
        .create_from_quotation(quotation.id)
        .await
        .unwrap();
    let jobs = app
        .state
        .services
        .job_orders
        .create_job_orders(
            sales_order.id,
            vec![CreateJobOrderLine {
                product_id,
                quantity: dec!(10),
                packaging: "Bulk".into(),
                net_weight_kg: None,
            }],
        )
        .await
        .unwrap();
    let job_id = jobs[0].id;
    assert_eq!(jobs[0].status, JobStatus::Pending);

    let created = app
        .state
        .services
        .dispatch
        .ensure_dispatch_routing(job_id)
        .await;
    assert!(!created);
    assert!(app.state.store.shipping_bookings.is_empty());
}

#[tokio::test]
async fn local_costing_prefers_recorded_outward_charges() {
    let app = TestApp::new();
    let product_id = app.seed_product("Caustic Soda");
    app.seed_route(
        "Plant",
        "United Arab Emirates",
        dec!(900),
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    );
    let (quotation_id, _, job_id) = routed_job(
        &app,
        local_quotation_input(product_id, dec!(20), dec!(350), false),
    )
    .await;

    // Dispatch records the actual trip charge on the outward.
    let outward_id = app
        .state
        .store
        .job_orders
        .get(&job_id)
        .unwrap()
        .transport_outward_id
        .unwrap();
    app.state.store.transport_outward.update(&outward_id, |outward| {
        outward.transport_charge = Some(dec!(1150));
    });

    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(quotation_id, CostingType::LocalDispatch, CostingInputs::default())
        .unwrap();
    assert_eq!(breakdown.transport.amount, dec!(1150));
    assert_eq!(breakdown.transport.source, CostSource::RecordedActual);

    // Without a recorded charge the rate table is the fallback.
    app.state.store.transport_outward.update(&outward_id, |outward| {
        outward.transport_charge = None;
    });
    let breakdown = app
        .state
        .services
        .costing
        .calculate_cost(quotation_id, CostingType::LocalDispatch, CostingInputs::default())
        .unwrap();
    assert_eq!(breakdown.transport.amount, dec!(900));
    assert_eq!(breakdown.transport.source, CostSource::RateTable);
}
