//! Table-driven coverage of the costing-type decision order.

use test_case::test_case;

use chemtrade_core::models::{CostingAttributes, CostingType};
use chemtrade_core::services::classify;

fn attributes(
    order_type: &str,
    packaging: &str,
    transport_mode: &str,
    destination: &str,
    local_type: &str,
    container_type: &str,
    is_dg: bool,
) -> CostingAttributes {
    let opt = |s: &str| {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };
    CostingAttributes {
        order_type: opt(order_type),
        packaging: opt(packaging),
        incoterm: None,
        destination_country: opt(destination),
        transport_mode: opt(transport_mode),
        local_type: opt(local_type),
        container_type: opt(container_type),
        is_dg,
    }
}

#[test_case("export", "Drum", "road", "Saudi Arabia", "", "", false => CostingType::ExportGccRoad; "road to gcc")]
#[test_case("export", "Drum", "road", "India", "", "", false => CostingType::ExportRoad; "road elsewhere")]
#[test_case("local", "", "", "", "direct_to_customer", "", false => CostingType::LocalPurchaseSale; "local direct")]
#[test_case("local", "", "", "", "bulk_to_plant", "", false => CostingType::LocalBulkToPlant; "local bulk to plant")]
#[test_case("local", "", "", "", "packaged_to_plant", "", false => CostingType::LocalDrumToPlant; "local packaged to plant")]
#[test_case("local", "", "", "", "gcc_road", "", false => CostingType::ExportGccRoad; "local gcc road shares export sheet")]
#[test_case("local", "", "", "", "gcc_road_bulk", "", false => CostingType::ExportGccRoad; "local gcc road bulk shares export sheet")]
#[test_case("local", "", "", "", "", "", false => CostingType::LocalDispatch; "local without sub type")]
#[test_case("local", "", "", "", "walk_in", "", false => CostingType::LocalDispatch; "local unknown sub type")]
#[test_case("export", "Bulk", "sea", "", "", "", false => CostingType::ExportBulk; "sea bulk")]
#[test_case("export", "", "sea", "", "", "", false => CostingType::ExportBulk; "blank packaging reads as bulk")]
#[test_case("export", "Drum", "sea", "", "", "40ft", true => CostingType::Export40FtDg; "forty foot dg")]
#[test_case("export", "Drum", "sea", "", "", "40ft", false => CostingType::Export40FtNonDg; "forty foot non dg")]
#[test_case("export", "Drum", "ocean", "", "", "20ft", true => CostingType::Export20FtDg; "twenty foot dg via ocean")]
#[test_case("export", "Drum", "sea", "", "", "20ft", false => CostingType::Export20FtNonDg; "twenty foot non dg")]
#[test_case("export", "Drum", "sea", "", "", "", false => CostingType::ExportContainerized; "packaged sea without container type")]
#[test_case("export", "Drum", "air", "", "", "40ft", false => CostingType::ExportContainerized; "container type ignored off sea")]
#[test_case("consignment", "Drum", "sea", "", "", "", false => CostingType::LocalDispatch; "unrecognized order type")]
fn classifies(
    order_type: &str,
    packaging: &str,
    transport_mode: &str,
    destination: &str,
    local_type: &str,
    container_type: &str,
    is_dg: bool,
) -> CostingType {
    classify(&attributes(
        order_type,
        packaging,
        transport_mode,
        destination,
        local_type,
        container_type,
        is_dg,
    ))
}

#[test]
fn case_of_inputs_does_not_change_the_result() {
    let lower = attributes("export", "drum", "road", "saudi arabia", "", "", false);
    let upper = attributes("EXPORT", "DRUM", "ROAD", "SAUDI ARABIA", "", "", false);
    let mixed = attributes("Export", "Drum", "Road", "Saudi Arabia", "", "", false);
    assert_eq!(classify(&lower), CostingType::ExportGccRoad);
    assert_eq!(classify(&lower), classify(&upper));
    assert_eq!(classify(&lower), classify(&mixed));
}

#[test]
fn every_gcc_destination_maps_to_the_gcc_sheet() {
    for destination in ["Saudi Arabia", "Bahrain", "Kuwait", "Oman", "Qatar"] {
        let attrs = attributes("export", "Drum", "road", destination, "", "", false);
        assert_eq!(classify(&attrs), CostingType::ExportGccRoad, "{}", destination);
    }
}
