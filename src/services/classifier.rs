//! Costing-type classification.
//!
//! A pure, total function from raw order attributes to one of the twelve
//! costing sheets. All string comparison is case-insensitive; absent or
//! blank packaging reads as bulk. First matching rule wins.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::models::{CostingAttributes, CostingType};

/// Destinations reachable by road from the plant under the GCC costing
/// sheet.
static GCC_ROAD_COUNTRIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["saudi arabia", "bahrain", "kuwait", "oman", "qatar"])
});

fn normalized(value: &Option<String>) -> String {
    value
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn is_bulk_or_blank(packaging: &str) -> bool {
    packaging.is_empty() || packaging == "bulk"
}

/// Classifies an order into its costing type.
pub fn classify(attributes: &CostingAttributes) -> CostingType {
    let order_type = normalized(&attributes.order_type);
    let packaging = normalized(&attributes.packaging);
    let destination = normalized(&attributes.destination_country);
    let transport_mode = normalized(&attributes.transport_mode);
    let local_type = normalized(&attributes.local_type);
    let container_type = normalized(&attributes.container_type);

    // Rule 1: export by road, GCC destinations get their own sheet.
    if order_type == "export" && transport_mode == "road" {
        return if GCC_ROAD_COUNTRIES.contains(destination.as_str()) {
            CostingType::ExportGccRoad
        } else {
            CostingType::ExportRoad
        };
    }

    // Rule 2: local orders dispatch on the local sub-type. GCC road locals
    // share the export-GCC costing sheet.
    if order_type == "local" {
        return match local_type.as_str() {
            "direct_to_customer" => CostingType::LocalPurchaseSale,
            "bulk_to_plant" => CostingType::LocalBulkToPlant,
            "packaged_to_plant" => CostingType::LocalDrumToPlant,
            "gcc_road_bulk" | "gcc_road" => CostingType::ExportGccRoad,
            _ => CostingType::LocalDispatch,
        };
    }

    // Rule 3: export, not road.
    if order_type == "export" {
        if is_bulk_or_blank(&packaging) {
            return CostingType::ExportBulk;
        }
        let by_sea = transport_mode == "sea" || transport_mode == "ocean";
        if by_sea && !container_type.is_empty() {
            if container_type.starts_with("40") {
                return if attributes.is_dg {
                    CostingType::Export40FtDg
                } else {
                    CostingType::Export40FtNonDg
                };
            }
            if container_type.starts_with("20") {
                return if attributes.is_dg {
                    CostingType::Export20FtDg
                } else {
                    CostingType::Export20FtNonDg
                };
            }
        }
        return CostingType::ExportContainerized;
    }

    // Rule 4: unrecognized order type.
    CostingType::LocalDispatch
}
