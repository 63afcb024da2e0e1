//! Package weight and dimension computation.
//!
//! The storefront reports weights in grams and rarely supplies box
//! dimensions, so a synthetic cube is derived from the total line-item
//! quantity. The applicable (billable) weight is always
//! max(actual weight, volumetric weight).

use crate::storefront::ExternalOrder;

/// Divisor for the volumetric weight formula L*W*H / 5000 (cm -> kg).
pub const VOLUMETRIC_DIVISOR: f64 = 5000.0;

/// Smallest synthetic box edge, in centimeters.
pub const MIN_BOX_EDGE_CM: f64 = 10.0;

/// Smallest derived item edge, in centimeters.
pub const MIN_ITEM_EDGE_CM: f64 = 1.0;

/// Computed package attributes for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageAttributes {
    /// Actual weight in kilograms
    pub actual_weight: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    /// L*W*H / 5000, in kilograms
    pub volumetric_weight: f64,
    /// max(actual_weight, volumetric_weight)
    pub applicable_weight: f64,
}

/// Convert a gram value to kilograms.
pub fn grams_to_kg(grams: i64) -> f64 {
    grams.max(0) as f64 / 1000.0
}

/// Synthetic cube edge for an order with `total_quantity` items.
///
/// Monotonic in quantity with a floor of [`MIN_BOX_EDGE_CM`].
pub fn synthetic_box_edge_cm(total_quantity: i64) -> f64 {
    let quantity = total_quantity.max(1) as f64;
    (MIN_BOX_EDGE_CM * quantity.cbrt()).max(MIN_BOX_EDGE_CM)
}

/// Volumetric weight in kilograms for a box of the given dimensions.
pub fn volumetric_weight_kg(length_cm: f64, width_cm: f64, height_cm: f64) -> f64 {
    (length_cm * width_cm * height_cm) / VOLUMETRIC_DIVISOR
}

/// Billable weight: max of actual and volumetric. Hard business rule.
pub fn applicable_weight_kg(actual_weight: f64, volumetric_weight: f64) -> f64 {
    actual_weight.max(volumetric_weight)
}

/// Cube edge for a single item, derived from its weight when the platform
/// supplies no dimensions. Sized so the item's volumetric weight matches its
/// actual weight, floored at [`MIN_ITEM_EDGE_CM`].
pub fn item_edge_from_weight_cm(weight_kg: f64) -> f64 {
    (weight_kg.max(0.0) * VOLUMETRIC_DIVISOR)
        .cbrt()
        .max(MIN_ITEM_EDGE_CM)
}

/// Compute the package attributes for one external order.
///
/// Actual weight comes from the order's total weight, falling back to the
/// sum of line-item weights; the box is a synthetic cube derived from the
/// total quantity.
pub fn compute_package(order: &ExternalOrder) -> PackageAttributes {
    let actual_grams = order.total_weight.unwrap_or_else(|| {
        order
            .line_items
            .iter()
            .map(|item| item.grams.unwrap_or(0).max(0) * item.quantity.max(1))
            .sum()
    });
    let actual_weight = grams_to_kg(actual_grams);

    let edge = synthetic_box_edge_cm(order.total_quantity());
    let volumetric_weight = volumetric_weight_kg(edge, edge, edge);

    PackageAttributes {
        actual_weight,
        length_cm: edge,
        width_cm: edge,
        height_cm: edge,
        volumetric_weight,
        applicable_weight: applicable_weight_kg(actual_weight, volumetric_weight),
    }
}
