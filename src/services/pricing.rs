//! Aggregation of an order's openings into billable totals.
//!
//! Always a full recompute over the current opening set. Decimal
//! arithmetic keeps repeated recomputation exact, so the cached totals on
//! an order can be compared bit-for-bit against a fresh aggregation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Opening, Order};

/// Billable totals for one order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub total_area_m2: Decimal,
    pub total_cost: Decimal,
}

/// Sums opening areas and prices them at the effective rate.
///
/// The override, when present, takes precedence over the snapshot rate;
/// the snapshot is untouched so clearing the override restores it.
pub fn compute_totals(
    openings: &[Opening],
    blade_width_cm: Decimal,
    price_per_square_meter: Decimal,
    override_price: Option<Decimal>,
) -> OrderTotals {
    let total_area_m2: Decimal = openings
        .iter()
        .map(|opening| opening.area_m2(blade_width_cm))
        .sum();

    let effective_rate = override_price.unwrap_or(price_per_square_meter);

    OrderTotals {
        total_area_m2,
        total_cost: total_area_m2 * effective_rate,
    }
}

/// Recomputes and writes back an order's cached totals.
///
/// Called on every mutation that can change them: opening add/edit/remove,
/// override set/clear, order edit.
pub fn refresh_order_totals(order: &mut Order) {
    let totals = compute_totals(
        &order.openings,
        order.blade_width_cm,
        order.price_per_square_meter,
        order.overridden_price_per_square_meter,
    );
    order.total_area_m2 = totals.total_area_m2;
    order.total_cost = totals.total_cost;
}

/// Totals for an order as stored, without touching it.
pub fn compute_order_totals(order: &Order) -> OrderTotals {
    compute_totals(
        &order.openings,
        order.blade_width_cm,
        order.price_per_square_meter,
        order.overridden_price_per_square_meter,
    )
}
