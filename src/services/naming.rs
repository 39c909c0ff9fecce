//! Cosmetic display-name suggestion for an order.
//!
//! Deterministic stand-in for the naming suggestions the surrounding
//! application may generate; nothing downstream depends on the shape of
//! the string.

use crate::models::Order;

/// Suggests a human-friendly display name for an order.
pub fn suggest_order_name(order: &Order) -> String {
    let openings = order.openings.len();
    let noun = if openings == 1 { "opening" } else { "openings" };
    format!(
        "{} - {} {} ({} {})",
        order.customer_name, order.color, order.material_name, openings, noun
    )
}
