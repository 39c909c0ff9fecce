use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::opening::Opening;

/// The possible statuses of an order.
///
/// Linear fulfillment progression with one branch point (`FactoryShipped` is
/// only reachable for delivery orders) and two terminal states (`Delivered`,
/// `Rejected`). The legality of each move lives in the transition table in
/// `services::order_status`, not here.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum OrderStatus {
    Pending,
    Approved,
    FactoryOrdered,
    Processing,
    FactoryShipped,
    ReadyForDelivery,
    Delivered,
    Rejected,
}

impl OrderStatus {
    /// Terminal statuses admit no further transition; only archival may
    /// still change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Rejected)
    }
}

/// The central aggregate: one customer's order for a set of openings.
///
/// `total_area_m2` and `total_cost` are caches of the aggregation over
/// `openings` and the effective rate; they are recomputed in full on every
/// mutation and never patched independently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned, sequential.
    pub id: u64,

    /// Owning customer.
    pub user_id: u64,

    /// Snapshot of the customer's name at creation time.
    pub customer_name: String,

    /// Snapshot of the customer's phone at creation time.
    pub customer_phone: Option<String>,

    /// Insertion order is the physical numbering of the openings.
    pub openings: Vec<Opening>,

    /// Catalog key of the chosen product line.
    pub material_name: String,

    pub color: String,

    /// Snapshot of the material's blade width at order time.
    pub blade_width_cm: Decimal,

    /// Snapshot of the material's rate at order time, decoupled from later
    /// catalog price changes.
    pub price_per_square_meter: Decimal,

    /// Admin-set override. When present it takes precedence for costing;
    /// the snapshot above is retained for display and audit.
    pub overridden_price_per_square_meter: Option<Decimal>,

    /// Cached aggregate, always equal to the recomputation from `openings`.
    pub total_area_m2: Decimal,

    /// Cached aggregate, always `total_area_m2 * effective rate`.
    pub total_cost: Decimal,

    pub status: OrderStatus,

    /// Visibility filter only; blocks no transition.
    pub is_archived: bool,

    /// Advisory flag raised by the owning customer while `Pending`, cleared
    /// when an admin applies the requested edit.
    pub is_edit_requested: bool,

    pub has_delivery: bool,
    pub has_installation: bool,
    pub delivery_address: Option<String>,

    /// Additive; the grand total is derived on demand, never cached.
    pub delivery_cost: Decimal,

    pub scheduled_delivery_date: Option<NaiveDate>,
    pub actual_delivery_date: Option<NaiveDate>,

    /// 1–5, set at most once by the owning customer after delivery.
    pub rating: Option<u8>,
    pub review: Option<String>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Optimistic counter bumped by the store on every successful save.
    pub version: i32,
}

impl Order {
    /// The rate actually used for costing: the admin override when present,
    /// otherwise the creation-time snapshot.
    pub fn effective_price_per_m2(&self) -> Decimal {
        self.overridden_price_per_square_meter
            .unwrap_or(self.price_per_square_meter)
    }

    /// Blind cost plus delivery cost. Derived at display/invoice time.
    pub fn grand_total(&self) -> Decimal {
        self.total_cost + self.delivery_cost
    }

    pub fn is_owned_by(&self, user_id: u64) -> bool {
        self.user_id == user_id
    }

    pub fn has_review(&self) -> bool {
        self.rating.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bare_order() -> Order {
        Order {
            id: 1,
            user_id: 7,
            customer_name: "Rania Haddad".into(),
            customer_phone: None,
            openings: vec![],
            material_name: "aluminium-39".into(),
            color: "white".into(),
            blade_width_cm: dec!(3.9),
            price_per_square_meter: dec!(120),
            overridden_price_per_square_meter: None,
            total_area_m2: dec!(4.5),
            total_cost: dec!(540),
            status: OrderStatus::Pending,
            is_archived: false,
            is_edit_requested: false,
            has_delivery: true,
            has_installation: false,
            delivery_address: Some("12 Port St".into()),
            delivery_cost: dec!(25),
            scheduled_delivery_date: None,
            actual_delivery_date: None,
            rating: None,
            review: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
        }
    }

    #[test]
    fn grand_total_adds_delivery_on_demand() {
        let order = bare_order();
        assert_eq!(order.grand_total(), dec!(565));
    }

    #[test]
    fn override_takes_precedence_when_present() {
        let mut order = bare_order();
        assert_eq!(order.effective_price_per_m2(), dec!(120));
        order.overridden_price_per_square_meter = Some(dec!(100));
        assert_eq!(order.effective_price_per_m2(), dec!(100));
    }

    #[test]
    fn status_parses_from_its_display_form() {
        let status: OrderStatus = "ReadyForDelivery".parse().unwrap();
        assert_eq!(status, OrderStatus::ReadyForDelivery);
        assert!(!status.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }
}
