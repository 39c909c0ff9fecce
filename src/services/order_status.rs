//! The order fulfillment state machine.
//!
//! One explicit transition table of `(action, from, to, guard)` rows,
//! evaluated by a single [`attempt_transition`] function, instead of
//! per-action status checks scattered across call sites. The table is the
//! whole truth about which moves are legal; everything else here is
//! bookkeeping for the side effects a legal move authorizes.
//!
//! All forward transitions are admin-only. The owning customer's two
//! abilities (requesting an edit while `Pending`, reviewing after
//! `Delivered`) are not transitions and live on the order service.

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::events::Event;
use crate::models::{Order, OrderStatus, User};

/// A fulfillment action an admin can request on an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum OrderAction {
    /// `Pending` → `Approved`; notifies the customer.
    Approve,
    /// `Pending` → `Rejected`; terminal, notifies the customer.
    Reject,
    /// `Approved` → `FactoryOrdered`; notifies the customer.
    SendToFactory,
    /// `FactoryOrdered` → `Processing`; computes the scheduled delivery
    /// date from the supplied positive lead time.
    Schedule { lead_days: u32 },
    /// `Processing` → `FactoryShipped`; delivery orders only.
    MarkShipped,
    /// `Processing` (pickup) or `FactoryShipped` (delivery) →
    /// `ReadyForDelivery`. For pickup orders the UI relabels this status
    /// "ready for pickup"; the stored value is the same.
    MarkReady,
    /// `ReadyForDelivery` → `Delivered`; stamps the actual delivery date
    /// and unlocks the customer's rating/review.
    ConfirmDelivered,
}

impl OrderAction {
    /// The status this action moves an order to, independent of whether
    /// the move is currently legal.
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Approve => OrderStatus::Approved,
            OrderAction::Reject => OrderStatus::Rejected,
            OrderAction::SendToFactory => OrderStatus::FactoryOrdered,
            OrderAction::Schedule { .. } => OrderStatus::Processing,
            OrderAction::MarkShipped => OrderStatus::FactoryShipped,
            OrderAction::MarkReady => OrderStatus::ReadyForDelivery,
            OrderAction::ConfirmDelivered => OrderStatus::Delivered,
        }
    }

    fn kind(&self) -> ActionKind {
        match self {
            OrderAction::Approve => ActionKind::Approve,
            OrderAction::Reject => ActionKind::Reject,
            OrderAction::SendToFactory => ActionKind::SendToFactory,
            OrderAction::Schedule { .. } => ActionKind::Schedule,
            OrderAction::MarkShipped => ActionKind::MarkShipped,
            OrderAction::MarkReady => ActionKind::MarkReady,
            OrderAction::ConfirmDelivered => ActionKind::ConfirmDelivered,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ActionKind {
    Approve,
    Reject,
    SendToFactory,
    Schedule,
    MarkShipped,
    MarkReady,
    ConfirmDelivered,
}

/// Branch condition a table row applies under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Guard {
    Always,
    DeliveryOnly,
    PickupOnly,
}

impl Guard {
    fn admits(&self, order: &Order) -> bool {
        match self {
            Guard::Always => true,
            Guard::DeliveryOnly => order.has_delivery,
            Guard::PickupOnly => !order.has_delivery,
        }
    }
}

struct TransitionRule {
    action: ActionKind,
    from: OrderStatus,
    to: OrderStatus,
    guard: Guard,
}

/// The full transition table. `FactoryShipped` exists only on the delivery
/// branch: pickup orders go `Processing → ReadyForDelivery` directly, and
/// delivery orders may not skip the shipping step.
const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        action: ActionKind::Approve,
        from: OrderStatus::Pending,
        to: OrderStatus::Approved,
        guard: Guard::Always,
    },
    TransitionRule {
        action: ActionKind::Reject,
        from: OrderStatus::Pending,
        to: OrderStatus::Rejected,
        guard: Guard::Always,
    },
    TransitionRule {
        action: ActionKind::SendToFactory,
        from: OrderStatus::Approved,
        to: OrderStatus::FactoryOrdered,
        guard: Guard::Always,
    },
    TransitionRule {
        action: ActionKind::Schedule,
        from: OrderStatus::FactoryOrdered,
        to: OrderStatus::Processing,
        guard: Guard::Always,
    },
    TransitionRule {
        action: ActionKind::MarkShipped,
        from: OrderStatus::Processing,
        to: OrderStatus::FactoryShipped,
        guard: Guard::DeliveryOnly,
    },
    TransitionRule {
        action: ActionKind::MarkReady,
        from: OrderStatus::Processing,
        to: OrderStatus::ReadyForDelivery,
        guard: Guard::PickupOnly,
    },
    TransitionRule {
        action: ActionKind::MarkReady,
        from: OrderStatus::FactoryShipped,
        to: OrderStatus::ReadyForDelivery,
        guard: Guard::Always,
    },
    TransitionRule {
        action: ActionKind::ConfirmDelivered,
        from: OrderStatus::ReadyForDelivery,
        to: OrderStatus::Delivered,
        guard: Guard::Always,
    },
];

/// A legal transition applied to a copy of the order, plus the events the
/// move authorizes. Nothing is persisted here; the caller saves the order
/// under the CAS contract and emits the events only after the save sticks.
#[derive(Clone, Debug)]
pub struct TransitionOutcome {
    pub order: Order,
    pub events: Vec<Event>,
}

/// Applies `action` to `order` on behalf of `actor`.
///
/// Fails without touching anything when the actor is not an admin, when
/// the table has no row for the current status, or when the row's branch
/// guard does not admit this order.
pub fn attempt_transition(
    order: &Order,
    actor: &User,
    action: OrderAction,
) -> Result<TransitionOutcome, ServiceError> {
    if !actor.is_admin() {
        return Err(ServiceError::PermissionDenied(format!(
            "Role '{}' may not change order status",
            actor.role
        )));
    }

    let rule = TRANSITIONS
        .iter()
        .find(|rule| {
            rule.action == action.kind() && rule.from == order.status && rule.guard.admits(order)
        })
        .ok_or(ServiceError::InvalidTransition {
            from: order.status,
            to: action.target(),
        })?;

    let today = Utc::now().date_naive();
    let mut updated = order.clone();
    updated.status = rule.to;
    updated.updated_at = Some(Utc::now());

    let mut events = vec![Event::OrderStatusChanged {
        order_id: order.id,
        old_status: rule.from,
        new_status: rule.to,
    }];

    match action {
        OrderAction::Approve => events.push(Event::OrderApproved(order.id)),
        OrderAction::Reject => events.push(Event::OrderRejected(order.id)),
        OrderAction::Schedule { lead_days } => {
            let scheduled_for = schedule_date(today, lead_days)?;
            updated.scheduled_delivery_date = Some(scheduled_for);
            events.push(Event::OrderScheduled {
                order_id: order.id,
                scheduled_for,
            });
        }
        OrderAction::ConfirmDelivered => {
            updated.actual_delivery_date = Some(today);
            events.push(Event::OrderDelivered {
                order_id: order.id,
                delivered_on: today,
            });
        }
        OrderAction::SendToFactory | OrderAction::MarkShipped | OrderAction::MarkReady => {}
    }

    Ok(TransitionOutcome {
        order: updated,
        events,
    })
}

/// Statuses reachable from `status` in one legal move for this order's
/// delivery branch. Surfaced to the admin queue UI.
pub fn reachable_statuses(order: &Order) -> Vec<OrderStatus> {
    TRANSITIONS
        .iter()
        .filter(|rule| rule.from == order.status && rule.guard.admits(order))
        .map(|rule| rule.to)
        .collect()
}

fn schedule_date(today: NaiveDate, lead_days: u32) -> Result<NaiveDate, ServiceError> {
    if lead_days == 0 {
        return Err(ServiceError::ValidationError(
            "Scheduling lead time must be a positive number of days".to_string(),
        ));
    }
    today
        .checked_add_days(Days::new(u64::from(lead_days)))
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("Lead time of {lead_days} days is out of range"))
        })
}
