//! Order orchestration: the mutation surface of the engine.
//!
//! Every mutation recomputes the cached totals in full, saves under the
//! repository's compare-and-swap contract, and only then emits events.
//! Role checks work off the verified [`User`] the caller resolved from the
//! session; nothing here trusts a client-side toggle.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{AccessoryLine, Opening, OpeningInput, Order, OrderStatus, User};
use crate::repositories::{MaterialRepository, OrderRepository, UserRepository};
use crate::services::accessories::propose_accessories;
use crate::services::dimensions::derive_opening;
use crate::services::order_status::{attempt_transition, OrderAction};
use crate::services::pricing::refresh_order_totals;

/// Maximum rating a delivered order can receive.
const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Owning customer. Customers may only submit for themselves; admins
    /// may submit on behalf of any customer (the order then skips
    /// approval).
    pub user_id: u64,
    #[validate(length(min = 1, message = "Material is required"))]
    pub material_name: String,
    #[validate(length(min = 1, message = "Color is required"))]
    pub color: String,
    #[validate(length(min = 1, message = "At least one opening is required"))]
    pub openings: Vec<OpeningInput>,
    #[serde(default)]
    pub has_delivery: bool,
    #[serde(default)]
    pub has_installation: bool,
    pub delivery_address: Option<String>,
    pub delivery_cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    pub review: Option<String>,
}

/// One page of orders, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    materials: Arc<dyn MaterialRepository>,
    users: Arc<dyn UserRepository>,
    event_sender: Option<Arc<EventSender>>,
    allow_backorder: bool,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        materials: Arc<dyn MaterialRepository>,
        users: Arc<dyn UserRepository>,
        event_sender: Option<Arc<EventSender>>,
        allow_backorder: bool,
    ) -> Self {
        Self {
            orders,
            materials,
            users,
            event_sender,
            allow_backorder,
        }
    }

    /// Creates an order from raw opening submissions.
    ///
    /// Snapshots the material's blade width and rate, derives every
    /// opening, aggregates the totals and consumes the material stock.
    /// Customer submissions enter at `Pending`; admin submissions on a
    /// customer's behalf enter at `FactoryOrdered`, skipping approval.
    #[instrument(skip(self, actor, request), fields(user_id = request.user_id, material = %request.material_name))]
    pub async fn create_order(
        &self,
        actor: &User,
        request: CreateOrderRequest,
    ) -> Result<Order, ServiceError> {
        request.validate().map_err(ServiceError::from_validation)?;

        if !actor.is_admin() && actor.id != request.user_id {
            return Err(ServiceError::PermissionDenied(
                "Customers may only submit orders for themselves".to_string(),
            ));
        }

        let owner = self
            .users
            .find_by_id(request.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", request.user_id)))?;

        let material = self
            .materials
            .find_by_name(&request.material_name)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Material '{}' not found", request.material_name))
            })?;

        if !material.has_color(&request.color) {
            return Err(ServiceError::ValidationError(format!(
                "Material '{}' is not available in '{}'",
                material.name, request.color
            )));
        }

        let delivery_cost = request.delivery_cost.unwrap_or(Decimal::ZERO);
        if delivery_cost < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Delivery cost cannot be negative".to_string(),
            ));
        }
        if request.has_delivery && request.delivery_address.is_none() {
            return Err(ServiceError::ValidationError(
                "Delivery orders need a delivery address".to_string(),
            ));
        }

        let openings = self.derive_openings(&request.openings, material.blade_width_cm)?;

        let mut order = Order {
            id: 0,
            user_id: owner.id,
            customer_name: owner.name.clone(),
            customer_phone: owner.phone.clone(),
            openings,
            material_name: material.name.clone(),
            color: request.color,
            blade_width_cm: material.blade_width_cm,
            price_per_square_meter: material.price_per_square_meter,
            overridden_price_per_square_meter: None,
            total_area_m2: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            status: if actor.is_admin() {
                OrderStatus::FactoryOrdered
            } else {
                OrderStatus::Pending
            },
            is_archived: false,
            is_edit_requested: false,
            has_delivery: request.has_delivery,
            has_installation: request.has_installation,
            delivery_address: request.delivery_address,
            delivery_cost,
            scheduled_delivery_date: None,
            actual_delivery_date: None,
            rating: None,
            review: None,
            notes: request.notes,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
        };
        refresh_order_totals(&mut order);

        self.consume_stock(&material.name, order.total_area_m2)
            .await?;

        let order = self.orders.insert(order).await?;
        info!(
            order_id = order.id,
            status = %order.status,
            total_area_m2 = %order.total_area_m2,
            total_cost = %order.total_cost,
            "order created"
        );

        self.emit(Event::OrderCreated(order.id)).await;
        Ok(order)
    }

    /// Order as stored; admins see every order, customers only their own.
    #[instrument(skip(self, actor))]
    pub async fn get_order(&self, actor: &User, order_id: u64) -> Result<Order, ServiceError> {
        let order = self.load(order_id).await?;
        if !actor.is_admin() && !order.is_owned_by(actor.id) {
            return Err(ServiceError::PermissionDenied(
                "Order belongs to another customer".to_string(),
            ));
        }
        Ok(order)
    }

    /// Admin listing; archived orders stay hidden unless asked for.
    #[instrument(skip(self, actor))]
    pub async fn list_orders(
        &self,
        actor: &User,
        page: u64,
        per_page: u64,
        include_archived: bool,
    ) -> Result<OrderPage, ServiceError> {
        self.require_admin(actor, "list all orders")?;
        let (orders, total) = self.orders.find_all(page, per_page, include_archived).await?;
        Ok(OrderPage {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Admin queue view of one fulfillment stage.
    #[instrument(skip(self, actor))]
    pub async fn list_orders_by_status(
        &self,
        actor: &User,
        status: OrderStatus,
        page: u64,
        per_page: u64,
    ) -> Result<OrderPage, ServiceError> {
        self.require_admin(actor, "list orders by status")?;
        let (orders, total) = self.orders.find_by_status(status, page, per_page).await?;
        Ok(OrderPage {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// A customer's own orders (or any customer's, for an admin).
    #[instrument(skip(self, actor))]
    pub async fn list_orders_for_user(
        &self,
        actor: &User,
        user_id: u64,
        page: u64,
        per_page: u64,
    ) -> Result<OrderPage, ServiceError> {
        if !actor.is_admin() && actor.id != user_id {
            return Err(ServiceError::PermissionDenied(
                "Customers may only list their own orders".to_string(),
            ));
        }
        let (orders, total) = self.orders.find_by_user(user_id, page, per_page).await?;
        Ok(OrderPage {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Runs one fulfillment action through the state machine and persists
    /// the result under the CAS contract. Events are emitted only after
    /// the save sticks.
    #[instrument(skip(self, actor), fields(action = %action))]
    pub async fn attempt_transition(
        &self,
        actor: &User,
        order_id: u64,
        action: OrderAction,
    ) -> Result<Order, ServiceError> {
        let order = self.load(order_id).await?;
        let expected = order.status;

        let outcome = attempt_transition(&order, actor, action)?;
        let saved = self.orders.save(outcome.order, expected).await?;

        info!(
            order_id,
            old_status = %expected,
            new_status = %saved.status,
            "order transitioned"
        );
        for event in outcome.events {
            self.emit(event).await;
        }
        Ok(saved)
    }

    /// Admin edit path: replaces the opening set, re-derives and
    /// recomputes, applies the stock delta, and clears the customer's
    /// edit-request flag.
    #[instrument(skip(self, actor, openings), fields(opening_count = openings.len()))]
    pub async fn update_openings(
        &self,
        actor: &User,
        order_id: u64,
        openings: Vec<OpeningInput>,
    ) -> Result<Order, ServiceError> {
        self.require_admin(actor, "edit an order")?;
        if openings.is_empty() {
            return Err(ServiceError::ValidationError(
                "An order needs at least one opening".to_string(),
            ));
        }

        let order = self.load(order_id).await?;
        if order.status.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} is {} and can no longer be edited",
                order.id, order.status
            )));
        }

        let expected = order.status;
        let previous_area = order.total_area_m2;

        let mut updated = order;
        updated.openings = self.derive_openings(&openings, updated.blade_width_cm)?;
        refresh_order_totals(&mut updated);
        updated.is_edit_requested = false;
        updated.updated_at = Some(Utc::now());

        let area_delta = updated.total_area_m2 - previous_area;
        let material_name = updated.material_name.clone();
        self.consume_stock(&material_name, area_delta).await?;

        let saved = self.orders.save(updated, expected).await?;
        self.emit(Event::OrderUpdated(saved.id)).await;
        Ok(saved)
    }

    /// Sets or clears the admin price override and recomputes the totals.
    /// Allowed at any status; the creation-time rate stays on the order
    /// for audit.
    #[instrument(skip(self, actor))]
    pub async fn set_price_override(
        &self,
        actor: &User,
        order_id: u64,
        override_price: Option<Decimal>,
    ) -> Result<Order, ServiceError> {
        self.require_admin(actor, "override the price")?;
        if let Some(price) = override_price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Override price must be positive".to_string(),
                ));
            }
        }

        let order = self.load(order_id).await?;
        let expected = order.status;

        let mut updated = order;
        updated.overridden_price_per_square_meter = override_price;
        refresh_order_totals(&mut updated);
        updated.updated_at = Some(Utc::now());

        let saved = self.orders.save(updated, expected).await?;
        self.emit(Event::PriceOverrideChanged {
            order_id: saved.id,
            override_price,
        })
        .await;
        Ok(saved)
    }

    /// Archival is a visibility filter: settable either way from any
    /// status, blocks nothing.
    #[instrument(skip(self, actor))]
    pub async fn set_archived(
        &self,
        actor: &User,
        order_id: u64,
        archived: bool,
    ) -> Result<Order, ServiceError> {
        self.require_admin(actor, "archive an order")?;

        let order = self.load(order_id).await?;
        let expected = order.status;

        let mut updated = order;
        updated.is_archived = archived;
        updated.updated_at = Some(Utc::now());

        let saved = self.orders.save(updated, expected).await?;
        self.emit(Event::OrderArchived {
            order_id: saved.id,
            archived,
        })
        .await;
        Ok(saved)
    }

    /// Changes the delivery arrangement. Only before the order is on the
    /// move: the flag decides the shipping branch, so flipping it after
    /// `Processing` would rewrite a path already taken.
    #[instrument(skip(self, actor, delivery_address))]
    pub async fn set_delivery(
        &self,
        actor: &User,
        order_id: u64,
        has_delivery: bool,
        delivery_address: Option<String>,
        delivery_cost: Decimal,
    ) -> Result<Order, ServiceError> {
        self.require_admin(actor, "change delivery")?;
        if delivery_cost < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Delivery cost cannot be negative".to_string(),
            ));
        }
        if has_delivery && delivery_address.is_none() {
            return Err(ServiceError::ValidationError(
                "Delivery orders need a delivery address".to_string(),
            ));
        }

        let order = self.load(order_id).await?;
        if !matches!(
            order.status,
            OrderStatus::Pending
                | OrderStatus::Approved
                | OrderStatus::FactoryOrdered
                | OrderStatus::Processing
        ) {
            return Err(ServiceError::InvalidOperation(format!(
                "Delivery arrangement of order {} is locked at status {}",
                order.id, order.status
            )));
        }

        let expected = order.status;
        let mut updated = order;
        updated.has_delivery = has_delivery;
        updated.delivery_address = delivery_address;
        updated.delivery_cost = delivery_cost;
        updated.updated_at = Some(Utc::now());

        let saved = self.orders.save(updated, expected).await?;
        self.emit(Event::OrderUpdated(saved.id)).await;
        Ok(saved)
    }

    /// The owning customer flags a pending order for correction. Advisory
    /// only: surfaces in the admin queue, blocks nothing.
    #[instrument(skip(self, actor))]
    pub async fn request_edit(&self, actor: &User, order_id: u64) -> Result<Order, ServiceError> {
        let order = self.load(order_id).await?;
        if !order.is_owned_by(actor.id) || actor.is_admin() {
            return Err(ServiceError::PermissionDenied(
                "Only the owning customer may request an edit".to_string(),
            ));
        }
        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "Edits can only be requested while pending, order {} is {}",
                order.id, order.status
            )));
        }

        let expected = order.status;
        let mut updated = order;
        updated.is_edit_requested = true;
        updated.updated_at = Some(Utc::now());

        let saved = self.orders.save(updated, expected).await?;
        self.emit(Event::OrderEditRequested(saved.id)).await;
        Ok(saved)
    }

    /// One rating/review per order, by the owning customer, after
    /// delivery.
    #[instrument(skip(self, actor, request), fields(rating = request.rating))]
    pub async fn submit_review(
        &self,
        actor: &User,
        order_id: u64,
        request: SubmitReviewRequest,
    ) -> Result<Order, ServiceError> {
        request.validate().map_err(ServiceError::from_validation)?;
        debug_assert!(request.rating <= MAX_RATING);

        let order = self.load(order_id).await?;
        if !order.is_owned_by(actor.id) || actor.is_admin() {
            return Err(ServiceError::PermissionDenied(
                "Only the owning customer may review an order".to_string(),
            ));
        }
        if order.status != OrderStatus::Delivered {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} has not been delivered yet",
                order.id
            )));
        }
        if order.has_review() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} has already been reviewed",
                order.id
            )));
        }

        let expected = order.status;
        let mut updated = order;
        updated.rating = Some(request.rating);
        updated.review = request.review;
        updated.updated_at = Some(Utc::now());

        let saved = self.orders.save(updated, expected).await?;
        self.emit(Event::ReviewSubmitted {
            order_id: saved.id,
            rating: request.rating,
        })
        .await;
        Ok(saved)
    }

    /// Staff preparation sheet for an order. Read-only.
    #[instrument(skip(self, actor))]
    pub async fn accessory_proposal(
        &self,
        actor: &User,
        order_id: u64,
    ) -> Result<Vec<AccessoryLine>, ServiceError> {
        self.require_admin(actor, "view the accessory proposal")?;
        let order = self.load(order_id).await?;
        Ok(propose_accessories(
            &order.openings,
            order.blade_width_cm,
            order.has_delivery,
            order.has_installation,
        ))
    }

    fn derive_openings(
        &self,
        inputs: &[OpeningInput],
        blade_width_cm: Decimal,
    ) -> Result<Vec<Opening>, ServiceError> {
        inputs
            .iter()
            .enumerate()
            .map(|(index, input)| derive_opening((index + 1).to_string(), input, blade_width_cm))
            .collect()
    }

    async fn consume_stock(&self, material: &str, area_m2: Decimal) -> Result<(), ServiceError> {
        if area_m2 == Decimal::ZERO {
            return Ok(());
        }
        let updated = self
            .materials
            .adjust_stock(material, -area_m2, self.allow_backorder)
            .await?;
        if updated.stock_m2 < Decimal::ZERO {
            warn!(
                material,
                balance_m2 = %updated.stock_m2,
                "material stock went negative under the backorder policy"
            );
        }
        if area_m2 > Decimal::ZERO {
            self.emit(Event::StockConsumed {
                material: material.to_string(),
                quantity_m2: area_m2,
            })
            .await;
        } else {
            self.emit(Event::StockReceived {
                material: material.to_string(),
                quantity_m2: -area_m2,
            })
            .await;
        }
        Ok(())
    }

    async fn load(&self, order_id: u64) -> Result<Order, ServiceError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))
    }

    fn require_admin(&self, actor: &User, what: &str) -> Result<(), ServiceError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(format!(
                "Only admins may {what}"
            )))
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to send event");
            }
        }
    }
}
