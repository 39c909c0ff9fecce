//! Storage seam for the order engine.
//!
//! The engine is storage-agnostic: services depend on these traits only.
//! The obligations a real backing store must honor are the ones
//! [`memory::InMemoryStore`] implements, most importantly the
//! compare-and-swap contract on [`OrderRepository::save`]: transitions on
//! the same order must be serialized, and a save whose expectation no
//! longer matches the stored status must fail without mutating anything.
//! Different orders are independent units of concurrency.

use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::models::{Material, Order, OrderStatus, User};
use rust_decimal::Decimal;

pub mod memory;

pub use memory::{
    InMemoryMaterialRepository, InMemoryOrderRepository, InMemoryStore, InMemoryUserRepository,
};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<Order>, ServiceError>;

    /// Newest-first page of orders. `include_archived` widens the view;
    /// archived orders are hidden by default.
    async fn find_all(
        &self,
        page: u64,
        per_page: u64,
        include_archived: bool,
    ) -> Result<(Vec<Order>, u64), ServiceError>;

    /// Newest-first page of one customer's orders (archived included; a
    /// customer's archive filter is presentation-side).
    async fn find_by_user(
        &self,
        user_id: u64,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Order>, u64), ServiceError>;

    async fn find_by_status(
        &self,
        status: OrderStatus,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Order>, u64), ServiceError>;

    /// Assigns the next sequential id and stores the order at version 1.
    async fn insert(&self, order: Order) -> Result<Order, ServiceError>;

    /// Compare-and-swap save: fails with
    /// [`ServiceError::ConcurrentModification`] when the stored status no
    /// longer equals `expected_status`, leaving the stored record untouched.
    /// Bumps `version` on success.
    async fn save(&self, order: Order, expected_status: OrderStatus) -> Result<Order, ServiceError>;
}

#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Material>, ServiceError>;

    async fn find_all(&self) -> Result<Vec<Material>, ServiceError>;

    /// Fails with [`ServiceError::InvalidOperation`] when the name is taken.
    async fn insert(&self, material: Material) -> Result<Material, ServiceError>;

    /// Replaces the stored record for `material.name`.
    async fn update(&self, material: Material) -> Result<Material, ServiceError>;

    /// Applies `delta_m2` (positive intake, negative consumption) to the
    /// stock balance atomically. A balance that would go negative is
    /// rejected with [`ServiceError::InsufficientStock`] unless
    /// `allow_negative` is set.
    async fn adjust_stock(
        &self,
        name: &str,
        delta_m2: Decimal,
        allow_negative: bool,
    ) -> Result<Material, ServiceError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, ServiceError>;

    /// Assigns the next sequential id.
    async fn insert(&self, user: User) -> Result<User, ServiceError>;
}
