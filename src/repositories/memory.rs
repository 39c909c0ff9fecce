//! In-memory repositories backing the storage traits.
//!
//! These serve both as the test fixtures and as the stand-in for the real
//! persistence collaborator. `DashMap` gives per-key entry locks, which is
//! exactly the serialization unit the CAS contract asks for: two concurrent
//! saves against the same order are ordered, and the loser's expectation no
//! longer matches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::errors::ServiceError;
use crate::models::{Material, Order, OrderStatus, User};

use super::{MaterialRepository, OrderRepository, UserRepository};

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: DashMap<u64, Order>,
    seq: AtomicU64,
}

#[derive(Debug, Default)]
pub struct InMemoryMaterialRepository {
    materials: DashMap<String, Material>,
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<u64, User>,
    seq: AtomicU64,
}

/// Bundles the three in-memory repositories behind one constructor.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    pub orders: Arc<InMemoryOrderRepository>,
    pub materials: Arc<InMemoryMaterialRepository>,
    pub users: Arc<InMemoryUserRepository>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of(mut orders: Vec<Order>, page: u64, per_page: u64) -> (Vec<Order>, u64) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let total = orders.len() as u64;
    let page = page.max(1);
    let per_page = per_page.max(1);
    let start = ((page - 1) * per_page) as usize;
    let items = orders
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();
    (items, total)
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: u64) -> Result<Option<Order>, ServiceError> {
        Ok(self.orders.get(&id).map(|entry| entry.clone()))
    }

    async fn find_all(
        &self,
        page: u64,
        per_page: u64,
        include_archived: bool,
    ) -> Result<(Vec<Order>, u64), ServiceError> {
        let matching: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| include_archived || !entry.is_archived)
            .map(|entry| entry.clone())
            .collect();
        Ok(page_of(matching, page, per_page))
    }

    async fn find_by_user(
        &self,
        user_id: u64,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Order>, u64), ServiceError> {
        let matching: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        Ok(page_of(matching, page, per_page))
    }

    async fn find_by_status(
        &self,
        status: OrderStatus,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Order>, u64), ServiceError> {
        let matching: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.clone())
            .collect();
        Ok(page_of(matching, page, per_page))
    }

    async fn insert(&self, mut order: Order) -> Result<Order, ServiceError> {
        let id = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        order.id = id;
        order.version = 1;
        self.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn save(
        &self,
        mut order: Order,
        expected_status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let mut entry = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order.id)))?;

        if entry.status != expected_status {
            return Err(ServiceError::ConcurrentModification(order.id));
        }

        order.version = entry.version + 1;
        *entry = order.clone();
        Ok(order)
    }
}

#[async_trait]
impl MaterialRepository for InMemoryMaterialRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Material>, ServiceError> {
        Ok(self.materials.get(name).map(|entry| entry.clone()))
    }

    async fn find_all(&self) -> Result<Vec<Material>, ServiceError> {
        let mut all: Vec<Material> = self.materials.iter().map(|entry| entry.clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn insert(&self, material: Material) -> Result<Material, ServiceError> {
        use dashmap::mapref::entry::Entry;
        match self.materials.entry(material.name.clone()) {
            Entry::Occupied(_) => Err(ServiceError::InvalidOperation(format!(
                "Material '{}' already exists",
                material.name
            ))),
            Entry::Vacant(slot) => {
                slot.insert(material.clone());
                Ok(material)
            }
        }
    }

    async fn update(&self, material: Material) -> Result<Material, ServiceError> {
        let mut entry = self.materials.get_mut(&material.name).ok_or_else(|| {
            ServiceError::NotFound(format!("Material '{}' not found", material.name))
        })?;
        *entry = material.clone();
        Ok(material)
    }

    async fn adjust_stock(
        &self,
        name: &str,
        delta_m2: Decimal,
        allow_negative: bool,
    ) -> Result<Material, ServiceError> {
        let mut entry = self
            .materials
            .get_mut(name)
            .ok_or_else(|| ServiceError::NotFound(format!("Material '{}' not found", name)))?;

        let new_balance = entry.stock_m2 + delta_m2;
        if new_balance < Decimal::ZERO && !allow_negative {
            return Err(ServiceError::InsufficientStock(format!(
                "Material '{}' has {} m² in stock, {} m² requested",
                name, entry.stock_m2, -delta_m2
            )));
        }

        entry.stock_m2 = new_balance;
        entry.updated_at = Some(Utc::now());
        Ok(entry.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, ServiceError> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn insert(&self, mut user: User) -> Result<User, ServiceError> {
        let id = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        user.id = id;
        self.users.insert(id, user.clone());
        Ok(user)
    }
}
