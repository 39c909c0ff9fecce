//! Abjour Orders
//!
//! Pricing, dimension-derivation, accessory-proposal and fulfillment
//! state-machine engine for a custom-blinds (abjour) order workflow.
//!
//! The engine is the business core only: persistence is an injected
//! repository (with an in-memory implementation included), notification
//! delivery is whoever drains the event channel, and there is no wire or
//! UI surface here.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod models;
pub mod repositories;
pub mod services;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::events::{EventEnvelope, EventSender};
use crate::repositories::InMemoryStore;
use crate::services::materials::MaterialService;
use crate::services::orders::OrderService;

/// Wired application state over the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub event_sender: EventSender,
    pub store: InMemoryStore,
    pub orders: OrderService,
    pub materials: MaterialService,
}

impl AppState {
    /// Builds the services over a fresh in-memory store.
    ///
    /// Returns the receiving half of the event channel; the caller hands
    /// it to its notification collaborator (or to
    /// [`events::spawn_log_subscriber`]).
    pub fn in_memory(config: config::AppConfig) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (event_sender, receiver) = EventSender::channel(config.event_buffer_size.max(1));
        let shared_sender = Arc::new(event_sender.clone());
        let store = InMemoryStore::new();

        let orders = OrderService::new(
            store.orders.clone(),
            store.materials.clone(),
            store.users.clone(),
            Some(shared_sender.clone()),
            config.allow_backorder,
        );
        let materials = MaterialService::new(store.materials.clone(), Some(shared_sender));

        (
            Self {
                config,
                event_sender,
                store,
                orders,
                materials,
            },
            receiver,
        )
    }
}
