//! Shared fixture: a wired in-memory app with seeded users and a material.

#![allow(dead_code)]

use abjour_orders::config::AppConfig;
use abjour_orders::events::EventEnvelope;
use abjour_orders::models::{OpeningGeometry, OpeningInput, Role, User};
use abjour_orders::repositories::UserRepository;
use abjour_orders::services::materials::CreateMaterialRequest;
use abjour_orders::services::orders::CreateOrderRequest;
use abjour_orders::AppState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

pub const MATERIAL: &str = "wood-58";
pub const BLADE_WIDTH_CM: Decimal = dec!(5.8);
pub const PRICE_PER_M2: Decimal = dec!(120);
pub const SEED_STOCK_M2: Decimal = dec!(500);

pub struct TestApp {
    pub state: AppState,
    pub events: mpsc::Receiver<EventEnvelope>,
    pub admin: User,
    pub customer: User,
    pub other_customer: User,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let (state, events) = AppState::in_memory(config);

        let admin = state
            .store
            .users
            .insert(user("Salma", "salma@abjour.example", Role::Admin))
            .await
            .expect("seed admin");
        let customer = state
            .store
            .users
            .insert(user("Karim", "karim@example.com", Role::Customer))
            .await
            .expect("seed customer");
        let other_customer = state
            .store
            .users
            .insert(user("Nour", "nour@example.com", Role::Customer))
            .await
            .expect("seed second customer");

        state
            .materials
            .create_material(
                &admin,
                CreateMaterialRequest {
                    name: MATERIAL.to_string(),
                    blade_width_cm: BLADE_WIDTH_CM,
                    price_per_square_meter: PRICE_PER_M2,
                    colors: vec!["white".to_string(), "walnut".to_string()],
                    initial_stock_m2: Some(SEED_STOCK_M2),
                },
            )
            .await
            .expect("seed material");

        Self {
            state,
            events,
            admin,
            customer,
            other_customer,
        }
    }

    /// A plain order request for the seeded customer and material.
    pub fn order_request(
        &self,
        openings: Vec<OpeningInput>,
        has_delivery: bool,
    ) -> CreateOrderRequest {
        CreateOrderRequest {
            user_id: self.customer.id,
            material_name: MATERIAL.to_string(),
            color: "white".to_string(),
            openings,
            has_delivery,
            has_installation: false,
            delivery_address: has_delivery.then(|| "12 Port St".to_string()),
            delivery_cost: has_delivery.then(|| dec!(25)),
            notes: None,
        }
    }
}

fn user(name: &str, email: &str, role: Role) -> User {
    User {
        id: 0,
        name: name.to_string(),
        email: email.to_string(),
        phone: Some("0790000000".to_string()),
        role,
    }
}

pub fn measured(width_cm: Decimal, height_cm: Decimal) -> OpeningInput {
    OpeningInput {
        geometry: OpeningGeometry::Measured {
            width_cm,
            height_cm,
        },
        has_end_cap: false,
        has_accessories: false,
        notes: None,
    }
}

pub fn direct(code_length_m: Decimal, number_of_codes: u32) -> OpeningInput {
    OpeningInput {
        geometry: OpeningGeometry::Direct {
            code_length_m,
            number_of_codes,
        },
        has_end_cap: false,
        has_accessories: false,
        notes: None,
    }
}
