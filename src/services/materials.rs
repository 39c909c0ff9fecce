//! Material catalog and inventory movements.
//!
//! Catalog rates are live values; orders snapshot them at creation time,
//! so nothing here ever reaches back into existing orders.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Material, User};
use crate::repositories::MaterialRepository;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, message = "Material name is required"))]
    pub name: String,
    pub blade_width_cm: Decimal,
    pub price_per_square_meter: Decimal,
    #[validate(length(min = 1, message = "At least one color is required"))]
    pub colors: Vec<String>,
    pub initial_stock_m2: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMaterialRequest {
    pub price_per_square_meter: Option<Decimal>,
    pub colors: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct MaterialService {
    materials: Arc<dyn MaterialRepository>,
    event_sender: Option<Arc<EventSender>>,
}

impl MaterialService {
    pub fn new(
        materials: Arc<dyn MaterialRepository>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            materials,
            event_sender,
        }
    }

    #[instrument(skip(self, actor, request), fields(name = %request.name))]
    pub async fn create_material(
        &self,
        actor: &User,
        request: CreateMaterialRequest,
    ) -> Result<Material, ServiceError> {
        self.require_admin(actor, "create a material")?;
        request.validate().map_err(ServiceError::from_validation)?;

        if request.blade_width_cm <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Blade width must be positive".to_string(),
            ));
        }
        if request.price_per_square_meter < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }
        let initial_stock = request.initial_stock_m2.unwrap_or(Decimal::ZERO);
        if initial_stock < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Initial stock cannot be negative".to_string(),
            ));
        }

        let material = Material {
            name: request.name,
            blade_width_cm: request.blade_width_cm,
            price_per_square_meter: request.price_per_square_meter,
            colors: BTreeSet::from_iter(request.colors),
            stock_m2: initial_stock,
            created_at: Utc::now(),
            updated_at: None,
        };

        let created = self.materials.insert(material).await?;
        info!(name = %created.name, blade_width_cm = %created.blade_width_cm, "material created");
        Ok(created)
    }

    /// Rate and color changes apply to future orders only.
    #[instrument(skip(self, actor, request))]
    pub async fn update_material(
        &self,
        actor: &User,
        name: &str,
        request: UpdateMaterialRequest,
    ) -> Result<Material, ServiceError> {
        self.require_admin(actor, "update a material")?;

        let mut material = self
            .materials
            .find_by_name(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Material '{name}' not found")))?;

        if let Some(price) = request.price_per_square_meter {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
            material.price_per_square_meter = price;
        }
        if let Some(colors) = request.colors {
            if colors.is_empty() {
                return Err(ServiceError::ValidationError(
                    "At least one color is required".to_string(),
                ));
            }
            material.colors = BTreeSet::from_iter(colors);
        }
        material.updated_at = Some(Utc::now());

        self.materials.update(material).await
    }

    pub async fn get_material(&self, name: &str) -> Result<Material, ServiceError> {
        self.materials
            .find_by_name(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Material '{name}' not found")))
    }

    pub async fn list_materials(&self) -> Result<Vec<Material>, ServiceError> {
        self.materials.find_all().await
    }

    /// Purchase intake; always additive.
    #[instrument(skip(self, actor), fields(quantity_m2 = %quantity_m2))]
    pub async fn receive_stock(
        &self,
        actor: &User,
        name: &str,
        quantity_m2: Decimal,
    ) -> Result<Material, ServiceError> {
        self.require_admin(actor, "receive stock")?;
        if quantity_m2 <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Received quantity must be positive".to_string(),
            ));
        }

        let updated = self.materials.adjust_stock(name, quantity_m2, true).await?;
        info!(name, balance_m2 = %updated.stock_m2, "stock received");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::StockReceived {
                    material: name.to_string(),
                    quantity_m2,
                })
                .await
            {
                warn!(error = %e, "failed to send event");
            }
        }
        Ok(updated)
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
}
