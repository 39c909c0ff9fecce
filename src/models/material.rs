use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog entry describing one abjour product line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Unique catalog key.
    pub name: String,

    /// Physical slat height in cm; converts an opening height into a slat
    /// count. Always `> 0`.
    pub blade_width_cm: Decimal,

    /// Current catalog rate. Orders snapshot this at creation time and are
    /// unaffected by later changes.
    pub price_per_square_meter: Decimal,

    pub colors: BTreeSet<String>,

    /// Inventory balance in m². Goes negative only under the backorder
    /// policy (`AppConfig::allow_backorder`).
    pub stock_m2: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Material {
    pub fn has_color(&self, color: &str) -> bool {
        self.colors.contains(color)
    }
}
