use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One physical window/door cavity to be fitted with a blind.
///
/// Always stored in normalized manufacturing units. When the opening was
/// derived from a raw measurement the original width/height are retained for
/// display and for accessory rules that need them; the derived values take
/// precedence for costing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    /// Unique within an order, assigned sequentially at add time.
    pub serial: String,

    /// Slat length in meters. Always `> 0` once normalized.
    pub code_length_m: Decimal,

    /// Slat count. Always `>= 1` once normalized.
    pub number_of_codes: u32,

    /// Raw measured width in cm, when the opening came in as a measurement.
    pub width_cm: Option<Decimal>,

    /// Raw measured height in cm, when the opening came in as a measurement.
    pub height_cm: Option<Decimal>,

    /// Side-channel length in meters, derivable only from a measured height.
    pub channel_length_m: Option<Decimal>,

    pub has_end_cap: bool,

    /// Requests channel (majari) accessories for this opening.
    pub has_accessories: bool,

    /// Free text, not interpreted by the engine.
    pub notes: Option<String>,
}

impl Opening {
    /// Billable area of this opening in m² for the given blade width (cm).
    pub fn area_m2(&self, blade_width_cm: Decimal) -> Decimal {
        self.code_length_m * Decimal::from(self.number_of_codes) * blade_width_cm / dec!(100)
    }
}

/// Geometry of an opening as submitted by the caller.
///
/// Both variants converge on the same [`Opening`] shape before any costing
/// happens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpeningGeometry {
    /// Raw cm measurements taken at the opening.
    Measured {
        width_cm: Decimal,
        height_cm: Decimal,
    },
    /// Direct manufacturing values, bypassing derivation.
    Direct {
        code_length_m: Decimal,
        number_of_codes: u32,
    },
}

/// Full opening submission: geometry plus per-opening flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpeningInput {
    pub geometry: OpeningGeometry,
    #[serde(default)]
    pub has_end_cap: bool,
    #[serde(default)]
    pub has_accessories: bool,
    #[serde(default)]
    pub notes: Option<String>,
}
