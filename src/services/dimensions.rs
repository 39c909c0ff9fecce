//! Conversion of raw opening measurements into manufacturing units.
//!
//! The adjustment constants account for installation tolerances and
//! hardware overhead and are part of the pricing contract; a change here
//! changes what every new order is billed.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::errors::ServiceError;
use crate::models::{Opening, OpeningGeometry, OpeningInput};

/// Fixed frame/installation clearance subtracted from the measured width.
pub const WIDTH_CLEARANCE_CM: Decimal = dec!(3.5);

/// Fixed overlap allowance added to the measured height.
pub const HEIGHT_OVERLAP_CM: Decimal = dec!(10);

/// Extra length per side channel beyond the measured height.
pub const CHANNEL_ALLOWANCE_CM: Decimal = dec!(5);

/// Manufacturing quantities derived from one measured opening.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedDimensions {
    /// Slat length in meters.
    pub code_length_m: Decimal,
    /// Slat count.
    pub number_of_codes: u32,
    /// Length of both side channels together, in meters.
    pub channel_length_m: Decimal,
}

/// Derives slat length, slat count and channel length from a raw cm
/// measurement under the material's blade width.
///
/// Openings too narrow to yield a positive slat length are rejected rather
/// than silently zeroed into an order.
pub fn derive_from_measurement(
    width_cm: Decimal,
    height_cm: Decimal,
    blade_width_cm: Decimal,
) -> Result<DerivedDimensions, ServiceError> {
    if width_cm <= Decimal::ZERO || height_cm <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Opening measurements must be positive, got {width_cm}x{height_cm} cm"
        )));
    }
    if blade_width_cm <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Blade width must be positive, got {blade_width_cm} cm"
        )));
    }

    let final_width_cm = width_cm - WIDTH_CLEARANCE_CM;
    let final_height_cm = height_cm + HEIGHT_OVERLAP_CM;

    let code_length_m = final_width_cm.max(Decimal::ZERO) / dec!(100);
    let number_of_codes = (final_height_cm / blade_width_cm)
        .ceil()
        .to_u32()
        .unwrap_or(0);
    let channel_length_m = (height_cm + CHANNEL_ALLOWANCE_CM) * dec!(2) / dec!(100);

    if code_length_m <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Opening width {width_cm} cm leaves no slat length after the {WIDTH_CLEARANCE_CM} cm clearance"
        )));
    }
    if number_of_codes < 1 {
        return Err(ServiceError::ValidationError(format!(
            "Opening height {height_cm} cm yields no slats for blade width {blade_width_cm} cm"
        )));
    }

    Ok(DerivedDimensions {
        code_length_m,
        number_of_codes,
        channel_length_m,
    })
}

/// Normalizes one opening submission into the shape costing works on.
///
/// Measured geometry goes through [`derive_from_measurement`]; direct
/// manufacturing values bypass derivation but face the same invariants.
pub fn derive_opening(
    serial: impl Into<String>,
    input: &OpeningInput,
    blade_width_cm: Decimal,
) -> Result<Opening, ServiceError> {
    let serial = serial.into();
    match input.geometry {
        OpeningGeometry::Measured {
            width_cm,
            height_cm,
        } => {
            let derived = derive_from_measurement(width_cm, height_cm, blade_width_cm)?;
            Ok(Opening {
                serial,
                code_length_m: derived.code_length_m,
                number_of_codes: derived.number_of_codes,
                width_cm: Some(width_cm),
                height_cm: Some(height_cm),
                channel_length_m: Some(derived.channel_length_m),
                has_end_cap: input.has_end_cap,
                has_accessories: input.has_accessories,
                notes: input.notes.clone(),
            })
        }
        OpeningGeometry::Direct {
            code_length_m,
            number_of_codes,
        } => {
            if code_length_m <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Code length must be positive, got {code_length_m} m"
                )));
            }
            if number_of_codes < 1 {
                return Err(ServiceError::ValidationError(
                    "Number of codes must be at least 1".to_string(),
                ));
            }
            Ok(Opening {
                serial,
                code_length_m,
                number_of_codes,
                width_cm: None,
                height_cm: None,
                channel_length_m: None,
                has_end_cap: input.has_end_cap,
                has_accessories: input.has_accessories,
                notes: input.notes.clone(),
            })
        }
    }
}
