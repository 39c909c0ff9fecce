//! Accessory-quantity proposal for a finalized opening set.
//!
//! Advisory only: staff read the proposal to prepare materials by hand; it
//! never mutates inventory or the order. Each rule is evaluated per
//! opening and contributions to the same accessory are merged into one
//! line by name and unit. Openings missing the geometry a rule needs are
//! skipped by that rule alone.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{AccessoryLine, Opening, Requirement, Unit};

pub const MAIN_AXIS: &str = "Main Axis (Tube)";
pub const MOTOR_STANDARD: &str = "Motor (Standard)";
pub const MOTOR_HEAVY_DUTY: &str = "Motor (Heavy-Duty)";
pub const CHANNELS: &str = "Channels (Majari)";
pub const END_CAPS: &str = "End Caps (Tabbat)";
pub const SCREWS: &str = "Screws & Bolts";
pub const SECURITY_LOCKS: &str = "Security Locks";
pub const REMOTE_CONTROL: &str = "Remote Control";
pub const HANGERS: &str = "Hangers (Hamalat)";
pub const BOTTOM_BAR: &str = "Bottom Bar (Barra)";

/// Openings at or above this area get the heavy-duty motor tier.
pub const MOTOR_HEAVY_DUTY_THRESHOLD_M2: Decimal = dec!(5);

/// Fixed mid-value of the 8–12 screws-per-opening heuristic.
pub const SCREWS_PER_OPENING: u32 = 10;

/// One remote control covers up to this many motors.
pub const MOTORS_PER_REMOTE: u32 = 3;

pub const HANGERS_PER_OPENING: u32 = 2;

#[derive(Default)]
struct ProposalBuilder {
    lines: Vec<AccessoryLine>,
}

impl ProposalBuilder {
    /// Merge policy: one line per accessory name+unit, quantities summed.
    fn add(&mut self, name: &str, quantity: Decimal, unit: Unit, requirement: Requirement) {
        if quantity <= Decimal::ZERO {
            return;
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.name == name && line.unit == unit)
        {
            line.quantity += quantity;
            return;
        }
        self.lines.push(AccessoryLine {
            name: name.to_string(),
            quantity,
            unit,
            requirement,
        });
    }
}

/// Proposes accessory line items for an order's openings and service flags.
///
/// `has_delivery` is part of the call contract for parity with the other
/// order-level flags; no current rule keys off it.
pub fn propose_accessories(
    openings: &[Opening],
    blade_width_cm: Decimal,
    _has_delivery: bool,
    has_installation: bool,
) -> Vec<AccessoryLine> {
    if openings.is_empty() {
        return Vec::new();
    }

    let mut proposal = ProposalBuilder::default();
    let opening_count = openings.len() as u32;

    // Main axis and bottom bar both run the full slat length of every
    // opening.
    let total_code_length_m: Decimal = openings.iter().map(|o| o.code_length_m).sum();
    proposal.add(
        MAIN_AXIS,
        total_code_length_m,
        Unit::Meter,
        Requirement::Required,
    );

    // One motor per opening, tiered by the opening's own area. Tiers are
    // distinct line items so staff pick the right hardware per opening.
    let motor_requirement = if has_installation {
        Requirement::Required
    } else {
        Requirement::Optional
    };
    let heavy_motors = openings
        .iter()
        .filter(|o| o.area_m2(blade_width_cm) >= MOTOR_HEAVY_DUTY_THRESHOLD_M2)
        .count() as u32;
    let standard_motors = opening_count - heavy_motors;
    proposal.add(
        MOTOR_STANDARD,
        Decimal::from(standard_motors),
        Unit::Piece,
        motor_requirement,
    );
    proposal.add(
        MOTOR_HEAVY_DUTY,
        Decimal::from(heavy_motors),
        Unit::Piece,
        motor_requirement,
    );

    // Side channels for openings that asked for them; needs a measured
    // height, openings without one are skipped by this rule only.
    let channel_cm: Decimal = openings
        .iter()
        .filter(|o| o.has_accessories)
        .filter_map(|o| o.height_cm)
        .map(|height_cm| height_cm * dec!(2))
        .sum();
    proposal.add(
        CHANNELS,
        channel_cm / dec!(100),
        Unit::Meter,
        Requirement::Required,
    );

    let end_cap_sets = openings.iter().filter(|o| o.has_end_cap).count() as u32;
    proposal.add(
        END_CAPS,
        Decimal::from(end_cap_sets),
        Unit::Piece,
        Requirement::Required,
    );

    if has_installation {
        proposal.add(
            SCREWS,
            Decimal::from(SCREWS_PER_OPENING * opening_count),
            Unit::Piece,
            Requirement::Required,
        );
    }

    proposal.add(
        SECURITY_LOCKS,
        Decimal::from(opening_count),
        Unit::Piece,
        Requirement::Optional,
    );

    // One remote covers a few motors; proposed only when motors are.
    let motor_count = standard_motors + heavy_motors;
    if motor_count > 0 {
        let remotes = motor_count.div_ceil(MOTORS_PER_REMOTE);
        proposal.add(
            REMOTE_CONTROL,
            Decimal::from(remotes),
            Unit::Piece,
            Requirement::Optional,
        );
    }

    if has_installation {
        proposal.add(
            HANGERS,
            Decimal::from(HANGERS_PER_OPENING * opening_count),
            Unit::Piece,
            Requirement::Required,
        );
    }

    proposal.add(
        BOTTOM_BAR,
        total_code_length_m,
        Unit::Meter,
        Requirement::Required,
    );

    proposal.lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening(serial: &str, code_length_m: Decimal, number_of_codes: u32) -> Opening {
        Opening {
            serial: serial.into(),
            code_length_m,
            number_of_codes,
            width_cm: None,
            height_cm: None,
            channel_length_m: None,
            has_end_cap: false,
            has_accessories: false,
            notes: None,
        }
    }

    fn measured(serial: &str, code_length_m: Decimal, number_of_codes: u32, height_cm: Decimal) -> Opening {
        Opening {
            height_cm: Some(height_cm),
            ..opening(serial, code_length_m, number_of_codes)
        }
    }

    fn line<'a>(lines: &'a [AccessoryLine], name: &str) -> Option<&'a AccessoryLine> {
        lines.iter().find(|l| l.name == name)
    }

    #[test]
    fn empty_opening_set_proposes_nothing() {
        assert!(propose_accessories(&[], dec!(5.8), false, false).is_empty());
    }

    #[test]
    fn end_caps_merge_into_one_line() {
        let mut first = opening("1", dec!(1.0), 20);
        first.has_end_cap = true;
        let mut second = opening("2", dec!(1.2), 22);
        second.has_end_cap = true;

        let lines = propose_accessories(&[first, second], dec!(5.8), false, false);
        let caps = line(&lines, END_CAPS).expect("end caps proposed");
        assert_eq!(caps.quantity, dec!(2));
        assert_eq!(caps.unit, Unit::Piece);
        assert_eq!(caps.requirement, Requirement::Required);
        assert_eq!(
            lines.iter().filter(|l| l.name == END_CAPS).count(),
            1,
            "no duplicate lines per accessory"
        );
    }

    #[test]
    fn axis_and_bar_sum_the_slat_lengths() {
        let lines = propose_accessories(
            &[opening("1", dec!(1.0), 20), opening("2", dec!(2.5), 20)],
            dec!(5.8),
            false,
            false,
        );
        assert_eq!(line(&lines, MAIN_AXIS).unwrap().quantity, dec!(3.5));
        assert_eq!(line(&lines, BOTTOM_BAR).unwrap().quantity, dec!(3.5));
        assert_eq!(line(&lines, MAIN_AXIS).unwrap().unit, Unit::Meter);
    }

    #[test]
    fn motors_tier_by_opening_area() {
        // 2.0 m * 50 codes * 5.8 cm = 5.8 m², heavy duty.
        // 1.0 m * 20 codes * 5.8 cm = 1.16 m², standard.
        let lines = propose_accessories(
            &[opening("1", dec!(2.0), 50), opening("2", dec!(1.0), 20)],
            dec!(5.8),
            false,
            false,
        );
        assert_eq!(line(&lines, MOTOR_STANDARD).unwrap().quantity, dec!(1));
        assert_eq!(line(&lines, MOTOR_HEAVY_DUTY).unwrap().quantity, dec!(1));
        // Without installation, motors are offered, not imposed.
        assert_eq!(
            line(&lines, MOTOR_STANDARD).unwrap().requirement,
            Requirement::Optional
        );
    }

    #[test]
    fn installation_upgrades_motors_and_adds_mounting_hardware() {
        let openings = vec![opening("1", dec!(1.0), 20), opening("2", dec!(1.0), 20)];
        let lines = propose_accessories(&openings, dec!(5.8), false, true);

        assert_eq!(
            line(&lines, MOTOR_STANDARD).unwrap().requirement,
            Requirement::Required
        );
        assert_eq!(line(&lines, SCREWS).unwrap().quantity, dec!(20));
        assert_eq!(line(&lines, HANGERS).unwrap().quantity, dec!(4));

        // And none of it without installation.
        let bare = propose_accessories(&openings, dec!(5.8), false, false);
        assert!(line(&bare, SCREWS).is_none());
        assert!(line(&bare, HANGERS).is_none());
    }

    #[test]
    fn one_remote_covers_three_motors_rounded_up() {
        let four: Vec<Opening> = (1..=4)
            .map(|i| opening(&i.to_string(), dec!(1.0), 20))
            .collect();
        let lines = propose_accessories(&four, dec!(5.8), false, false);
        assert_eq!(line(&lines, REMOTE_CONTROL).unwrap().quantity, dec!(2));

        let three: Vec<Opening> = (1..=3)
            .map(|i| opening(&i.to_string(), dec!(1.0), 20))
            .collect();
        let lines = propose_accessories(&three, dec!(5.8), false, false);
        assert_eq!(line(&lines, REMOTE_CONTROL).unwrap().quantity, dec!(1));
    }

    #[test]
    fn channels_need_the_flag_and_a_height() {
        let mut with_height = measured("1", dec!(1.0), 20, dec!(150));
        with_height.has_accessories = true;
        let mut without_height = opening("2", dec!(1.0), 20);
        without_height.has_accessories = true;
        let mut uninterested = measured("3", dec!(1.0), 20, dec!(200));
        uninterested.has_accessories = false;

        let lines = propose_accessories(
            &[with_height, without_height, uninterested],
            dec!(5.8),
            false,
            false,
        );

        // Only the first opening qualifies: 150 * 2 cm = 3 m. The opening
        // without a height degrades that line, not the whole proposal.
        let channels = line(&lines, CHANNELS).expect("channels proposed");
        assert_eq!(channels.quantity, dec!(3));
        assert_eq!(channels.unit, Unit::Meter);
        assert!(line(&lines, MAIN_AXIS).is_some());
    }

    #[test]
    fn locks_are_offered_one_per_opening() {
        let lines = propose_accessories(
            &[opening("1", dec!(1.0), 20), opening("2", dec!(1.0), 20)],
            dec!(5.8),
            true,
            false,
        );
        let locks = line(&lines, SECURITY_LOCKS).unwrap();
        assert_eq!(locks.quantity, dec!(2));
        assert_eq!(locks.requirement, Requirement::Optional);
    }
}
