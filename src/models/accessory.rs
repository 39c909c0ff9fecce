use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unit a proposed accessory quantity is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Unit {
    /// Counted pieces ("unit" on the proposal sheet).
    #[serde(rename = "unit")]
    #[strum(serialize = "unit")]
    Piece,
    Meter,
    Kg,
}

/// Whether staff must prepare the accessory or merely offer it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Requirement {
    Required,
    Optional,
}

/// One line of an accessory proposal.
///
/// Ephemeral: produced per-order on demand for staff preparation and never
/// persisted. Multiple openings contributing to the same accessory are
/// merged into one line by name and unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessoryLine {
    pub name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub requirement: Requirement,
}
