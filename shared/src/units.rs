//! Unit conversion calculus
//!
//! Units are free text entered by users, so every lookup normalizes first
//! (trim + lowercase). Two conversion surfaces exist:
//!
//! - [`convert`] is permissive: unknown units and cross-dimension pairs pass
//!   through unchanged. The cost resolver relies on this fallback.
//! - [`Quantity::try_convert`] is strict: incompatible dimensions are a
//!   [`UnitMismatchError`]. Stock transactions use this surface.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dimension of a unit string
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    Mass,
    Volume,
    Count,
    Unknown,
}

/// Normalize a user-entered unit string for lookup
pub fn normalize_unit(unit: &str) -> String {
    unit.trim().to_ascii_lowercase()
}

/// Classify a unit string into a dimension
pub fn unit_class(unit: &str) -> UnitClass {
    match normalize_unit(unit).as_str() {
        "g" | "kg" => UnitClass::Mass,
        "ml" | "l" => UnitClass::Volume,
        "pcs" | "pc" | "unit" | "units" => UnitClass::Count,
        _ => UnitClass::Unknown,
    }
}

/// Factor to the dimension's base unit (g for mass, ml for volume).
/// Count and unknown units have no factor.
fn base_factor(normalized: &str) -> Option<Decimal> {
    match normalized {
        "g" | "ml" => Some(Decimal::ONE),
        "kg" | "l" => Some(Decimal::from(1000)),
        _ => None,
    }
}

/// Convert a value between units.
///
/// Supported: kg<->g and l<->ml (factor 1000). Same-unit, unknown-unit and
/// cross-dimension pairs return the input unchanged rather than erroring.
pub fn convert(value: Decimal, from: &str, to: &str) -> Decimal {
    let from = normalize_unit(from);
    let to = normalize_unit(to);

    if from == to {
        return value;
    }
    if unit_class(&from) != unit_class(&to) {
        return value;
    }
    match (base_factor(&from), base_factor(&to)) {
        (Some(f), Some(t)) => value * f / t,
        _ => value,
    }
}

/// Whether two unit strings can be converted exactly
pub fn convertible(from: &str, to: &str) -> bool {
    let from = normalize_unit(from);
    let to = normalize_unit(to);
    if from == to {
        return true;
    }
    unit_class(&from) == unit_class(&to)
        && base_factor(&from).is_some()
        && base_factor(&to).is_some()
}

/// Attempted conversion between incompatible dimensions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot convert '{from}' to '{to}'")]
pub struct UnitMismatchError {
    pub from: String,
    pub to: String,
}

/// A value tagged with its (normalized) unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quantity {
    pub value: Decimal,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: Decimal, unit: &str) -> Self {
        Self {
            value,
            unit: normalize_unit(unit),
        }
    }

    /// Dimension of this quantity's unit
    pub fn class(&self) -> UnitClass {
        unit_class(&self.unit)
    }

    /// Convert to another unit, failing on incompatible dimensions.
    ///
    /// Count and unknown units only convert to themselves.
    pub fn try_convert(&self, to: &str) -> Result<Quantity, UnitMismatchError> {
        let to = normalize_unit(to);
        if self.unit == to {
            return Ok(Quantity {
                value: self.value,
                unit: to,
            });
        }
        if convertible(&self.unit, &to) {
            return Ok(Quantity {
                value: convert(self.value, &self.unit, &to),
                unit: to,
            });
        }
        Err(UnitMismatchError {
            from: self.unit.clone(),
            to,
        })
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn kg_to_g() {
        assert_eq!(convert(dec("2.5"), "kg", "g"), dec("2500"));
    }

    #[test]
    fn g_to_kg() {
        assert_eq!(convert(dec("250"), "g", "kg"), dec("0.25"));
    }

    #[test]
    fn l_to_ml_and_back() {
        assert_eq!(convert(dec("1.2"), "L", "mL"), dec("1200"));
        assert_eq!(convert(dec("1200"), "ml", "l"), dec("1.2"));
    }

    #[test]
    fn same_unit_is_identity() {
        assert_eq!(convert(dec("7"), "kg", "kg"), dec("7"));
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(convert(dec("1"), " KG ", "g"), dec("1000"));
    }

    #[test]
    fn cross_dimension_passes_through() {
        assert_eq!(convert(dec("3"), "kg", "ml"), dec("3"));
        assert_eq!(convert(dec("3"), "kg", "pcs"), dec("3"));
    }

    #[test]
    fn unknown_unit_passes_through() {
        assert_eq!(convert(dec("5"), "bag", "kg"), dec("5"));
        assert_eq!(convert(dec("5"), "bag", "sack"), dec("5"));
    }

    #[test]
    fn try_convert_rejects_cross_dimension() {
        let q = Quantity::new(dec("3"), "kg");
        let err = q.try_convert("ml").unwrap_err();
        assert_eq!(err.from, "kg");
        assert_eq!(err.to, "ml");
    }

    #[test]
    fn try_convert_count_only_to_itself() {
        let q = Quantity::new(dec("10"), "pcs");
        assert!(q.try_convert("pcs").is_ok());
        assert!(q.try_convert("unit").is_err());
    }

    #[test]
    fn quantity_normalizes_on_construction() {
        let q = Quantity::new(dec("1"), "  KG ");
        assert_eq!(q.unit, "kg");
        assert_eq!(q.class(), UnitClass::Mass);
    }
}
