//! Unit conversion tests
//!
//! Property-based and unit tests for the conversion calculus:
//! - round-trip stability for kg/g and l/ml
//! - normalization of user-entered unit strings
//! - permissive pass-through vs strict rejection

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{convert, convertible, normalize_unit, unit_class, Quantity, UnitClass};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Positive quantities with up to 3 decimal places
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|n| Decimal::new(n, 3))
}

fn mass_unit_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("g"), Just("kg")]
}

fn volume_unit_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("ml"), Just("l")]
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Converting there and back returns the original value exactly
    /// (factor-1000 pairs divide without remainder in decimal arithmetic)
    #[test]
    fn mass_round_trip_is_exact(value in quantity_strategy(),
                                from in mass_unit_strategy(),
                                to in mass_unit_strategy()) {
        let converted = convert(value, from, to);
        let back = convert(converted, to, from);
        prop_assert_eq!(back, value);
    }

    #[test]
    fn volume_round_trip_is_exact(value in quantity_strategy(),
                                  from in volume_unit_strategy(),
                                  to in volume_unit_strategy()) {
        let converted = convert(value, from, to);
        let back = convert(converted, to, from);
        prop_assert_eq!(back, value);
    }

    /// Case and surrounding whitespace never change the result
    #[test]
    fn conversion_ignores_case_and_whitespace(value in quantity_strategy()) {
        prop_assert_eq!(convert(value, "KG", "g"), convert(value, "kg", "g"));
        prop_assert_eq!(convert(value, " kg ", "G"), convert(value, "kg", "g"));
    }

    /// Cross-dimension pairs pass the value through unchanged
    #[test]
    fn cross_dimension_is_identity(value in quantity_strategy(),
                                   mass in mass_unit_strategy(),
                                   volume in volume_unit_strategy()) {
        prop_assert_eq!(convert(value, mass, volume), value);
        prop_assert_eq!(convert(value, volume, mass), value);
    }

    /// The strict surface rejects exactly the pairs the permissive one
    /// passes through
    #[test]
    fn strict_conversion_agrees_with_convertible(value in quantity_strategy()) {
        let q = Quantity::new(value, "kg");
        prop_assert!(q.try_convert("g").is_ok());
        prop_assert!(q.try_convert("ml").is_err());
        prop_assert!(q.try_convert("pcs").is_err());
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn kilogram_to_gram_factor() {
        assert_eq!(convert(Decimal::from(2), "kg", "g"), Decimal::from(2000));
    }

    #[test]
    fn litre_to_millilitre_factor() {
        assert_eq!(convert(Decimal::from(3), "l", "ml"), Decimal::from(3000));
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_unit("  KG "), "kg");
        assert_eq!(normalize_unit("mL"), "ml");
    }

    #[test]
    fn classification() {
        assert_eq!(unit_class("kg"), UnitClass::Mass);
        assert_eq!(unit_class("ML"), UnitClass::Volume);
        assert_eq!(unit_class("pcs"), UnitClass::Count);
        assert_eq!(unit_class("sack"), UnitClass::Unknown);
    }

    #[test]
    fn unknown_units_are_convertible_only_to_themselves() {
        assert!(convertible("sack", "sack"));
        assert!(!convertible("sack", "kg"));
        assert!(!convertible("sack", "bag"));
    }

    #[test]
    fn count_units_do_not_cross_convert() {
        let q = Quantity::new(Decimal::from(10), "pcs");
        assert!(q.try_convert("pcs").is_ok());
        assert!(q.try_convert("unit").is_err());
    }
}
