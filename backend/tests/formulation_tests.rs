//! Formulation resolution tests
//!
//! Property-based and unit tests for ingredient scaling:
//! - linearity of scaled requirements
//! - order preservation
//! - empty-formulation rejection

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    ingredient_percentage, scale_ingredients, FormulationIngredient, IngredientType, ScalingError,
};

// ============================================================================
// Helpers and Strategies
// ============================================================================

fn dec(n: i64, scale: u32) -> Decimal {
    Decimal::new(n, scale)
}

fn ingredient(quantity: Decimal, unit: &str, position: i32) -> FormulationIngredient {
    FormulationIngredient {
        id: Uuid::new_v4(),
        formulation_id: Uuid::new_v4(),
        position,
        ingredient_type: IngredientType::RawMaterial,
        ingredient_id: Uuid::new_v4(),
        quantity,
        unit: unit.to_string(),
    }
}

/// Positive decimals with 2 decimal places, bounded to keep products exact
fn positive_decimal() -> impl Strategy<Value = Decimal> {
    (1i64..100_000).prop_map(|n| Decimal::new(n, 2))
}

fn ingredient_list() -> impl Strategy<Value = Vec<FormulationIngredient>> {
    prop::collection::vec(positive_decimal(), 1..8).prop_map(|quantities| {
        quantities
            .into_iter()
            .enumerate()
            .map(|(i, q)| ingredient(q, "kg", i as i32))
            .collect()
    })
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Every scaled requirement is the authored quantity times the same
    /// multiplier target/batch_size
    #[test]
    fn scaling_is_linear(ingredients in ingredient_list(),
                         batch in positive_decimal(),
                         target in positive_decimal()) {
        let scaled = scale_ingredients(batch, &ingredients, target).unwrap();
        prop_assert_eq!(scaled.len(), ingredients.len());
        let multiplier = target / batch;
        for (req, ing) in scaled.iter().zip(&ingredients) {
            prop_assert_eq!(req.quantity, ing.quantity * multiplier);
            prop_assert_eq!(req.ingredient_id, ing.ingredient_id);
        }
    }

    /// Scaling to the native batch size is the identity
    #[test]
    fn scaling_to_native_size_is_identity(ingredients in ingredient_list(),
                                          batch in positive_decimal()) {
        let scaled = scale_ingredients(batch, &ingredients, batch).unwrap();
        for (req, ing) in scaled.iter().zip(&ingredients) {
            prop_assert_eq!(req.quantity, ing.quantity);
        }
    }

    /// Authored order survives scaling
    #[test]
    fn scaling_preserves_order(ingredients in ingredient_list(),
                               batch in positive_decimal(),
                               target in positive_decimal()) {
        let scaled = scale_ingredients(batch, &ingredients, target).unwrap();
        let ids: Vec<_> = scaled.iter().map(|r| r.ingredient_id).collect();
        let expected: Vec<_> = ingredients.iter().map(|i| i.ingredient_id).collect();
        prop_assert_eq!(ids, expected);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    /// 100 kg cream batch with 70 kg water, run at 50 kg: water = 35 kg
    #[test]
    fn cream_scenario_scales_down() {
        let water = ingredient(Decimal::from(70), "kg", 0);
        let scaled =
            scale_ingredients(Decimal::from(100), &[water], Decimal::from(50)).unwrap();
        assert_eq!(scaled[0].quantity, Decimal::from(35));
    }

    #[test]
    fn empty_formulation_is_rejected() {
        let err = scale_ingredients(Decimal::from(100), &[], Decimal::from(50)).unwrap_err();
        assert_eq!(err, ScalingError::EmptyFormulation);
    }

    #[test]
    fn non_positive_sizes_are_rejected() {
        let ing = ingredient(Decimal::from(1), "kg", 0);
        assert_eq!(
            scale_ingredients(Decimal::ZERO, &[ing.clone()], Decimal::from(10)).unwrap_err(),
            ScalingError::NonPositiveBatchSize
        );
        assert_eq!(
            scale_ingredients(Decimal::from(10), &[ing], Decimal::ZERO).unwrap_err(),
            ScalingError::NonPositiveTargetSize
        );
    }

    /// Percentage is presentation-only and converts to the batch unit first
    #[test]
    fn percentage_converts_to_batch_unit() {
        // 500 g of a 2 kg batch = 25%
        let pct = ingredient_percentage(
            Decimal::from(500),
            "g",
            Decimal::from(2),
            "kg",
        );
        assert_eq!(pct, Decimal::from(25));
    }

    #[test]
    fn percentage_of_zero_batch_is_zero() {
        let pct = ingredient_percentage(dec(5, 0), "kg", Decimal::ZERO, "kg");
        assert_eq!(pct, Decimal::ZERO);
    }
}
