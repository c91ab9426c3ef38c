//! Inventory availability tests
//!
//! Property-based and unit tests for the pure shortage check:
//! - completeness (every short entity is reported, none more)
//! - the check never mutates stock
//! - missing ledger rows read as zero

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use shared::{find_shortages, IngredientRequirement, IngredientType, InventoryKind};

// ============================================================================
// Helpers and Strategies
// ============================================================================

fn requirement(id: Uuid, quantity: Decimal) -> (IngredientRequirement, String) {
    (
        IngredientRequirement {
            ingredient_type: IngredientType::RawMaterial,
            ingredient_id: id,
            quantity,
            unit: "kg".to_string(),
        },
        format!("material-{id}"),
    )
}

fn positive_decimal() -> impl Strategy<Value = Decimal> {
    (1i64..100_000).prop_map(|n| Decimal::new(n, 2))
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// The shortage list contains exactly the requirements that exceed stock
    #[test]
    fn shortage_list_is_complete_and_exact(
        entries in prop::collection::vec((positive_decimal(), positive_decimal()), 1..12)
    ) {
        let mut requirements = Vec::new();
        let mut stock = HashMap::new();
        let mut expected_short = Vec::new();

        for (required, available) in &entries {
            let id = Uuid::new_v4();
            requirements.push(requirement(id, *required));
            stock.insert(id, *available);
            if available < required {
                expected_short.push(id);
            }
        }

        let shortages = find_shortages(&requirements, &stock, InventoryKind::RawMaterial);
        let reported: Vec<_> = shortages.iter().map(|s| s.entity_id).collect();
        prop_assert_eq!(reported, expected_short);
    }

    /// Reported figures echo the inputs: required from the requirement,
    /// available from the stock snapshot
    #[test]
    fn shortage_figures_echo_inputs(required in positive_decimal(),
                                    available in positive_decimal()) {
        prop_assume!(available < required);
        let id = Uuid::new_v4();
        let mut stock = HashMap::new();
        stock.insert(id, available);

        let shortages = find_shortages(
            &[requirement(id, required)],
            &stock,
            InventoryKind::RawMaterial,
        );
        prop_assert_eq!(shortages.len(), 1);
        prop_assert_eq!(shortages[0].required, required);
        prop_assert_eq!(shortages[0].available, available);
    }

    /// The check reads the snapshot without changing it
    #[test]
    fn check_does_not_mutate_stock(required in positive_decimal(),
                                   available in positive_decimal()) {
        let id = Uuid::new_v4();
        let mut stock = HashMap::new();
        stock.insert(id, available);
        let before = stock.clone();

        let _ = find_shortages(&[requirement(id, required)], &stock, InventoryKind::RawMaterial);
        prop_assert_eq!(stock, before);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// Cream at half batch needs 35 kg water against 30 kg stock: exactly
    /// one shortage, figures 35/30
    #[test]
    fn cream_scenario_shortage() {
        let water = Uuid::new_v4();
        let sugar = Uuid::new_v4();
        let mut stock = HashMap::new();
        stock.insert(water, dec("30"));
        stock.insert(sugar, dec("100"));

        let shortages = find_shortages(
            &[requirement(water, dec("35")), requirement(sugar, dec("10"))],
            &stock,
            InventoryKind::RawMaterial,
        );

        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].entity_id, water);
        assert_eq!(shortages[0].required, dec("35"));
        assert_eq!(shortages[0].available, dec("30"));
    }

    #[test]
    fn missing_ledger_row_reads_as_zero() {
        let id = Uuid::new_v4();
        let shortages = find_shortages(
            &[requirement(id, dec("1"))],
            &HashMap::new(),
            InventoryKind::RawMaterial,
        );
        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].available, Decimal::ZERO);
    }

    #[test]
    fn exact_stock_passes() {
        let id = Uuid::new_v4();
        let mut stock = HashMap::new();
        stock.insert(id, dec("10"));
        let shortages = find_shortages(
            &[requirement(id, dec("10"))],
            &stock,
            InventoryKind::RawMaterial,
        );
        assert!(shortages.is_empty());
    }
}
