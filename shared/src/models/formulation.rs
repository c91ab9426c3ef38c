//! Formulation (recipe) models and scaling math
//!
//! A formulation's ingredient list is authored against its reference
//! `batch_size`; running at any other size scales every quantity linearly.
//! The engine only ever operates on (quantity, unit) pairs — the percentage
//! view is a presentation convenience derived on demand.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{IngredientType, ProducesType};
use crate::units::convert;

/// A recipe producing either a bulk or a finished product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formulation {
    pub id: Uuid,
    pub name: String,
    /// Reference scale the ingredient list was authored at
    pub batch_size: Decimal,
    pub batch_unit: String,
    pub produces_type: ProducesType,
    pub produces_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a formulation's ordered ingredient list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulationIngredient {
    pub id: Uuid,
    pub formulation_id: Uuid,
    pub position: i32,
    pub ingredient_type: IngredientType,
    pub ingredient_id: Uuid,
    /// Authored quantity, in `unit` (not necessarily the batch unit or the
    /// ingredient's native unit)
    pub quantity: Decimal,
    pub unit: String,
}

/// A scaled material requirement produced by the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub ingredient_type: IngredientType,
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    /// Unit the quantity is expressed in (the ingredient's authored unit)
    pub unit: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScalingError {
    #[error("formulation has no ingredients")]
    EmptyFormulation,

    #[error("formulation batch size must be positive")]
    NonPositiveBatchSize,

    #[error("target batch size must be positive")]
    NonPositiveTargetSize,
}

/// Scale a formulation's ingredient list to a target batch size.
///
/// `required = authored_quantity * (target / batch_size)`. Quantities stay in
/// each ingredient's authored unit; callers convert before comparing against
/// native-unit stock.
pub fn scale_ingredients(
    batch_size: Decimal,
    ingredients: &[FormulationIngredient],
    target_batch_size: Decimal,
) -> Result<Vec<IngredientRequirement>, ScalingError> {
    if batch_size <= Decimal::ZERO {
        return Err(ScalingError::NonPositiveBatchSize);
    }
    if target_batch_size <= Decimal::ZERO {
        return Err(ScalingError::NonPositiveTargetSize);
    }
    if ingredients.is_empty() {
        return Err(ScalingError::EmptyFormulation);
    }

    let multiplier = target_batch_size / batch_size;
    Ok(ingredients
        .iter()
        .map(|ing| IngredientRequirement {
            ingredient_type: ing.ingredient_type,
            ingredient_id: ing.ingredient_id,
            quantity: ing.quantity * multiplier,
            unit: ing.unit.clone(),
        })
        .collect())
}

/// Derived percentage of an ingredient relative to the batch size, for the
/// editing UI only. The ingredient quantity is converted to the batch unit
/// first; incompatible units fall back to the raw quantity.
pub fn ingredient_percentage(
    quantity: Decimal,
    unit: &str,
    batch_size: Decimal,
    batch_unit: &str,
) -> Decimal {
    if batch_size <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    convert(quantity, unit, batch_unit) / batch_size * Decimal::from(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ingredient(quantity: &str, unit: &str) -> FormulationIngredient {
        FormulationIngredient {
            id: Uuid::new_v4(),
            formulation_id: Uuid::new_v4(),
            position: 0,
            ingredient_type: IngredientType::RawMaterial,
            ingredient_id: Uuid::new_v4(),
            quantity: dec(quantity),
            unit: unit.to_string(),
        }
    }

    #[test]
    fn scales_linearly() {
        let ings = vec![ingredient("70", "kg")];
        let half = scale_ingredients(dec("100"), &ings, dec("50")).unwrap();
        assert_eq!(half[0].quantity, dec("35"));
        assert_eq!(half[0].unit, "kg");
    }

    #[test]
    fn empty_list_is_an_error() {
        assert_eq!(
            scale_ingredients(dec("100"), &[], dec("50")),
            Err(ScalingError::EmptyFormulation)
        );
    }

    #[test]
    fn zero_batch_size_is_an_error() {
        let ings = vec![ingredient("70", "kg")];
        assert_eq!(
            scale_ingredients(dec("0"), &ings, dec("50")),
            Err(ScalingError::NonPositiveBatchSize)
        );
    }

    #[test]
    fn percentage_converts_to_batch_unit() {
        // 70,000 g of a 100 kg batch = 70%
        assert_eq!(
            ingredient_percentage(dec("70000"), "g", dec("100"), "kg"),
            dec("70")
        );
    }
}
