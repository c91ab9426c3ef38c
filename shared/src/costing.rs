//! Recursive cost-of-goods resolution
//!
//! Costs a formulation's output by walking its ingredient list: raw
//! materials contribute `last_purchase_cost x quantity` (converted to the
//! material's native unit), bulk-product ingredients recurse into their
//! source formulation. The recursion tracks the ancestor path explicitly so
//! a cyclic formulation graph fails with [`CostingError::CyclicFormulation`]
//! instead of hanging; a depth ceiling backs the path check up.
//!
//! Unit mismatches between an authored unit and a native unit are the one
//! place the permissive conversion fallback is kept: the raw quantity is
//! used unconverted. [`CostGraph::dimension_mismatches`] lets callers
//! surface those before trusting a figure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::models::FormulationIngredient;
use crate::types::IngredientType;
use crate::units::{convert, convertible};

/// Default ceiling on bulk-product dependency depth
pub const DEFAULT_MAX_COST_DEPTH: usize = 32;

/// Pricing inputs for one raw material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialCostInfo {
    pub name: String,
    pub unit: String,
    pub last_purchase_cost: Decimal,
}

/// Costing-relevant fields of one bulk product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCostInfo {
    pub name: String,
    pub unit: String,
    /// None = purchased ready-made; costed at zero (unpriced)
    pub formulation_id: Option<Uuid>,
}

/// One formulation with its authored ingredient list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulationNode {
    pub batch_size: Decimal,
    pub batch_unit: String,
    pub ingredients: Vec<FormulationIngredient>,
}

/// In-memory snapshot of the formulation dependency graph, loaded once per
/// costing request
#[derive(Debug, Clone, Default)]
pub struct CostGraph {
    pub formulations: HashMap<Uuid, FormulationNode>,
    pub materials: HashMap<Uuid, MaterialCostInfo>,
    pub bulk_products: HashMap<Uuid, BulkCostInfo>,
}

/// Result of costing one formulation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormulationCost {
    pub formulation_id: Uuid,
    pub total_cost: Decimal,
    /// total_cost / batch_size; 0 when batch_size is 0 (undefined, reported
    /// rather than divided)
    pub cost_per_batch_unit: Decimal,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CostingError {
    #[error("formulation {0} does not exist")]
    UnknownFormulation(Uuid),

    #[error("raw material {0} referenced by an ingredient does not exist")]
    UnknownMaterial(Uuid),

    #[error("bulk product {0} referenced by an ingredient does not exist")]
    UnknownBulkProduct(Uuid),

    #[error("formulation {0} has no ingredients")]
    EmptyFormulation(Uuid),

    #[error("cyclic formulation reference involving {formulation_id} at depth {depth}")]
    CyclicFormulation { formulation_id: Uuid, depth: usize },
}

/// Cost a formulation at its native batch size.
pub fn formulation_cost(
    graph: &CostGraph,
    formulation_id: Uuid,
    max_depth: usize,
) -> Result<FormulationCost, CostingError> {
    let mut path = HashSet::new();
    cost_node(graph, formulation_id, max_depth, &mut path, 0)
}

fn cost_node(
    graph: &CostGraph,
    formulation_id: Uuid,
    max_depth: usize,
    path: &mut HashSet<Uuid>,
    depth: usize,
) -> Result<FormulationCost, CostingError> {
    // Path membership catches true cycles; the depth ceiling converts any
    // other runaway chain into a reported error.
    if path.contains(&formulation_id) || depth > max_depth {
        return Err(CostingError::CyclicFormulation {
            formulation_id,
            depth,
        });
    }

    let node = graph
        .formulations
        .get(&formulation_id)
        .ok_or(CostingError::UnknownFormulation(formulation_id))?;
    if node.ingredients.is_empty() {
        return Err(CostingError::EmptyFormulation(formulation_id));
    }

    path.insert(formulation_id);

    let mut total_cost = Decimal::ZERO;
    for ingredient in &node.ingredients {
        total_cost += match ingredient.ingredient_type {
            IngredientType::RawMaterial => {
                let material = graph
                    .materials
                    .get(&ingredient.ingredient_id)
                    .ok_or(CostingError::UnknownMaterial(ingredient.ingredient_id))?;
                let quantity = convert(ingredient.quantity, &ingredient.unit, &material.unit);
                material.last_purchase_cost * quantity
            }
            IngredientType::BulkProduct => {
                let bulk = graph
                    .bulk_products
                    .get(&ingredient.ingredient_id)
                    .ok_or(CostingError::UnknownBulkProduct(ingredient.ingredient_id))?;
                match bulk.formulation_id {
                    // Purchased ready-made: unpriced, contributes zero
                    None => Decimal::ZERO,
                    Some(source_id) => {
                        let sub = cost_node(graph, source_id, max_depth, path, depth + 1)?;
                        let quantity = convert(ingredient.quantity, &ingredient.unit, &bulk.unit);
                        sub.cost_per_batch_unit * quantity
                    }
                }
            }
        };
    }

    path.remove(&formulation_id);

    let cost_per_batch_unit = if node.batch_size > Decimal::ZERO {
        total_cost / node.batch_size
    } else {
        Decimal::ZERO
    };

    Ok(FormulationCost {
        formulation_id,
        total_cost,
        cost_per_batch_unit,
    })
}

impl CostGraph {
    /// Ingredient lines whose authored unit cannot be converted exactly to
    /// the referenced entity's native unit. Costing still proceeds with the
    /// raw quantity for these; callers should log them.
    pub fn dimension_mismatches(&self, formulation_id: Uuid) -> Vec<(Uuid, String, String)> {
        let Some(node) = self.formulations.get(&formulation_id) else {
            return Vec::new();
        };
        node.ingredients
            .iter()
            .filter_map(|ing| {
                let native = match ing.ingredient_type {
                    IngredientType::RawMaterial => {
                        self.materials.get(&ing.ingredient_id).map(|m| m.unit.clone())
                    }
                    IngredientType::BulkProduct => self
                        .bulk_products
                        .get(&ing.ingredient_id)
                        .map(|b| b.unit.clone()),
                }?;
                if convertible(&ing.unit, &native) {
                    None
                } else {
                    Some((ing.ingredient_id, ing.unit.clone(), native))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ingredient(
        ty: IngredientType,
        id: Uuid,
        quantity: &str,
        unit: &str,
    ) -> FormulationIngredient {
        FormulationIngredient {
            id: Uuid::new_v4(),
            formulation_id: Uuid::new_v4(),
            position: 0,
            ingredient_type: ty,
            ingredient_id: id,
            quantity: dec(quantity),
            unit: unit.to_string(),
        }
    }

    #[test]
    fn raw_material_cost_with_conversion() {
        // 500 g of a material priced 20/kg -> 0.5 kg x 20 = 10
        let material_id = Uuid::new_v4();
        let formulation_id = Uuid::new_v4();
        let mut graph = CostGraph::default();
        graph.materials.insert(
            material_id,
            MaterialCostInfo {
                name: "Oil".into(),
                unit: "kg".into(),
                last_purchase_cost: dec("20"),
            },
        );
        graph.formulations.insert(
            formulation_id,
            FormulationNode {
                batch_size: dec("2"),
                batch_unit: "kg".into(),
                ingredients: vec![ingredient(
                    IngredientType::RawMaterial,
                    material_id,
                    "500",
                    "g",
                )],
            },
        );

        let cost = formulation_cost(&graph, formulation_id, DEFAULT_MAX_COST_DEPTH).unwrap();
        assert_eq!(cost.total_cost, dec("10"));
        assert_eq!(cost.cost_per_batch_unit, dec("5"));
    }

    #[test]
    fn bulk_ingredient_recurses_into_source_formulation() {
        // Base: 10 L batch, 10 L water at 10/L -> per-unit cost 10.
        // F uses 2 L of Base -> contribution 20.
        let water = Uuid::new_v4();
        let base = Uuid::new_v4();
        let g = Uuid::new_v4();
        let f = Uuid::new_v4();

        let mut graph = CostGraph::default();
        graph.materials.insert(
            water,
            MaterialCostInfo {
                name: "Water".into(),
                unit: "l".into(),
                last_purchase_cost: dec("10"),
            },
        );
        graph.bulk_products.insert(
            base,
            BulkCostInfo {
                name: "Base".into(),
                unit: "l".into(),
                formulation_id: Some(g),
            },
        );
        graph.formulations.insert(
            g,
            FormulationNode {
                batch_size: dec("10"),
                batch_unit: "l".into(),
                ingredients: vec![ingredient(IngredientType::RawMaterial, water, "10", "l")],
            },
        );
        graph.formulations.insert(
            f,
            FormulationNode {
                batch_size: dec("1"),
                batch_unit: "l".into(),
                ingredients: vec![ingredient(IngredientType::BulkProduct, base, "2", "L")],
            },
        );

        let cost = formulation_cost(&graph, f, DEFAULT_MAX_COST_DEPTH).unwrap();
        assert_eq!(cost.total_cost, dec("20"));
    }

    #[test]
    fn recipe_less_bulk_costs_zero() {
        let bulk = Uuid::new_v4();
        let f = Uuid::new_v4();
        let mut graph = CostGraph::default();
        graph.bulk_products.insert(
            bulk,
            BulkCostInfo {
                name: "Bought base".into(),
                unit: "kg".into(),
                formulation_id: None,
            },
        );
        graph.formulations.insert(
            f,
            FormulationNode {
                batch_size: dec("5"),
                batch_unit: "kg".into(),
                ingredients: vec![ingredient(IngredientType::BulkProduct, bulk, "3", "kg")],
            },
        );

        let cost = formulation_cost(&graph, f, DEFAULT_MAX_COST_DEPTH).unwrap();
        assert_eq!(cost.total_cost, Decimal::ZERO);
    }

    #[test]
    fn cycle_is_detected_not_hung() {
        // A's bulk output feeds B, B's bulk output feeds back into A.
        let bulk_a = Uuid::new_v4();
        let bulk_b = Uuid::new_v4();
        let form_a = Uuid::new_v4();
        let form_b = Uuid::new_v4();

        let mut graph = CostGraph::default();
        graph.bulk_products.insert(
            bulk_a,
            BulkCostInfo {
                name: "A".into(),
                unit: "kg".into(),
                formulation_id: Some(form_a),
            },
        );
        graph.bulk_products.insert(
            bulk_b,
            BulkCostInfo {
                name: "B".into(),
                unit: "kg".into(),
                formulation_id: Some(form_b),
            },
        );
        graph.formulations.insert(
            form_a,
            FormulationNode {
                batch_size: dec("1"),
                batch_unit: "kg".into(),
                ingredients: vec![ingredient(IngredientType::BulkProduct, bulk_b, "1", "kg")],
            },
        );
        graph.formulations.insert(
            form_b,
            FormulationNode {
                batch_size: dec("1"),
                batch_unit: "kg".into(),
                ingredients: vec![ingredient(IngredientType::BulkProduct, bulk_a, "1", "kg")],
            },
        );

        let err = formulation_cost(&graph, form_a, DEFAULT_MAX_COST_DEPTH).unwrap_err();
        assert!(matches!(err, CostingError::CyclicFormulation { .. }));
    }

    #[test]
    fn shared_subformulation_is_not_a_cycle() {
        // Diamond: F uses bulk X twice (two ingredient lines); the second
        // visit must not be flagged as a cycle.
        let water = Uuid::new_v4();
        let bulk_x = Uuid::new_v4();
        let form_x = Uuid::new_v4();
        let f = Uuid::new_v4();

        let mut graph = CostGraph::default();
        graph.materials.insert(
            water,
            MaterialCostInfo {
                name: "Water".into(),
                unit: "l".into(),
                last_purchase_cost: dec("1"),
            },
        );
        graph.bulk_products.insert(
            bulk_x,
            BulkCostInfo {
                name: "X".into(),
                unit: "l".into(),
                formulation_id: Some(form_x),
            },
        );
        graph.formulations.insert(
            form_x,
            FormulationNode {
                batch_size: dec("1"),
                batch_unit: "l".into(),
                ingredients: vec![ingredient(IngredientType::RawMaterial, water, "1", "l")],
            },
        );
        graph.formulations.insert(
            f,
            FormulationNode {
                batch_size: dec("1"),
                batch_unit: "l".into(),
                ingredients: vec![
                    ingredient(IngredientType::BulkProduct, bulk_x, "1", "l"),
                    ingredient(IngredientType::BulkProduct, bulk_x, "2", "l"),
                ],
            },
        );

        let cost = formulation_cost(&graph, f, DEFAULT_MAX_COST_DEPTH).unwrap();
        assert_eq!(cost.total_cost, dec("3"));
    }

    #[test]
    fn zero_batch_size_reports_zero_per_unit() {
        let material = Uuid::new_v4();
        let f = Uuid::new_v4();
        let mut graph = CostGraph::default();
        graph.materials.insert(
            material,
            MaterialCostInfo {
                name: "Salt".into(),
                unit: "kg".into(),
                last_purchase_cost: dec("4"),
            },
        );
        graph.formulations.insert(
            f,
            FormulationNode {
                batch_size: Decimal::ZERO,
                batch_unit: "kg".into(),
                ingredients: vec![ingredient(IngredientType::RawMaterial, material, "2", "kg")],
            },
        );

        let cost = formulation_cost(&graph, f, DEFAULT_MAX_COST_DEPTH).unwrap();
        assert_eq!(cost.total_cost, dec("8"));
        assert_eq!(cost.cost_per_batch_unit, Decimal::ZERO);
    }
}
