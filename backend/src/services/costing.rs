//! Costing service: loads the formulation dependency graph and prices it
//!
//! The recursion itself lives in `shared::costing`; this service only
//! snapshots the database into a [`CostGraph`] and reports dimension
//! mismatches before trusting a figure.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use shared::{
    formulation_cost, BulkCostInfo, CostGraph, FormulationCost, FormulationIngredient,
    FormulationNode, IngredientType, MaterialCostInfo,
};

#[derive(Clone)]
pub struct CostingService {
    db: PgPool,
    max_depth: usize,
}

impl CostingService {
    /// Create a new CostingService instance
    pub fn new(db: PgPool, max_depth: usize) -> Self {
        Self { db, max_depth }
    }

    /// Cost a formulation at its native batch size
    pub async fn cost_formulation(&self, formulation_id: Uuid) -> AppResult<FormulationCost> {
        let graph = self.load_graph().await?;

        for (ingredient_id, authored, native) in graph.dimension_mismatches(formulation_id) {
            tracing::warn!(
                %formulation_id,
                %ingredient_id,
                authored_unit = %authored,
                native_unit = %native,
                "Ingredient unit is not convertible to the entity's native unit; \
                 costing with the raw quantity"
            );
        }

        let cost = formulation_cost(&graph, formulation_id, self.max_depth)?;
        Ok(cost)
    }

    /// Snapshot every formulation, raw material and bulk product into an
    /// in-memory graph. One load per costing request keeps the recursion
    /// free of queries and consistent within itself.
    async fn load_graph(&self) -> AppResult<CostGraph> {
        let mut graph = CostGraph::default();

        let materials = sqlx::query_as::<_, (Uuid, String, String, Decimal)>(
            "SELECT id, name, unit, last_purchase_cost FROM raw_materials",
        )
        .fetch_all(&self.db)
        .await?;
        for (id, name, unit, last_purchase_cost) in materials {
            graph.materials.insert(
                id,
                MaterialCostInfo {
                    name,
                    unit,
                    last_purchase_cost,
                },
            );
        }

        let bulk_products = sqlx::query_as::<_, (Uuid, String, String, Option<Uuid>)>(
            "SELECT id, name, unit, formulation_id FROM bulk_products",
        )
        .fetch_all(&self.db)
        .await?;
        for (id, name, unit, formulation_id) in bulk_products {
            graph.bulk_products.insert(
                id,
                BulkCostInfo {
                    name,
                    unit,
                    formulation_id,
                },
            );
        }

        let formulations = sqlx::query_as::<_, (Uuid, Decimal, String)>(
            "SELECT id, batch_size, batch_unit FROM formulations",
        )
        .fetch_all(&self.db)
        .await?;
        for (id, batch_size, batch_unit) in formulations {
            graph.formulations.insert(
                id,
                FormulationNode {
                    batch_size,
                    batch_unit,
                    ingredients: Vec::new(),
                },
            );
        }

        let ingredients = sqlx::query_as::<_, (Uuid, Uuid, i32, String, Uuid, Decimal, String)>(
            "SELECT id, formulation_id, position, ingredient_type, ingredient_id, quantity, unit \
             FROM formulation_ingredients ORDER BY formulation_id, position",
        )
        .fetch_all(&self.db)
        .await?;
        for (id, formulation_id, position, ingredient_type, ingredient_id, quantity, unit) in
            ingredients
        {
            // Rows with an unrecognized type text are skipped rather than
            // failing the whole graph; the schema CHECK constraint should
            // make this unreachable.
            let Some(ingredient_type) = IngredientType::parse(&ingredient_type) else {
                tracing::warn!(ingredient_row = %id, %ingredient_type, "Skipping ingredient with unknown type");
                continue;
            };
            if let Some(node) = graph.formulations.get_mut(&formulation_id) {
                node.ingredients.push(FormulationIngredient {
                    id,
                    formulation_id,
                    position,
                    ingredient_type,
                    ingredient_id,
                    quantity,
                    unit,
                });
            }
        }

        Ok(graph)
    }
}
