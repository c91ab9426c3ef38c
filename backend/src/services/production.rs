//! Production service: execute a formulation as one atomic transaction
//!
//! A run resolves its formulation, locks the raw-material ledger rows it
//! will touch, verifies every requirement against stock (collecting all
//! shortages, not just the first), writes the run and its audit rows, debits
//! the materials and credits the produced output. Any failure rolls the
//! whole run back; stock is never partially consumed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{validation_error, AppError, AppResult};
use crate::services::formulation::{FormulationService, ResolvedIngredient};
use crate::services::inventory::{apply_delta, credit_finished, quantity_for_update};
use shared::{
    derive_batch_number, derive_expiry_date, find_shortages, finished_units, run_expiry_date,
    validate_batch_size, IngredientRequirement, IngredientType, InventoryKind, OutputCredit,
    ProducesType, ProductionRun, Quantity,
};

#[derive(Clone)]
pub struct ProductionService {
    db: PgPool,
    formulations: FormulationService,
}

/// Input for executing a production run
#[derive(Debug, Deserialize)]
pub struct ProduceInput {
    pub formulation_id: Uuid,
    pub batch_size: Decimal,
    pub production_date: NaiveDate,
    /// Credit only this finished product instead of every product linked to
    /// the formulation. Only valid for formulations producing finished goods.
    pub finished_product_id: Option<Uuid>,
}

/// Raw material debited by a run, in its native unit
#[derive(Debug, Clone, Serialize)]
pub struct MaterialUsage {
    pub material_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
}

/// Bulk output credited by a run
#[derive(Debug, Clone, Serialize)]
pub struct BulkCredit {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit: String,
}

/// Everything a completed run changed
#[derive(Debug, Clone, Serialize)]
pub struct ProductionReceipt {
    pub run: ProductionRun,
    pub materials_used: Vec<MaterialUsage>,
    /// Present when the formulation produces a bulk product
    pub bulk_output: Option<BulkCredit>,
    /// Finished products credited, when the formulation produces finished goods
    pub outputs: Vec<OutputCredit>,
}

/// Finished-product fields a run needs for crediting
#[derive(Debug, sqlx::FromRow)]
struct FinishedProductRef {
    id: Uuid,
    name: String,
    units_per_batch: Decimal,
    shelf_life_months: Option<i32>,
}

impl ProductionService {
    /// Create a new ProductionService instance
    pub fn new(db: PgPool) -> Self {
        let formulations = FormulationService::new(db.clone());
        Self { db, formulations }
    }

    /// Execute a production run atomically
    pub async fn produce(&self, input: ProduceInput) -> AppResult<ProductionReceipt> {
        validate_batch_size(input.batch_size).map_err(|e| validation_error("batch_size", e))?;

        let formulation = self.formulations.load_formulation(input.formulation_id).await?;

        if input.finished_product_id.is_some() && formulation.produces_type != ProducesType::Finished
        {
            return Err(validation_error(
                "finished_product_id",
                "Formulation produces a bulk product; a finished product cannot be named",
            ));
        }

        let resolved = self
            .formulations
            .resolve(input.formulation_id, input.batch_size)
            .await?;

        // Only raw-material lines consume stock here; bulk-product lines are
        // intermediate goods consumed when their own runs are packaged or
        // used, and are left untouched by this run.
        let mut requirements: Vec<(IngredientRequirement, String)> = Vec::new();
        for ingredient in &resolved {
            if ingredient.ingredient_type != IngredientType::RawMaterial {
                continue;
            }
            let needed = native_requirement(ingredient)?;
            requirements.push((
                IngredientRequirement {
                    ingredient_type: ingredient.ingredient_type,
                    ingredient_id: ingredient.ingredient_id,
                    quantity: needed.value,
                    unit: needed.unit,
                },
                ingredient.name.clone(),
            ));
        }

        // Deterministic lock order across concurrent runs
        requirements.sort_by_key(|(req, _)| req.ingredient_id);

        let mut tx = self.db.begin().await?;

        let mut available = HashMap::new();
        for (req, _) in &requirements {
            let stock =
                quantity_for_update(&mut tx, InventoryKind::RawMaterial, req.ingredient_id).await?;
            available.insert(req.ingredient_id, stock);
        }

        let shortages = find_shortages(&requirements, &available, InventoryKind::RawMaterial);
        if !shortages.is_empty() {
            return Err(AppError::InsufficientInventory { shortages });
        }

        // Output products are fixed before the run row is written so a
        // single product's shelf life, named or discovered, can drive the
        // run-level expiry.
        let output_products = match formulation.produces_type {
            ProducesType::Bulk => Vec::new(),
            ProducesType::Finished => match input.finished_product_id {
                Some(id) => vec![self.load_finished_product(&mut tx, id).await?],
                None => {
                    self.discover_finished_products(&mut tx, input.formulation_id)
                        .await?
                }
            },
        };

        let run_id = Uuid::new_v4();
        let batch_number = derive_batch_number(run_id, input.production_date);
        let shelf_lives: Vec<Option<i32>> = output_products
            .iter()
            .map(|p| p.shelf_life_months)
            .collect();
        let expiry_date = run_expiry_date(input.production_date, &shelf_lives);

        let run = sqlx::query_as::<_, RunRow>(
            r#"
            INSERT INTO production_runs
                (id, formulation_id, batch_size, production_date, batch_number, expiry_date, finished_product_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, formulation_id, batch_size, production_date, batch_number, expiry_date,
                      finished_product_id, created_at
            "#,
        )
        .bind(run_id)
        .bind(input.formulation_id)
        .bind(input.batch_size)
        .bind(input.production_date)
        .bind(&batch_number)
        .bind(expiry_date)
        .bind(input.finished_product_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut materials_used = Vec::with_capacity(requirements.len());
        for (req, name) in &requirements {
            sqlx::query(
                "INSERT INTO production_materials_used (production_run_id, raw_material_id, quantity) \
                 VALUES ($1, $2, $3)",
            )
            .bind(run_id)
            .bind(req.ingredient_id)
            .bind(req.quantity)
            .execute(&mut *tx)
            .await?;

            apply_delta(
                &mut tx,
                InventoryKind::RawMaterial,
                req.ingredient_id,
                -req.quantity,
            )
            .await?;

            materials_used.push(MaterialUsage {
                material_id: req.ingredient_id,
                name: name.clone(),
                quantity: req.quantity,
                unit: req.unit.clone(),
            });
        }

        let mut bulk_output = None;
        let mut outputs = Vec::new();

        match formulation.produces_type {
            ProducesType::Bulk => {
                bulk_output = Some(
                    self.credit_bulk_output(
                        &mut tx,
                        formulation.produces_id,
                        input.batch_size,
                        &formulation.batch_unit,
                    )
                    .await?,
                );
            }
            ProducesType::Finished => {
                for product in output_products {
                    let units = finished_units(input.batch_size, product.units_per_batch);
                    // Each product's inventory row is stamped with its own
                    // batch expiry, independent of the run-level one
                    let product_expiry =
                        derive_expiry_date(input.production_date, product.shelf_life_months);
                    credit_finished(&mut tx, product.id, units, product_expiry).await?;
                    outputs.push(OutputCredit {
                        product_id: product.id,
                        product_name: product.name,
                        units_credited: units,
                        batch_size: input.batch_size,
                        units_per_batch: product.units_per_batch,
                    });
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            %run_id,
            formulation_id = %input.formulation_id,
            batch_size = %input.batch_size,
            batch_number = %batch_number,
            materials = materials_used.len(),
            "Production run completed"
        );

        Ok(ProductionReceipt {
            run: run.into(),
            materials_used,
            bulk_output,
            outputs,
        })
    }

    /// Get a production run with its audit rows
    pub async fn get_run(&self, id: Uuid) -> AppResult<ProductionRunDetail> {
        let run = sqlx::query_as::<_, RunRow>(
            "SELECT id, formulation_id, batch_size, production_date, batch_number, expiry_date, \
                    finished_product_id, created_at \
             FROM production_runs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Production run {id}")))?;

        let materials_used = sqlx::query_as::<_, (Uuid, String, String, Decimal)>(
            "SELECT u.raw_material_id, m.name, m.unit, u.quantity \
             FROM production_materials_used u \
             JOIN raw_materials m ON m.id = u.raw_material_id \
             WHERE u.production_run_id = $1 \
             ORDER BY m.name",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(material_id, name, unit, quantity)| MaterialUsage {
            material_id,
            name,
            quantity,
            unit,
        })
        .collect();

        Ok(ProductionRunDetail {
            run: run.into(),
            materials_used,
        })
    }

    /// List production runs, most recent first
    pub async fn list_runs(&self) -> AppResult<Vec<ProductionRun>> {
        let rows = sqlx::query_as::<_, RunRow>(
            "SELECT id, formulation_id, batch_size, production_date, batch_number, expiry_date, \
                    finished_product_id, created_at \
             FROM production_runs ORDER BY production_date DESC, created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ProductionRun::from).collect())
    }

    async fn credit_bulk_output(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        batch_size: Decimal,
        batch_unit: &str,
    ) -> AppResult<BulkCredit> {
        let (name, native_unit) = sqlx::query_as::<_, (String, String)>(
            "SELECT name, unit FROM bulk_products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::InvalidReference(format!("bulk product {product_id}")))?;

        let credited = Quantity::new(batch_size, batch_unit).try_convert(&native_unit)?;
        apply_delta(tx, InventoryKind::BulkProduct, product_id, credited.value).await?;

        Ok(BulkCredit {
            product_id,
            product_name: name,
            quantity: credited.value,
            unit: credited.unit,
        })
    }

    async fn load_finished_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<FinishedProductRef> {
        sqlx::query_as::<_, FinishedProductRef>(
            "SELECT id, name, units_per_batch, shelf_life_months \
             FROM finished_products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::InvalidReference(format!("finished product {id}")))
    }

    async fn discover_finished_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        formulation_id: Uuid,
    ) -> AppResult<Vec<FinishedProductRef>> {
        let products = sqlx::query_as::<_, FinishedProductRef>(
            "SELECT id, name, units_per_batch, shelf_life_months \
             FROM finished_products WHERE formulation_id = $1 ORDER BY name",
        )
        .bind(formulation_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(products)
    }
}

/// A production run with its material audit trail
#[derive(Debug, Clone, Serialize)]
pub struct ProductionRunDetail {
    #[serde(flatten)]
    pub run: ProductionRun,
    pub materials_used: Vec<MaterialUsage>,
}

#[derive(Debug, sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    formulation_id: Uuid,
    batch_size: Decimal,
    production_date: NaiveDate,
    batch_number: String,
    expiry_date: Option<NaiveDate>,
    finished_product_id: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<RunRow> for ProductionRun {
    fn from(row: RunRow) -> Self {
        ProductionRun {
            id: row.id,
            formulation_id: row.formulation_id,
            batch_size: row.batch_size,
            production_date: row.production_date,
            batch_number: row.batch_number,
            expiry_date: row.expiry_date,
            finished_product_id: row.finished_product_id,
            created_at: row.created_at,
        }
    }
}

/// Convert a resolved ingredient's authored quantity into the entity's
/// native unit; incompatible dimensions block the run.
fn native_requirement(ingredient: &ResolvedIngredient) -> AppResult<Quantity> {
    let quantity = Quantity::new(ingredient.quantity, &ingredient.unit)
        .try_convert(&ingredient.native_unit)?;
    Ok(quantity)
}
