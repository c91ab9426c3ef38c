//! Packaging service: convert bulk product into finished sellable units
//!
//! Bulk stock is a hard constraint: packaging more bulk than is on hand
//! rejects the run. Packaging materials (jars, labels, boxes) are soft:
//! their counts drift in practice, so a short material logs a warning and
//! its stock clamps at zero instead of blocking the run.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{validation_error, AppError, AppResult};
use crate::services::inventory::{
    apply_delta, apply_delta_clamped, credit_finished, quantity_for_update,
};
use shared::{
    derive_expiry_date, validate_positive_quantity, InventoryKind, PackagingRun, Shortage,
};

#[derive(Clone)]
pub struct PackagingService {
    db: PgPool,
}

/// One packaging material consumed by a run
#[derive(Debug, Deserialize)]
pub struct PackagingMaterialInput {
    pub raw_material_id: Uuid,
    pub quantity: Decimal,
}

/// Input for executing a packaging run
#[derive(Debug, Deserialize)]
pub struct PackageInput {
    pub bulk_product_id: Uuid,
    pub finished_product_id: Uuid,
    pub bulk_quantity_used: Decimal,
    pub finished_units_produced: Decimal,
    pub packaging_date: NaiveDate,
    #[serde(default)]
    pub packaging_materials: Vec<PackagingMaterialInput>,
}

/// Packaging material line on a receipt
#[derive(Debug, Clone, Serialize)]
pub struct PackagingMaterialUsage {
    pub material_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    /// Stock remaining after the clamped debit
    pub remaining: Decimal,
}

/// Everything a completed packaging run changed
#[derive(Debug, Clone, Serialize)]
pub struct PackagingReceipt {
    pub run: PackagingRun,
    pub materials_used: Vec<PackagingMaterialUsage>,
}

#[derive(Debug, sqlx::FromRow)]
struct PackagingRunRow {
    id: Uuid,
    bulk_product_id: Uuid,
    finished_product_id: Uuid,
    bulk_quantity_used: Decimal,
    finished_units_produced: Decimal,
    packaging_date: NaiveDate,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<PackagingRunRow> for PackagingRun {
    fn from(row: PackagingRunRow) -> Self {
        PackagingRun {
            id: row.id,
            bulk_product_id: row.bulk_product_id,
            finished_product_id: row.finished_product_id,
            bulk_quantity_used: row.bulk_quantity_used,
            finished_units_produced: row.finished_units_produced,
            packaging_date: row.packaging_date,
            created_at: row.created_at,
        }
    }
}

impl PackagingService {
    /// Create a new PackagingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Execute a packaging run atomically
    pub async fn package(&self, input: PackageInput) -> AppResult<PackagingReceipt> {
        validate_positive_quantity(input.bulk_quantity_used)
            .map_err(|e| validation_error("bulk_quantity_used", e))?;
        validate_positive_quantity(input.finished_units_produced)
            .map_err(|e| validation_error("finished_units_produced", e))?;
        for (idx, material) in input.packaging_materials.iter().enumerate() {
            validate_positive_quantity(material.quantity).map_err(|e| {
                validation_error(&format!("packaging_materials[{idx}].quantity"), e)
            })?;
        }

        let mut tx = self.db.begin().await?;

        let bulk_name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM bulk_products WHERE id = $1",
        )
        .bind(input.bulk_product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::InvalidReference(format!("bulk product {}", input.bulk_product_id))
        })?;

        let shelf_life_months = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT shelf_life_months FROM finished_products WHERE id = $1",
        )
        .bind(input.finished_product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::InvalidReference(format!(
                "finished product {}",
                input.finished_product_id
            ))
        })?;

        // Bulk stock blocks the run when short
        let bulk_stock =
            quantity_for_update(&mut tx, InventoryKind::BulkProduct, input.bulk_product_id)
                .await?;
        if bulk_stock < input.bulk_quantity_used {
            return Err(AppError::InsufficientInventory {
                shortages: vec![Shortage {
                    entity_id: input.bulk_product_id,
                    name: bulk_name,
                    kind: InventoryKind::BulkProduct,
                    required: input.bulk_quantity_used,
                    available: bulk_stock,
                }],
            });
        }

        let run = sqlx::query_as::<_, PackagingRunRow>(
            r#"
            INSERT INTO packaging_runs
                (bulk_product_id, finished_product_id, bulk_quantity_used,
                 finished_units_produced, packaging_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, bulk_product_id, finished_product_id, bulk_quantity_used,
                      finished_units_produced, packaging_date, created_at
            "#,
        )
        .bind(input.bulk_product_id)
        .bind(input.finished_product_id)
        .bind(input.bulk_quantity_used)
        .bind(input.finished_units_produced)
        .bind(input.packaging_date)
        .fetch_one(&mut *tx)
        .await?;

        let mut materials_used = Vec::with_capacity(input.packaging_materials.len());
        for material in &input.packaging_materials {
            let name = sqlx::query_scalar::<_, String>(
                "SELECT name FROM raw_materials WHERE id = $1",
            )
            .bind(material.raw_material_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::InvalidReference(format!("raw material {}", material.raw_material_id))
            })?;

            sqlx::query(
                "INSERT INTO packaging_materials_used (packaging_run_id, raw_material_id, quantity) \
                 VALUES ($1, $2, $3)",
            )
            .bind(run.id)
            .bind(material.raw_material_id)
            .bind(material.quantity)
            .execute(&mut *tx)
            .await?;

            let stock = quantity_for_update(
                &mut tx,
                InventoryKind::RawMaterial,
                material.raw_material_id,
            )
            .await?;
            if stock < material.quantity {
                tracing::warn!(
                    material_id = %material.raw_material_id,
                    material = %name,
                    required = %material.quantity,
                    available = %stock,
                    "Packaging material short; stock clamped at zero"
                );
            }

            let remaining = apply_delta_clamped(
                &mut tx,
                InventoryKind::RawMaterial,
                material.raw_material_id,
                -material.quantity,
            )
            .await?;

            materials_used.push(PackagingMaterialUsage {
                material_id: material.raw_material_id,
                name,
                quantity: material.quantity,
                remaining,
            });
        }

        apply_delta(
            &mut tx,
            InventoryKind::BulkProduct,
            input.bulk_product_id,
            -input.bulk_quantity_used,
        )
        .await?;
        credit_finished(
            &mut tx,
            input.finished_product_id,
            input.finished_units_produced,
            derive_expiry_date(input.packaging_date, shelf_life_months),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            run_id = %run.id,
            bulk_product_id = %input.bulk_product_id,
            finished_product_id = %input.finished_product_id,
            bulk_used = %input.bulk_quantity_used,
            units = %input.finished_units_produced,
            "Packaging run completed"
        );

        Ok(PackagingReceipt {
            run: run.into(),
            materials_used,
        })
    }

    /// Get a packaging run with its material audit trail
    pub async fn get_run(&self, id: Uuid) -> AppResult<PackagingRunDetail> {
        let run = sqlx::query_as::<_, PackagingRunRow>(
            "SELECT id, bulk_product_id, finished_product_id, bulk_quantity_used, \
                    finished_units_produced, packaging_date, created_at \
             FROM packaging_runs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Packaging run {id}")))?;

        let materials_used = sqlx::query_as::<_, (Uuid, String, Decimal)>(
            "SELECT u.raw_material_id, m.name, u.quantity \
             FROM packaging_materials_used u \
             JOIN raw_materials m ON m.id = u.raw_material_id \
             WHERE u.packaging_run_id = $1 \
             ORDER BY m.name",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(material_id, name, quantity)| PackagingMaterialLine {
            material_id,
            name,
            quantity,
        })
        .collect();

        Ok(PackagingRunDetail {
            run: run.into(),
            materials_used,
        })
    }

    /// List packaging runs, most recent first
    pub async fn list_runs(&self) -> AppResult<Vec<PackagingRun>> {
        let rows = sqlx::query_as::<_, PackagingRunRow>(
            "SELECT id, bulk_product_id, finished_product_id, bulk_quantity_used, \
                    finished_units_produced, packaging_date, created_at \
             FROM packaging_runs ORDER BY packaging_date DESC, created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PackagingRun::from).collect())
    }
}

/// A packaging run with its material audit trail
#[derive(Debug, Clone, Serialize)]
pub struct PackagingRunDetail {
    #[serde(flatten)]
    pub run: PackagingRun,
    pub materials_used: Vec<PackagingMaterialLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackagingMaterialLine {
    pub material_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
}
