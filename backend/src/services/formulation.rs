//! Formulation service: recipe storage and the formulation resolver
//!
//! The resolver expands a formulation into concrete material requirements
//! for an arbitrary batch size. Requirements keep each ingredient's authored
//! unit; transactions convert to native units before touching stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{validation_error, AppError, AppResult};
use shared::{
    ingredient_percentage, scale_ingredients, validate_batch_size, validate_name,
    validate_positive_quantity, validate_unit, Formulation, FormulationIngredient,
    IngredientType, ProducesType, ScalingError,
};

#[derive(Clone)]
pub struct FormulationService {
    db: PgPool,
}

/// Database row for a formulation
#[derive(Debug, sqlx::FromRow)]
struct FormulationRow {
    id: Uuid,
    name: String,
    batch_size: Decimal,
    batch_unit: String,
    produces_type: String,
    produces_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FormulationRow> for Formulation {
    type Error = AppError;

    fn try_from(row: FormulationRow) -> Result<Self, Self::Error> {
        let produces_type = ProducesType::parse(&row.produces_type).ok_or_else(|| {
            AppError::Internal(format!(
                "formulation {} has unknown produces_type '{}'",
                row.id, row.produces_type
            ))
        })?;
        Ok(Formulation {
            id: row.id,
            name: row.name,
            batch_size: row.batch_size,
            batch_unit: row.batch_unit,
            produces_type,
            produces_id: row.produces_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for a formulation ingredient
#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: Uuid,
    formulation_id: Uuid,
    position: i32,
    ingredient_type: String,
    ingredient_id: Uuid,
    quantity: Decimal,
    unit: String,
}

impl TryFrom<IngredientRow> for FormulationIngredient {
    type Error = AppError;

    fn try_from(row: IngredientRow) -> Result<Self, Self::Error> {
        let ingredient_type = IngredientType::parse(&row.ingredient_type).ok_or_else(|| {
            AppError::Internal(format!(
                "ingredient {} has unknown type '{}'",
                row.id, row.ingredient_type
            ))
        })?;
        Ok(FormulationIngredient {
            id: row.id,
            formulation_id: row.formulation_id,
            position: row.position,
            ingredient_type,
            ingredient_id: row.ingredient_id,
            quantity: row.quantity,
            unit: row.unit,
        })
    }
}

/// Input for one ingredient line
#[derive(Debug, Deserialize)]
pub struct IngredientInput {
    pub ingredient_type: IngredientType,
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
}

/// Input for creating a formulation
#[derive(Debug, Deserialize)]
pub struct CreateFormulationInput {
    pub name: String,
    pub batch_size: Decimal,
    pub batch_unit: String,
    pub produces_type: ProducesType,
    pub produces_id: Uuid,
    /// Ordered ingredient list; may be empty while a recipe is drafted,
    /// resolution will fail until it has lines
    pub ingredients: Vec<IngredientInput>,
}

/// A formulation with its ordered ingredient list and the derived
/// percentage view for the editing UI
#[derive(Debug, Clone, Serialize)]
pub struct FormulationDetail {
    #[serde(flatten)]
    pub formulation: Formulation,
    pub ingredients: Vec<IngredientView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientView {
    #[serde(flatten)]
    pub ingredient: FormulationIngredient,
    pub name: String,
    /// Derived, presentation-only: quantity as percent of the batch size
    pub percentage: Decimal,
}

/// A scaled material requirement enriched with catalog data
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedIngredient {
    pub ingredient_type: IngredientType,
    pub ingredient_id: Uuid,
    pub name: String,
    /// Required quantity in the ingredient's authored unit
    pub quantity: Decimal,
    pub unit: String,
    /// The referenced entity's native unit
    pub native_unit: String,
}

impl FormulationService {
    /// Create a new FormulationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a formulation with its ordered ingredient rows
    pub async fn create_formulation(
        &self,
        input: CreateFormulationInput,
    ) -> AppResult<FormulationDetail> {
        validate_name(&input.name).map_err(|e| validation_error("name", e))?;
        validate_batch_size(input.batch_size).map_err(|e| validation_error("batch_size", e))?;
        validate_unit(&input.batch_unit).map_err(|e| validation_error("batch_unit", e))?;

        // The produced entity must exist and match the declared type
        self.require_produces(input.produces_type, input.produces_id)
            .await?;

        for (idx, ingredient) in input.ingredients.iter().enumerate() {
            validate_positive_quantity(ingredient.quantity)
                .map_err(|e| validation_error(&format!("ingredients[{idx}].quantity"), e))?;
            validate_unit(&ingredient.unit)
                .map_err(|e| validation_error(&format!("ingredients[{idx}].unit"), e))?;
            self.require_ingredient(ingredient.ingredient_type, ingredient.ingredient_id)
                .await?;
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, FormulationRow>(
            r#"
            INSERT INTO formulations (name, batch_size, batch_unit, produces_type, produces_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, batch_size, batch_unit, produces_type, produces_id, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.batch_size)
        .bind(input.batch_unit.trim())
        .bind(input.produces_type.as_str())
        .bind(input.produces_id)
        .fetch_one(&mut *tx)
        .await?;

        for (position, ingredient) in input.ingredients.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO formulation_ingredients
                    (formulation_id, position, ingredient_type, ingredient_id, quantity, unit)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.id)
            .bind(position as i32)
            .bind(ingredient.ingredient_type.as_str())
            .bind(ingredient.ingredient_id)
            .bind(ingredient.quantity)
            .bind(ingredient.unit.trim())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_formulation(row.id).await
    }

    /// Get a formulation with its ingredient list
    pub async fn get_formulation(&self, id: Uuid) -> AppResult<FormulationDetail> {
        let formulation = self.load_formulation(id).await?;
        let ingredients = self.load_ingredients(id).await?;

        let mut views = Vec::with_capacity(ingredients.len());
        for ingredient in ingredients {
            let name = self
                .ingredient_name_and_unit(ingredient.ingredient_type, ingredient.ingredient_id)
                .await?
                .0;
            let percentage = ingredient_percentage(
                ingredient.quantity,
                &ingredient.unit,
                formulation.batch_size,
                &formulation.batch_unit,
            );
            views.push(IngredientView {
                ingredient,
                name,
                percentage,
            });
        }

        Ok(FormulationDetail {
            formulation,
            ingredients: views,
        })
    }

    /// List all formulations (without ingredient lists)
    pub async fn list_formulations(&self) -> AppResult<Vec<Formulation>> {
        let rows = sqlx::query_as::<_, FormulationRow>(
            "SELECT id, name, batch_size, batch_unit, produces_type, produces_id, created_at, updated_at \
             FROM formulations ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Formulation::try_from).collect()
    }

    /// Expand a formulation into scaled material requirements for a target
    /// batch size.
    pub async fn resolve(
        &self,
        formulation_id: Uuid,
        target_batch_size: Decimal,
    ) -> AppResult<Vec<ResolvedIngredient>> {
        let formulation = self.load_formulation(formulation_id).await?;
        let ingredients = self.load_ingredients(formulation_id).await?;

        let requirements =
            scale_ingredients(formulation.batch_size, &ingredients, target_batch_size).map_err(
                |e| match e {
                    ScalingError::EmptyFormulation => AppError::EmptyFormulation(formulation_id),
                    ScalingError::NonPositiveBatchSize => {
                        validation_error("batch_size", "Formulation batch size must be positive")
                    }
                    ScalingError::NonPositiveTargetSize => {
                        validation_error("target_batch_size", "Target batch size must be positive")
                    }
                },
            )?;

        let mut resolved = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let (name, native_unit) = self
                .ingredient_name_and_unit(requirement.ingredient_type, requirement.ingredient_id)
                .await?;
            resolved.push(ResolvedIngredient {
                ingredient_type: requirement.ingredient_type,
                ingredient_id: requirement.ingredient_id,
                name,
                quantity: requirement.quantity,
                unit: requirement.unit,
                native_unit,
            });
        }

        Ok(resolved)
    }

    /// Load the bare formulation row
    pub async fn load_formulation(&self, id: Uuid) -> AppResult<Formulation> {
        let row = sqlx::query_as::<_, FormulationRow>(
            "SELECT id, name, batch_size, batch_unit, produces_type, produces_id, created_at, updated_at \
             FROM formulations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::InvalidReference(format!("formulation {id}")))?;

        row.try_into()
    }

    /// Load a formulation's ingredient rows in authored order
    pub async fn load_ingredients(
        &self,
        formulation_id: Uuid,
    ) -> AppResult<Vec<FormulationIngredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(
            "SELECT id, formulation_id, position, ingredient_type, ingredient_id, quantity, unit \
             FROM formulation_ingredients WHERE formulation_id = $1 ORDER BY position",
        )
        .bind(formulation_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(FormulationIngredient::try_from).collect()
    }

    async fn ingredient_name_and_unit(
        &self,
        ingredient_type: IngredientType,
        ingredient_id: Uuid,
    ) -> AppResult<(String, String)> {
        let (sql, what) = match ingredient_type {
            IngredientType::RawMaterial => (
                "SELECT name, unit FROM raw_materials WHERE id = $1",
                "raw material",
            ),
            IngredientType::BulkProduct => (
                "SELECT name, unit FROM bulk_products WHERE id = $1",
                "bulk product",
            ),
        };

        sqlx::query_as::<_, (String, String)>(sql)
            .bind(ingredient_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::InvalidReference(format!("{what} {ingredient_id}")))
    }

    async fn require_ingredient(
        &self,
        ingredient_type: IngredientType,
        ingredient_id: Uuid,
    ) -> AppResult<()> {
        self.ingredient_name_and_unit(ingredient_type, ingredient_id)
            .await
            .map(|_| ())
    }

    async fn require_produces(
        &self,
        produces_type: ProducesType,
        produces_id: Uuid,
    ) -> AppResult<()> {
        let (sql, what) = match produces_type {
            ProducesType::Bulk => (
                "SELECT EXISTS(SELECT 1 FROM bulk_products WHERE id = $1)",
                "bulk product",
            ),
            ProducesType::Finished => (
                "SELECT EXISTS(SELECT 1 FROM finished_products WHERE id = $1)",
                "finished product",
            ),
        };

        let exists = sqlx::query_scalar::<_, bool>(sql)
            .bind(produces_id)
            .fetch_one(&self.db)
            .await?;

        if !exists {
            return Err(AppError::InvalidReference(format!("{what} {produces_id}")));
        }
        Ok(())
    }
}
