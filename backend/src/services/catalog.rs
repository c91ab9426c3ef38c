//! Catalog service: raw materials, bulk and finished products, customers
//!
//! The thin admin surface the transaction engine reads from. Creating an
//! inventory-tracked entity also creates its zero-quantity ledger row in the
//! same transaction, so every entity always has exactly one inventory row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{validation_error, AppError, AppResult};
use shared::{
    validate_name, validate_non_negative_amount, validate_positive_quantity, validate_unit,
    BulkProduct, Customer, FinishedProduct, RawMaterial,
};

#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Database row for a raw material
#[derive(Debug, sqlx::FromRow)]
struct RawMaterialRow {
    id: Uuid,
    name: String,
    unit: String,
    last_purchase_cost: Decimal,
    average_purchase_cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RawMaterialRow> for RawMaterial {
    fn from(row: RawMaterialRow) -> Self {
        RawMaterial {
            id: row.id,
            name: row.name,
            unit: row.unit,
            last_purchase_cost: row.last_purchase_cost,
            average_purchase_cost: row.average_purchase_cost,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BulkProductRow {
    id: Uuid,
    name: String,
    unit: String,
    formulation_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BulkProductRow> for BulkProduct {
    fn from(row: BulkProductRow) -> Self {
        BulkProduct {
            id: row.id,
            name: row.name,
            unit: row.unit,
            formulation_id: row.formulation_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FinishedProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    formulation_id: Option<Uuid>,
    units_per_batch: Decimal,
    shelf_life_months: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FinishedProductRow> for FinishedProduct {
    fn from(row: FinishedProductRow) -> Self {
        FinishedProduct {
            id: row.id,
            name: row.name,
            price: row.price,
            formulation_id: row.formulation_id,
            units_per_batch: row.units_per_batch,
            shelf_life_months: row.shelf_life_months,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a raw material
#[derive(Debug, Deserialize)]
pub struct CreateRawMaterialInput {
    pub name: String,
    pub unit: String,
    pub last_purchase_cost: Decimal,
    pub average_purchase_cost: Option<Decimal>,
}

/// Input for creating a bulk product
#[derive(Debug, Deserialize)]
pub struct CreateBulkProductInput {
    pub name: String,
    pub unit: String,
    /// Source formulation; None for bulk products purchased ready-made
    pub formulation_id: Option<Uuid>,
}

/// Input for creating a finished product
#[derive(Debug, Deserialize)]
pub struct CreateFinishedProductInput {
    pub name: String,
    pub price: Decimal,
    pub formulation_id: Option<Uuid>,
    pub units_per_batch: Decimal,
    pub shelf_life_months: Option<i32>,
}

/// Input for creating a customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub phone: Option<String>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a raw material with its zero-quantity inventory row
    pub async fn create_raw_material(
        &self,
        input: CreateRawMaterialInput,
    ) -> AppResult<RawMaterial> {
        validate_name(&input.name).map_err(|e| validation_error("name", e))?;
        validate_unit(&input.unit).map_err(|e| validation_error("unit", e))?;
        validate_non_negative_amount(input.last_purchase_cost)
            .map_err(|e| validation_error("last_purchase_cost", e))?;

        let average = input.average_purchase_cost.unwrap_or(input.last_purchase_cost);
        validate_non_negative_amount(average)
            .map_err(|e| validation_error("average_purchase_cost", e))?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, RawMaterialRow>(
            r#"
            INSERT INTO raw_materials (name, unit, last_purchase_cost, average_purchase_cost)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, unit, last_purchase_cost, average_purchase_cost, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.unit.trim())
        .bind(input.last_purchase_cost)
        .bind(average)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO raw_material_inventory (material_id, quantity, updated_at) VALUES ($1, 0, NOW())",
        )
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Get a raw material by ID
    pub async fn get_raw_material(&self, id: Uuid) -> AppResult<RawMaterial> {
        let row = sqlx::query_as::<_, RawMaterialRow>(
            "SELECT id, name, unit, last_purchase_cost, average_purchase_cost, created_at, updated_at \
             FROM raw_materials WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Raw material".to_string()))?;

        Ok(row.into())
    }

    /// List all raw materials
    pub async fn list_raw_materials(&self) -> AppResult<Vec<RawMaterial>> {
        let rows = sqlx::query_as::<_, RawMaterialRow>(
            "SELECT id, name, unit, last_purchase_cost, average_purchase_cost, created_at, updated_at \
             FROM raw_materials ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Create a bulk product with its zero-quantity inventory row
    pub async fn create_bulk_product(
        &self,
        input: CreateBulkProductInput,
    ) -> AppResult<BulkProduct> {
        validate_name(&input.name).map_err(|e| validation_error("name", e))?;
        validate_unit(&input.unit).map_err(|e| validation_error("unit", e))?;

        if let Some(formulation_id) = input.formulation_id {
            self.require_formulation(formulation_id).await?;
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, BulkProductRow>(
            r#"
            INSERT INTO bulk_products (name, unit, formulation_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, unit, formulation_id, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.unit.trim())
        .bind(input.formulation_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO bulk_product_inventory (product_id, quantity, updated_at) VALUES ($1, 0, NOW())",
        )
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Get a bulk product by ID
    pub async fn get_bulk_product(&self, id: Uuid) -> AppResult<BulkProduct> {
        let row = sqlx::query_as::<_, BulkProductRow>(
            "SELECT id, name, unit, formulation_id, created_at, updated_at FROM bulk_products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bulk product".to_string()))?;

        Ok(row.into())
    }

    /// List all bulk products
    pub async fn list_bulk_products(&self) -> AppResult<Vec<BulkProduct>> {
        let rows = sqlx::query_as::<_, BulkProductRow>(
            "SELECT id, name, unit, formulation_id, created_at, updated_at FROM bulk_products ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Create a finished product with its zero-quantity inventory row
    pub async fn create_finished_product(
        &self,
        input: CreateFinishedProductInput,
    ) -> AppResult<FinishedProduct> {
        validate_name(&input.name).map_err(|e| validation_error("name", e))?;
        validate_non_negative_amount(input.price).map_err(|e| validation_error("price", e))?;
        validate_positive_quantity(input.units_per_batch)
            .map_err(|e| validation_error("units_per_batch", e))?;

        if let Some(formulation_id) = input.formulation_id {
            self.require_formulation(formulation_id).await?;
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, FinishedProductRow>(
            r#"
            INSERT INTO finished_products (name, price, formulation_id, units_per_batch, shelf_life_months)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, price, formulation_id, units_per_batch, shelf_life_months, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.price)
        .bind(input.formulation_id)
        .bind(input.units_per_batch)
        .bind(input.shelf_life_months)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO finished_product_inventory (product_id, quantity, updated_at) VALUES ($1, 0, NOW())",
        )
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Get a finished product by ID
    pub async fn get_finished_product(&self, id: Uuid) -> AppResult<FinishedProduct> {
        let row = sqlx::query_as::<_, FinishedProductRow>(
            "SELECT id, name, price, formulation_id, units_per_batch, shelf_life_months, created_at, updated_at \
             FROM finished_products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Finished product".to_string()))?;

        Ok(row.into())
    }

    /// List all finished products
    pub async fn list_finished_products(&self) -> AppResult<Vec<FinishedProduct>> {
        let rows = sqlx::query_as::<_, FinishedProductRow>(
            "SELECT id, name, price, formulation_id, units_per_batch, shelf_life_months, created_at, updated_at \
             FROM finished_products ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Create a customer
    pub async fn create_customer(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        validate_name(&input.name).map_err(|e| validation_error("name", e))?;

        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            INSERT INTO customers (name, phone)
            VALUES ($1, $2)
            RETURNING id, name, phone, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, id: Uuid) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, phone, created_at, updated_at FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// List all customers
    pub async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, phone, created_at, updated_at FROM customers ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn require_formulation(&self, formulation_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM formulations WHERE id = $1)")
                .bind(formulation_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::InvalidReference(format!(
                "formulation {formulation_id}"
            )));
        }
        Ok(())
    }
}
