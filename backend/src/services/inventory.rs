//! Inventory ledger service
//!
//! One mutable quantity counter per inventory-tracked entity (raw material,
//! bulk product, finished product), updated by deltas and never derived from
//! history. Rows are upserted keyed by entity id and stamped `updated_at` on
//! every write.
//!
//! Transactions read stock with `SELECT ... FOR UPDATE` so the
//! check-then-act window is serialized per entity row: two concurrent
//! production runs against the same material cannot both pass the
//! availability check on a stale quantity.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use shared::{InventoryKind, InventoryLevel};

/// Table and key column for an inventory kind
fn ledger_table(kind: InventoryKind) -> (&'static str, &'static str) {
    match kind {
        InventoryKind::RawMaterial => ("raw_material_inventory", "material_id"),
        InventoryKind::BulkProduct => ("bulk_product_inventory", "product_id"),
        InventoryKind::FinishedProduct => ("finished_product_inventory", "product_id"),
    }
}

/// Pool-level inventory reads and the admin override
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current stock for one entity; 0 when no ledger row exists yet
    pub async fn quantity(&self, kind: InventoryKind, entity_id: Uuid) -> AppResult<Decimal> {
        let (table, key) = ledger_table(kind);
        let sql = format!("SELECT quantity FROM {table} WHERE {key} = $1");
        let quantity = sqlx::query_scalar::<_, Decimal>(&sql)
            .bind(entity_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(quantity.unwrap_or(Decimal::ZERO))
    }

    /// All ledger rows of one kind. Finished-goods rows carry the expiry
    /// stamped by the latest production or packaging credit.
    pub async fn list_levels(&self, kind: InventoryKind) -> AppResult<Vec<InventoryLevel>> {
        if kind == InventoryKind::FinishedProduct {
            let rows = sqlx::query_as::<_, (Uuid, Decimal, Option<NaiveDate>, DateTime<Utc>)>(
                "SELECT product_id, quantity, expiry_date, updated_at \
                 FROM finished_product_inventory ORDER BY updated_at DESC",
            )
            .fetch_all(&self.db)
            .await?;
            return Ok(rows
                .into_iter()
                .map(|(entity_id, quantity, expiry_date, updated_at)| InventoryLevel {
                    entity_id,
                    kind,
                    quantity,
                    expiry_date,
                    updated_at,
                })
                .collect());
        }

        let (table, key) = ledger_table(kind);
        let sql = format!("SELECT {key}, quantity, updated_at FROM {table} ORDER BY updated_at DESC");
        let rows = sqlx::query_as::<_, (Uuid, Decimal, DateTime<Utc>)>(&sql)
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(entity_id, quantity, updated_at)| InventoryLevel {
                entity_id,
                kind,
                quantity,
                expiry_date: None,
                updated_at,
            })
            .collect())
    }

    /// Administrative override: set a stock quantity directly.
    ///
    /// Bypasses audit tracking and may push stock negative; every use is
    /// logged at warn level.
    pub async fn set_quantity(
        &self,
        kind: InventoryKind,
        entity_id: Uuid,
        quantity: Decimal,
    ) -> AppResult<Decimal> {
        tracing::warn!(
            %entity_id,
            kind = kind.as_str(),
            %quantity,
            "Admin inventory override (bypasses audit trail)"
        );

        let (table, key) = ledger_table(kind);
        let sql = format!(
            "INSERT INTO {table} ({key}, quantity, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT ({key}) DO UPDATE SET quantity = $2, updated_at = NOW() \
             RETURNING quantity"
        );
        let new_quantity = sqlx::query_scalar::<_, Decimal>(&sql)
            .bind(entity_id)
            .bind(quantity)
            .fetch_one(&self.db)
            .await?;
        Ok(new_quantity)
    }
}

/// Read current stock inside a transaction, locking the row until commit.
/// Missing ledger rows read as 0 (they are created on first write).
pub async fn quantity_for_update(
    tx: &mut Transaction<'_, Postgres>,
    kind: InventoryKind,
    entity_id: Uuid,
) -> AppResult<Decimal> {
    let (table, key) = ledger_table(kind);
    let sql = format!("SELECT quantity FROM {table} WHERE {key} = $1 FOR UPDATE");
    let quantity = sqlx::query_scalar::<_, Decimal>(&sql)
        .bind(entity_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(quantity.unwrap_or(Decimal::ZERO))
}

/// Apply a signed delta to an entity's stock inside a transaction,
/// upserting the ledger row. Returns the new quantity.
pub async fn apply_delta(
    tx: &mut Transaction<'_, Postgres>,
    kind: InventoryKind,
    entity_id: Uuid,
    delta: Decimal,
) -> AppResult<Decimal> {
    let (table, key) = ledger_table(kind);
    let sql = format!(
        "INSERT INTO {table} ({key}, quantity, updated_at) VALUES ($1, $2, NOW()) \
         ON CONFLICT ({key}) DO UPDATE SET quantity = {table}.quantity + $2, updated_at = NOW() \
         RETURNING quantity"
    );
    let new_quantity = sqlx::query_scalar::<_, Decimal>(&sql)
        .bind(entity_id)
        .bind(delta)
        .fetch_one(&mut **tx)
        .await?;

    tracing::debug!(
        %entity_id,
        kind = kind.as_str(),
        %delta,
        %new_quantity,
        "Applied inventory delta"
    );

    Ok(new_quantity)
}

/// Credit finished-goods stock inside a transaction, stamping the batch
/// expiry on the ledger row. A credit without an expiry keeps whatever
/// expiry the row already carries.
pub async fn credit_finished(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    units: Decimal,
    expiry_date: Option<NaiveDate>,
) -> AppResult<Decimal> {
    let new_quantity = sqlx::query_scalar::<_, Decimal>(
        "INSERT INTO finished_product_inventory (product_id, quantity, expiry_date, updated_at) \
         VALUES ($1, $2, $3, NOW()) \
         ON CONFLICT (product_id) DO UPDATE \
         SET quantity = finished_product_inventory.quantity + $2, \
             expiry_date = COALESCE($3, finished_product_inventory.expiry_date), \
             updated_at = NOW() \
         RETURNING quantity",
    )
    .bind(product_id)
    .bind(units)
    .bind(expiry_date)
    .fetch_one(&mut **tx)
    .await?;

    tracing::debug!(
        %product_id,
        %units,
        expiry = ?expiry_date,
        %new_quantity,
        "Credited finished-goods stock"
    );

    Ok(new_quantity)
}

/// Like [`apply_delta`] but floors the result at zero. Packaging-material
/// debits use this: those are allowed to run short without blocking the run.
pub async fn apply_delta_clamped(
    tx: &mut Transaction<'_, Postgres>,
    kind: InventoryKind,
    entity_id: Uuid,
    delta: Decimal,
) -> AppResult<Decimal> {
    let (table, key) = ledger_table(kind);
    let sql = format!(
        "INSERT INTO {table} ({key}, quantity, updated_at) VALUES ($1, GREATEST($2, 0), NOW()) \
         ON CONFLICT ({key}) DO UPDATE SET quantity = GREATEST({table}.quantity + $2, 0), updated_at = NOW() \
         RETURNING quantity"
    );
    let new_quantity = sqlx::query_scalar::<_, Decimal>(&sql)
        .bind(entity_id)
        .bind(delta)
        .fetch_one(&mut **tx)
        .await?;
    Ok(new_quantity)
}
