//! Bulk and finished product models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An intermediate, unpackaged formulation output (e.g. a cream base).
/// `formulation_id` is None for bulk products purchased ready-made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkProduct {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub formulation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkProductInventory {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// A saleable, packaged product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedProduct {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub formulation_id: Option<Uuid>,
    /// Saleable units yielded by one batch-unit of formulation output
    pub units_per_batch: Decimal,
    pub shelf_life_months: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedProductInventory {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}
