//! Raw material models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchased input tracked by the raw-material ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterial {
    pub id: Uuid,
    pub name: String,
    /// Native unit of this material (free text; "kg", "l", "pcs", ...)
    pub unit: String,
    /// Price per native unit from the most recent purchase; costing uses this
    pub last_purchase_cost: Decimal,
    pub average_purchase_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Current stock counter for a raw material (mutable, updated by deltas)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterialInventory {
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub updated_at: DateTime<Utc>,
}
