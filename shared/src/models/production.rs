//! Production and packaging run models
//!
//! Runs are append-only once created; the materials-used rows are the audit
//! trail for each run and are never mutated.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One execution of a formulation at a requested batch size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRun {
    pub id: Uuid,
    pub formulation_id: Uuid,
    pub batch_size: Decimal,
    pub production_date: NaiveDate,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
    /// Specific finished product credited, when the caller named one
    pub finished_product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Immutable audit row: raw material debited by a production run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionMaterialUsed {
    pub id: Uuid,
    pub production_run_id: Uuid,
    pub raw_material_id: Uuid,
    /// Quantity deducted, in the material's native unit
    pub quantity: Decimal,
}

/// Receipt line item for a finished product credited by a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputCredit {
    pub product_id: Uuid,
    pub product_name: String,
    pub units_credited: Decimal,
    pub batch_size: Decimal,
    pub units_per_batch: Decimal,
}

/// One packaging event: bulk product + packaging materials -> finished units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingRun {
    pub id: Uuid,
    pub bulk_product_id: Uuid,
    pub finished_product_id: Uuid,
    pub bulk_quantity_used: Decimal,
    /// Operator-supplied count, not derived from a yield formula
    pub finished_units_produced: Decimal,
    pub packaging_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Audit row: packaging material consumed by a packaging run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingMaterialUsed {
    pub id: Uuid,
    pub packaging_run_id: Uuid,
    pub raw_material_id: Uuid,
    pub quantity: Decimal,
}

/// Derive a batch/lot number from the run id and production date.
/// Format: YYYYMMDD-XXXXXXXX (first uuid segment, uppercased).
pub fn derive_batch_number(run_id: Uuid, production_date: NaiveDate) -> String {
    let id = run_id.simple().to_string();
    format!(
        "{}-{}",
        production_date.format("%Y%m%d"),
        id[..8].to_ascii_uppercase()
    )
}

/// Derive an expiry date from the production date and the product's shelf
/// life. No shelf life means no expiry.
pub fn derive_expiry_date(
    production_date: NaiveDate,
    shelf_life_months: Option<i32>,
) -> Option<NaiveDate> {
    let months = shelf_life_months?;
    if months <= 0 {
        return None;
    }
    production_date.checked_add_months(Months::new(months as u32))
}

/// Run-level expiry, defined only when the run credits a single finished
/// product (named or discovered). A multi-product run has no one shelf life
/// to stamp, so it carries none.
pub fn run_expiry_date(
    production_date: NaiveDate,
    shelf_lives: &[Option<i32>],
) -> Option<NaiveDate> {
    match shelf_lives {
        [only] => derive_expiry_date(production_date, *only),
        _ => None,
    }
}

/// Saleable units credited for a run: floor(batch_size * units_per_batch)
pub fn finished_units(batch_size: Decimal, units_per_batch: Decimal) -> Decimal {
    (batch_size * units_per_batch).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn batch_number_is_deterministic() {
        let id = Uuid::from_str("a1b2c3d4-0000-0000-0000-000000000000").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(derive_batch_number(id, date), "20260314-A1B2C3D4");
    }

    #[test]
    fn expiry_adds_shelf_life() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(
            derive_expiry_date(date, Some(1)),
            Some(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap())
        );
        assert_eq!(derive_expiry_date(date, None), None);
        assert_eq!(derive_expiry_date(date, Some(0)), None);
    }

    #[test]
    fn run_expiry_only_for_a_single_output() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(
            run_expiry_date(date, &[Some(6)]),
            Some(NaiveDate::from_ymd_opt(2026, 9, 14).unwrap())
        );
        assert_eq!(run_expiry_date(date, &[None]), None);
        assert_eq!(run_expiry_date(date, &[Some(6), Some(12)]), None);
        assert_eq!(run_expiry_date(date, &[]), None);
    }

    #[test]
    fn finished_units_floor() {
        assert_eq!(finished_units(dec("50"), dec("2.5")), dec("125"));
        assert_eq!(finished_units(dec("7"), dec("1.5")), dec("10"));
    }
}
