//! Sale models and totals math

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DiscountType;

/// A completed sale of finished products
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    /// None = walk-in customer
    pub customer_id: Option<Uuid>,
    pub sale_date: NaiveDate,
    pub subtotal: Decimal,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub total_amount: Decimal,
    pub is_cash_paid: bool,
    pub created_at: DateTime<Utc>,
}

/// One line of a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub finished_product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Computed sale totals before persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// Compute subtotal and discounted total for a list of (quantity, unit price)
/// lines. The total is clamped at zero so a fixed discount larger than the
/// subtotal never produces a negative sale.
pub fn compute_totals(
    lines: &[(Decimal, Decimal)],
    discount_type: DiscountType,
    discount_value: Decimal,
) -> SaleTotals {
    let subtotal: Decimal = lines.iter().map(|(qty, price)| qty * price).sum();

    let total = match discount_type {
        DiscountType::None => subtotal,
        DiscountType::Percentage => subtotal - subtotal * discount_value / Decimal::from(100),
        DiscountType::Fixed => subtotal - discount_value,
    };

    SaleTotals {
        subtotal,
        total: total.max(Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn subtotal_sums_lines() {
        let totals = compute_totals(
            &[(dec("2"), dec("10")), (dec("3"), dec("5"))],
            DiscountType::None,
            Decimal::ZERO,
        );
        assert_eq!(totals.subtotal, dec("35"));
        assert_eq!(totals.total, dec("35"));
    }

    #[test]
    fn percentage_discount() {
        let totals = compute_totals(&[(dec("1"), dec("200"))], DiscountType::Percentage, dec("25"));
        assert_eq!(totals.total, dec("150"));
    }

    #[test]
    fn fixed_discount_clamps_at_zero() {
        let totals = compute_totals(&[(dec("1"), dec("30"))], DiscountType::Fixed, dec("50"));
        assert_eq!(totals.subtotal, dec("30"));
        assert_eq!(totals.total, Decimal::ZERO);
    }
}
