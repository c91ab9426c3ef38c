//! Customer and customer-ledger models
//!
//! The ledger is append-only; each entry's `balance` is the running total
//! fixed at insert time from the previous entry, never recomputed on read.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::LedgerEntryType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of a customer's running account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerLedgerEntry {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Append order of the ledger. `created_at` is the insert's transaction
    /// start time, which can interleave across concurrent writers, so all
    /// ordering goes through this column.
    pub position: i64,
    pub entry_type: LedgerEntryType,
    pub amount: Decimal,
    /// Running balance after this entry (prefix sum in insertion order)
    pub balance: Decimal,
    pub entry_date: NaiveDate,
    pub sale_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Balance after appending an entry: sales add to the outstanding balance,
/// payments subtract. No floor — an overpayment is a valid credit balance.
pub fn next_balance(previous: Decimal, entry_type: LedgerEntryType, amount: Decimal) -> Decimal {
    match entry_type {
        LedgerEntryType::Sale => previous + amount,
        LedgerEntryType::Payment => previous - amount,
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
    fn sales_add_payments_subtract() {
        let b = next_balance(Decimal::ZERO, LedgerEntryType::Sale, dec("100"));
        let b = next_balance(b, LedgerEntryType::Payment, dec("40"));
        assert_eq!(b, dec("60"));
    }

    #[test]
    fn overpayment_goes_negative() {
        let b = next_balance(dec("30"), LedgerEntryType::Payment, dec("50"));
        assert_eq!(b, dec("-20"));
    }
}
