//! Sales service: finished-goods sales and the customer running ledger
//!
//! A sale checks every line against finished-goods stock and rejects the
//! whole sale when any line is short; duplicate product lines are aggregated
//! for the check so two lines cannot each pass against the same stock.
//! Credit sales append to the customer's ledger with the running balance
//! fixed at insert time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{validation_error, AppError, AppResult};
use crate::services::inventory::{apply_delta, quantity_for_update};
use shared::{
    compute_totals, next_balance, validate_discount, validate_non_negative_amount,
    validate_positive_quantity, CustomerLedgerEntry, DiscountType, InventoryKind,
    LedgerEntryType, Sale, SaleItem, Shortage,
};

#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

/// One line of a sale request
#[derive(Debug, Deserialize)]
pub struct SaleLineInput {
    pub finished_product_id: Uuid,
    pub quantity: Decimal,
    /// Overrides the product's list price when given
    pub unit_price: Option<Decimal>,
}

/// Input for recording a sale
#[derive(Debug, Deserialize)]
pub struct SellInput {
    /// None = walk-in customer; walk-ins cannot buy on credit
    pub customer_id: Option<Uuid>,
    pub sale_date: NaiveDate,
    pub items: Vec<SaleLineInput>,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: Decimal,
    pub is_cash_paid: bool,
}

/// Input for recording a customer payment
#[derive(Debug, Deserialize)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub entry_date: NaiveDate,
}

/// A sale with its line items
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    customer_id: Option<Uuid>,
    sale_date: NaiveDate,
    subtotal: Decimal,
    discount_type: String,
    discount_value: Decimal,
    total_amount: Decimal,
    is_cash_paid: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let discount_type = DiscountType::parse(&row.discount_type).ok_or_else(|| {
            AppError::Internal(format!(
                "sale {} has unknown discount_type '{}'",
                row.id, row.discount_type
            ))
        })?;
        Ok(Sale {
            id: row.id,
            customer_id: row.customer_id,
            sale_date: row.sale_date,
            subtotal: row.subtotal,
            discount_type,
            discount_value: row.discount_value,
            total_amount: row.total_amount,
            is_cash_paid: row.is_cash_paid,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    customer_id: Uuid,
    position: i64,
    entry_type: String,
    amount: Decimal,
    balance: Decimal,
    entry_date: NaiveDate,
    sale_id: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<LedgerRow> for CustomerLedgerEntry {
    type Error = AppError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let entry_type = LedgerEntryType::parse(&row.entry_type).ok_or_else(|| {
            AppError::Internal(format!(
                "ledger entry {} has unknown type '{}'",
                row.id, row.entry_type
            ))
        })?;
        Ok(CustomerLedgerEntry {
            id: row.id,
            customer_id: row.customer_id,
            position: row.position,
            entry_type,
            amount: row.amount,
            balance: row.balance,
            entry_date: row.entry_date,
            sale_id: row.sale_id,
            created_at: row.created_at,
        })
    }
}

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a sale atomically: stock check, sale rows, stock debits and
    /// the credit ledger entry all commit or roll back together.
    pub async fn sell(&self, input: SellInput) -> AppResult<SaleDetail> {
        if input.items.is_empty() {
            return Err(validation_error("items", "A sale needs at least one item"));
        }
        for (idx, item) in input.items.iter().enumerate() {
            validate_positive_quantity(item.quantity)
                .map_err(|e| validation_error(&format!("items[{idx}].quantity"), e))?;
            if let Some(price) = item.unit_price {
                validate_non_negative_amount(price)
                    .map_err(|e| validation_error(&format!("items[{idx}].unit_price"), e))?;
            }
        }
        validate_discount(input.discount_type, input.discount_value)
            .map_err(|e| validation_error("discount_value", e))?;
        if input.customer_id.is_none() && !input.is_cash_paid {
            return Err(validation_error(
                "is_cash_paid",
                "A walk-in sale cannot be on credit",
            ));
        }

        let mut tx = self.db.begin().await?;

        if let Some(customer_id) = input.customer_id {
            // Locked for the duration so the ledger append below reads the
            // true last balance
            lock_customer(&mut tx, customer_id).await?;
        }

        // Price each line, defaulting to the product's list price
        let mut lines: Vec<(Uuid, String, Decimal, Decimal)> = Vec::new();
        for item in &input.items {
            let (name, list_price) = sqlx::query_as::<_, (String, Decimal)>(
                "SELECT name, price FROM finished_products WHERE id = $1",
            )
            .bind(item.finished_product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::InvalidReference(format!(
                    "finished product {}",
                    item.finished_product_id
                ))
            })?;
            let unit_price = item.unit_price.unwrap_or(list_price);
            lines.push((item.finished_product_id, name, item.quantity, unit_price));
        }

        // Aggregate duplicate product lines so the availability check sees
        // the combined demand
        let mut required: HashMap<Uuid, (String, Decimal)> = HashMap::new();
        for (product_id, name, quantity, _) in &lines {
            required
                .entry(*product_id)
                .and_modify(|(_, total)| *total += *quantity)
                .or_insert_with(|| (name.clone(), *quantity));
        }

        let mut product_ids: Vec<Uuid> = required.keys().copied().collect();
        product_ids.sort();

        let mut shortages = Vec::new();
        for product_id in &product_ids {
            let stock =
                quantity_for_update(&mut tx, InventoryKind::FinishedProduct, *product_id).await?;
            let (name, needed) = &required[product_id];
            if stock < *needed {
                shortages.push(Shortage {
                    entity_id: *product_id,
                    name: name.clone(),
                    kind: InventoryKind::FinishedProduct,
                    required: *needed,
                    available: stock,
                });
            }
        }
        if !shortages.is_empty() {
            return Err(AppError::InsufficientInventory { shortages });
        }

        let totals = compute_totals(
            &lines
                .iter()
                .map(|(_, _, qty, price)| (*qty, *price))
                .collect::<Vec<_>>(),
            input.discount_type,
            input.discount_value,
        );

        let sale_row = sqlx::query_as::<_, SaleRow>(
            r#"
            INSERT INTO sales
                (customer_id, sale_date, subtotal, discount_type, discount_value,
                 total_amount, is_cash_paid)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, customer_id, sale_date, subtotal, discount_type, discount_value,
                      total_amount, is_cash_paid, created_at
            "#,
        )
        .bind(input.customer_id)
        .bind(input.sale_date)
        .bind(totals.subtotal)
        .bind(input.discount_type.as_str())
        .bind(input.discount_value)
        .bind(totals.total)
        .bind(input.is_cash_paid)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (product_id, _, quantity, unit_price) in &lines {
            let item = sqlx::query_as::<_, (Uuid,)>(
                r#"
                INSERT INTO sale_items (sale_id, finished_product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(sale_row.id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_price)
            .bind(*quantity * *unit_price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(SaleItem {
                id: item.0,
                sale_id: sale_row.id,
                finished_product_id: *product_id,
                quantity: *quantity,
                unit_price: *unit_price,
                subtotal: *quantity * *unit_price,
            });
        }

        for product_id in &product_ids {
            let (_, needed) = &required[product_id];
            apply_delta(&mut tx, InventoryKind::FinishedProduct, *product_id, -*needed).await?;
        }

        // Credit sales go on the customer's account
        if let (Some(customer_id), false) = (input.customer_id, input.is_cash_paid) {
            append_ledger_entry(
                &mut tx,
                customer_id,
                LedgerEntryType::Sale,
                totals.total,
                input.sale_date,
                Some(sale_row.id),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale_row.id,
            customer_id = ?input.customer_id,
            total = %totals.total,
            items = items.len(),
            cash = input.is_cash_paid,
            "Sale recorded"
        );

        Ok(SaleDetail {
            sale: sale_row.try_into()?,
            items,
        })
    }

    /// Record a payment against a customer's account
    pub async fn record_payment(
        &self,
        customer_id: Uuid,
        input: PaymentInput,
    ) -> AppResult<CustomerLedgerEntry> {
        validate_positive_quantity(input.amount)
            .map_err(|e| validation_error("amount", e))?;

        let mut tx = self.db.begin().await?;
        lock_customer(&mut tx, customer_id).await?;
        let entry = append_ledger_entry(
            &mut tx,
            customer_id,
            LedgerEntryType::Payment,
            input.amount,
            input.entry_date,
            None,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            %customer_id,
            amount = %input.amount,
            balance = %entry.balance,
            "Customer payment recorded"
        );

        Ok(entry)
    }

    /// A customer's full ledger, oldest first
    pub async fn ledger(&self, customer_id: Uuid) -> AppResult<Vec<CustomerLedgerEntry>> {
        self.require_customer(customer_id).await?;
        let rows = sqlx::query_as::<_, LedgerRow>(
            "SELECT id, customer_id, position, entry_type, amount, balance, entry_date, sale_id, \
                    created_at \
             FROM customer_ledger WHERE customer_id = $1 ORDER BY position",
        )
        .bind(customer_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(CustomerLedgerEntry::try_from).collect()
    }

    /// Get a sale with its line items
    pub async fn get_sale(&self, id: Uuid) -> AppResult<SaleDetail> {
        let row = sqlx::query_as::<_, SaleRow>(
            "SELECT id, customer_id, sale_date, subtotal, discount_type, discount_value, \
                    total_amount, is_cash_paid, created_at \
             FROM sales WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sale {id}")))?;

        let items = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Decimal, Decimal, Decimal)>(
            "SELECT id, sale_id, finished_product_id, quantity, unit_price, subtotal \
             FROM sale_items WHERE sale_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(
            |(id, sale_id, finished_product_id, quantity, unit_price, subtotal)| SaleItem {
                id,
                sale_id,
                finished_product_id,
                quantity,
                unit_price,
                subtotal,
            },
        )
        .collect();

        Ok(SaleDetail {
            sale: row.try_into()?,
            items,
        })
    }

    /// List sales, most recent first
    pub async fn list_sales(&self) -> AppResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            "SELECT id, customer_id, sale_date, subtotal, discount_type, discount_value, \
                    total_amount, is_cash_paid, created_at \
             FROM sales ORDER BY sale_date DESC, created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }

    async fn require_customer(&self, customer_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
                .bind(customer_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::NotFound(format!(
                "Customer {customer_id}"
            )));
        }
        Ok(())
    }
}

/// Lock a customer row for the transaction so concurrent ledger appends
/// serialize per customer
async fn lock_customer(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: Uuid,
) -> AppResult<()> {
    let locked =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM customers WHERE id = $1 FOR UPDATE")
            .bind(customer_id)
            .fetch_optional(&mut **tx)
            .await?;
    if locked.is_none() {
        return Err(AppError::InvalidReference(format!("customer {customer_id}")));
    }
    Ok(())
}

/// Append a ledger entry with the running balance fixed from the previous
/// entry. Caller must hold the customer row lock.
async fn append_ledger_entry(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: Uuid,
    entry_type: LedgerEntryType,
    amount: Decimal,
    entry_date: NaiveDate,
    sale_id: Option<Uuid>,
) -> AppResult<CustomerLedgerEntry> {
    // `position` is assigned at insert and the customer lock serializes
    // appends, so the highest position is always the true latest entry.
    // Timestamps are not usable here: created_at defaults to the insert's
    // transaction start time, which can interleave across writers.
    let previous = sqlx::query_scalar::<_, Decimal>(
        "SELECT balance FROM customer_ledger WHERE customer_id = $1 \
         ORDER BY position DESC LIMIT 1",
    )
    .bind(customer_id)
    .fetch_optional(&mut **tx)
    .await?
    .unwrap_or(Decimal::ZERO);

    let balance = next_balance(previous, entry_type, amount);

    let row = sqlx::query_as::<_, LedgerRow>(
        r#"
        INSERT INTO customer_ledger (customer_id, entry_type, amount, balance, entry_date, sale_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, customer_id, position, entry_type, amount, balance, entry_date, sale_id,
                  created_at
        "#,
    )
    .bind(customer_id)
    .bind(entry_type.as_str())
    .bind(amount)
    .bind(balance)
    .bind(entry_date)
    .bind(sale_id)
    .fetch_one(&mut **tx)
    .await?;

    row.try_into()
}
