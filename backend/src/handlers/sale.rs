//! HTTP handlers for sales, payments and the customer ledger

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::sales::{PaymentInput, SaleDetail, SalesService, SellInput};
use crate::AppState;
use shared::{CustomerLedgerEntry, Sale};

/// Record a sale
pub async fn sell(
    State(state): State<AppState>,
    Json(input): Json<SellInput>,
) -> AppResult<Json<SaleDetail>> {
    let service = SalesService::new(state.db);
    let sale = service.sell(input).await?;
    Ok(Json(sale))
}

/// Get a sale with its line items
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SaleDetail>> {
    let service = SalesService::new(state.db);
    let sale = service.get_sale(id).await?;
    Ok(Json(sale))
}

/// List sales
pub async fn list_sales(State(state): State<AppState>) -> AppResult<Json<Vec<Sale>>> {
    let service = SalesService::new(state.db);
    let sales = service.list_sales().await?;
    Ok(Json(sales))
}

/// Record a customer payment
pub async fn record_payment(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<PaymentInput>,
) -> AppResult<Json<CustomerLedgerEntry>> {
    let service = SalesService::new(state.db);
    let entry = service.record_payment(customer_id, input).await?;
    Ok(Json(entry))
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub customer_id: Uuid,
    pub balance: Decimal,
    pub entries: Vec<CustomerLedgerEntry>,
}

/// A customer's ledger with the current balance
pub async fn get_customer_ledger(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<LedgerResponse>> {
    let service = SalesService::new(state.db);
    let entries = service.ledger(customer_id).await?;
    let balance = entries
        .last()
        .map(|e| e.balance)
        .unwrap_or(Decimal::ZERO);
    Ok(Json(LedgerResponse {
        customer_id,
        balance,
        entries,
    }))
}
