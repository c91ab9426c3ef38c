//! HTTP handlers for inventory balances and the admin override

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{validation_error, AppResult};
use crate::services::inventory::InventoryService;
use crate::AppState;
use shared::{InventoryKind, InventoryLevel};

fn parse_kind(kind: &str) -> AppResult<InventoryKind> {
    InventoryKind::parse(kind).ok_or_else(|| {
        validation_error(
            "kind",
            "Expected raw_material, bulk_product or finished_product",
        )
    })
}

/// List inventory levels for one entity kind
pub async fn list_levels(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<Vec<InventoryLevel>>> {
    let kind = parse_kind(&kind)?;
    let service = InventoryService::new(state.db);
    let levels = service.list_levels(kind).await?;
    Ok(Json(levels))
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub entity_id: Uuid,
    pub kind: InventoryKind,
    pub quantity: Decimal,
}

/// Current stock for one entity
pub async fn get_quantity(
    State(state): State<AppState>,
    Path((kind, entity_id)): Path<(String, Uuid)>,
) -> AppResult<Json<QuantityResponse>> {
    let kind = parse_kind(&kind)?;
    let service = InventoryService::new(state.db);
    let quantity = service.quantity(kind, entity_id).await?;
    Ok(Json(QuantityResponse {
        entity_id,
        kind,
        quantity,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityInput {
    pub quantity: Decimal,
}

/// Administrative stock override
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((kind, entity_id)): Path<(String, Uuid)>,
    Json(input): Json<SetQuantityInput>,
) -> AppResult<Json<QuantityResponse>> {
    let kind = parse_kind(&kind)?;
    let service = InventoryService::new(state.db);
    let quantity = service.set_quantity(kind, entity_id, input.quantity).await?;
    Ok(Json(QuantityResponse {
        entity_id,
        kind,
        quantity,
    }))
}
