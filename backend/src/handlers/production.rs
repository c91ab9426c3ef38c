//! HTTP handlers for production runs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::production::{
    ProduceInput, ProductionReceipt, ProductionRunDetail, ProductionService,
};
use crate::AppState;
use shared::ProductionRun;

/// Execute a production run
pub async fn produce(
    State(state): State<AppState>,
    Json(input): Json<ProduceInput>,
) -> AppResult<Json<ProductionReceipt>> {
    let service = ProductionService::new(state.db);
    let receipt = service.produce(input).await?;
    Ok(Json(receipt))
}

/// Get a production run with its audit trail
pub async fn get_production_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductionRunDetail>> {
    let service = ProductionService::new(state.db);
    let run = service.get_run(id).await?;
    Ok(Json(run))
}

/// List production runs
pub async fn list_production_runs(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProductionRun>>> {
    let service = ProductionService::new(state.db);
    let runs = service.list_runs().await?;
    Ok(Json(runs))
}
