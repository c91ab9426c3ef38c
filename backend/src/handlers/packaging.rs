//! HTTP handlers for packaging runs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::packaging::{
    PackageInput, PackagingReceipt, PackagingRunDetail, PackagingService,
};
use crate::AppState;
use shared::PackagingRun;

/// Execute a packaging run
pub async fn package(
    State(state): State<AppState>,
    Json(input): Json<PackageInput>,
) -> AppResult<Json<PackagingReceipt>> {
    let service = PackagingService::new(state.db);
    let receipt = service.package(input).await?;
    Ok(Json(receipt))
}

/// Get a packaging run with its audit trail
pub async fn get_packaging_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PackagingRunDetail>> {
    let service = PackagingService::new(state.db);
    let run = service.get_run(id).await?;
    Ok(Json(run))
}

/// List packaging runs
pub async fn list_packaging_runs(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PackagingRun>>> {
    let service = PackagingService::new(state.db);
    let runs = service.list_runs().await?;
    Ok(Json(runs))
}
