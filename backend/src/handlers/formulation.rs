//! HTTP handlers for formulations, resolution and costing

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::costing::CostingService;
use crate::services::formulation::{
    CreateFormulationInput, FormulationDetail, FormulationService, ResolvedIngredient,
};
use crate::AppState;
use shared::{Formulation, FormulationCost};

/// Create a formulation with its ingredient list
pub async fn create_formulation(
    State(state): State<AppState>,
    Json(input): Json<CreateFormulationInput>,
) -> AppResult<Json<FormulationDetail>> {
    let service = FormulationService::new(state.db);
    let formulation = service.create_formulation(input).await?;
    Ok(Json(formulation))
}

/// Get a formulation with its ingredient list
pub async fn get_formulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FormulationDetail>> {
    let service = FormulationService::new(state.db);
    let formulation = service.get_formulation(id).await?;
    Ok(Json(formulation))
}

/// List formulations
pub async fn list_formulations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Formulation>>> {
    let service = FormulationService::new(state.db);
    let formulations = service.list_formulations().await?;
    Ok(Json(formulations))
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub batch_size: Decimal,
}

/// Resolve a formulation into scaled material requirements
pub async fn resolve_formulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ResolveParams>,
) -> AppResult<Json<Vec<ResolvedIngredient>>> {
    let service = FormulationService::new(state.db);
    let resolved = service.resolve(id, params.batch_size).await?;
    Ok(Json(resolved))
}

/// Cost a formulation at its native batch size
pub async fn cost_formulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FormulationCost>> {
    let service = CostingService::new(
        state.db,
        state.config.engine.max_cost_recursion_depth,
    );
    let cost = service.cost_formulation(id).await?;
    Ok(Json(cost))
}
