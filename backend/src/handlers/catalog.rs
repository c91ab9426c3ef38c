//! HTTP handlers for the catalog: materials, products and customers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::catalog::{
    CatalogService, CreateBulkProductInput, CreateCustomerInput, CreateFinishedProductInput,
    CreateRawMaterialInput,
};
use crate::AppState;
use shared::{BulkProduct, Customer, FinishedProduct, RawMaterial};

/// Create a raw material (with its zero-quantity inventory row)
pub async fn create_raw_material(
    State(state): State<AppState>,
    Json(input): Json<CreateRawMaterialInput>,
) -> AppResult<Json<RawMaterial>> {
    let service = CatalogService::new(state.db);
    let material = service.create_raw_material(input).await?;
    Ok(Json(material))
}

/// Get a raw material
pub async fn get_raw_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RawMaterial>> {
    let service = CatalogService::new(state.db);
    let material = service.get_raw_material(id).await?;
    Ok(Json(material))
}

/// List raw materials
pub async fn list_raw_materials(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RawMaterial>>> {
    let service = CatalogService::new(state.db);
    let materials = service.list_raw_materials().await?;
    Ok(Json(materials))
}

/// Create a bulk product
pub async fn create_bulk_product(
    State(state): State<AppState>,
    Json(input): Json<CreateBulkProductInput>,
) -> AppResult<Json<BulkProduct>> {
    let service = CatalogService::new(state.db);
    let product = service.create_bulk_product(input).await?;
    Ok(Json(product))
}

/// Get a bulk product
pub async fn get_bulk_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BulkProduct>> {
    let service = CatalogService::new(state.db);
    let product = service.get_bulk_product(id).await?;
    Ok(Json(product))
}

/// List bulk products
pub async fn list_bulk_products(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BulkProduct>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_bulk_products().await?;
    Ok(Json(products))
}

/// Create a finished product
pub async fn create_finished_product(
    State(state): State<AppState>,
    Json(input): Json<CreateFinishedProductInput>,
) -> AppResult<Json<FinishedProduct>> {
    let service = CatalogService::new(state.db);
    let product = service.create_finished_product(input).await?;
    Ok(Json(product))
}

/// Get a finished product
pub async fn get_finished_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FinishedProduct>> {
    let service = CatalogService::new(state.db);
    let product = service.get_finished_product(id).await?;
    Ok(Json(product))
}

/// List finished products
pub async fn list_finished_products(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<FinishedProduct>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_finished_products().await?;
    Ok(Json(products))
}

/// Create a customer
pub async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<Json<Customer>> {
    let service = CatalogService::new(state.db);
    let customer = service.create_customer(input).await?;
    Ok(Json(customer))
}

/// Get a customer
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    let service = CatalogService::new(state.db);
    let customer = service.get_customer(id).await?;
    Ok(Json(customer))
}

/// List customers
pub async fn list_customers(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    let service = CatalogService::new(state.db);
    let customers = service.list_customers().await?;
    Ok(Json(customers))
}
