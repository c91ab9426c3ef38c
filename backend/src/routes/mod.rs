//! Route definitions for the Manufacturing ERP API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/materials", material_routes())
        .nest("/bulk-products", bulk_product_routes())
        .nest("/finished-products", finished_product_routes())
        .nest("/customers", customer_routes())
        .nest("/formulations", formulation_routes())
        .nest("/inventory", inventory_routes())
        .nest("/production", production_routes())
        .nest("/packaging", packaging_routes())
        .nest("/sales", sale_routes())
}

/// Raw material catalog
fn material_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_raw_materials).post(handlers::create_raw_material),
        )
        .route("/:id", get(handlers::get_raw_material))
}

/// Bulk product catalog
fn bulk_product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_bulk_products).post(handlers::create_bulk_product),
        )
        .route("/:id", get(handlers::get_bulk_product))
}

/// Finished product catalog
fn finished_product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_finished_products).post(handlers::create_finished_product),
        )
        .route("/:id", get(handlers::get_finished_product))
}

/// Customers, their ledgers and payments
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route("/:id", get(handlers::get_customer))
        .route("/:id/ledger", get(handlers::get_customer_ledger))
        .route("/:id/payments", post(handlers::record_payment))
}

/// Formulations, resolution and costing
fn formulation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_formulations).post(handlers::create_formulation),
        )
        .route("/:id", get(handlers::get_formulation))
        .route("/:id/resolve", get(handlers::resolve_formulation))
        .route("/:id/cost", get(handlers::cost_formulation))
}

/// Inventory balances and the admin override
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/:kind", get(handlers::list_levels))
        .route(
            "/:kind/:entity_id",
            get(handlers::get_quantity),
        )
        .route("/:kind/:entity_id/quantity", put(handlers::set_quantity))
}

/// Production runs
fn production_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_production_runs).post(handlers::produce),
        )
        .route("/:id", get(handlers::get_production_run))
}

/// Packaging runs
fn packaging_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_packaging_runs).post(handlers::package),
        )
        .route("/:id", get(handlers::get_packaging_run))
}

/// Sales
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::sell))
        .route("/:id", get(handlers::get_sale))
}
