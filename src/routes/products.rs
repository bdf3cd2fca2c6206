use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::ProductEntity,
    services::products,
};

/// Read-only view over the product catalog.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_products))
        .routes(utoipa_axum::routes!(get_product))
}

/// Fetch all products.
#[utoipa::path(
    get,
    path = "/products/",
    tags = ["Products"],
    responses(
        (status = 200, description = "List all products", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn get_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let products = products::list_products(conn).await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

/// Fetch a specific product.
#[utoipa::path(
    get,
    path = "/products/{id}",
    tags = ["Products"],
    params(
        ("id" = i32, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn get_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product = products::get_product(conn, id).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}
