use anyhow::{Context, Result};
use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    extract::AppJson,
    middleware,
    services::carts::{self, CartDetail, CartItemDetail},
    validation::{Quantity, required},
};

/// Defines the authenticated cart routes.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_cart))
        .routes(utoipa_axum::routes!(add_item))
        .routes(utoipa_axum::routes!(update_item))
        .routes(utoipa_axum::routes!(remove_item))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization))
}

/// Fetch the authenticated user's cart, creating it on first access.
#[utoipa::path(
    get,
    path = "/cart/",
    tags = ["Cart"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "Get cart successfully", body = StdResponse<CartDetail, String>),
        (status = 401, description = "Missing or invalid credentials")
    )
)]
async fn get_cart(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart = carts::get_cart(conn, user_id).await?;

    Ok(StdResponse {
        data: Some(cart),
        message: Some("Get cart successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct AddItemReq {
    product_id: Option<i32>,
    /// Defaults to 1.
    quantity: Option<i32>,
}

/// Add a product to the cart, accumulating onto an existing line.
#[utoipa::path(
    post,
    path = "/cart/add/",
    tags = ["Cart"],
    security(("userId" = [])),
    request_body = AddItemReq,
    responses(
        (status = 201, description = "Added item to cart successfully", body = StdResponse<CartItemDetail, String>),
        (status = 400, description = "Missing or invalid field"),
        (status = 404, description = "Product not found")
    )
)]
async fn add_item(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    AppJson(body): AppJson<AddItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = required(body.product_id, "product_id")?;
    let quantity = Quantity::new(body.quantity.unwrap_or(1))?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item = carts::add_item(conn, user_id, product_id, quantity).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(item),
            message: Some("Added item to cart successfully"),
        },
    ))
}

#[derive(Deserialize, ToSchema)]
struct UpdateItemReq {
    product_id: Option<i32>,
    quantity: Option<i32>,
}

/// Replace the quantity of a product already in the cart.
#[utoipa::path(
    put,
    path = "/cart/update/",
    tags = ["Cart"],
    security(("userId" = [])),
    request_body = UpdateItemReq,
    responses(
        (status = 200, description = "Updated cart item successfully", body = StdResponse<CartItemDetail, String>),
        (status = 400, description = "Missing or invalid field"),
        (status = 404, description = "Cart or cart item not found")
    )
)]
async fn update_item(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    AppJson(body): AppJson<UpdateItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = required(body.product_id, "product_id")?;
    let quantity = Quantity::new(required(body.quantity, "quantity")?)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item = carts::update_item(conn, user_id, product_id, quantity).await?;

    Ok(StdResponse {
        data: Some(item),
        message: Some("Updated cart item successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct RemoveItemReq {
    product_id: Option<i32>,
}

/// Remove a product from the cart.
#[utoipa::path(
    delete,
    path = "/cart/remove/",
    tags = ["Cart"],
    security(("userId" = [])),
    request_body = RemoveItemReq,
    responses(
        (status = 204, description = "Item removed"),
        (status = 400, description = "Missing product_id"),
        (status = 404, description = "Cart or cart item not found")
    )
)]
async fn remove_item(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    AppJson(body): AppJson<RemoveItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = required(body.product_id, "product_id")?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    carts::remove_item(conn, user_id, product_id).await?;

    Ok((
        StatusCode::NO_CONTENT,
        StdResponse::<(), &str> {
            data: None,
            message: Some("Item removed"),
        },
    ))
}
