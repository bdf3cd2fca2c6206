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
    services::orders::{self, OrderDetail},
};

/// Defines the authenticated order routes.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_my_orders))
        .routes(utoipa_axum::routes!(create_order))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization))
}

/// Fetch all orders belonging to the authenticated user, most recent first.
#[utoipa::path(
    get,
    path = "/orders/",
    tags = ["Orders"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<OrderDetail>, String>),
        (status = 401, description = "Missing or invalid credentials")
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let orders = orders::list_orders(conn, user_id).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get my orders successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderReq {
    items: Vec<CreateOrderItemReq>,
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderItemReq {
    /// Id of an existing product.
    product: i32,
    quantity: i32,
}

/// Place an order for the submitted items. The cart is left untouched.
#[utoipa::path(
    post,
    path = "/orders/create/",
    tags = ["Orders"],
    security(("userId" = [])),
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Created order successfully", body = StdResponse<OrderDetail, String>),
        (status = 400, description = "Empty or malformed item list"),
        (status = 404, description = "Product not found")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    AppJson(body): AppJson<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let lines = orders::order_lines(
        body.items
            .into_iter()
            .map(|item| (item.product, item.quantity)),
    )?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = orders::place_order(conn, user_id, lines).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(order),
            message: Some("Create order successfully"),
        },
    ))
}
