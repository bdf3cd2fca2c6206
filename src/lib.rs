pub mod aliases;
pub mod app_error;
pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod schema;
pub mod services;
pub mod swagger;
pub mod validation;

use axum::{Router, routing};
use tower_http::trace::TraceLayer;
use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

/// Assembles every route, the OpenAPI document and the Swagger UI.
pub fn create_app(state: AppState) -> Router {
    let (router, mut openapi) = OpenApiRouter::new()
        .merge(routes::carts::routes_with_openapi())
        .merge(routes::orders::routes_with_openapi())
        .merge(routes::products::routes_with_openapi())
        .split_for_parts();

    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Shop OrderService API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();

    Router::new()
        .merge(router)
        .merge(swagger::create_swagger_ui(openapi))
        .route("/health", routing::get(routes::health::check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
