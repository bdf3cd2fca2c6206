use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthRes {
    pub status: &'static str,
}

/// Liveness check, does not touch the database.
pub async fn check() -> Json<HealthRes> {
    Json(HealthRes { status: "ok" })
}
