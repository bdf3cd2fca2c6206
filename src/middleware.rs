use axum::{extract::Request, middleware::Next, response::Response};

use crate::app_error::AppError;

/// Header carrying the user id resolved by the upstream authentication gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Rejects requests without a valid user id and exposes it to handlers as `Extension<i32>`.
pub async fn users_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_user_id)
        .ok_or_else(|| {
            tracing::warn!("Rejected request without valid {} header", USER_ID_HEADER);
            AppError::Unauthorized("Authentication credentials were not provided".into())
        })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

fn parse_user_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|id| *id > 0)
}
