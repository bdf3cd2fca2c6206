use axum::extract::FromRequest;

use crate::app_error::AppError;

/// JSON body extractor whose rejections are reported as `400` in the standard envelope.
#[derive(FromRequest, Debug)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
