mod echo;
mod health;

use axum::http::Uri;

use crate::error::AppError;

pub use echo::echo;
pub use health::health_check;

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
