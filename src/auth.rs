//! Shared-secret check for fiscal routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::error::BridgeError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject the request unless it carries the configured `x-api-key`.
///
/// With no key configured every request passes.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, BridgeError> {
    if let Some(expected) = state.api_key.as_deref() {
        let presented = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected) {
            warn!(path = %request.uri().path(), "rejected request with missing or wrong api key");
            return Err(BridgeError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}
