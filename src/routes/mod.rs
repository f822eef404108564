//! HTTP route modules for the bridge.
//!
//! - `health`: liveness and diagnostics, open to everyone
//! - `fiscal`: receipt, invoice, report and storno spooling, behind the api key

pub mod fiscal;
pub mod health;

use crate::error::BridgeError;

/// Fallback for unknown paths and methods.
pub async fn not_found() -> BridgeError {
    BridgeError::NotFound
}
