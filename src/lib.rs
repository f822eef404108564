//! # POSNET Bridge
//!
//! A local store-and-forward spooler between the browser-based hotel PMS and
//! a POSNET fiscal printer attached to the operator's machine.
//!
//! The bridge listens on loopback only, validates each fiscal request, writes
//! it to the spool directory and answers with a reference number. Driving the
//! physical device from the spool is the job of a separate consumer.
//!
//! The router is exposed here so integration tests can run an in-process
//! server without `cargo run` in another terminal.

pub mod auth;
pub mod config;
pub mod error;
pub mod fiscal;
pub mod models;
pub mod routes;
pub mod spool;
pub mod state;
pub mod validation;

use std::any::Any;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, Method};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::BridgeError;
use crate::state::AppState;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1_000_000;

/// Build the bridge router with all routes and middleware.
///
/// This function does NOT bind a socket; the caller serves the router.
pub fn create_app(state: AppState) -> Router {
    let stats = state.stats.clone();
    let on_panic = move |panic: Box<dyn Any + Send + 'static>| -> Response {
        let message = panic_message(panic.as_ref());
        error!("request handler panicked: {}", message);
        stats.record_error(message.clone());
        BridgeError::Internal(message).into_response()
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::fiscal::router(state.clone()))
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(on_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(auth::API_KEY_HEADER),
        ])
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "Bridge error".to_string()
    }
}
