//! Fiscal operation routes.
//!
//! POST /fiscal/print           - receipt
//! POST /fiscal/invoice         - invoice for a company buyer
//! POST /fiscal/report/x        - X report
//! POST /fiscal/report/z        - Z report
//! POST /fiscal/report/periodic - periodic report
//! POST /fiscal/storno          - void of a printed receipt
//!
//! Every request runs authenticate, parse, validate, persist, acknowledge.
//! A success response means the record is on disk, not that it was printed.

use std::path::PathBuf;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::middleware;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::auth::require_api_key;
use crate::error::BridgeError;
use crate::fiscal::{FiscalKind, FiscalOperation};
use crate::models::{
    InvoiceResponse, ReceiptResponse, ReportResponse, StornoRequest, StornoResponse,
};
use crate::state::AppState;
use crate::validation;

type RawBody = Result<Bytes, BytesRejection>;

/// Build the fiscal router. All routes require the api key when one is configured.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/fiscal/print", post(print_receipt))
        .route("/fiscal/invoice", post(print_invoice))
        .route("/fiscal/report/x", post(report_x))
        .route("/fiscal/report/z", post(report_z))
        .route("/fiscal/report/periodic", post(report_periodic))
        .route("/fiscal/storno", post(storno))
        .route_layer(middleware::from_fn_with_state(state, require_api_key))
}

async fn print_receipt(
    State(state): State<AppState>,
    body: RawBody,
) -> Result<Json<ReceiptResponse>, BridgeError> {
    let op = accept(&state, FiscalKind::Receipt, body).await?;
    Ok(Json(ReceiptResponse {
        success: true,
        receipt_number: op.number(),
    }))
}

async fn print_invoice(
    State(state): State<AppState>,
    body: RawBody,
) -> Result<Json<InvoiceResponse>, BridgeError> {
    let op = accept(&state, FiscalKind::Invoice, body).await?;
    Ok(Json(InvoiceResponse {
        success: true,
        invoice_number: op.number(),
    }))
}

async fn report_x(
    State(state): State<AppState>,
    body: RawBody,
) -> Result<Json<ReportResponse>, BridgeError> {
    report(&state, FiscalKind::ReportX, body).await
}

async fn report_z(
    State(state): State<AppState>,
    body: RawBody,
) -> Result<Json<ReportResponse>, BridgeError> {
    report(&state, FiscalKind::ReportZ, body).await
}

async fn report_periodic(
    State(state): State<AppState>,
    body: RawBody,
) -> Result<Json<ReportResponse>, BridgeError> {
    report(&state, FiscalKind::ReportPeriodic, body).await
}

async fn report(
    state: &AppState,
    kind: FiscalKind,
    body: RawBody,
) -> Result<Json<ReportResponse>, BridgeError> {
    let op = accept(state, kind, body).await?;
    Ok(Json(ReportResponse {
        success: true,
        report_number: op.number(),
    }))
}

async fn storno(
    State(state): State<AppState>,
    body: RawBody,
) -> Result<Json<StornoResponse>, BridgeError> {
    let op = accept(&state, FiscalKind::Storno, body).await?;
    let req: StornoRequest = serde_json::from_value(Value::Object(op.payload.clone()))
        .map_err(|e| BridgeError::Internal(format!("validated storno unreadable: {e}")))?;

    debug!(
        "storno of {} for {:.2}: {}",
        req.original_receipt_number, req.amount, req.reason
    );

    Ok(Json(StornoResponse {
        success: true,
        storno_number: op.number(),
        original_receipt_number: req.original_receipt_number,
        storno_amount: req.amount,
    }))
}

/// Validate and spool one operation, remembering server-side failures for `/health`.
async fn accept(
    state: &AppState,
    kind: FiscalKind,
    body: RawBody,
) -> Result<FiscalOperation, BridgeError> {
    match spool_operation(state, kind, body).await {
        Ok((op, path)) => {
            let count = state.stats.record(kind);
            info!(
                "[{} #{}] {} -> {}",
                kind,
                count,
                op.number(),
                path.display()
            );
            Ok(op)
        }
        Err(err) => {
            if err.is_server_error() {
                error!("{} failed: {}", kind, err);
                state.stats.record_error(err.to_string());
            } else {
                debug!("{} rejected: {}", kind, err);
            }
            Err(err)
        }
    }
}

async fn spool_operation(
    state: &AppState,
    kind: FiscalKind,
    body: RawBody,
) -> Result<(FiscalOperation, PathBuf), BridgeError> {
    let body = body?;
    let payload = validation::parse_payload(&body)?;
    validation::validate(kind, &payload)?;

    let op = FiscalOperation::new(kind, payload);
    let path = state.spool.persist(&op).await?;
    Ok((op, path))
}
