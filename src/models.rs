//! Wire models for the bridge HTTP API.
//!
//! Field names are the camelCase names the PMS already sends and reads, so
//! every struct here renames on the way through serde.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Models (typed views over validated payloads)
// ============================================================================

/// The fields of a storno request that are echoed back to the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StornoRequest {
    pub original_receipt_number: String,
    pub reason: String,
    pub amount: f64,
}

// ============================================================================
// Response Models
// ============================================================================

/// Error body shared by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub success: bool,
    pub receipt_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub success: bool,
    pub invoice_number: String,
}

/// Shared by X, Z and periodic reports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub success: bool,
    pub report_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StornoResponse {
    pub success: bool,
    pub storno_number: String,
    pub original_receipt_number: String,
    pub storno_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCounters {
    pub receipts: u64,
    pub invoices: u64,
    pub reports: u64,
    pub stornos: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub bridge: &'static str,
    pub version: &'static str,
    pub started_at: String,
    pub uptime: u64,
    pub counters: HealthCounters,
    pub spool_files: usize,
    pub last_error: Option<LastError>,
    pub mode: &'static str,
}
