//! Fiscal operation kinds and the spooled operation record.
//!
//! Each kind fixes its spool file prefix, the prefix of the number handed
//! back to the PMS, and what gets stamped onto the payload before it is
//! written. The physical printer never sees these numbers; they only let the
//! caller log a reference before the device has printed anything.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// File name timestamp: ISO-8601 with `:` replaced so it is valid on every filesystem.
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiscalKind {
    Receipt,
    Invoice,
    ReportX,
    ReportZ,
    ReportPeriodic,
    Storno,
}

impl FiscalKind {
    pub const ALL: [FiscalKind; 6] = [
        FiscalKind::Receipt,
        FiscalKind::Invoice,
        FiscalKind::ReportX,
        FiscalKind::ReportZ,
        FiscalKind::ReportPeriodic,
        FiscalKind::Storno,
    ];

    /// Stable name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            FiscalKind::Receipt => "receipt",
            FiscalKind::Invoice => "invoice",
            FiscalKind::ReportX => "report_x",
            FiscalKind::ReportZ => "report_z",
            FiscalKind::ReportPeriodic => "report_periodic",
            FiscalKind::Storno => "storno",
        }
    }

    pub fn file_prefix(self) -> &'static str {
        match self {
            FiscalKind::Receipt => "receipt",
            FiscalKind::Invoice => "invoice",
            FiscalKind::ReportX => "report-x",
            FiscalKind::ReportZ => "report-z",
            FiscalKind::ReportPeriodic => "report-periodic",
            FiscalKind::Storno => "storno",
        }
    }

    pub fn number_prefix(self) -> &'static str {
        match self {
            FiscalKind::Receipt => "PAR",
            FiscalKind::Invoice => "FV",
            FiscalKind::ReportX => "X",
            FiscalKind::ReportZ => "Z",
            FiscalKind::ReportPeriodic => "PER",
            FiscalKind::Storno => "ST",
        }
    }

    /// Value of the `_type` tag merged into the spooled record, if any.
    pub fn type_tag(self) -> Option<&'static str> {
        match self {
            FiscalKind::Receipt => None,
            FiscalKind::Invoice => Some("invoice"),
            FiscalKind::ReportX => Some("X_REPORT"),
            FiscalKind::ReportZ => Some("Z_REPORT"),
            FiscalKind::ReportPeriodic => Some("PERIODIC_REPORT"),
            FiscalKind::Storno => Some("storno"),
        }
    }

    /// Whether the capture time is stamped into the record as `timestamp`.
    pub fn stamps_timestamp(self) -> bool {
        matches!(
            self,
            FiscalKind::ReportX
                | FiscalKind::ReportZ
                | FiscalKind::ReportPeriodic
                | FiscalKind::Storno
        )
    }
}

impl std::fmt::Display for FiscalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted, validated operation on its way to the spool.
#[derive(Debug, Clone)]
pub struct FiscalOperation {
    pub kind: FiscalKind,
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub payload: Map<String, Value>,
}

impl FiscalOperation {
    pub fn new(kind: FiscalKind, payload: Map<String, Value>) -> Self {
        Self::with_identity(kind, Uuid::new_v4(), Utc::now(), payload)
    }

    pub fn with_identity(
        kind: FiscalKind,
        id: Uuid,
        captured_at: DateTime<Utc>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            kind,
            id,
            captured_at,
            payload,
        }
    }

    /// Human-facing reference, e.g. `PAR-1A2B3C4D`.
    pub fn number(&self) -> String {
        let id = self.id.to_string();
        format!("{}-{}", self.kind.number_prefix(), id[..8].to_uppercase())
    }

    /// `<prefix>_<timestamp>_<id>.json`, unique per operation.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.json",
            self.kind.file_prefix(),
            self.captured_at.format(FILE_TIMESTAMP_FORMAT),
            self.id
        )
    }

    /// The JSON document written to the spool.
    pub fn record(&self) -> Value {
        let mut record = self.payload.clone();
        if let Some(tag) = self.kind.type_tag() {
            record.insert("_type".to_string(), Value::from(tag));
        }
        if self.kind.stamps_timestamp() {
            record.insert(
                "timestamp".to_string(),
                Value::from(
                    self.captured_at
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
            );
        }
        Value::Object(record)
    }
}
