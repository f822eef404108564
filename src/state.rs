//! Shared bridge state: diagnostics counters and the handles every handler needs.
//!
//! Counters live only in memory and reset on restart. The spool directory
//! is the durable record of what was accepted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::BridgeConfig;
use crate::fiscal::FiscalKind;
use crate::models::{HealthCounters, LastError};
use crate::spool::Spool;

/// Process-wide counters and the most recent server error.
#[derive(Debug)]
pub struct BridgeStats {
    started_at: DateTime<Utc>,
    started: Instant,
    receipts: AtomicU64,
    invoices: AtomicU64,
    reports: AtomicU64,
    stornos: AtomicU64,
    last_error: Mutex<Option<LastError>>,
}

impl Default for BridgeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            receipts: AtomicU64::new(0),
            invoices: AtomicU64::new(0),
            reports: AtomicU64::new(0),
            stornos: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    fn counter(&self, kind: FiscalKind) -> &AtomicU64 {
        match kind {
            FiscalKind::Receipt => &self.receipts,
            FiscalKind::Invoice => &self.invoices,
            FiscalKind::ReportX | FiscalKind::ReportZ | FiscalKind::ReportPeriodic => &self.reports,
            FiscalKind::Storno => &self.stornos,
        }
    }

    /// Count one spooled operation and return the new value of its counter.
    pub fn record(&self, kind: FiscalKind) -> u64 {
        self.counter(kind).fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn counters(&self) -> HealthCounters {
        HealthCounters {
            receipts: self.receipts.load(Ordering::Relaxed),
            invoices: self.invoices.load(Ordering::Relaxed),
            reports: self.reports.load(Ordering::Relaxed),
            stornos: self.stornos.load(Ordering::Relaxed),
        }
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let entry = LastError {
            message: message.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }

    pub fn last_error(&self) -> Option<LastError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// State handed to every route.
#[derive(Debug, Clone)]
pub struct AppState {
    pub api_key: Option<Arc<str>>,
    pub spool: Spool,
    pub stats: Arc<BridgeStats>,
}

impl AppState {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            api_key: config.api_key.as_deref().map(Arc::from),
            spool: Spool::new(config.spool_dir.clone()),
            stats: Arc::new(BridgeStats::new()),
        }
    }
}
