// src/pipeline/report.rs
// =============================================================================
// Per-entry outcomes and the aggregated scan report.
//
// Every scheduled entry ends up with exactly one EntryReport, whatever
// happened to it. The caller (main.rs) looks at the report and decides
// whether a transport failure should fail the run.
// =============================================================================

use crate::error::TransportKind;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// What happened to one disallowed entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryStatus {
    /// 200 response, body written to `path`
    Saved { status: u16, path: PathBuf },
    /// The server answered with anything but 200
    NotFound { status: u16 },
    /// 200 response, but the body could not be stored
    PersistFailed { status: u16, message: String },
    /// No HTTP response at all
    FetchFailed { kind: TransportKind, message: String },
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Saved { status, .. } => write!(f, "FOUND ({})", status),
            EntryStatus::NotFound { status } => write!(f, "CLOSED ({})", status),
            EntryStatus::PersistFailed { status, .. } => write!(f, "NOT SAVED ({})", status),
            EntryStatus::FetchFailed { kind, .. } => write!(f, "ERROR ({})", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryReport {
    /// Position of the entry in the robots.txt order
    pub index: usize,
    pub url: String,
    #[serde(flatten)]
    pub status: EntryStatus,
}

impl EntryReport {
    pub fn is_success(&self) -> bool {
        matches!(self.status, EntryStatus::Saved { .. })
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self.status, EntryStatus::FetchFailed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: String,
    /// Sorted by entry index
    pub entries: Vec<EntryReport>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl ScanReport {
    pub fn new(target: impl Into<String>, mut entries: Vec<EntryReport>, elapsed: Duration) -> Self {
        entries.sort_by_key(|entry| entry.index);
        Self {
            target: target.into(),
            entries,
            elapsed,
        }
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Entries that were found and stored
    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_success()).count()
    }

    pub fn error_count(&self) -> usize {
        self.total() - self.success_count()
    }

    pub fn transport_failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.is_transport_failure())
    }

    /// URLs of the stored entries, in robots.txt order
    pub fn found_urls(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_success())
            .map(|e| e.url.clone())
            .collect()
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}
