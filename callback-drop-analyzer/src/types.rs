//! Core types for the callback drop analyzer
//!
//! This module defines the fundamental types shared by both report builders:
//! the trace observation record, the callback identity, and the error type.
//! Nothing here owns trace data - observations are borrowed from a
//! [`TraceSource`](crate::trace::TraceSource) for the duration of a report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the analyzer
pub type Timestamp = DateTime<Utc>;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Opaque identity of a callback within a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackHandle(pub u64);

impl fmt::Display for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// A single recorded callback invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Start of the invocation
    pub timestamp: Timestamp,
    /// Time spent in the callback, in seconds
    pub duration: f64,
}

impl Observation {
    pub fn new(timestamp: Timestamp, duration: f64) -> Self {
        Self { timestamp, duration }
    }

    /// Duration converted to milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.duration * 1000.0
    }
}

/// Errors that can occur while building reports
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Reference callback {reference} not found in period table (needed by {callback})")]
    ReferenceCallbackMissing { reference: String, callback: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid trace data: {0}")]
    InvalidTrace(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// First and last timestamp observed for one callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub first: Timestamp,
    pub last: Timestamp,
}

impl TimeWindow {
    /// Window spanned by an ordered observation sequence
    ///
    /// Returns `None` for an empty sequence.
    pub fn of(observations: &[Observation]) -> Option<Self> {
        let first = observations.first()?.timestamp;
        let last = observations.last()?.timestamp;
        Some(Self { first, last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_duration_ms() {
        let ts = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let obs = Observation::new(ts, 0.0025);
        assert!((obs.duration_ms() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_time_window() {
        let t0 = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let t1 = Utc.timestamp_opt(1_600_000_005, 0).unwrap();
        let observations = vec![Observation::new(t0, 0.001), Observation::new(t1, 0.002)];

        let window = TimeWindow::of(&observations).unwrap();
        assert_eq!(window.first, t0);
        assert_eq!(window.last, t1);
        assert!(TimeWindow::of(&[]).is_none());
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(format!("{}", CallbackHandle(0xBEEF)), "0xBEEF");
    }
}
