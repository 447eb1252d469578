//! Callback Drop Analyzer Library
//!
//! Estimates dropped messages in a robotics benchmark trace. Given the recorded
//! invocations of every node/topic callback, it infers how often each callback
//! should have fired and reports the shortfall, alongside per-callback duration
//! series and histograms.
//!
//! # Architecture
//!
//! Two independent report builders share one read-only [`TraceSource`]:
//! - The summary report: metadata extraction, then period propagation, then
//!   dropped-count estimation
//! - The duration report: per-callback duration series and histogram
//!
//! The library does NOT:
//! - Parse tracer output formats (the trace source is supplied by the caller)
//! - Render charts (all outputs are plain serializable data)
//! - Persist anything between report calls
//!
//! # Example Usage
//!
//! ```
//! use callback_drop_analyzer::{Analyzer, AnalyzerConfig, InMemoryTrace, Observation};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let t0 = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
//! let ticks: Vec<Observation> = (0..=100)
//!     .map(|i| Observation::new(t0 + Duration::milliseconds(100 * i), 0.001))
//!     .collect();
//!
//! let trace = InMemoryTrace::new()
//!     .with_callback(1, Some("Timer -- node: FrontLidarDriver, period: 100 ms"), ticks)
//!     .unwrap();
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::new()).unwrap();
//! let summary = analyzer.summary(&trace).unwrap();
//!
//! assert_eq!(summary.rows[0].name, "node_FrontLidarDriver");
//! assert_eq!(summary.rows[0].dropped, 1.0);
//! ```

// Public modules
pub mod analyzer;
pub mod color;
pub mod config;
pub mod dropped;
pub mod duration;
pub mod metadata;
pub mod period;
pub mod stats;
pub mod trace;
pub mod types;

// Re-export main types for convenience
pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, DEFAULT_REFERENCE_CALLBACK};
pub use dropped::{CallbackSummary, DroppedRow, DroppedSummary, ExpectationSource, SkippedCallback};
pub use duration::{DurationReport, Histogram, HistogramBin};
pub use metadata::CallbackMetadata;
pub use period::{PeriodEntry, PeriodTable};
pub use stats::ColumnStats;
pub use trace::{CallbackRecord, InMemoryTrace, TraceSource};
pub use types::{AnalyzerError, CallbackHandle, Observation, Result, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an empty trace yields empty reports
        let analyzer = Analyzer::default();
        let trace = InMemoryTrace::new();
        assert!(analyzer.summary(&trace).unwrap().rows.is_empty());
        assert!(analyzer.individual(&trace).unwrap().is_empty());
    }
}
