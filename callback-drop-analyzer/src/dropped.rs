//! Dropped-message estimation
//!
//! Compares each callback's observed invocation count with the count the
//! period table expects. Callbacks whose name has no period entry borrow the
//! expectation of a reference callback (a periodic sensor driver) instead.

use crate::color::color_for;
use crate::period::PeriodTable;
use crate::stats::ColumnStats;
use crate::types::{AnalyzerError, CallbackHandle, Result};
use serde::Serialize;

/// Padding added to the largest dropped count for the chart axis
const AXIS_PADDING: f64 = 0.25;

/// Where a callback's expected count came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationSource {
    /// Exact name match in the period table
    PeriodTable,
    /// Reference callback stand-in
    Reference,
}

/// Expected count and drop estimate for one callback
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub expected_count: f64,
    pub dropped: f64,
    pub source: ExpectationSource,
}

impl Estimate {
    /// Estimate against the callback's own period entry
    pub fn from_entry(expected_count: f64, observed_count: f64) -> Self {
        Self {
            expected_count,
            dropped: (expected_count - observed_count).abs(),
            source: ExpectationSource::PeriodTable,
        }
    }
}

/// Estimate dropped invocations for a callback without its own period entry
pub fn estimate(
    name: &str,
    observed_count: f64,
    table: &PeriodTable,
    reference_callback: &str,
) -> Result<Estimate> {
    let (expected_count, source) = match table.expected_for(name) {
        Some(expected) => (expected, ExpectationSource::PeriodTable),
        None => {
            let expected = table.expected_for(reference_callback).ok_or_else(|| {
                AnalyzerError::ReferenceCallbackMissing {
                    reference: reference_callback.to_string(),
                    callback: name.to_string(),
                }
            })?;
            log::debug!(
                "No period entry for {:?}, using rate of {}",
                name,
                reference_callback
            );
            (expected, ExpectationSource::Reference)
        }
    };

    Ok(Estimate {
        expected_count,
        dropped: (expected_count - observed_count).abs(),
        source,
    })
}

/// Everything derived for one callback in the summary report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallbackSummary {
    pub handle: CallbackHandle,
    pub name: String,
    pub observed_count: usize,
    /// Period used for propagation (0 when message-triggered or undeclared)
    pub period_seconds: f64,
    pub expected_count: f64,
    pub dropped: f64,
    pub expectation: ExpectationSource,
}

/// Row of the dropped-messages table handed to the chart layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRow {
    pub name: String,
    pub observed_count: f64,
    pub dropped: f64,
    pub color: String,
}

impl From<&CallbackSummary> for DroppedRow {
    fn from(summary: &CallbackSummary) -> Self {
        Self {
            name: summary.name.clone(),
            observed_count: summary.observed_count as f64,
            dropped: summary.dropped,
            color: color_for(&summary.name),
        }
    }
}

/// A callback left out of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCallback {
    pub handle: CallbackHandle,
    pub reason: String,
}

/// The dropped-messages summary report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedSummary {
    /// Trace window used for expectations, in seconds
    pub run_time_seconds: f64,
    pub callbacks: Vec<CallbackSummary>,
    pub rows: Vec<DroppedRow>,
    /// Statistics over the observed-count column
    pub count_stats: Option<ColumnStats>,
    /// Statistics over the dropped column
    pub dropped_stats: Option<ColumnStats>,
    pub skipped: Vec<SkippedCallback>,
}

impl DroppedSummary {
    pub fn new(
        run_time_seconds: f64,
        callbacks: Vec<CallbackSummary>,
        skipped: Vec<SkippedCallback>,
    ) -> Self {
        let rows: Vec<DroppedRow> = callbacks.iter().map(DroppedRow::from).collect();
        let counts: Vec<f64> = rows.iter().map(|row| row.observed_count).collect();
        let dropped: Vec<f64> = rows.iter().map(|row| row.dropped).collect();

        Self {
            run_time_seconds,
            count_stats: ColumnStats::describe(&counts),
            dropped_stats: ColumnStats::describe(&dropped),
            callbacks,
            rows,
            skipped,
        }
    }

    /// Chart title
    pub fn title(&self) -> String {
        format!("Dropped Messages Summary ({:.2} s)", self.run_time_seconds)
    }

    /// Upper bound for the dropped-count axis
    pub fn max_dropped(&self) -> f64 {
        self.rows.iter().map(|row| row.dropped).fold(0.0, f64::max) + AXIS_PADDING
    }

    /// Sum of dropped counts over all rows
    pub fn total_dropped(&self) -> f64 {
        self.rows.iter().map(|row| row.dropped).sum()
    }
}
