//! Period propagation
//!
//! Turns declared periods into expected invocation counts over the trace
//! window. Timer-driven callbacks get `run_time / period`. Callbacks with a
//! zero period sit downstream of the timers and fire once per upstream
//! message, so they all share the sum of the periodic expectations.

use crate::types::TimeWindow;
use serde::Serialize;

/// One row of the period table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodEntry {
    /// Callback display name
    pub name: String,
    /// Declared period in seconds (0 for message-triggered callbacks)
    pub period_seconds: f64,
    /// Inferred invocation count over the trace window
    pub expected_count: f64,
}

impl PeriodEntry {
    /// Create an entry whose expected count is not yet known
    pub fn new(name: impl Into<String>, period_seconds: f64) -> Self {
        Self {
            name: name.into(),
            period_seconds,
            expected_count: 0.0,
        }
    }

    pub fn is_periodic(&self) -> bool {
        self.period_seconds != 0.0
    }
}

/// Period entries with their expected counts filled in
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodTable {
    entries: Vec<PeriodEntry>,
    run_time_seconds: f64,
}

impl PeriodTable {
    pub fn entries(&self) -> &[PeriodEntry] {
        &self.entries
    }

    pub fn run_time_seconds(&self) -> f64 {
        self.run_time_seconds
    }

    /// Expected count of the first entry named exactly `name`
    pub fn expected_for(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.expected_count)
    }

    /// Expected count of the entry at `index`, in input order
    pub fn expected_at(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|entry| entry.expected_count)
    }

    /// Shared expectation of zero-period entries
    pub fn upstream_total(&self) -> f64 {
        self.entries
            .iter()
            .filter(|entry| entry.is_periodic())
            .map(|entry| entry.expected_count)
            .sum()
    }
}

/// Approximate run time of the trace, in seconds
///
/// Latest last-timestamp minus earliest first-timestamp over all windows;
/// zero when there are none.
pub fn run_time_seconds<I>(windows: I) -> f64
where
    I: IntoIterator<Item = TimeWindow>,
{
    let mut span: Option<TimeWindow> = None;
    for window in windows {
        span = Some(match span {
            None => window,
            Some(acc) => TimeWindow {
                first: acc.first.min(window.first),
                last: acc.last.max(window.last),
            },
        });
    }

    let Some(span) = span else {
        return 0.0;
    };
    let delta = span.last - span.first;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Fill in expected counts for every entry
///
/// Periodic entries are finalized first; only then is their sum assigned to
/// the zero-period entries.
pub fn propagate(mut entries: Vec<PeriodEntry>, run_time_seconds: f64) -> PeriodTable {
    for entry in entries.iter_mut().filter(|entry| entry.is_periodic()) {
        entry.expected_count = run_time_seconds / entry.period_seconds;
    }

    let upstream_total: f64 = entries
        .iter()
        .filter(|entry| entry.is_periodic())
        .map(|entry| entry.expected_count)
        .sum();

    for entry in entries.iter_mut().filter(|entry| !entry.is_periodic()) {
        entry.expected_count = upstream_total;
    }

    log::debug!(
        "Propagated {} period entries over {:.3} s (upstream total {:.1})",
        entries.len(),
        run_time_seconds,
        upstream_total
    );

    PeriodTable {
        entries,
        run_time_seconds,
    }
}
