//! Main analyzer API
//!
//! [`Analyzer`] is the entry point for both reports. It walks the callbacks of
//! a [`TraceSource`] once per report and wires the pipeline together:
//!
//! 1. metadata extraction (name, declared period, exclusion)
//! 2. period propagation over the trace window
//! 3. dropped-count estimation per callback
//!
//! The duration report runs independently of the other three stages.
//!
//! Callbacks without observations are skipped with a warning by both reports.

use crate::config::AnalyzerConfig;
use crate::dropped::{estimate, CallbackSummary, DroppedSummary, Estimate, SkippedCallback};
use crate::duration::DurationReport;
use crate::metadata::{CallbackMetadata, UNKNOWN_OWNER};
use crate::period::{propagate, run_time_seconds, PeriodEntry};
use crate::trace::TraceSource;
use crate::types::{CallbackHandle, Result, TimeWindow};

/// A callback that made it past metadata extraction
struct Candidate {
    handle: CallbackHandle,
    name: String,
    observed_count: usize,
    window: TimeWindow,
    period_entry: Option<PeriodEntry>,
    /// Position of `period_entry` in the propagated table
    entry_index: Option<usize>,
}

/// The analyzer - entry point for all report generation
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create an analyzer, rejecting unusable configurations
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Build the dropped-messages summary report
    ///
    /// # Example
    /// ```
    /// use callback_drop_analyzer::{Analyzer, AnalyzerConfig, InMemoryTrace};
    ///
    /// let trace = InMemoryTrace::new();
    /// let analyzer = Analyzer::new(AnalyzerConfig::new()).unwrap();
    /// let summary = analyzer.summary(&trace).unwrap();
    /// assert!(summary.rows.is_empty());
    /// ```
    pub fn summary(&self, trace: &dyn TraceSource) -> Result<DroppedSummary> {
        let handles = trace.list_callbacks();
        log::info!("Building dropped-messages summary over {} callbacks", handles.len());

        let mut candidates = Vec::new();
        let mut skipped = Vec::new();
        let mut next_entry = 0;

        for handle in handles {
            let Some(owner_info) = trace.owner_info(handle) else {
                log::warn!("Skipping callback {}: no owner info", handle);
                skipped.push(SkippedCallback {
                    handle,
                    reason: "no owner info".to_string(),
                });
                continue;
            };
            if self.config.is_excluded(owner_info) {
                log::debug!("Skipping excluded callback {}: {}", handle, owner_info);
                continue;
            }

            let observations = trace.observations(handle);
            let Some(window) = TimeWindow::of(observations) else {
                log::warn!("Skipping callback {}: no data for callback", handle);
                skipped.push(SkippedCallback {
                    handle,
                    reason: "no data for callback".to_string(),
                });
                continue;
            };

            let metadata = trace.metadata(handle).unwrap_or_default();
            let name = metadata.display_name();
            let observed_count = observations.len();
            let period_entry = self.period_entry(&name, &metadata, observed_count);
            let entry_index = period_entry.as_ref().map(|_| {
                next_entry += 1;
                next_entry - 1
            });

            candidates.push(Candidate {
                handle,
                name,
                observed_count,
                window,
                period_entry,
                entry_index,
            });
        }

        let run_time = run_time_seconds(candidates.iter().map(|c| c.window));
        let entries = candidates
            .iter()
            .filter_map(|c| c.period_entry.clone())
            .collect();
        let table = propagate(entries, run_time);

        let mut callbacks = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let observed = candidate.observed_count as f64;
            // Callbacks sharing a display name each keep their own entry
            let estimate = match candidate.entry_index.and_then(|i| table.expected_at(i)) {
                Some(expected) => Estimate::from_entry(expected, observed),
                None => estimate(
                    &candidate.name,
                    observed,
                    &table,
                    &self.config.reference_callback,
                )?,
            };
            callbacks.push(CallbackSummary {
                handle: candidate.handle,
                period_seconds: candidate
                    .period_entry
                    .as_ref()
                    .map_or(0.0, |entry| entry.period_seconds),
                name: candidate.name,
                observed_count: candidate.observed_count,
                expected_count: estimate.expected_count,
                dropped: estimate.dropped,
                expectation: estimate.source,
            });
        }

        let summary = DroppedSummary::new(run_time, callbacks, skipped);
        log::info!(
            "{}: {} callbacks, {:.1} dropped in total, {} skipped",
            summary.title(),
            summary.rows.len(),
            summary.total_dropped(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Build one duration report per non-excluded callback
    pub fn individual(&self, trace: &dyn TraceSource) -> Result<Vec<DurationReport>> {
        let handles = trace.list_callbacks();
        log::info!("Building duration reports over {} callbacks", handles.len());

        let mut reports = Vec::new();
        for handle in handles {
            let owner_info = trace.owner_info(handle).unwrap_or(UNKNOWN_OWNER);
            if self.config.is_excluded(owner_info) {
                log::debug!("Skipping excluded callback {}: {}", handle, owner_info);
                continue;
            }

            let observations = trace.observations(handle);
            if observations.is_empty() {
                log::warn!("Skipping callback {}: no data for callback", handle);
                continue;
            }

            let mut name = trace.metadata(handle).unwrap_or_default().display_name();
            if name.is_empty() {
                name = UNKNOWN_OWNER.to_string();
            }

            reports.push(DurationReport::build(
                handle,
                name,
                trace.symbol(handle).map(str::to_string),
                observations,
                self.config.histogram_bins,
            )?);
        }

        Ok(reports)
    }

    /// Period entry for a callback, if it takes part in propagation
    ///
    /// Callbacks above the downstream threshold are message-triggered whatever
    /// they declare; callbacks with no declared period get no entry and fall
    /// back to the reference rate.
    fn period_entry(
        &self,
        name: &str,
        metadata: &CallbackMetadata,
        observed_count: usize,
    ) -> Option<PeriodEntry> {
        let declared = metadata.period_seconds();
        if self.config.exceeds_downstream_threshold(observed_count) {
            if declared != 0.0 {
                log::debug!(
                    "{} observed {} times, ignoring declared period {} s",
                    name,
                    observed_count,
                    declared
                );
            }
            Some(PeriodEntry::new(name, 0.0))
        } else if declared != 0.0 {
            Some(PeriodEntry::new(name, declared))
        } else {
            None
        }
    }
}
