//! Per-callback duration and frequency reporting
//!
//! Purely descriptive: a duration time series plus an equal-width histogram of
//! durations in milliseconds. Binning follows numpy's `histogram` exactly:
//! `bins + 1` linearly spaced edges over `[min, max]`, half-open bins except
//! the last which also takes values equal to `max`.

use crate::color::color_for;
use crate::stats::ColumnStats;
use crate::types::{AnalyzerError, CallbackHandle, Observation, Result};
use serde::Serialize;

/// Label format for the first observation of a series
const START_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A single histogram bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub left: f64,
    pub right: f64,
    pub count: u64,
}

/// Equal-width histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// Number of values per bin
    pub counts: Vec<u64>,
    /// Bin edges, one more than there are bins
    pub edges: Vec<f64>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins over their min/max
    ///
    /// Non-finite values are ignored.
    pub fn compute(values: &[f64], bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "histogram needs at least one bin".to_string(),
            ));
        }

        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.len() != values.len() {
            log::warn!(
                "Ignoring {} non-finite values in histogram input",
                values.len() - finite.len()
            );
        }

        let (mut first, mut last) = match finite.iter().copied().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        }) {
            Some(range) => range,
            None => (0.0, 1.0),
        };
        if first == last {
            first -= 0.5;
            last += 0.5;
        }

        let edges = linspace(first, last, bins + 1);
        let mut counts = vec![0u64; bins];
        let span = last - first;

        for value in finite {
            let scaled = (value - first) / span * bins as f64;
            let mut index = (scaled as usize).min(bins - 1);
            // Correct for rounding in the scaled offset against the real edges
            if value < edges[index] && index > 0 {
                index -= 1;
            } else if value >= edges[index + 1] && index != bins - 1 {
                index += 1;
            }
            counts[index] += 1;
        }

        Ok(Self { counts, edges })
    }

    /// Bins with their edges
    pub fn bins(&self) -> Vec<HistogramBin> {
        self.counts
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&count, edge)| HistogramBin {
                left: edge[0],
                right: edge[1],
                count,
            })
            .collect()
    }

    /// Total number of binned values
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// `num` evenly spaced values from `start` to `stop` inclusive
fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    let div = (num - 1) as f64;
    let step = (stop - start) / div;
    let mut values: Vec<f64> = (0..num).map(|i| i as f64 * step + start).collect();
    if let Some(end) = values.last_mut() {
        *end = stop;
    }
    values
}

/// Duration report for one callback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationReport {
    pub handle: CallbackHandle,
    pub name: String,
    pub symbol: Option<String>,
    pub color: String,
    /// First observation, formatted for an axis label
    pub start_label: String,
    /// Observations in trace order, durations in seconds
    pub series: Vec<Observation>,
    /// Histogram of durations in milliseconds
    pub histogram: Histogram,
    /// Duration statistics in milliseconds
    pub stats: Option<ColumnStats>,
}

impl DurationReport {
    /// Build the report from a callback's observations
    ///
    /// The caller guarantees `observations` is non-empty.
    pub fn build(
        handle: CallbackHandle,
        name: String,
        symbol: Option<String>,
        observations: &[Observation],
        bins: usize,
    ) -> Result<Self> {
        let first = observations.first().ok_or_else(|| {
            AnalyzerError::InvalidTrace(format!("no data for callback {}", name))
        })?;

        let millis: Vec<f64> = observations.iter().map(Observation::duration_ms).collect();
        let histogram = Histogram::compute(&millis, bins)?;

        log::trace!("Duration histogram for {}: {:?}", name, histogram.counts);

        Ok(Self {
            handle,
            color: color_for(&name),
            start_label: first.timestamp.format(START_LABEL_FORMAT).to_string(),
            series: observations.to_vec(),
            histogram,
            stats: ColumnStats::describe(&millis),
            symbol,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn assert_edges(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "edge {a} != {e}");
        }
    }

    #[test]
    fn test_numpy_reference_histogram() {
        // numpy.histogram([1, 2, 2, 3, 3, 3])
        let hist = Histogram::compute(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0], 10).unwrap();
        assert_eq!(hist.counts, vec![1, 0, 0, 0, 0, 2, 0, 0, 0, 3]);
        assert_edges(
            &hist.edges,
            &[1.0, 1.2, 1.4, 1.6, 1.8, 2.0, 2.2, 2.4, 2.6, 2.8, 3.0],
        );
        assert_eq!(hist.total(), 6);
    }

    #[test]
    fn test_constant_values_widen_range() {
        // numpy.histogram([5, 5, 5], bins=4)
        let hist = Histogram::compute(&[5.0, 5.0, 5.0], 4).unwrap();
        assert_eq!(hist.counts, vec![0, 0, 3, 0]);
        assert_edges(&hist.edges, &[4.5, 4.75, 5.0, 5.25, 5.5]);
    }

    #[test]
    fn test_last_bin_is_closed() {
        let hist = Histogram::compute(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(hist.counts, vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_empty_input_uses_unit_range() {
        let hist = Histogram::compute(&[], 2).unwrap();
        assert_eq!(hist.counts, vec![0, 0]);
        assert_edges(&hist.edges, &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let hist = Histogram::compute(&[1.0, f64::NAN, 2.0, f64::INFINITY], 2).unwrap();
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn test_zero_bins_rejected() {
        assert!(Histogram::compute(&[1.0], 0).is_err());
    }

    #[test]
    fn test_bins_view() {
        let hist = Histogram::compute(&[0.0, 1.0], 2).unwrap();
        let bins = hist.bins();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0], HistogramBin { left: 0.0, right: 0.5, count: 1 });
        assert_eq!(bins[1], HistogramBin { left: 0.5, right: 1.0, count: 1 });
    }

    #[test]
    fn test_duration_report() {
        let t0 = Utc.with_ymd_and_hms(2021, 6, 1, 12, 30, 15).unwrap();
        let observations: Vec<Observation> = (0..4)
            .map(|i| Observation::new(t0 + Duration::milliseconds(100 * i), 0.002))
            .collect();

        let report = DurationReport::build(
            CallbackHandle(3),
            "node_A".to_string(),
            None,
            &observations,
            10,
        )
        .unwrap();

        assert_eq!(report.start_label, "2021-06-01 12:30");
        assert_eq!(report.series, observations);
        assert_eq!(report.series[3].timestamp, t0 + Duration::milliseconds(300));
        assert_eq!(report.histogram.total(), 4);
        assert_eq!(report.color, color_for("node_A"));
        let stats = report.stats.unwrap();
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_duration_report_requires_data() {
        let result = DurationReport::build(CallbackHandle(1), "x".to_string(), None, &[], 10);
        assert!(matches!(result, Err(AnalyzerError::InvalidTrace(_))));
    }
}
