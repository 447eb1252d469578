//! Analyzer configuration types
//!
//! The knobs here replace constants that were baked into the report heuristic:
//! the downstream-count threshold, the reference callback used as a stand-in
//! rate, the histogram bin count and the owner-info exclusion markers.

use crate::types::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};

/// Default reference callback (a periodic sensor driver)
pub const DEFAULT_REFERENCE_CALLBACK: &str = "node_FrontLidarDriver";

/// Configuration for the analyzer library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Callbacks observed more often than this are treated as non-periodic
    /// (triggered by every upstream message). Heuristic, trace-length dependent.
    #[serde(default = "default_threshold")]
    pub downstream_count_threshold: usize,

    /// Callback whose expected count stands in for callbacks with no period entry
    #[serde(default = "default_reference")]
    pub reference_callback: String,

    /// Number of equal-width bins in the duration histogram
    #[serde(default = "default_bins")]
    pub histogram_bins: usize,

    /// Owner-info substrings marking callbacks to skip entirely
    #[serde(default = "default_excluded")]
    pub excluded_markers: Vec<String>,
}

fn default_threshold() -> usize {
    200
}

fn default_reference() -> String {
    DEFAULT_REFERENCE_CALLBACK.to_string()
}

fn default_bins() -> usize {
    10
}

fn default_excluded() -> Vec<String> {
    vec!["/parameter_events".to_string()]
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            downstream_count_threshold: default_threshold(),
            reference_callback: default_reference(),
            histogram_bins: default_bins(),
            excluded_markers: default_excluded(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a new analyzer configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the downstream-count threshold
    pub fn with_downstream_threshold(mut self, threshold: usize) -> Self {
        self.downstream_count_threshold = threshold;
        self
    }

    /// Builder method: set the reference callback name
    pub fn with_reference_callback(mut self, name: impl Into<String>) -> Self {
        self.reference_callback = name.into();
        self
    }

    /// Builder method: set the histogram bin count
    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins;
        self
    }

    /// Builder method: add an exclusion marker
    pub fn add_excluded_marker(mut self, marker: impl Into<String>) -> Self {
        self.excluded_markers.push(marker.into());
        self
    }

    /// Check that the configuration can drive a report
    pub fn validate(&self) -> Result<()> {
        if self.histogram_bins == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "histogram_bins must be at least 1".to_string(),
            ));
        }
        if self.reference_callback.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "reference_callback must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if a callback's owner-info marks it as excluded
    pub fn is_excluded(&self, owner_info: &str) -> bool {
        crate::metadata::is_excluded(owner_info, &self.excluded_markers)
    }

    /// Check if an observed count puts a callback downstream of the periodic sources
    pub fn exceeds_downstream_threshold(&self, observed: usize) -> bool {
        observed > self.downstream_count_threshold
    }
}
