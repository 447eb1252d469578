//! Trace data access
//!
//! The analyzer never reads trace files itself. It consumes an
//! already-materialized, read-only dataset through [`TraceSource`], which both
//! report builders share by reference.
//!
//! [`InMemoryTrace`] is the bundled implementation. It can be assembled in code
//! or loaded from a JSON dump:
//!
//! ```json
//! { "callbacks": [
//!     { "handle": 1,
//!       "symbol": "void FrontLidarDriver::timer_callback()",
//!       "owner_info": "Timer -- node: FrontLidarDriver, period: 100 ms",
//!       "observations": [ { "timestamp": "2021-06-01T12:00:00Z", "duration": 0.0012 } ] }
//! ] }
//! ```

use crate::metadata::CallbackMetadata;
use crate::types::{AnalyzerError, CallbackHandle, Observation, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Read-only accessor over recorded callback data
pub trait TraceSource {
    /// All callbacks in the trace, in a stable order
    fn list_callbacks(&self) -> Vec<CallbackHandle>;

    /// Raw owner-info text, if the tracer recorded one
    fn owner_info(&self, handle: CallbackHandle) -> Option<&str>;

    /// Invocations of the callback, ordered by timestamp
    fn observations(&self, handle: CallbackHandle) -> &[Observation];

    /// Callback function symbol, if known
    fn symbol(&self, _handle: CallbackHandle) -> Option<&str> {
        None
    }

    /// Structured metadata parsed from the owner-info
    fn metadata(&self, handle: CallbackHandle) -> Option<CallbackMetadata> {
        self.owner_info(handle).map(CallbackMetadata::parse)
    }
}

/// One callback as stored in a trace dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackRecord {
    pub handle: CallbackHandle,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub owner_info: Option<String>,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TraceDump {
    callbacks: Vec<CallbackRecord>,
}

/// Trace held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryTrace {
    callbacks: Vec<CallbackRecord>,
    index: HashMap<CallbackHandle, usize>,
}

impl InMemoryTrace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback to the trace
    ///
    /// Observations are sorted by timestamp. Handles must be unique.
    pub fn add_callback(&mut self, mut record: CallbackRecord) -> Result<()> {
        if self.index.contains_key(&record.handle) {
            return Err(AnalyzerError::InvalidTrace(format!(
                "duplicate callback handle {}",
                record.handle
            )));
        }

        if !record
            .observations
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
        {
            log::debug!("Sorting out-of-order observations for callback {}", record.handle);
            record.observations.sort_by_key(|obs| obs.timestamp);
        }

        self.index.insert(record.handle, self.callbacks.len());
        self.callbacks.push(record);
        Ok(())
    }

    /// Builder-style variant of [`add_callback`](Self::add_callback)
    pub fn with_callback(
        mut self,
        handle: u64,
        owner_info: Option<&str>,
        observations: Vec<Observation>,
    ) -> Result<Self> {
        self.add_callback(CallbackRecord {
            handle: CallbackHandle(handle),
            symbol: None,
            owner_info: owner_info.map(str::to_string),
            observations,
        })?;
        Ok(self)
    }

    /// Parse a JSON trace dump
    pub fn from_json_str(json: &str) -> Result<Self> {
        let dump: TraceDump = serde_json::from_str(json)?;
        let mut trace = Self::new();
        for record in dump.callbacks {
            trace.add_callback(record)?;
        }
        log::debug!("Loaded {} callbacks from JSON dump", trace.len());
        Ok(trace)
    }

    /// Load a JSON trace dump from disk
    pub fn from_json_file(path: &Path) -> Result<Self> {
        log::info!("Loading trace dump: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Number of callbacks in the trace
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn record(&self, handle: CallbackHandle) -> Option<&CallbackRecord> {
        self.index.get(&handle).map(|&i| &self.callbacks[i])
    }
}

impl TraceSource for InMemoryTrace {
    fn list_callbacks(&self) -> Vec<CallbackHandle> {
        self.callbacks.iter().map(|record| record.handle).collect()
    }

    fn owner_info(&self, handle: CallbackHandle) -> Option<&str> {
        self.record(handle)?.owner_info.as_deref()
    }

    fn observations(&self, handle: CallbackHandle) -> &[Observation] {
        self.record(handle)
            .map(|record| record.observations.as_slice())
            .unwrap_or(&[])
    }

    fn symbol(&self, handle: CallbackHandle) -> Option<&str> {
        self.record(handle)?.symbol.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn obs(secs: i64, duration: f64) -> Observation {
        Observation::new(Utc.timestamp_opt(secs, 0).unwrap(), duration)
    }

    #[test]
    fn test_in_memory_trace() {
        let trace = InMemoryTrace::new()
            .with_callback(1, Some("node: A, period: 10 ms"), vec![obs(0, 0.1)])
            .unwrap()
            .with_callback(2, None, vec![])
            .unwrap();

        assert_eq!(trace.len(), 2);
        assert_eq!(
            trace.list_callbacks(),
            vec![CallbackHandle(1), CallbackHandle(2)]
        );
        assert_eq!(trace.owner_info(CallbackHandle(1)), Some("node: A, period: 10 ms"));
        assert_eq!(trace.owner_info(CallbackHandle(2)), None);
        assert!(trace.observations(CallbackHandle(2)).is_empty());
        assert!(trace.observations(CallbackHandle(99)).is_empty());

        let meta = trace.metadata(CallbackHandle(1)).unwrap();
        assert_eq!(meta.display_name(), "node_A");
        assert_eq!(meta.period, Some(0.01));
        assert!(trace.metadata(CallbackHandle(2)).is_none());
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let result = InMemoryTrace::new()
            .with_callback(1, None, vec![])
            .unwrap()
            .with_callback(1, None, vec![]);
        assert!(matches!(result, Err(AnalyzerError::InvalidTrace(_))));
    }

    #[test]
    fn test_observations_sorted() {
        let trace = InMemoryTrace::new()
            .with_callback(1, None, vec![obs(5, 0.1), obs(1, 0.2), obs(3, 0.3)])
            .unwrap();
        let secs: Vec<i64> = trace
            .observations(CallbackHandle(1))
            .iter()
            .map(|o| o.timestamp.timestamp())
            .collect();
        assert_eq!(secs, vec![1, 3, 5]);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "callbacks": [
                {
                    "handle": 7,
                    "symbol": "void Lidar::tick()",
                    "owner_info": "Timer -- node: Lidar, period: 100 ms",
                    "observations": [
                        { "timestamp": "2021-06-01T12:00:00Z", "duration": 0.001 },
                        { "timestamp": "2021-06-01T12:00:00.100Z", "duration": 0.002 }
                    ]
                },
                { "handle": 8 }
            ]
        }"#;

        let trace = InMemoryTrace::from_json_str(json).unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.symbol(CallbackHandle(7)), Some("void Lidar::tick()"));
        assert_eq!(trace.observations(CallbackHandle(7)).len(), 2);
        assert!(trace.observations(CallbackHandle(8)).is_empty());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            InMemoryTrace::from_json_str("{ not json"),
            Err(AnalyzerError::JsonError(_))
        ));
    }
}
