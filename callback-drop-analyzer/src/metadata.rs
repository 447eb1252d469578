//! Callback metadata extraction
//!
//! Tracers describe a callback's owner with a free-text string such as
//! `"Timer -- node: FrontLidarDriver, period: 100 ms"` or
//! `"Subscription -- node: PointsTransformerFront, topic: /FrontLidarDriver"`.
//! That text is a legacy wire format: it is scanned exactly once here and
//! turned into a [`CallbackMetadata`] record. Nothing downstream looks at the
//! raw string again, except for the exclusion check.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

const NODE_MARKER: &str = "node: ";
const TOPIC_MARKER: &str = "topic: /";
const PERIOD_MARKER: &str = "period: ";

/// Name used for callbacks whose owner-info is missing entirely
pub const UNKNOWN_OWNER: &str = "[unknown]";

/// Structured view of a callback's owner-info
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbackMetadata {
    /// Owning node name
    pub node: Option<String>,
    /// Topic name without its leading slash
    pub topic: Option<String>,
    /// Declared period in seconds
    pub period: Option<f64>,
}

impl CallbackMetadata {
    /// Parse the legacy owner-info text
    ///
    /// Unparseable fields are left empty; this never fails.
    pub fn parse(owner_info: &str) -> Self {
        let node = after_marker(owner_info, NODE_MARKER).map(|rest| {
            let end = rest.find(',').unwrap_or(rest.len());
            rest[..end].to_string()
        });

        let topic = after_marker(owner_info, TOPIC_MARKER).map(str::to_string);

        let period = after_marker(owner_info, PERIOD_MARKER).and_then(|rest| {
            let token = rest.split(' ').next().unwrap_or_default();
            match token.parse::<f64>() {
                // Declared in milliseconds
                Ok(ms) => Some(ms / 1000.0),
                Err(e) => {
                    log::warn!(
                        "Ignoring unparseable period {:?} in owner info {:?}: {}",
                        token,
                        owner_info,
                        e
                    );
                    None
                }
            }
        });

        Self { node, topic, period }
    }

    /// Human-readable callback name, e.g. `node_Foo_topic_bar`
    ///
    /// Empty when the owner-info carried neither a node nor a topic.
    pub fn display_name(&self) -> String {
        let mut name = String::new();
        if let Some(node) = &self.node {
            name.push_str("node_");
            name.push_str(node);
        }
        if let Some(topic) = &self.topic {
            name.push_str("_topic_");
            name.push_str(topic);
        }
        name
    }

    /// Declared period in seconds, 0 when absent
    pub fn period_seconds(&self) -> f64 {
        self.period.unwrap_or(0.0)
    }
}

impl FromStr for CallbackMetadata {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Check whether owner-info contains any of the exclusion markers
pub fn is_excluded(owner_info: &str, markers: &[String]) -> bool {
    markers.iter().any(|marker| owner_info.contains(marker.as_str()))
}

fn after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.find(marker).map(|index| &text[index + marker.len()..])
}
