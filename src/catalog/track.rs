use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single catalog track as delivered by the ingestion boundary.
///
/// Identified by its ISRC. Numeric popularity metrics arrive already parsed,
/// keyed by metric name; a metric the source row did not carry is simply
/// absent from the map. Descriptive fields are never used in similarity math.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Track {
    pub isrc: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// ISO-8601 release date, if the source row had one.
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub is_explicit: bool,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
}

impl Track {
    /// Numeric value of a named metric, 0.0 when absent.
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(0.0)
    }
}
