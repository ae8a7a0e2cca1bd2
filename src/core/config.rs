use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Bound on the radix top-K selector.
    pub top: usize,
    /// Admission threshold for the one-word optimisation; also the
    /// candidate cap for unbounded mirror post-filtering.
    pub min_result_count: usize,
    /// Prefix length materialised for partial cursors.
    pub partial_load_limit: usize,
    /// Capacity of the query result cache; zero disables caching.
    pub cache_entries: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            top: 100,
            min_result_count: 3000,
            partial_load_limit: 10 * 1024,
            cache_entries: 256,
        }
    }
}

impl SearchConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::new(ErrorKind::Internal, format!("bad config: {}", e)))
    }
}
