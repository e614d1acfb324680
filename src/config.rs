// src/config.rs
//
// Run settings shared by the create and update phases.

use crate::constants::{DEFAULT_NAMESPACE, MARKER_LABEL_KEY, MARKER_LABEL_VALUE, OBJECTS_TOTAL, WORKERS};
use crate::store::LabelSelector;

/// Load shape for one run
///
/// The binary always runs with [`ChurnConfig::default`]; the fields exist so
/// tests can shrink the pool and the object count.
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// Namespace the store is bound to
    pub namespace: String,

    /// Pool width for creates and partition width for updates
    pub workers: usize,

    /// Objects to create before churning
    pub total: usize,

    /// Label stamped on every created object and used to list them back
    pub marker: LabelSelector,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            workers: WORKERS,
            total: OBJECTS_TOTAL,
            marker: LabelSelector::new(MARKER_LABEL_KEY, MARKER_LABEL_VALUE),
        }
    }
}

impl ChurnConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    pub fn with_marker(mut self, marker: LabelSelector) -> Self {
        self.marker = marker;
        self
    }
}
