//! Resource store abstraction
//!
//! The load generator only ever talks to the store through [`ResourceStore`]:
//! - `create` to populate the namespace
//! - `list` with an equality label selector to get the authoritative set
//! - `update` to replace an object wholesale (optimistic, version-checked)
//!
//! Two backends live here: an in-memory map for tests and smoke runs, and a
//! Kubernetes Secrets client for real clusters.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub mod kube;
pub mod memory;

pub use kube::KubeSecretStore;
pub use memory::InMemoryStore;

/// Opaque object data: key -> raw bytes
pub type Payload = BTreeMap<String, Vec<u8>>;

/// Objects returned by one `list` call, in store order; never resized afterwards
pub type ObjectCollection = Vec<ResourceObject>;

/// Local snapshot of one stored object
///
/// The store owns the object; this is a cached copy. Mutations only take
/// effect by sending the object back through [`ResourceStore::update`] and
/// replacing the local copy with the returned snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceObject {
    pub name: String,
    pub namespace: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub payload: Payload,
    /// Store-assigned version token; `None` until the store has seen the object
    pub version: Option<String>,
    /// Backend-native document this snapshot was decoded from, if any
    ///
    /// Lets a backend send fields it does not model back unchanged on update.
    pub raw: Option<serde_json::Value>,
}

impl ResourceObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// Equality label filter (`key=value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    pub key: String,
    pub value: String,
}

impl LabelSelector {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.get(&self.key).is_some_and(|v| *v == self.value)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Failures reported by a store backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("object {name:?} already exists")]
    AlreadyExists { name: String },

    /// Update carried a stale version
    #[error("conflict updating {name:?}: object has been modified")]
    Conflict { name: String },

    #[error("object {name:?} not found")]
    NotFound { name: String },

    /// Transport, auth, or any other backend failure
    #[error("store error: {0}")]
    Backend(String),
}

/// Namespaced key-value resource store
///
/// Implementations are bound to a single namespace at construction time.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Create a new object; fails with `AlreadyExists` on a name collision
    async fn create(&self, object: ResourceObject) -> Result<ResourceObject, StoreError>;

    /// All objects whose labels satisfy `selector`
    async fn list(&self, selector: &LabelSelector) -> Result<Vec<ResourceObject>, StoreError>;

    /// Full-object replace keyed by name; fails with `Conflict` if the version is stale
    async fn update(&self, object: ResourceObject) -> Result<ResourceObject, StoreError>;
}
