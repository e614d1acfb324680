// src/store/memory.rs
//
// In-memory ResourceStore with optimistic versioning. Backs the tests and
// `kube-churn --in-memory` smoke runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{LabelSelector, ResourceObject, ResourceStore, StoreError};

/// Single-namespace object map
///
/// Cloning shares the underlying map, so several handles can observe the same
/// namespace.
#[derive(Clone)]
pub struct InMemoryStore {
    namespace: String,
    objects: Arc<Mutex<HashMap<String, ResourceObject>>>,
    next_version: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            next_version: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Number of stored objects, regardless of labels
    pub fn len(&self) -> usize {
        self.objects.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current stored snapshot of `name`
    pub fn get(&self, name: &str) -> Option<ResourceObject> {
        self.objects.lock().ok()?.get(name).cloned()
    }

    fn bump_version(&self) -> String {
        self.next_version.fetch_add(1, Ordering::Relaxed).to_string()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ResourceObject>>, StoreError> {
        self.objects
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn create(&self, mut object: ResourceObject) -> Result<ResourceObject, StoreError> {
        let mut objects = self.lock()?;
        if objects.contains_key(&object.name) {
            return Err(StoreError::AlreadyExists { name: object.name });
        }

        object.namespace = Some(self.namespace.clone());
        object.version = Some(self.bump_version());
        objects.insert(object.name.clone(), object.clone());
        Ok(object)
    }

    async fn list(&self, selector: &LabelSelector) -> Result<Vec<ResourceObject>, StoreError> {
        let objects = self.lock()?;
        let mut matched: Vec<ResourceObject> = objects
            .values()
            .filter(|o| selector.matches(&o.labels))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn update(&self, mut object: ResourceObject) -> Result<ResourceObject, StoreError> {
        let mut objects = self.lock()?;
        let current = objects
            .get(&object.name)
            .ok_or_else(|| StoreError::NotFound { name: object.name.clone() })?;

        // No version on the request means an unconditional replace
        if let Some(expected) = &object.version {
            if current.version.as_ref() != Some(expected) {
                return Err(StoreError::Conflict { name: object.name });
            }
        }

        object.namespace = Some(self.namespace.clone());
        object.version = Some(self.bump_version());
        objects.insert(object.name.clone(), object.clone());
        Ok(object)
    }
}
