//! Shared test fixtures: an instrumented store wrapping InMemoryStore

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use kube_churn::{InMemoryStore, LabelSelector, ResourceObject, ResourceStore, StoreError};
use tokio_util::sync::CancellationToken;

/// One observed update call
#[derive(Debug, Clone)]
pub struct UpdateCall {
    pub seq: usize,
    pub name: String,
    pub started: Instant,
    /// Whether the run's cancellation token was already cancelled when the call started
    pub after_cancel: bool,
}

/// InMemoryStore plus call counting, latency, and failure injection
pub struct InstrumentedStore {
    pub inner: InMemoryStore,
    create_delay: Duration,
    update_delay: Duration,
    fail_create_at: Option<usize>,
    fail_update_at: Option<usize>,
    watch: Option<CancellationToken>,

    creates: AtomicUsize,
    updates: AtomicUsize,
    in_flight_creates: AtomicUsize,
    peak_creates: AtomicUsize,
    update_log: Mutex<Vec<UpdateCall>>,
}

impl InstrumentedStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            create_delay: Duration::ZERO,
            update_delay: Duration::ZERO,
            fail_create_at: None,
            fail_update_at: None,
            watch: None,
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            in_flight_creates: AtomicUsize::new(0),
            peak_creates: AtomicUsize::new(0),
            update_log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    /// The `n`th create call (1-based) fails with a backend error
    pub fn fail_create_at(mut self, n: usize) -> Self {
        self.fail_create_at = Some(n);
        self
    }

    /// The `n`th update call (1-based) fails with a backend error
    pub fn fail_update_at(mut self, n: usize) -> Self {
        self.fail_update_at = Some(n);
        self
    }

    /// Record, for each update, whether `token` was already cancelled
    pub fn watching(mut self, token: CancellationToken) -> Self {
        self.watch = Some(token);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn peak_concurrent_creates(&self) -> usize {
        self.peak_creates.load(Ordering::SeqCst)
    }

    pub fn update_log(&self) -> Vec<UpdateCall> {
        self.update_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceStore for InstrumentedStore {
    async fn create(&self, object: ResourceObject) -> Result<ResourceObject, StoreError> {
        let seq = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight_creates.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_creates.fetch_max(now, Ordering::SeqCst);

        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        let result = if self.fail_create_at == Some(seq) {
            Err(StoreError::Backend(format!("injected create failure #{}", seq)))
        } else {
            self.inner.create(object).await
        };

        self.in_flight_creates.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list(&self, selector: &LabelSelector) -> Result<Vec<ResourceObject>, StoreError> {
        self.inner.list(selector).await
    }

    async fn update(&self, object: ResourceObject) -> Result<ResourceObject, StoreError> {
        let seq = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        let after_cancel = self.watch.as_ref().is_some_and(|t| t.is_cancelled());
        self.update_log.lock().unwrap().push(UpdateCall {
            seq,
            name: object.name.clone(),
            started: Instant::now(),
            after_cancel,
        });

        if !self.update_delay.is_zero() {
            tokio::time::sleep(self.update_delay).await;
        }

        if self.fail_update_at == Some(seq) {
            return Err(StoreError::Backend(format!("injected update failure #{}", seq)));
        }
        self.inner.update(object).await
    }
}

/// Store that fails every list call
pub struct BrokenListStore(pub InMemoryStore);

#[async_trait]
impl ResourceStore for BrokenListStore {
    async fn create(&self, object: ResourceObject) -> Result<ResourceObject, StoreError> {
        self.0.create(object).await
    }

    async fn list(&self, _selector: &LabelSelector) -> Result<Vec<ResourceObject>, StoreError> {
        Err(StoreError::Backend("list unavailable".to_string()))
    }

    async fn update(&self, object: ResourceObject) -> Result<ResourceObject, StoreError> {
        self.0.update(object).await
    }
}
