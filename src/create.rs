//! Create phase: bulk object creation with a bounded worker pool
//!
//! Every unit of work synthesizes one labeled object and creates it in the
//! store. At most `workers` creates are in flight at once (semaphore-bounded
//! tokio tasks). The first failure is fatal: units that have not started yet
//! are skipped, in-flight ones are drained, and nothing is rolled back.
//!
//! Once all creates succeed the namespace is re-listed through the marker
//! label, and that listing is the collection the update phase works on.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::ChurnConfig;
use crate::constants::IDENTIFIER_LEN;
use crate::error::{ChurnError, ChurnResult};
use crate::payload::RandomPayloadSource;
use crate::store::{LabelSelector, ObjectCollection, ResourceObject, ResourceStore};

/// How `total` creates spread across a pool of `workers`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub total: usize,
    pub workers: usize,
}

impl BatchPlan {
    pub fn new(total: usize, workers: usize) -> Self {
        Self { total, workers }
    }

    /// Size of each full-pool wave; the last one may be partial
    ///
    /// 10 objects over 4 workers -> `[4, 4, 2]`. Empty when either side is 0.
    pub fn waves(&self) -> Vec<usize> {
        if self.workers == 0 {
            return Vec::new();
        }
        (0..self.total)
            .step_by(self.workers)
            .map(|start| self.workers.min(self.total - start))
            .collect()
    }
}

/// Build one unsaved object: random name, marker label, random payload
pub fn new_object(source: &dyn RandomPayloadSource, marker: &LabelSelector) -> ResourceObject {
    ResourceObject::new(source.identifier(IDENTIFIER_LEN))
        .with_label(marker.key.clone(), marker.value.clone())
        .with_payload(source.payload())
}

/// Create `config.total` objects, then return everything carrying the marker label
///
/// # Errors
/// - [`ChurnError::Creation`] for the first failed create
/// - [`ChurnError::Listing`] if the follow-up list fails
/// - [`ChurnError::InvalidWorkers`] when `config.workers == 0`
pub async fn create_batch(
    store: Arc<dyn ResourceStore>,
    config: &ChurnConfig,
    source: Arc<dyn RandomPayloadSource>,
) -> ChurnResult<ObjectCollection> {
    if config.workers == 0 {
        return Err(ChurnError::InvalidWorkers);
    }

    let n = config.total;
    let plan = BatchPlan::new(n, config.workers);
    info!(
        "Creating {} objects with {} workers ({} waves)",
        n,
        config.workers,
        plan.waves().len()
    );

    let pb = ProgressBar::new(n as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} objects {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(format!("{} workers", config.workers));

    let sem = Arc::new(Semaphore::new(config.workers));
    let abort = CancellationToken::new();
    let mut futs = FuturesUnordered::new();

    for index in 0..n {
        let sem = sem.clone();
        let store = store.clone();
        let source = source.clone();
        let abort = abort.clone();
        let pb = pb.clone();
        let marker = config.marker.clone();

        futs.push(tokio::spawn(async move {
            // The semaphore is never closed, so acquire only fails if it is dropped
            let Ok(_permit) = sem.acquire_owned().await else {
                return Ok(false);
            };
            if abort.is_cancelled() {
                return Ok(false);
            }

            let object = new_object(source.as_ref(), &marker);
            let name = object.name.clone();
            match store.create(object).await {
                Ok(_) => {
                    debug!("Created object #{} ({})", index, name);
                    pb.inc(1);
                    Ok(true)
                }
                Err(e) => {
                    abort.cancel();
                    Err(ChurnError::Creation { index, source: e })
                }
            }
        }));
    }

    let mut created = 0usize;
    let mut first_error: Option<ChurnError> = None;

    while let Some(joined) = futs.next().await {
        match joined {
            Ok(Ok(true)) => created += 1,
            Ok(Ok(false)) => {}
            Ok(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(e) => {
                abort.cancel();
                if first_error.is_none() {
                    first_error = Some(ChurnError::TaskPanicked(e.to_string()));
                }
            }
        }
    }
    pb.finish_and_clear();

    if let Some(e) = first_error {
        error!("Create phase aborted after {} of {} objects: {}", created, n, e);
        return Err(e);
    }

    let objects = store.list(&config.marker).await.map_err(ChurnError::Listing)?;
    info!("There are {} objects", objects.len());
    if objects.len() != n {
        debug!(
            "Listed {} objects labeled {} but created {}; namespace is shared",
            objects.len(),
            config.marker,
            n
        );
    }

    Ok(objects)
}
