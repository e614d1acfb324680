// src/run.rs
//
// Top-level driver: create phase, then update phase on its output.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ChurnConfig;
use crate::create::create_batch;
use crate::error::ChurnResult;
use crate::payload::RandomPayloadSource;
use crate::store::{ObjectCollection, ResourceStore};
use crate::update::run_forever;

/// Populate the store, then churn the listed objects until `cancel` fires or a store call fails
///
/// `cancel` only governs the update phase; the create phase always runs to
/// completion or to its first error.
pub async fn run(
    store: Arc<dyn ResourceStore>,
    config: &ChurnConfig,
    source: Arc<dyn RandomPayloadSource>,
    cancel: CancellationToken,
) -> ChurnResult<ObjectCollection> {
    let objects = create_batch(store.clone(), config, source.clone()).await?;

    info!("Churning {} objects in namespace {}", objects.len(), config.namespace);
    run_forever(store, objects, config, source, cancel).await
}
