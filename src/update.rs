//! Update phase: partitioned, never-ending object churn
//!
//! The listed collection is cut into contiguous `[from, to)` partitions of
//! `workers` slots each (the last may be shorter). Each partition's slots are
//! moved into exactly one tokio task, so no slot is ever reachable from two
//! tasks and no lock guards the collection.
//!
//! Each task loops forever: pick a random slot in its partition, replace the
//! object's payload, send it to the store, and keep the returned snapshot.
//! The first failing task cancels the shared token; siblings stop at their
//! next iteration boundary. In-flight updates are left to complete.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ChurnConfig;
use crate::constants::UPDATE_YIELD_INTERVAL;
use crate::error::{ChurnError, ChurnResult};
use crate::payload::RandomPayloadSource;
use crate::store::{ObjectCollection, ResourceObject, ResourceStore, StoreError};

/// Half-open index range `[from, to)` owned by one mutator task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    pub from: usize,
    pub to: usize,
}

impl Partition {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.to == self.from
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index range [{}, {})", self.from, self.to)
    }
}

/// Split `[0, total)` into consecutive ranges of `width`; the last may be shorter
///
/// 450 slots at width 200 -> `[0,200) [200,400) [400,450)`.
pub fn partitions(total: usize, width: usize) -> ChurnResult<Vec<Partition>> {
    if width == 0 {
        return Err(ChurnError::InvalidWorkers);
    }
    Ok((0..total)
        .step_by(width)
        .map(|from| Partition::new(from, (from + width).min(total)))
        .collect())
}

/// Per-task state machine
#[derive(Debug)]
enum TaskState {
    Running,
    /// `None` for a clean stop after cancellation
    Stopped(Option<StoreError>),
}

/// What a task hands back once it stops
struct TaskOutcome {
    partition: Partition,
    slots: Vec<ResourceObject>,
    updates: u64,
    failure: Option<(Instant, StoreError)>,
}

struct MutatorTask {
    partition: Partition,
    slots: Vec<ResourceObject>,
    store: Arc<dyn ResourceStore>,
    source: Arc<dyn RandomPayloadSource>,
    cancel: CancellationToken,
    updates: u64,
}

impl MutatorTask {
    /// One iteration: random slot -> fresh payload -> update -> keep snapshot
    async fn step(&mut self) -> TaskState {
        if self.cancel.is_cancelled() {
            return TaskState::Stopped(None);
        }

        // Partitions are never empty, so index() always returns Some here
        let Some(offset) = self.source.index(self.slots.len()) else {
            return TaskState::Stopped(None);
        };

        let mut object = self.slots[offset].clone();
        object.payload = self.source.payload();

        match self.store.update(object).await {
            Ok(updated) => {
                self.slots[offset] = updated;
                self.updates += 1;
                TaskState::Running
            }
            Err(e) => {
                self.cancel.cancel();
                TaskState::Stopped(Some(e))
            }
        }
    }

    async fn run(mut self) -> TaskOutcome {
        loop {
            match self.step().await {
                TaskState::Running => {
                    if self.updates.is_multiple_of(UPDATE_YIELD_INTERVAL) {
                        tokio::task::yield_now().await;
                    }
                }
                TaskState::Stopped(err) => {
                    let failure = err.map(|e| (Instant::now(), e));
                    debug!(
                        "Stopped updating {} after {} updates{}",
                        self.partition,
                        self.updates,
                        if failure.is_some() { " (failed)" } else { "" }
                    );
                    return TaskOutcome {
                        partition: self.partition,
                        slots: self.slots,
                        updates: self.updates,
                        failure,
                    };
                }
            }
        }
    }
}

/// Churn `collection` until `cancel` fires or any update fails
///
/// Spawns one task per partition of width `config.workers`. On a clean
/// cancellation the collection comes back with every slot holding the latest
/// snapshot its task saw. On failure the earliest store error is returned and
/// later sibling failures are only logged.
///
/// An empty collection has no partitions and returns immediately.
pub async fn run_forever(
    store: Arc<dyn ResourceStore>,
    collection: ObjectCollection,
    config: &ChurnConfig,
    source: Arc<dyn RandomPayloadSource>,
    cancel: CancellationToken,
) -> ChurnResult<ObjectCollection> {
    let parts = partitions(collection.len(), config.workers)?;
    if parts.is_empty() {
        warn!("No objects to update");
        return Ok(collection);
    }

    // Hand each partition its own slots, cut from the back so offsets stay valid
    let mut rest = collection;
    let mut owned = Vec::with_capacity(parts.len());
    for part in parts.iter().rev() {
        owned.push((*part, rest.split_off(part.from)));
    }
    owned.reverse();

    let mut futs = FuturesUnordered::new();
    for (partition, slots) in owned {
        info!("Updating objects in the index range from {} to {}", partition.from, partition.to);
        let task = MutatorTask {
            partition,
            slots,
            store: store.clone(),
            source: source.clone(),
            cancel: cancel.clone(),
            updates: 0,
        };
        futs.push(tokio::spawn(task.run()));
    }

    let mut outcomes: Vec<TaskOutcome> = Vec::with_capacity(parts.len());
    let mut first_failure: Option<(Instant, ChurnError)> = None;
    let mut panicked: Option<ChurnError> = None;

    while let Some(joined) = futs.next().await {
        match joined {
            Ok(mut outcome) => {
                if let Some((at, e)) = outcome.failure.take() {
                    let err = ChurnError::Mutation {
                        partition: outcome.partition,
                        source: e,
                    };
                    match &first_failure {
                        Some((first_at, _)) if *first_at <= at => {
                            debug!("Ignoring later failure: {}", err);
                        }
                        _ => first_failure = Some((at, err)),
                    }
                }
                outcomes.push(outcome);
            }
            Err(e) => {
                cancel.cancel();
                if panicked.is_none() {
                    panicked = Some(ChurnError::TaskPanicked(e.to_string()));
                }
            }
        }
    }

    let total_updates: u64 = outcomes.iter().map(|o| o.updates).sum();
    info!("Update phase stopped after {} updates", total_updates);

    if let Some((_, e)) = first_failure {
        return Err(e);
    }
    if let Some(e) = panicked {
        return Err(e);
    }

    outcomes.sort_by_key(|o| o.partition.from);
    Ok(outcomes.into_iter().flat_map(|o| o.slots).collect())
}
