// src/lib.rs

pub mod config;
pub mod constants;
pub mod create; // Create phase: bounded-parallel object creation
pub mod error;
pub mod kubeconfig;
pub mod payload;
pub mod run;
pub mod store;
pub mod update; // Update phase: partitioned churn with first-error cancellation

pub use config::ChurnConfig;
pub use error::{ChurnError, ChurnResult};
pub use payload::{RandomPayloadSource, SeededSource, ThreadRngSource};
pub use store::{InMemoryStore, KubeSecretStore, LabelSelector, ObjectCollection, ResourceObject, ResourceStore, StoreError};
pub use update::Partition;
