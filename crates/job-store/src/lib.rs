//! Kubernetes Job store
//!
//! The narrow slice of the cluster's batch/v1 Job API that the job
//! orchestrator depends on: list by label, create, delete.
//!
//! # Example
//!
//! ```no_run
//! use job_store::{JobStore, KubeJobStore};
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let store = KubeJobStore::new(client);
//!
//! let labels = BTreeMap::from([("app".to_string(), "signer".to_string())]);
//! let jobs = store.list("default", &labels).await?;
//! println!("found {} jobs", jobs.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{label_selector, KubeJobStore};
pub use error::JobStoreError;
pub use store_trait::{JobStore, PropagationPolicy};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockJobStore;
