//! Kernel module build/sign job orchestration
//!
//! Turns a `Module` and one of its `KernelMapping`s into a one-shot Kubernetes
//! Job and drives that Job to completion:
//!
//! - [`resolver`]: merges Module defaults with KernelMapping overrides
//! - [`sign`]: builds the desired signing Job from a resolved `Sign`
//! - [`manager`]: discovers, creates, replaces and reports on the live Job
//!
//! Jobs are immutable once created. A configuration change is detected through
//! a hash of the desired Job spec stored in an annotation, and is applied by
//! deleting the live Job so that the next sync recreates it.

pub mod error;
pub mod hash;
pub mod labels;
pub mod manager;
pub mod resolver;
pub mod result;
pub mod sign;

pub use error::JobError;
pub use manager::SignJobManager;
pub use result::{SyncResult, SyncStatus};
pub use sign::{ImageContext, InClusterSigner, PostBuildSigner, SignJobMaker, SignerMode};
