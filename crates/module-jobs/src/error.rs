//! Job orchestration errors.

use job_store::JobStoreError;
use thiserror::Error;

/// Errors that can occur while resolving, building or syncing a Job.
///
/// None of these are retried internally; the caller decides when to sync again.
#[derive(Debug, Error)]
pub enum JobError {
    /// The resolved configuration cannot produce a Job (e.g. no image to sign)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The Module cannot be set as the Job's controller owner
    #[error("Could not set the owner reference: {0}")]
    OwnerReference(String),

    /// Job API list/create/delete failure
    #[error("Job store error: {0}")]
    Store(#[from] JobStoreError),

    /// More than one Job carries the labels of a single logical unit
    #[error("Expected 0 or 1 job matching {selector}, got {count}")]
    Consistency { selector: String, count: usize },

    /// The live Job reports a failed run
    #[error("Job {0} failed")]
    JobFailed(String),

    /// The live Job's status counters match no known state
    #[error("Unknown status for job {name}: active={active}, succeeded={succeeded}, failed={failed}")]
    UnknownStatus {
        name: String,
        active: i32,
        succeeded: i32,
        failed: i32,
    },

    /// The desired Job spec could not be encoded for hashing
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
