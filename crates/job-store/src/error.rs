//! Job store errors

use thiserror::Error;

/// Errors that can occur when talking to the Job API
#[derive(Debug, Error)]
pub enum JobStoreError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// The Job is missing metadata the operation requires
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// A Job with the same name already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Job not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failure injected by a test double
    #[error("Injected failure: {0}")]
    Injected(String),
}
