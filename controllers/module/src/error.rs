//! Controller-specific error types.

use module_jobs::JobError;
use thiserror::Error;
use kube::Error as KubeError;

/// Errors that can occur in the Module Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Signing Job sync failed
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Probes server failed
    #[error("Probe server error: {0}")]
    Server(#[from] std::io::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
