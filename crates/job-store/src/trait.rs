//! JobStore trait
//!
//! This trait abstracts the cluster's Job API so the orchestrator can be
//! exercised against an in-memory store in unit tests.
//! All async methods must be `Send` to work with Tokio's work-stealing runtime.

use crate::error::JobStoreError;
use k8s_openapi::api::batch::v1::Job;
use std::collections::BTreeMap;

/// How dependents (the Job's Pods) are handled when a Job is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationPolicy {
    /// Delete the Job immediately and let the garbage collector remove its Pods
    Background,
    /// Delete the Pods first, then the Job
    Foreground,
    /// Leave the Pods behind
    Orphan,
}

impl From<PropagationPolicy> for kube::api::PropagationPolicy {
    fn from(policy: PropagationPolicy) -> Self {
        match policy {
            PropagationPolicy::Background => kube::api::PropagationPolicy::Background,
            PropagationPolicy::Foreground => kube::api::PropagationPolicy::Foreground,
            PropagationPolicy::Orphan => kube::api::PropagationPolicy::Orphan,
        }
    }
}

/// Trait for Job API operations
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// List the Jobs in `namespace` carrying every label in `labels`
    async fn list(&self, namespace: &str, labels: &BTreeMap<String, String>) -> Result<Vec<Job>, JobStoreError>;

    /// Create a Job; the namespace is taken from the Job's metadata
    async fn create(&self, job: &Job) -> Result<Job, JobStoreError>;

    /// Delete an existing Job
    async fn delete(&self, job: &Job, propagation: PropagationPolicy) -> Result<(), JobStoreError>;
}
