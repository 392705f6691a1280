//! Mock JobStore for unit testing
//!
//! Stores Jobs in memory and records every mutating call so tests can assert
//! on what the orchestrator did, not only on what it returned.

use crate::error::JobStoreError;
use crate::store_trait::{JobStore, PropagationPolicy};
use k8s_openapi::api::batch::v1::{Job, JobStatus};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MockState {
    /// (namespace, name) -> Job
    jobs: BTreeMap<(String, String), Job>,
    next_id: u64,
    list_calls: usize,
    created: Vec<Job>,
    deleted: Vec<(String, PropagationPolicy)>,
    fail_list: Option<String>,
    fail_create: Option<String>,
    fail_delete: Option<String>,
}

/// In-memory JobStore
#[derive(Debug, Clone, Default)]
pub struct MockJobStore {
    state: Arc<Mutex<MockState>>,
}

impl MockJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a Job to the store without recording a create call (for test setup)
    ///
    /// Jobs without a name get one derived from `generateName`.
    pub fn add_job(&self, mut job: Job) -> Job {
        let mut state = self.state();
        if job.metadata.name.is_none() {
            state.next_id += 1;
            job.metadata.name = Some(generated_name(&job, state.next_id));
        }
        let key = job_key(&job);
        state.jobs.insert(key, job.clone());
        job
    }

    /// All Jobs currently stored
    pub fn jobs(&self) -> Vec<Job> {
        self.state().jobs.values().cloned().collect()
    }

    /// Overwrite the status of a stored Job (simulates the Job controller)
    pub fn set_job_status(&self, namespace: &str, name: &str, status: JobStatus) -> Result<(), JobStoreError> {
        let mut state = self.state();
        let job = state.jobs
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| JobStoreError::NotFound(format!("Job {}/{} not found", namespace, name)))?;
        job.status = Some(status);
        Ok(())
    }

    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    /// Jobs passed to `create`, in call order
    pub fn created(&self) -> Vec<Job> {
        self.state().created.clone()
    }

    /// Names and propagation policies passed to `delete`, in call order
    pub fn deleted(&self) -> Vec<(String, PropagationPolicy)> {
        self.state().deleted.clone()
    }

    /// Make every subsequent `list` fail
    pub fn fail_list_with(&self, message: impl Into<String>) {
        self.state().fail_list = Some(message.into());
    }

    /// Make every subsequent `create` fail
    pub fn fail_create_with(&self, message: impl Into<String>) {
        self.state().fail_create = Some(message.into());
    }

    /// Make every subsequent `delete` fail (the call is still recorded)
    pub fn fail_delete_with(&self, message: impl Into<String>) {
        self.state().fail_delete = Some(message.into());
    }
}

fn job_key(job: &Job) -> (String, String) {
    (
        job.metadata.namespace.clone().unwrap_or_default(),
        job.metadata.name.clone().unwrap_or_default(),
    )
}

fn generated_name(job: &Job, id: u64) -> String {
    let prefix = job.metadata.generate_name.as_deref().unwrap_or("job-");
    format!("{}{:05x}", prefix, id)
}

fn matches_labels(job: &Job, labels: &BTreeMap<String, String>) -> bool {
    let job_labels = job.metadata.labels.as_ref();
    labels.iter().all(|(k, v)| {
        job_labels
            .and_then(|l| l.get(k))
            .is_some_and(|value| value == v)
    })
}

#[async_trait::async_trait]
impl JobStore for MockJobStore {
    async fn list(&self, namespace: &str, labels: &BTreeMap<String, String>) -> Result<Vec<Job>, JobStoreError> {
        let mut state = self.state();
        state.list_calls += 1;
        if let Some(message) = &state.fail_list {
            return Err(JobStoreError::Injected(message.clone()));
        }

        Ok(state.jobs
            .iter()
            .filter(|((ns, _), job)| ns == namespace && matches_labels(job, labels))
            .map(|(_, job)| job.clone())
            .collect())
    }

    async fn create(&self, job: &Job) -> Result<Job, JobStoreError> {
        let mut state = self.state();
        state.created.push(job.clone());
        if let Some(message) = &state.fail_create {
            return Err(JobStoreError::Injected(message.clone()));
        }
        if job.metadata.namespace.is_none() {
            return Err(JobStoreError::InvalidJob("job has no namespace".to_string()));
        }

        let mut stored = job.clone();
        state.next_id += 1;
        let id = state.next_id;
        if stored.metadata.name.is_none() {
            stored.metadata.name = Some(generated_name(&stored, id));
        }
        stored.metadata.uid = Some(format!("mock-uid-{}", id));

        let key = job_key(&stored);
        if state.jobs.contains_key(&key) {
            return Err(JobStoreError::Conflict(format!("Job {}/{} already exists", key.0, key.1)));
        }
        state.jobs.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, job: &Job, propagation: PropagationPolicy) -> Result<(), JobStoreError> {
        let mut state = self.state();
        let key = job_key(job);
        state.deleted.push((key.1.clone(), propagation));
        if let Some(message) = &state.fail_delete {
            return Err(JobStoreError::Injected(message.clone()));
        }

        state.jobs
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| JobStoreError::NotFound(format!("Job {}/{} not found", key.0, key.1)))
    }
}
