//! Kubernetes-backed JobStore

use crate::error::JobStoreError;
use crate::store_trait::{JobStore, PropagationPolicy};
use k8s_openapi::api::batch::v1::Job;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::debug;

/// JobStore backed by the Kubernetes batch/v1 Job API
#[derive(Clone)]
pub struct KubeJobStore {
    client: Client,
}

impl std::fmt::Debug for KubeJobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeJobStore").finish_non_exhaustive()
    }
}

impl KubeJobStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Job> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Build an equality-based label selector (`k1=v1,k2=v2`) from a label map
///
/// Keys come out sorted, so the same map always yields the same selector.
pub fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

fn job_namespace(job: &Job) -> Result<&str, JobStoreError> {
    job.metadata
        .namespace
        .as_deref()
        .ok_or_else(|| JobStoreError::InvalidJob("job has no namespace".to_string()))
}

#[async_trait::async_trait]
impl JobStore for KubeJobStore {
    async fn list(&self, namespace: &str, labels: &BTreeMap<String, String>) -> Result<Vec<Job>, JobStoreError> {
        let selector = label_selector(labels);
        debug!("Listing jobs in {} with selector {}", namespace, selector);

        let lp = ListParams::default().labels(&selector);
        let list = self.api(namespace).list(&lp).await?;
        Ok(list.items)
    }

    async fn create(&self, job: &Job) -> Result<Job, JobStoreError> {
        let namespace = job_namespace(job)?;
        let created = self.api(namespace).create(&PostParams::default(), job).await?;
        Ok(created)
    }

    async fn delete(&self, job: &Job, propagation: PropagationPolicy) -> Result<(), JobStoreError> {
        let namespace = job_namespace(job)?;
        let name = job.metadata
            .name
            .as_deref()
            .ok_or_else(|| JobStoreError::InvalidJob("job has no name".to_string()))?;

        let dp = DeleteParams {
            propagation_policy: Some(propagation.into()),
            ..Default::default()
        };
        self.api(namespace).delete(name, &dp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_selector_is_sorted() {
        let labels = BTreeMap::from([
            ("stage".to_string(), "sign".to_string()),
            ("module".to_string(), "kmod".to_string()),
        ]);
        assert_eq!(label_selector(&labels), "module=kmod,stage=sign");
    }

    #[test]
    fn test_label_selector_empty() {
        assert_eq!(label_selector(&BTreeMap::new()), "");
    }

    #[test]
    fn test_propagation_policy_conversion() {
        let policy: kube::api::PropagationPolicy = PropagationPolicy::Background.into();
        assert!(matches!(policy, kube::api::PropagationPolicy::Background));
    }
}
