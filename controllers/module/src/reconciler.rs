//! Module reconciliation.
//!
//! A Module is reconciled by syncing the sign stage of each of its kernel
//! mappings. Every mapping is synced even when an earlier one fails, so that a
//! broken kernel does not hold back the others; the first error is returned.

use crate::backoff::BackoffStates;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crds::Module;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use module_jobs::resolver::relevant_sign;
use module_jobs::{ImageContext, JobError, SignJobManager};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Reconciles Module resources.
#[derive(Debug)]
pub struct Reconciler {
    manager: SignJobManager,
    requeue_interval: Duration,
    backoff: BackoffStates,
    metrics: Metrics,
}

/// Backoff and logging key of a Module
pub fn module_key(module: &Module) -> String {
    object_key(module.namespace().as_deref(), &module.name_any())
}

fn object_key(namespace: Option<&str>, name: &str) -> String {
    format!("{}/{}", namespace.unwrap_or_default(), name)
}

impl Reconciler {
    pub fn new(manager: SignJobManager, requeue_interval: Duration, backoff: BackoffStates, metrics: Metrics) -> Self {
        Self {
            manager,
            requeue_interval,
            backoff,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn reconcile_module(&self, module: &Module) -> Result<Action, ControllerError> {
        let started = Instant::now();
        let key = module_key(module);
        let mut requeue = false;
        let mut first_error: Option<JobError> = None;

        for km in module.kernel_mappings() {
            if km.literal.is_empty() {
                debug!("Module {}: skipping kernel mapping without a literal kernel version", key);
                continue;
            }
            if !self.manager.should_run(module, km) {
                debug!("Module {}: nothing to {} for kernel {}", key, self.manager.name(), km.literal);
                continue;
            }

            let push = relevant_sign(module, km).and_then(|s| s.push).unwrap_or(true);
            let ctx = ImageContext {
                target_kernel: &km.literal,
                previous_image: None,
                target_image: km.resolved_container_image(module),
                push,
            };

            match self.manager.sync(module, km, &ctx).await {
                Ok(result) => {
                    self.metrics.sync_finished(&result.status.to_string());
                    info!("Module {}: {} for kernel {} is {}", key, self.manager.name(), km.literal, result.status);
                    requeue |= result.requeue;
                }
                Err(e) => {
                    error!("Module {}: {} for kernel {} failed: {}", key, self.manager.name(), km.literal, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        self.metrics.observe_reconcile(started.elapsed().as_secs_f64());

        if let Some(e) = first_error {
            return Err(e.into());
        }

        self.backoff.reset(&key);
        if requeue {
            Ok(Action::requeue(self.requeue_interval))
        } else {
            Ok(Action::await_change())
        }
    }

    /// Requeue delay after a failed reconcile, growing with consecutive failures
    pub fn error_policy(&self, module: &Module, error: &ControllerError) -> Action {
        let key = module_key(module);
        let (delay, error_count) = self.backoff.record_error(&key);
        self.metrics.reconcile_failed(error_kind(error));
        warn!(
            "Module {} failed {} time(s) in a row, retrying in {:?}: {}",
            key, error_count, delay, error
        );
        Action::requeue(delay)
    }

    /// Drop the backoff state of a Module that no longer exists
    pub fn forget_module(&self, namespace: Option<&str>, name: &str) {
        self.backoff.reset(&object_key(namespace, name));
    }

    #[cfg(test)]
    pub(crate) fn error_count(&self, key: &str) -> u32 {
        self.backoff.error_count(key)
    }
}

/// Metric label for an error
fn error_kind(error: &ControllerError) -> &'static str {
    match error {
        ControllerError::Job(JobError::Configuration(_)) => "configuration",
        ControllerError::Job(JobError::OwnerReference(_)) => "owner_reference",
        ControllerError::Job(JobError::Store(_)) => "store",
        ControllerError::Job(JobError::Consistency { .. }) => "consistency",
        ControllerError::Job(JobError::JobFailed(_)) => "job_failed",
        ControllerError::Job(JobError::UnknownStatus { .. }) => "unknown_status",
        ControllerError::Job(JobError::Serialization(_)) => "serialization",
        ControllerError::Kube(_) => "kube",
        ControllerError::InvalidConfig(_) => "invalid_config",
        ControllerError::Metrics(_) => "metrics",
        ControllerError::Server(_) => "server",
        ControllerError::Watch(_) => "watch",
    }
}
