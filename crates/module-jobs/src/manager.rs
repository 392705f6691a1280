//! Sign Job orchestration.
//!
//! One sync call drives a single (module, kernel, stage) unit one step along
//! `NoJob -> Created -> InProgress -> Completed`. The live Job is discovered by
//! its labels and compared to the desired Job through the hash annotation; a
//! changed configuration deletes the live Job and the next sync recreates it.

use crate::error::JobError;
use crate::hash::{annotate_hash, recorded_hash};
use crate::labels::job_labels;
use crate::resolver::relevant_sign;
use crate::result::SyncResult;
use crate::sign::{ImageContext, SignJobMaker};
use crds::{KernelMapping, Module};
use job_store::{label_selector, JobStore, PropagationPolicy};
use k8s_openapi::api::batch::v1::Job;
use kube::ResourceExt;
use tracing::{debug, info, warn};

/// Drives the signing Job of each unit to completion
pub struct SignJobManager {
    store: Box<dyn JobStore>,
    maker: Box<dyn SignJobMaker>,
}

impl std::fmt::Debug for SignJobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignJobManager")
            .field("stage", &self.maker.stage())
            .finish_non_exhaustive()
    }
}

impl SignJobManager {
    pub fn new(store: Box<dyn JobStore>, maker: Box<dyn SignJobMaker>) -> Self {
        Self { store, maker }
    }

    /// Stage this manager handles
    pub fn name(&self) -> &str {
        self.maker.stage()
    }

    /// Whether the unit needs signing at all
    pub fn should_run(&self, module: &Module, km: &KernelMapping) -> bool {
        module.sign().is_some() || km.sign.is_some()
    }

    /// Find the live Job of a unit.
    ///
    /// Returns `None` when no Job matches, and a consistency error when more
    /// than one does.
    pub async fn get_job(&self, module: &Module, target_kernel: &str) -> Result<Option<Job>, JobError> {
        let namespace = module.namespace().unwrap_or_default();
        let labels = job_labels(&module.name_any(), target_kernel, self.name());

        let mut jobs = self.store.list(&namespace, &labels).await?;
        match jobs.len() {
            0 => Ok(None),
            1 => Ok(jobs.pop()),
            count => Err(JobError::Consistency {
                selector: label_selector(&labels),
                count,
            }),
        }
    }

    /// Advance the unit by one step.
    pub async fn sync(&self, module: &Module, km: &KernelMapping, ctx: &ImageContext<'_>) -> Result<SyncResult, JobError> {
        let sign = relevant_sign(module, km).ok_or_else(|| {
            JobError::Configuration(format!(
                "no sign configuration for Module {} and kernel {}",
                module.name_any(),
                ctx.target_kernel
            ))
        })?;

        let mut desired = self.maker.make_job(module, &sign, ctx)?;
        let desired_hash = annotate_hash(&mut desired)?;

        let Some(live) = self.get_job(module, ctx.target_kernel).await? else {
            let created = self.store.create(&desired).await?;
            info!(
                "Created {} job {} for Module {} kernel {}",
                self.name(),
                created.name_any(),
                module.name_any(),
                ctx.target_kernel
            );
            return Ok(SyncResult::created());
        };

        let live_name = live.name_any();

        if recorded_hash(&live) != Some(desired_hash.as_str()) {
            info!(
                "{} job {} for Module {} is out of date, deleting it",
                self.name(),
                live_name,
                module.name_any()
            );
            if let Err(e) = self.store.delete(&live, PropagationPolicy::Background).await {
                warn!("Failed to delete outdated job {}: {}", live_name, e);
            }
            return Ok(SyncResult::in_progress());
        }

        let status = live.status.clone().unwrap_or_default();
        let active = status.active.unwrap_or(0);
        let succeeded = status.succeeded.unwrap_or(0);
        let failed = status.failed.unwrap_or(0);

        if succeeded == 1 {
            debug!("{} job {} succeeded", self.name(), live_name);
            Ok(SyncResult::completed())
        } else if active == 1 {
            debug!("{} job {} is running", self.name(), live_name);
            Ok(SyncResult::in_progress())
        } else if failed == 1 {
            Err(JobError::JobFailed(live_name))
        } else {
            Err(JobError::UnknownStatus {
                name: live_name,
                active,
                succeeded,
                failed,
            })
        }
    }
}
