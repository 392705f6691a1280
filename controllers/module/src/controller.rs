//! Main controller implementation.
//!
//! Wires the Kubernetes client, the job store and the configured signer into a
//! `Reconciler`, then runs the Module watcher and the probe server side by side.

use crate::backoff::BackoffStates;
use crate::config::Config;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::probes::{self, ProbeState, Readiness};
use crate::reconciler::Reconciler;
use crate::watcher::watch_modules;
use crds::Module;
use job_store::KubeJobStore;
use k8s_openapi::api::batch::v1::Job;
use kube::{Api, Client};
use module_jobs::SignJobManager;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for Module resources.
pub struct Controller {
    module_watcher: JoinHandle<Result<(), ControllerError>>,
    probe_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing Module Controller");

        let client = Client::try_default().await?;

        let (module_api, job_api): (Api<Module>, Api<Job>) = match config.watch_namespace.as_deref() {
            Some(ns) => (Api::namespaced(client.clone(), ns), Api::namespaced(client.clone(), ns)),
            None => (Api::all(client.clone()), Api::all(client.clone())),
        };

        let manager = SignJobManager::new(
            Box::new(KubeJobStore::new(client)),
            config.signer_mode.maker(config.signer_image.clone()),
        );
        let metrics = Metrics::new()?;
        let reconciler = Arc::new(Reconciler::new(
            manager,
            config.requeue_interval,
            BackoffStates::new(config.backoff_min_minutes, config.backoff_max_minutes),
            metrics.clone(),
        ));

        let ready = Readiness::default();
        let probe_server = tokio::spawn(probes::serve(
            config.probe_addr,
            ProbeState::new(metrics, ready.clone()),
        ));
        let module_watcher = tokio::spawn(watch_modules(module_api, job_api, reconciler, ready));

        Ok(Self {
            module_watcher,
            probe_server,
        })
    }

    /// Run until the watcher or the probe server exits; neither should.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Module Controller running");

        tokio::select! {
            result = &mut self.module_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Module watcher panicked: {}", e)))??;
                Err(ControllerError::Watch("Module watcher stopped".to_string()))
            }
            result = &mut self.probe_server => {
                result.map_err(|e| ControllerError::Watch(format!("Probe server panicked: {}", e)))??;
                Err(ControllerError::Watch("Probe server stopped".to_string()))
            }
        }
    }
}
