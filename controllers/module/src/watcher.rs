//! Module watcher.
//!
//! Runs a `kube_runtime::Controller` over `Module` resources. Jobs are watched
//! as owned objects, so a Job status change requeues its owning Module.

use crate::error::ControllerError;
use crate::probes::Readiness;
use crate::reconciler::Reconciler;
use crds::Module;
use futures::StreamExt;
use k8s_openapi::api::batch::v1::Job;
use kube::Api;
use kube_runtime::{Controller, watcher, controller::{Action, Config as ControllerConfig, Error as RunError}};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

async fn reconcile(module: Arc<Module>, reconciler: Arc<Reconciler>) -> Result<Action, ControllerError> {
    debug!("Reconciling Module {:?}/{:?}", module.metadata.namespace, module.metadata.name);
    reconciler.reconcile_module(&module).await
}

fn error_policy(module: Arc<Module>, error: &ControllerError, reconciler: Arc<Reconciler>) -> Action {
    reconciler.error_policy(&module, error)
}

/// Watch Modules and their Jobs until the watch stream ends.
///
/// `ready` is raised once the initial Module list has been cached.
pub async fn watch_modules(
    modules: Api<Module>,
    jobs: Api<Job>,
    reconciler: Arc<Reconciler>,
    ready: Readiness,
) -> Result<(), ControllerError> {
    info!("Starting Module watcher");

    // Job status updates arrive in bursts while a Pod starts; debounce them
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(3);

    let controller = Controller::new(modules, watcher::Config::default())
        .owns(jobs, watcher::Config::default())
        .with_config(controller_config);

    let store = controller.store();
    tokio::spawn(async move {
        if store.wait_until_ready().await.is_ok() {
            info!("Module cache synced");
            ready.mark_ready();
        }
    });

    controller
        .run(reconcile, error_policy, reconciler.clone())
        .for_each(|res| {
            let reconciler = reconciler.clone();
            async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled Module {}", obj.name),
                    // A requeued Module was deleted in the meantime
                    Err(RunError::ObjectNotFound(obj)) => {
                        debug!("Module {} is gone, dropping its backoff state", obj.name);
                        reconciler.forget_module(obj.namespace.as_deref(), &obj.name);
                    }
                    Err(e) => error!("Controller error for Module: {}", e),
                }
            }
        })
        .await;

    Ok(())
}
