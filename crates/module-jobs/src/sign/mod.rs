//! Signing Job construction.
//!
//! A [`SignJobMaker`] turns a resolved [`Sign`] into the desired Job for one
//! (module, kernel) unit. Two variants exist and are picked by configuration:
//!
//! - [`PostBuildSigner`]: signs an image that was already built and pushed
//! - [`InClusterSigner`]: signs the output of a preceding in-cluster build

mod in_cluster;
mod post_build;
mod template;
#[cfg(test)]
mod signer_test;

pub use in_cluster::InClusterSigner;
pub use post_build::PostBuildSigner;

use crate::error::JobError;
use crds::{Module, Sign};
use k8s_openapi::api::batch::v1::Job;
use std::fmt;
use std::str::FromStr;

/// Stage name placed in the build-stage label of signing Jobs
pub const SIGN_STAGE: &str = "sign";

/// Signer image used when none is configured
pub const DEFAULT_SIGNER_IMAGE: &str = "quay.io/chrisp262/kmod-signer:latest";

/// Name of the single container in a signing Job
pub const SIGN_CONTAINER_NAME: &str = "signimage";

/// Image references the caller knows about for the unit being signed
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageContext<'a> {
    /// Kernel version the unit targets
    pub target_kernel: &'a str,
    /// Output of a prior build stage, if there was one
    pub previous_image: Option<&'a str>,
    /// Image reference the signed result is pushed to
    pub target_image: &'a str,
    /// Push the signed image; `-no-push` otherwise
    pub push: bool,
}

/// Builds the desired signing Job for a unit.
pub trait SignJobMaker: Send + Sync {
    /// Stage name used in labels and as the manager's name
    fn stage(&self) -> &str;

    /// Build the desired Job, owned by `module`
    fn make_job(&self, module: &Module, sign: &Sign, ctx: &ImageContext<'_>) -> Result<Job, JobError>;
}

/// Which signer variant the controller runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignerMode {
    /// Sign the output of an in-cluster build ([`InClusterSigner`])
    #[default]
    InCluster,
    /// Sign an already-pushed image ([`PostBuildSigner`])
    PostBuild,
}

impl SignerMode {
    /// Construct the maker for this mode, running `signer_image`
    pub fn maker(self, signer_image: impl Into<String>) -> Box<dyn SignJobMaker> {
        match self {
            SignerMode::InCluster => Box::new(InClusterSigner::new(signer_image)),
            SignerMode::PostBuild => Box::new(PostBuildSigner::new(signer_image)),
        }
    }
}

impl FromStr for SignerMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in-cluster" => Ok(SignerMode::InCluster),
            "post-build" => Ok(SignerMode::PostBuild),
            other => Err(JobError::Configuration(format!(
                "unknown signer mode '{}', expected 'in-cluster' or 'post-build'",
                other
            ))),
        }
    }
}

impl fmt::Display for SignerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerMode::InCluster => f.write_str("in-cluster"),
            SignerMode::PostBuild => f.write_str("post-build"),
        }
    }
}
