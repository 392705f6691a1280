use crate::error::JobError;
use crds::{Module, Sign};
use k8s_openapi::api::batch::v1::Job;
use tracing::debug;

use super::template::{sign_job, SignTarget};
use super::{ImageContext, SignJobMaker, SIGN_STAGE};

/// Signs an image that was built and pushed outside the cluster.
///
/// Both image references come from the resolved `Sign`; the caller's
/// `previous_image` and `target_image` are not used.
#[derive(Debug, Clone)]
pub struct PostBuildSigner {
    signer_image: String,
}

impl PostBuildSigner {
    pub fn new(signer_image: impl Into<String>) -> Self {
        Self { signer_image: signer_image.into() }
    }
}

impl SignJobMaker for PostBuildSigner {
    fn stage(&self) -> &str {
        SIGN_STAGE
    }

    fn make_job(&self, module: &Module, sign: &Sign, ctx: &ImageContext<'_>) -> Result<Job, JobError> {
        if sign.unsigned_image.is_empty() {
            return Err(JobError::Configuration("no image to sign given".to_string()));
        }

        let signed_image = if ctx.push {
            if sign.signed_image.is_empty() {
                return Err(JobError::Configuration(
                    "sign.signedImage is required when pushing".to_string(),
                ));
            }
            Some(sign.signed_image.as_str())
        } else {
            None
        };

        debug!(
            "Making post-build sign job for kernel {}: {} -> {}",
            ctx.target_kernel,
            sign.unsigned_image,
            signed_image.unwrap_or("<no push>")
        );

        let target = SignTarget {
            signed_image,
            unsigned_image: &sign.unsigned_image,
        };
        sign_job(module, sign, ctx.target_kernel, self.stage(), &self.signer_image, &target)
    }
}
