use crate::error::JobError;
use crds::{Module, Sign};
use k8s_openapi::api::batch::v1::Job;
use tracing::debug;

use super::template::{sign_job, SignTarget};
use super::{ImageContext, SignJobMaker, SIGN_STAGE};

/// Signs the output of a preceding in-cluster build.
///
/// The image produced by the build stage (`previous_image`) takes precedence
/// over `sign.unsignedImage`, and the signed result goes to the caller's
/// `target_image`.
#[derive(Debug, Clone)]
pub struct InClusterSigner {
    signer_image: String,
}

impl InClusterSigner {
    pub fn new(signer_image: impl Into<String>) -> Self {
        Self { signer_image: signer_image.into() }
    }
}

impl SignJobMaker for InClusterSigner {
    fn stage(&self) -> &str {
        SIGN_STAGE
    }

    fn make_job(&self, module: &Module, sign: &Sign, ctx: &ImageContext<'_>) -> Result<Job, JobError> {
        let unsigned_image = match ctx.previous_image.filter(|image| !image.is_empty()) {
            Some(image) => image,
            None if !sign.unsigned_image.is_empty() => sign.unsigned_image.as_str(),
            None => return Err(JobError::Configuration("no image to sign given".to_string())),
        };

        if ctx.push && ctx.target_image.is_empty() {
            return Err(JobError::Configuration(
                "no target image to push the signed image to".to_string(),
            ));
        }
        let signed_image = ctx.push.then_some(ctx.target_image);

        debug!(
            "Making in-cluster sign job for kernel {}: {} -> {}",
            ctx.target_kernel,
            unsigned_image,
            signed_image.unwrap_or("<no push>")
        );

        let target = SignTarget {
            signed_image,
            unsigned_image,
        };
        sign_job(module, sign, ctx.target_kernel, self.stage(), &self.signer_image, &target)
    }
}
