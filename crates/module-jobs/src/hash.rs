//! Drift detection hash.
//!
//! The hash covers the desired `JobSpec` only (completions and pod template),
//! encoded with `serde_json` and digested with SHA-256. Object metadata is left
//! out: the generated name, owner uid and annotations are not part of what the
//! worker runs. The hash is always computed from the desired Job, never from
//! the live one, so fields defaulted by the API server never enter it.
//!
//! The encoding is stable: k8s-openapi serializes struct fields in a fixed
//! order and every map is a `BTreeMap`.

use crate::error::JobError;
use crate::labels::JOB_HASH_ANNOTATION;
use k8s_openapi::api::batch::v1::Job;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the Job's spec
pub fn job_spec_hash(job: &Job) -> Result<String, JobError> {
    let json = serde_json::to_vec(&job.spec)?;
    Ok(hex::encode(Sha256::digest(&json)))
}

/// Compute the spec hash and record it in the Job's annotations
pub fn annotate_hash(job: &mut Job) -> Result<String, JobError> {
    let hash = job_spec_hash(job)?;
    job.metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(JOB_HASH_ANNOTATION.to_string(), hash.clone());
    Ok(hash)
}

/// Hash recorded on a Job, if any
pub fn recorded_hash(job: &Job) -> Option<&str> {
    job.metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(JOB_HASH_ANNOTATION))
        .map(String::as_str)
}
