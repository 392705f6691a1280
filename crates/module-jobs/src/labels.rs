//! Label and annotation keys placed on Jobs.
//!
//! The three labels are the only way a Job is discovered again: they must stay
//! stable across reconciles of the same (module, kernel, stage) unit.

use std::collections::BTreeMap;

pub const MODULE_NAME_LABEL: &str = "kmm.microscaler.io/module.name";
pub const TARGET_KERNEL_LABEL: &str = "kmm.microscaler.io/target-kernel";
pub const BUILD_STAGE_LABEL: &str = "kmm.microscaler.io/build-stage";

/// Hash of the desired Job spec, compared on every sync to detect drift
pub const JOB_HASH_ANNOTATION: &str = "kmm.microscaler.io/last-hash";

/// Discovery labels for the Job of one logical unit
pub fn job_labels(module_name: &str, target_kernel: &str, stage: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (MODULE_NAME_LABEL.to_string(), module_name.to_string()),
        (TARGET_KERNEL_LABEL.to_string(), target_kernel.to_string()),
        (BUILD_STAGE_LABEL.to_string(), stage.to_string()),
    ])
}
