//! Effective build/sign configuration.
//!
//! A Module carries defaults, a KernelMapping carries per-kernel overrides.
//! These functions merge the two layers into a fresh owned value; the Module
//! itself is never modified.

use crds::{Build, BuildArg, KernelMapping, Module, Sign};
use std::collections::{BTreeMap, BTreeSet};

/// Merge build argument overrides into `args`.
///
/// An override with the same name as an existing argument replaces it in
/// place. Overrides that match nothing are appended, sorted by name. When the
/// same name is overridden twice the last override wins.
pub fn apply_build_arg_overrides(args: &[BuildArg], overrides: &[BuildArg]) -> Vec<BuildArg> {
    let by_name: BTreeMap<&str, &BuildArg> = overrides
        .iter()
        .map(|o| (o.name.as_str(), o))
        .collect();
    let mut unused: BTreeSet<&str> = by_name.keys().copied().collect();

    let mut merged: Vec<BuildArg> = args
        .iter()
        .map(|arg| match by_name.get(arg.name.as_str()) {
            Some(o) => {
                unused.remove(arg.name.as_str());
                (*o).clone()
            }
            None => arg.clone(),
        })
        .collect();

    merged.extend(
        unused
            .into_iter()
            .filter_map(|name| by_name.get(name))
            .map(|o| (*o).clone()),
    );
    merged
}

/// Effective build configuration for `km`, or `None` when neither layer defines one
pub fn relevant_build(module: &Module, km: &KernelMapping) -> Option<Build> {
    let Some(base) = module.build() else {
        return km.build.clone();
    };
    let Some(over) = km.build.as_ref() else {
        return Some(base.clone());
    };

    let mut build = base.clone();
    if !over.dockerfile.is_empty() {
        build.dockerfile = over.dockerfile.clone();
    }
    build.build_args = apply_build_arg_overrides(&build.build_args, &over.build_args);
    // Duplicate secret names are left for the caller to sort out
    build.secrets.extend(over.secrets.iter().cloned());

    Some(build)
}

/// Effective sign configuration for `km`, or `None` when neither layer defines one
pub fn relevant_sign(module: &Module, km: &KernelMapping) -> Option<Sign> {
    let Some(base) = module.sign() else {
        return km.sign.clone();
    };
    let Some(over) = km.sign.as_ref() else {
        return Some(base.clone());
    };

    let mut sign = base.clone();

    if !over.unsigned_image.is_empty() {
        sign.unsigned_image = over.unsigned_image.clone();
    }

    if !over.signed_image.is_empty() {
        sign.signed_image = over.signed_image.clone();
    } else if sign.signed_image.is_empty() {
        sign.signed_image = module.container_image().to_string();
    }

    if over.key_secret.is_some() {
        sign.key_secret = over.key_secret.clone();
    }

    if over.cert_secret.is_some() {
        sign.cert_secret = over.cert_secret.clone();
    }

    if !over.files_to_sign.is_empty() {
        sign.files_to_sign = over.files_to_sign.clone();
    }

    if over.pull.is_some() {
        sign.pull = over.pull;
    }

    if over.push.is_some() {
        sign.push = over.push;
    }

    Some(sign)
}
