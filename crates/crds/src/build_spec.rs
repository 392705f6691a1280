//! Build configuration
//!
//! Describes how an unsigned kernel module image is built in-cluster.
//! Can be set on the Module (defaults) and on a KernelMapping (overrides).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::references::SecretRef;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    /// Dockerfile contents used to build the image
    #[serde(default)]
    pub dockerfile: String,

    /// Build arguments passed to the image build, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_args: Vec<BuildArg>,

    /// Secrets exposed to the build
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretRef>,
}

/// A single named build argument
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildArg {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

impl BuildArg {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
