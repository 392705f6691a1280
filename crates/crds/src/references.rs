//! Kubernetes object references used by the Module CRD
//!
//! Mirrors the Kubernetes `LocalObjectReference` pattern: a bare name that is
//! resolved in the namespace of the referencing resource.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a Secret in the same namespace as the Module
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    /// Name of the referenced Secret
    pub name: String,
}

impl SecretRef {
    /// Create a reference to the named Secret
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
