//! Sign configuration
//!
//! Describes how a kernel module image is signed for Secure Boot.
//! Every field is optional at the KernelMapping level so that it can
//! override the Module-level defaults one field at a time.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::references::SecretRef;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Sign {
    /// Image containing the unsigned kernel modules
    #[serde(default)]
    pub unsigned_image: String,

    /// Image the signed kernel modules are pushed to
    #[serde(default)]
    pub signed_image: String,

    /// Secret holding the private signing key (data key `key`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_secret: Option<SecretRef>,

    /// Secret holding the public certificate (data key `cert`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_secret: Option<SecretRef>,

    /// Paths of the kernel module files inside the image to sign
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_to_sign: Vec<String>,

    /// Whether the unsigned image must be pulled before signing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull: Option<bool>,

    /// Whether the signed image is pushed to the registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,
}
