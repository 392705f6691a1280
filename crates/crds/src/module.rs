//! Module CRD
//!
//! Top-level configuration for a kernel module's build/sign lifecycle across
//! kernel versions. Jobs created for a Module are owned by it and are garbage
//! collected when the Module is deleted.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::build_spec::Build;
use crate::references::SecretRef;
use crate::sign_spec::Sign;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "kmm.microscaler.io",
    version = "v1beta1",
    kind = "Module",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSpec {
    /// Module loader configuration
    pub module_loader: ModuleLoaderSpec,

    /// Image pull secret used to access the module images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_repo_secret: Option<SecretRef>,

    /// Node selector applied to every Job created for this Module
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleLoaderSpec {
    pub container: ModuleLoaderContainerSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleLoaderContainerSpec {
    /// Default container image for the kernel module
    #[serde(default)]
    pub container_image: String,

    /// Default build configuration, overridable per kernel mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<Build>,

    /// Default sign configuration, overridable per kernel mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<Sign>,

    /// Per-kernel overrides, in order
    #[serde(default)]
    pub kernel_mappings: Vec<KernelMapping>,
}

/// Per-target-kernel override of the Module defaults
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KernelMapping {
    /// Literal kernel version this mapping applies to (e.g. `5.14.0-70.el9.x86_64`)
    #[serde(default)]
    pub literal: String,

    /// Container image for this kernel; falls back to the Module's image when empty
    #[serde(default)]
    pub container_image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<Build>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<Sign>,
}

impl Module {
    /// Module-level build defaults
    pub fn build(&self) -> Option<&Build> {
        self.spec.module_loader.container.build.as_ref()
    }

    /// Module-level sign defaults
    pub fn sign(&self) -> Option<&Sign> {
        self.spec.module_loader.container.sign.as_ref()
    }

    /// Module-level container image
    pub fn container_image(&self) -> &str {
        &self.spec.module_loader.container.container_image
    }

    pub fn kernel_mappings(&self) -> &[KernelMapping] {
        &self.spec.module_loader.container.kernel_mappings
    }
}

impl KernelMapping {
    /// Container image for this mapping, falling back to the Module's image
    pub fn resolved_container_image<'a>(&'a self, module: &'a Module) -> &'a str {
        if self.container_image.is_empty() {
            module.container_image()
        } else {
            &self.container_image
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_deserializes_camel_case() {
        let yaml = r#"
apiVersion: kmm.microscaler.io/v1beta1
kind: Module
metadata:
  name: simple-kmod
  namespace: kmm
spec:
  imageRepoSecret:
    name: pull-secret
  selector:
    node-role.kubernetes.io/worker: ""
  moduleLoader:
    container:
      containerImage: quay.io/example/simple-kmod:latest
      sign:
        keySecret:
          name: securebootkey
        certSecret:
          name: securebootcert
        filesToSign:
          - /modules/simple-kmod.ko
      kernelMappings:
        - literal: 5.14.0-70.el9.x86_64
          containerImage: quay.io/example/simple-kmod:5.14
          sign:
            unsignedImage: quay.io/example/simple-kmod:unsigned
            push: false
"#;
        let module: Module = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(module.spec.image_repo_secret, Some(SecretRef::new("pull-secret")));
        assert_eq!(module.container_image(), "quay.io/example/simple-kmod:latest");
        let sign = module.sign().unwrap();
        assert_eq!(sign.key_secret, Some(SecretRef::new("securebootkey")));
        assert_eq!(sign.files_to_sign, vec!["/modules/simple-kmod.ko".to_string()]);

        let km = &module.kernel_mappings()[0];
        assert_eq!(km.literal, "5.14.0-70.el9.x86_64");
        let km_sign = km.sign.as_ref().unwrap();
        assert_eq!(km_sign.unsigned_image, "quay.io/example/simple-kmod:unsigned");
        assert_eq!(km_sign.push, Some(false));
        assert_eq!(km_sign.pull, None);
    }

    #[test]
    fn test_crd_group_and_scope() {
        use kube::CustomResourceExt;

        let crd = Module::crd();
        assert_eq!(crd.spec.group, crate::API_GROUP);
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.names.kind, "Module");
    }

    #[test]
    fn test_resolved_container_image_falls_back_to_module() {
        let mut module = Module::new("m", ModuleSpec::default());
        module.spec.module_loader.container.container_image = "registry/m:default".to_string();

        let empty = KernelMapping::default();
        assert_eq!(empty.resolved_container_image(&module), "registry/m:default");

        let set = KernelMapping {
            container_image: "registry/m:5.14".to_string(),
            ..Default::default()
        };
        assert_eq!(set.resolved_container_image(&module), "registry/m:5.14");
    }
}
