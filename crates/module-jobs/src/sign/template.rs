//! Job template shared by both signer variants.

use crate::error::JobError;
use crate::labels::job_labels;
use crds::{Module, SecretRef, Sign};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, KeyToPath, PodSpec, PodTemplateSpec, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};

use super::SIGN_CONTAINER_NAME;

pub(crate) const KEY_MOUNT_PATH: &str = "/signingkey";
pub(crate) const CERT_MOUNT_PATH: &str = "/signingcert";
pub(crate) const DOCKER_CONFIG_MOUNT_PATH: &str = "/docker_config";

const KEY_FILE: &str = "key.priv";
const CERT_FILE: &str = "public.der";
const DOCKER_CONFIG_FILE: &str = "config.json";
const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

/// Images resolved by a signer variant
pub(crate) struct SignTarget<'a> {
    /// Where the signed image goes; `None` means `-no-push`
    pub signed_image: Option<&'a str>,
    pub unsigned_image: &'a str,
}

/// Worker arguments, in the order the signer expects them
pub(crate) fn sign_args(module: &Module, sign: &Sign, target: &SignTarget<'_>) -> Vec<String> {
    let mut args = Vec::new();

    match target.signed_image {
        Some(image) => {
            args.push("-signedimage".to_string());
            args.push(image.to_string());
        }
        None => args.push("-no-push".to_string()),
    }

    args.push("-unsignedimage".to_string());
    args.push(target.unsigned_image.to_string());

    if module.spec.image_repo_secret.is_some() {
        args.push("-pullsecret".to_string());
        args.push(format!("{}/{}", DOCKER_CONFIG_MOUNT_PATH, DOCKER_CONFIG_FILE));
    }

    args.push("-key".to_string());
    args.push(format!("{}/{}", KEY_MOUNT_PATH, KEY_FILE));
    args.push("-cert".to_string());
    args.push(format!("{}/{}", CERT_MOUNT_PATH, CERT_FILE));

    if !sign.files_to_sign.is_empty() {
        args.push("-filestosign".to_string());
        args.push(sign.files_to_sign.join(":"));
    }

    args
}

fn volume_name(secret: &SecretRef) -> String {
    format!("secret-{}", secret.name)
}

/// Project `key` of `secret` to `path`, sharing one volume per distinct Secret
fn add_secret_item(volumes: &mut Vec<Volume>, secret: &SecretRef, key: &str, path: &str) {
    let item = KeyToPath {
        key: key.to_string(),
        path: path.to_string(),
        ..Default::default()
    };
    let name = volume_name(secret);

    if let Some(source) = volumes
        .iter_mut()
        .find(|v| v.name == name)
        .and_then(|v| v.secret.as_mut())
    {
        source.items.get_or_insert_with(Vec::new).push(item);
        return;
    }

    volumes.push(Volume {
        name,
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret.name.clone()),
            items: Some(vec![item]),
            ..Default::default()
        }),
        ..Default::default()
    });
}

fn secret_mount(secret: &SecretRef, mount_path: &str) -> VolumeMount {
    VolumeMount {
        name: volume_name(secret),
        mount_path: mount_path.to_string(),
        read_only: Some(true),
        ..Default::default()
    }
}

/// Build the signing Job for a module.
///
/// Key and cert secrets are mandatory: the worker is always given `-key` and
/// `-cert`.
pub(crate) fn sign_job(
    module: &Module,
    sign: &Sign,
    target_kernel: &str,
    stage: &str,
    signer_image: &str,
    target: &SignTarget<'_>,
) -> Result<Job, JobError> {
    let key_secret = sign
        .key_secret
        .as_ref()
        .ok_or_else(|| JobError::Configuration("sign.keySecret is not set".to_string()))?;
    let cert_secret = sign
        .cert_secret
        .as_ref()
        .ok_or_else(|| JobError::Configuration("sign.certSecret is not set".to_string()))?;
    let namespace = module
        .namespace()
        .ok_or_else(|| JobError::Configuration(format!("Module {} has no namespace", module.name_any())))?;

    let mut owner = module.controller_owner_ref(&()).ok_or_else(|| {
        JobError::OwnerReference(format!("Module {} has no name or uid", module.name_any()))
    })?;
    owner.block_owner_deletion = Some(true);

    let mut volumes = Vec::new();
    add_secret_item(&mut volumes, key_secret, "key", KEY_FILE);
    add_secret_item(&mut volumes, cert_secret, "cert", CERT_FILE);
    let mut mounts = vec![
        secret_mount(cert_secret, CERT_MOUNT_PATH),
        secret_mount(key_secret, KEY_MOUNT_PATH),
    ];
    if let Some(pull_secret) = &module.spec.image_repo_secret {
        add_secret_item(&mut volumes, pull_secret, DOCKER_CONFIG_JSON_KEY, DOCKER_CONFIG_FILE);
        mounts.push(secret_mount(pull_secret, DOCKER_CONFIG_MOUNT_PATH));
    }

    let node_selector = (!module.spec.selector.is_empty()).then(|| module.spec.selector.clone());

    Ok(Job {
        metadata: ObjectMeta {
            generate_name: Some(format!("{}-{}-", module.name_any(), stage)),
            namespace: Some(namespace),
            labels: Some(job_labels(&module.name_any(), target_kernel, stage)),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(JobSpec {
            completions: Some(1),
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: SIGN_CONTAINER_NAME.to_string(),
                        image: Some(signer_image.to_string()),
                        args: Some(sign_args(module, sign, target)),
                        volume_mounts: Some(mounts),
                        ..Default::default()
                    }],
                    restart_policy: Some("OnFailure".to_string()),
                    volumes: Some(volumes),
                    node_selector,
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}
