use super::template::{CERT_MOUNT_PATH, DOCKER_CONFIG_MOUNT_PATH, KEY_MOUNT_PATH};
use super::*;
use crate::labels::{BUILD_STAGE_LABEL, MODULE_NAME_LABEL, TARGET_KERNEL_LABEL};
use crds::{ModuleSpec, SecretRef};
use k8s_openapi::api::core::v1::{Container, PodSpec};
use std::collections::BTreeMap;

const SIGNER_IMAGE: &str = "registry/signer:test";

fn module() -> Module {
    let mut module = Module::new("module-name", ModuleSpec::default());
    module.metadata.namespace = Some("module-namespace".to_string());
    module.metadata.uid = Some("module-uid".to_string());
    module.spec.module_loader.container.container_image = "my.registry/img".to_string();
    module
}

fn sign() -> Sign {
    Sign {
        unsigned_image: "my.registry/img".to_string(),
        signed_image: "my.registry/img-signed".to_string(),
        key_secret: Some(SecretRef::new("securebootkey")),
        cert_secret: Some(SecretRef::new("securebootcert")),
        ..Default::default()
    }
}

fn ctx(push: bool) -> ImageContext<'static> {
    ImageContext {
        target_kernel: "5.14.0-70.el9.x86_64",
        previous_image: None,
        target_image: "my.registry/img-signed",
        push,
    }
}

fn pod_spec(job: &Job) -> &PodSpec {
    job.spec.as_ref().unwrap().template.spec.as_ref().unwrap()
}

fn container(job: &Job) -> &Container {
    &pod_spec(job).containers[0]
}

fn args(job: &Job) -> Vec<&str> {
    container(job).args.as_ref().unwrap().iter().map(String::as_str).collect()
}

#[test]
fn test_post_build_job_args() {
    let job = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module(), &sign(), &ctx(true)).unwrap();

    assert_eq!(
        args(&job),
        vec![
            "-signedimage", "my.registry/img-signed",
            "-unsignedimage", "my.registry/img",
            "-key", "/signingkey/key.priv",
            "-cert", "/signingcert/public.der",
        ]
    );
}

#[test]
fn test_job_metadata_and_template() {
    let mut module = module();
    module.spec.selector = BTreeMap::from([("kubernetes.io/arch".to_string(), "amd64".to_string())]);

    let job = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module, &sign(), &ctx(true)).unwrap();

    assert_eq!(job.metadata.generate_name.as_deref(), Some("module-name-sign-"));
    assert_eq!(job.metadata.name, None);
    assert_eq!(job.metadata.namespace.as_deref(), Some("module-namespace"));

    let labels = job.metadata.labels.as_ref().unwrap();
    assert_eq!(labels.get(MODULE_NAME_LABEL).map(String::as_str), Some("module-name"));
    assert_eq!(labels.get(TARGET_KERNEL_LABEL).map(String::as_str), Some("5.14.0-70.el9.x86_64"));
    assert_eq!(labels.get(BUILD_STAGE_LABEL).map(String::as_str), Some(SIGN_STAGE));

    let owners = job.metadata.owner_references.as_ref().unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].kind, "Module");
    assert_eq!(owners[0].name, "module-name");
    assert_eq!(owners[0].uid, "module-uid");
    assert_eq!(owners[0].controller, Some(true));
    assert_eq!(owners[0].block_owner_deletion, Some(true));

    let spec = job.spec.as_ref().unwrap();
    assert_eq!(spec.completions, Some(1));

    let pod = pod_spec(&job);
    assert_eq!(pod.restart_policy.as_deref(), Some("OnFailure"));
    assert_eq!(pod.node_selector.as_ref(), Some(&module.spec.selector));
    assert_eq!(pod.containers.len(), 1);
    assert_eq!(container(&job).name, SIGN_CONTAINER_NAME);
    assert_eq!(container(&job).image.as_deref(), Some(SIGNER_IMAGE));
}

#[test]
fn test_volumes_and_mounts() {
    let job = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module(), &sign(), &ctx(true)).unwrap();

    let volumes = pod_spec(&job).volumes.as_ref().unwrap();
    assert_eq!(
        volumes.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        vec!["secret-securebootkey", "secret-securebootcert"]
    );
    let key_items = volumes[0].secret.as_ref().unwrap().items.as_ref().unwrap();
    assert_eq!(key_items[0].key, "key");
    assert_eq!(key_items[0].path, "key.priv");
    let cert_items = volumes[1].secret.as_ref().unwrap().items.as_ref().unwrap();
    assert_eq!(cert_items[0].key, "cert");
    assert_eq!(cert_items[0].path, "public.der");

    let mounts = container(&job).volume_mounts.as_ref().unwrap();
    assert_eq!(
        mounts.iter().map(|m| (m.name.as_str(), m.mount_path.as_str())).collect::<Vec<_>>(),
        vec![
            ("secret-securebootcert", CERT_MOUNT_PATH),
            ("secret-securebootkey", KEY_MOUNT_PATH),
        ]
    );
    assert!(mounts.iter().all(|m| m.read_only == Some(true)));
    assert_eq!(pod_spec(&job).node_selector, None);
}

#[test]
fn test_pull_secret_adds_arg_volume_and_mount() {
    let mut module = module();
    module.spec.image_repo_secret = Some(SecretRef::new("pull-secret"));
    let mut sign = sign();
    sign.files_to_sign = vec!["/modules/a.ko".to_string(), "/modules/b.ko".to_string()];

    let job = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module, &sign, &ctx(true)).unwrap();

    assert_eq!(
        args(&job),
        vec![
            "-signedimage", "my.registry/img-signed",
            "-unsignedimage", "my.registry/img",
            "-pullsecret", "/docker_config/config.json",
            "-key", "/signingkey/key.priv",
            "-cert", "/signingcert/public.der",
            "-filestosign", "/modules/a.ko:/modules/b.ko",
        ]
    );

    let volumes = pod_spec(&job).volumes.as_ref().unwrap();
    assert_eq!(volumes.len(), 3);
    assert_eq!(volumes[2].name, "secret-pull-secret");
    let items = volumes[2].secret.as_ref().unwrap().items.as_ref().unwrap();
    assert_eq!(items[0].key, ".dockerconfigjson");
    assert_eq!(items[0].path, "config.json");

    let mounts = container(&job).volume_mounts.as_ref().unwrap();
    assert_eq!(mounts[2].name, "secret-pull-secret");
    assert_eq!(mounts[2].mount_path, DOCKER_CONFIG_MOUNT_PATH);
}

#[test]
fn test_shared_secrets_get_one_volume() {
    let mut module = module();
    module.spec.image_repo_secret = Some(SecretRef::new("signing"));
    let mut sign = sign();
    sign.key_secret = Some(SecretRef::new("signing"));
    sign.cert_secret = Some(SecretRef::new("signing"));

    let job = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module, &sign, &ctx(true)).unwrap();

    let volumes = pod_spec(&job).volumes.as_ref().unwrap();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].name, "secret-signing");
    let items: Vec<(&str, &str)> = volumes[0]
        .secret
        .as_ref()
        .unwrap()
        .items
        .as_ref()
        .unwrap()
        .iter()
        .map(|i| (i.key.as_str(), i.path.as_str()))
        .collect();
    assert_eq!(
        items,
        vec![("key", "key.priv"), ("cert", "public.der"), (".dockerconfigjson", "config.json")]
    );

    // Every mount path is kept, all backed by the shared volume
    let mounts = container(&job).volume_mounts.as_ref().unwrap();
    assert_eq!(
        mounts.iter().map(|m| (m.name.as_str(), m.mount_path.as_str())).collect::<Vec<_>>(),
        vec![
            ("secret-signing", CERT_MOUNT_PATH),
            ("secret-signing", KEY_MOUNT_PATH),
            ("secret-signing", DOCKER_CONFIG_MOUNT_PATH),
        ]
    );
}

#[test]
fn test_pull_secret_shared_with_cert() {
    let mut module = module();
    module.spec.image_repo_secret = Some(SecretRef::new("securebootcert"));

    let job = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module, &sign(), &ctx(true)).unwrap();

    let names: Vec<&str> = pod_spec(&job).volumes.as_ref().unwrap().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["secret-securebootkey", "secret-securebootcert"]);
}

#[test]
fn test_no_push() {
    let job = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module(), &sign(), &ctx(false)).unwrap();
    assert_eq!(&args(&job)[..3], &["-no-push", "-unsignedimage", "my.registry/img"]);

    let job = InClusterSigner::new(SIGNER_IMAGE).make_job(&module(), &sign(), &ctx(false)).unwrap();
    assert_eq!(&args(&job)[..3], &["-no-push", "-unsignedimage", "my.registry/img"]);
}

#[test]
fn test_post_build_ignores_caller_images() {
    let ctx = ImageContext {
        previous_image: Some("registry/built:5.14"),
        target_image: "registry/elsewhere",
        ..ctx(true)
    };
    let job = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module(), &sign(), &ctx).unwrap();

    assert_eq!(&args(&job)[..4], &["-signedimage", "my.registry/img-signed", "-unsignedimage", "my.registry/img"]);
}

#[test]
fn test_post_build_requires_images() {
    let mut missing_unsigned = sign();
    missing_unsigned.unsigned_image.clear();
    let err = PostBuildSigner::new(SIGNER_IMAGE)
        .make_job(&module(), &missing_unsigned, &ctx(true))
        .unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)));

    let mut missing_signed = sign();
    missing_signed.signed_image.clear();
    let err = PostBuildSigner::new(SIGNER_IMAGE)
        .make_job(&module(), &missing_signed, &ctx(true))
        .unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)));

    // Not pushing, so no signed image is needed
    assert!(PostBuildSigner::new(SIGNER_IMAGE).make_job(&module(), &missing_signed, &ctx(false)).is_ok());
}

#[test]
fn test_in_cluster_prefers_previous_image() {
    let ctx = ImageContext {
        previous_image: Some("registry/built:5.14"),
        target_image: "registry/target:5.14",
        ..ctx(true)
    };
    let job = InClusterSigner::new(SIGNER_IMAGE).make_job(&module(), &sign(), &ctx).unwrap();

    assert_eq!(
        &args(&job)[..4],
        &["-signedimage", "registry/target:5.14", "-unsignedimage", "registry/built:5.14"]
    );
}

#[test]
fn test_in_cluster_falls_back_to_unsigned_image() {
    let ctx = ImageContext {
        previous_image: Some(""),
        ..ctx(true)
    };
    let job = InClusterSigner::new(SIGNER_IMAGE).make_job(&module(), &sign(), &ctx).unwrap();

    assert_eq!(&args(&job)[2..4], &["-unsignedimage", "my.registry/img"]);
}

#[test]
fn test_in_cluster_no_image_to_sign() {
    let mut sign = sign();
    sign.unsigned_image.clear();

    let err = InClusterSigner::new(SIGNER_IMAGE).make_job(&module(), &sign, &ctx(true)).unwrap_err();
    assert!(err.to_string().contains("no image to sign given"), "unexpected error: {}", err);
}

#[test]
fn test_missing_signing_secrets() {
    let mut no_key = sign();
    no_key.key_secret = None;
    let err = InClusterSigner::new(SIGNER_IMAGE).make_job(&module(), &no_key, &ctx(true)).unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)));

    let mut no_cert = sign();
    no_cert.cert_secret = None;
    let err = InClusterSigner::new(SIGNER_IMAGE).make_job(&module(), &no_cert, &ctx(true)).unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)));
}

#[test]
fn test_module_without_uid_cannot_own_job() {
    let mut module = module();
    module.metadata.uid = None;

    let err = PostBuildSigner::new(SIGNER_IMAGE).make_job(&module, &sign(), &ctx(true)).unwrap_err();
    assert!(matches!(err, JobError::OwnerReference(_)));
}

#[test]
fn test_signer_mode() {
    assert_eq!("in-cluster".parse::<SignerMode>().unwrap(), SignerMode::InCluster);
    assert_eq!(" post-build ".parse::<SignerMode>().unwrap(), SignerMode::PostBuild);
    assert!("sideways".parse::<SignerMode>().is_err());
    assert_eq!(SignerMode::default(), SignerMode::InCluster);
    assert_eq!(SignerMode::PostBuild.to_string(), "post-build");

    let maker = SignerMode::PostBuild.maker(DEFAULT_SIGNER_IMAGE);
    assert_eq!(maker.stage(), "sign");
}
