//! Prints the CustomResourceDefinition manifests as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/module.yaml`

use crds::Module;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&Module::crd())?);
    Ok(())
}
