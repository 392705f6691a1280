//! Kernel Module CRD Definitions
//!
//! Kubernetes Custom Resource Definitions consumed by the module controller.

pub mod build_spec;
pub mod module;
pub mod references;
pub mod sign_spec;

pub use build_spec::*;
pub use module::*;
pub use references::*;
pub use sign_spec::*;

/// API group shared by every CRD, label and annotation in this project
pub const API_GROUP: &str = "kmm.microscaler.io";
