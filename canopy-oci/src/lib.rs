//! Canopy OCI
//!
//! Declares an Oracle Cloud Infrastructure topology (VCN, security lists,
//! subnets, compute instances and an optional storage bucket) from a YAML
//! [`Config`](config::Config) and registers it into a
//! [`Stack`](canopy_core::context::Stack).

pub mod compute;
pub mod config;
pub mod deploy;
pub mod error;
pub mod exports;
pub mod network;
pub mod resources;
pub mod schemas;
pub mod storage;

use canopy_core::context::Stack;

pub use deploy::{Deployment, deploy};
pub use error::{InfraError, InfraResult};

/// Project name recorded on every stack
pub const PROJECT: &str = "canopy";

/// A stack that checks every registered resource against the OCI schemas
pub fn oci_stack(name: &str) -> Stack {
    Stack::new(PROJECT, name).with_resource_types(resources::resource_types())
}
