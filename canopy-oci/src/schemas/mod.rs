//! OCI resource schema definitions

pub mod compute;
pub mod storage;
pub mod vcn;

use canopy_core::schema::ResourceSchema;

/// Returns all OCI schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    let mut schemas = Vec::new();
    schemas.extend(vcn::schemas());
    schemas.extend(compute::schemas());
    schemas.extend(storage::schemas());
    schemas
}
