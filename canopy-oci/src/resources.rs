//! Resource type definitions for OCI
//!
//! Each type ties a resource type name (as used in [`Resource::new`]) to the
//! schema checked when the resource is registered into a stack.
//!
//! [`Resource::new`]: canopy_core::resource::Resource::new

use canopy_core::provider::ResourceType;
use canopy_core::schema::ResourceSchema;

use crate::schemas::{compute, storage, vcn};

pub const VCN: &str = "core.vcn";
pub const SUBNET: &str = "core.subnet";
pub const SECURITY_LIST: &str = "core.security_list";
pub const INSTANCE: &str = "core.instance";
pub const COMPARTMENT: &str = "identity.compartment";
pub const NAMESPACE: &str = "objectstorage.namespace";
pub const BUCKET: &str = "objectstorage.bucket";

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:path) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
        }
    };
}

define_resource_type!(VcnType, VCN, vcn::vcn_schema);
define_resource_type!(SubnetType, SUBNET, vcn::subnet_schema);
define_resource_type!(SecurityListType, SECURITY_LIST, vcn::security_list_schema);
define_resource_type!(InstanceType, INSTANCE, compute::instance_schema);
define_resource_type!(CompartmentType, COMPARTMENT, storage::compartment_schema);
define_resource_type!(NamespaceType, NAMESPACE, storage::namespace_schema);
define_resource_type!(BucketType, BUCKET, storage::bucket_schema);

/// Returns all resource types supported by this crate
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(VcnType),
        Box::new(SubnetType),
        Box::new(SecurityListType),
        Box::new(InstanceType),
        Box::new(CompartmentType),
        Box::new(NamespaceType),
        Box::new(BucketType),
    ]
}
