//! Network topology: the VCN, its security lists and subnets
//!
//! All builders borrow the [`NetworkConfig`] they were created from and
//! register resources into the [`Stack`] they are given. Security lists are
//! attached to subnets through the `subnet_name` tag on each list, see
//! [`NetworkBuilder::subnet_security_list_map`].

mod security_list;
mod subnet;

use canopy_core::context::{ResourceHandle, Stack};
use canopy_core::resource::{Resource, Value};
use log::info;

use crate::config::NetworkConfig;
use crate::error::{InfraError, InfraResult};
use crate::resources;

/// Builds network resources from a [`NetworkConfig`]
#[derive(Debug, Clone, Copy)]
pub struct NetworkBuilder<'a> {
    config: &'a NetworkConfig,
}

impl<'a> NetworkBuilder<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self) -> InfraResult<()> {
        self.config.validate()
    }

    fn compartment_id(&self) -> Value {
        Value::string(&self.config.base.compartment_id)
    }

    /// Register the VCN under the given logical name
    pub fn create_vcn(&self, stack: &mut Stack, name: &str) -> InfraResult<ResourceHandle> {
        let resource = Resource::new(resources::VCN, name)
            .with_attribute("compartment_id", self.compartment_id())
            .with_attribute("cidr_block", Value::string(&self.config.cidr_block))
            .with_attribute("display_name", Value::string(&self.config.display_name));

        let handle = stack
            .register(resource)
            .map_err(|e| InfraError::provider(name, e))?;
        info!("VCN {} ({})", name, self.config.cidr_block);
        Ok(handle)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{BaseConfig, SecurityListConfig, SubnetConfig, TcpOptionConfig};
    use crate::oci_stack;
    use canopy_core::effect::Effect;

    pub(crate) fn subnet(name: &str, cidr: &str) -> SubnetConfig {
        SubnetConfig {
            name: name.to_string(),
            cidr_block: cidr.to_string(),
        }
    }

    pub(crate) fn ingress(display_name: &str, subnet_name: Option<&str>) -> SecurityListConfig {
        SecurityListConfig {
            display_name: display_name.to_string(),
            protocol: "6".to_string(),
            description: "Allow SSH".to_string(),
            source: Some("0.0.0.0/0".to_string()),
            tcp_options: vec![TcpOptionConfig {
                min_port: 22,
                max_port: 22,
            }],
            subnet_name: subnet_name.map(str::to_string),
            ..Default::default()
        }
    }

    pub(crate) fn network() -> NetworkConfig {
        NetworkConfig {
            base: BaseConfig {
                compartment_id: "ocid1.compartment.oc1..net".to_string(),
                region: None,
            },
            cidr_block: "10.0.0.0/16".to_string(),
            display_name: "dev-vcn".to_string(),
            subnets: vec![
                subnet("public-subnet", "10.0.1.0/24"),
                subnet("private-subnet", "10.0.2.0/24"),
            ],
            security_lists: vec![
                ingress("public-ssh", Some("public-subnet")),
                ingress("untagged", None),
                ingress("public-http", Some("public-subnet")),
                ingress("private-ssh", Some("private-subnet")),
            ],
        }
    }

    #[test]
    fn create_vcn_registers_resource() {
        let config = network();
        let mut stack = oci_stack("test");

        let vcn = NetworkBuilder::new(&config)
            .create_vcn(&mut stack, "dev-vcn")
            .unwrap();

        assert_eq!(vcn.id().to_string(), "core.vcn.dev-vcn");
        let Effect::Create(resource) = &stack.plan().effects()[0] else {
            panic!("expected a create effect");
        };
        assert_eq!(resource.get("cidr_block"), Some(&Value::string("10.0.0.0/16")));
        assert_eq!(
            resource.get("compartment_id"),
            Some(&Value::string("ocid1.compartment.oc1..net"))
        );
    }

    #[test]
    fn create_vcn_rejects_bad_cidr() {
        let config = NetworkConfig {
            cidr_block: "10.0.0.0/40".to_string(),
            ..network()
        };
        let mut stack = oci_stack("test");

        let err = NetworkBuilder::new(&config)
            .create_vcn(&mut stack, "dev-vcn")
            .unwrap_err();

        match err {
            InfraError::Provider { resource, source } => {
                assert_eq!(resource, "dev-vcn");
                assert!(source.message.contains("cidr_block"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
