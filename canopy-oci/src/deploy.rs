//! Deployment pipeline
//!
//! Registers the whole topology into a stack in a fixed order: VCN, security
//! lists, subnets, instances, then optional storage. Identifiers are exported
//! once every step succeeded. A failing step aborts the run; resources already
//! registered stay in the stack.

use std::collections::HashMap;

use canopy_core::context::{ResourceHandle, Stack};
use canopy_core::resource::Value;
use log::{error, info};

use crate::compute::ComputeBuilder;
use crate::config::Config;
use crate::error::InfraResult;
use crate::exports::{self, export_key, named_key};
use crate::network::NetworkBuilder;
use crate::storage::{StorageBuilder, StorageHandles};

/// Logical name of the VCN when the configuration gives no display name
const DEFAULT_VCN_NAME: &str = "vcn";

/// Everything registered by one [`deploy`] run
#[derive(Debug, Clone)]
pub struct Deployment {
    pub vcn: ResourceHandle,
    pub security_lists: HashMap<String, ResourceHandle>,
    pub subnets: Vec<ResourceHandle>,
    pub instances: Vec<ResourceHandle>,
    pub storage: Option<StorageHandles>,
}

fn step<T>(name: &str, f: impl FnOnce() -> InfraResult<T>) -> InfraResult<T> {
    f().inspect_err(|e| error!("Failed to {}: {}", name, e))
}

/// Register the topology described by `config` into `stack`
pub fn deploy(config: &Config, stack: &mut Stack) -> InfraResult<Deployment> {
    info!("Deploying stack {}/{}", stack.project(), stack.name());

    let network = NetworkBuilder::new(&config.network);

    step("validate network configuration", || network.validate())?;
    step("validate compute configuration", || config.compute.validate())?;

    let vcn_name = match config.network.display_name.as_str() {
        "" => DEFAULT_VCN_NAME,
        name => name,
    };
    let vcn = step("create VCN", || network.create_vcn(stack, vcn_name))?;
    let vcn_id = vcn.id_ref();

    let security_lists = step("create security lists", || {
        network.create_security_list_map(stack, &vcn_id)
    })?;

    let subnets = step("create subnets", || {
        network.create_all_subnets_with_security_lists(stack, &vcn_id, &security_lists)
    })?;

    let subnet_ids: HashMap<String, Value> = subnets
        .iter()
        .map(|s| (s.name().to_string(), s.id_ref()))
        .collect();
    let compute = ComputeBuilder::new(&config.compute).with_subnet_ids(subnet_ids);
    let instances = step("create compute instances", || {
        compute.create_all_instances(stack)
    })?;

    let storage = match &config.storage {
        Some(storage) => Some(step("create storage", || {
            StorageBuilder::new(storage).provision(stack)
        })?),
        None => None,
    };

    let deployment = Deployment {
        vcn,
        security_lists,
        subnets,
        instances,
        storage,
    };
    export(&deployment, stack);

    info!("{}", stack.plan().summary());
    Ok(deployment)
}

fn export(deployment: &Deployment, stack: &mut Stack) {
    stack.export(exports::VCN_ID, deployment.vcn.id_ref());

    for (i, subnet) in deployment.subnets.iter().enumerate() {
        stack.export(export_key("subnet", i), subnet.id_ref());
        stack.export(named_key("subnet", subnet.name()), subnet.id_ref());
    }

    for (i, instance) in deployment.instances.iter().enumerate() {
        stack.export(export_key("instance", i), instance.id_ref());
        stack.export(named_key("instance", instance.name()), instance.id_ref());
    }

    let mut lists: Vec<_> = deployment.security_lists.iter().collect();
    lists.sort_by(|a, b| a.0.cmp(b.0));
    for (name, handle) in lists {
        stack.export(named_key("security_list", name), handle.id_ref());
    }

    if let Some(storage) = &deployment.storage {
        stack.export(exports::BUCKET_NAME, storage.bucket.output("name"));
        stack.export(exports::COMPARTMENT_ID, storage.compartment.id_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InfraError, ValidationError};
    use crate::oci_stack;

    const CONFIG: &str = r#"
network:
  compartment_id: ocid1.compartment.oc1..net
  cidr_block: 10.0.0.0/16
  display_name: dev-vcn
  subnets:
    - name: public-subnet
      cidr_block: 10.0.1.0/24
  security_lists:
    - display_name: public-ssh
      protocol: "6"
      source: 0.0.0.0/0
      tcp_options:
        - min_port: 22
          max_port: 22
      subnet_name: public-subnet
compute:
  compartment_id: ocid1.compartment.oc1..cmp
  instances:
    - name: web-1
      shape: VM.Standard.E4.Flex
      subnet_id: public-subnet
      image_ocid: ocid1.image.oc1..img
      ssh_public_key: ssh-rsa AAAA
    - name: web-2
      shape: VM.Standard.E4.Flex
      subnet_id: ocid1.subnet.oc1..external
      image_ocid: ocid1.image.oc1..img
      ssh_public_key: ssh-rsa AAAA
"#;

    #[test]
    fn deploy_registers_in_pipeline_order() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let mut stack = oci_stack("dev");

        let deployment = deploy(&config, &mut stack).unwrap();

        let order: Vec<_> = stack
            .plan()
            .effects()
            .iter()
            .map(|e| e.id().resource_type.as_str())
            .collect();
        assert_eq!(
            order,
            ["core.vcn", "core.security_list", "core.subnet", "core.instance", "core.instance"]
        );
        assert_eq!(deployment.subnets.len(), 1);
        assert_eq!(deployment.instances.len(), 2);
        assert!(deployment.storage.is_none());
    }

    #[test]
    fn deploy_exports_identifiers() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let mut stack = oci_stack("dev");
        let deployment = deploy(&config, &mut stack).unwrap();

        let keys: Vec<_> = stack.outputs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            [
                "vcn_id",
                "subnet-0",
                "subnet:public-subnet",
                "instance-0",
                "instance:web-1",
                "instance-1",
                "instance:web-2",
                "security_list:public-ssh",
            ]
        );
        assert_eq!(stack.output("instance-1"), Some(&deployment.instances[1].id_ref()));
    }

    #[test]
    fn deploy_aborts_on_invalid_compute() {
        let mut config = Config::from_yaml(CONFIG).unwrap();
        config.compute.instances.clear();
        let mut stack = oci_stack("dev");

        let err = deploy(&config, &mut stack).unwrap_err();
        assert!(matches!(
            err,
            InfraError::Validation(ValidationError::MissingField { field: "instances", .. })
        ));
        assert!(stack.plan().is_empty());
    }
}
