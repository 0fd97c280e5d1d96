//! Compute instances

use std::collections::HashMap;

use canopy_core::context::{ResourceHandle, Stack};
use canopy_core::resource::{Resource, Value};
use log::info;

use crate::config::{ComputeConfig, InstanceConfig};
use crate::error::{InfraError, InfraResult, ValidationError};
use crate::resources;

/// Builds compute instances from a [`ComputeConfig`]
#[derive(Debug, Clone)]
pub struct ComputeBuilder<'a> {
    config: &'a ComputeConfig,
    /// Subnet name -> subnet id, for instances that name a subnet of this run
    subnet_ids: HashMap<String, Value>,
}

impl<'a> ComputeBuilder<'a> {
    pub fn new(config: &'a ComputeConfig) -> Self {
        Self {
            config,
            subnet_ids: HashMap::new(),
        }
    }

    /// Attach instances whose `subnet_id` is a subnet name to that subnet
    pub fn with_subnet_ids(mut self, subnet_ids: HashMap<String, Value>) -> Self {
        self.subnet_ids = subnet_ids;
        self
    }

    pub fn validate(&self) -> InfraResult<()> {
        self.config.validate()
    }

    /// Register the instance at `index`
    pub fn create_instance(
        &self,
        ctx: Option<&mut Stack>,
        index: usize,
    ) -> InfraResult<ResourceHandle> {
        let stack = ctx.ok_or(InfraError::NilContext)?;
        let instance = self
            .config
            .instances
            .get(index)
            .ok_or(InfraError::IndexOutOfRange {
                kind: "instance",
                index,
                len: self.config.instances.len(),
            })?;

        let resource = self.instance_resource(instance);
        let handle = stack
            .register(resource)
            .map_err(|e| InfraError::provider(&instance.name, e))?;
        info!(
            "Instance {} ({}) in {}",
            instance.name,
            self.config.shape_of(instance),
            instance.subnet_id
        );
        Ok(handle)
    }

    /// Register every instance in order, stopping at the first failure
    pub fn create_all_instances(&self, stack: &mut Stack) -> InfraResult<Vec<ResourceHandle>> {
        self.require_instances()?;

        let mut handles = Vec::with_capacity(self.config.instances.len());
        for (i, instance) in self.config.instances.iter().enumerate() {
            let handle = self
                .create_instance(Some(&mut *stack), i)
                .map_err(|e| InfraError::wrap("instance", &instance.name, e))?;
            handles.push(handle);
        }
        Ok(handles)
    }

    /// Register the instances configured with exactly this `subnet_id`
    pub fn create_instances_in_subnet(
        &self,
        stack: &mut Stack,
        subnet_id: &str,
    ) -> InfraResult<Vec<ResourceHandle>> {
        self.require_instances()?;

        let mut handles = Vec::new();
        for (i, instance) in self.config.instances.iter().enumerate() {
            if instance.subnet_id != subnet_id {
                continue;
            }
            let handle = self
                .create_instance(Some(&mut *stack), i)
                .map_err(|e| InfraError::wrap("instance", &instance.name, e))?;
            handles.push(handle);
        }
        Ok(handles)
    }

    /// First instance configured under `name`
    pub fn get_instance(&self, name: &str) -> InfraResult<&'a InstanceConfig> {
        self.config
            .instances
            .iter()
            .find(|instance| instance.name == name)
            .ok_or_else(|| InfraError::NotFound {
                kind: "instance",
                name: name.to_string(),
            })
    }

    fn require_instances(&self) -> InfraResult<()> {
        if self.config.instances.is_empty() {
            return Err(ValidationError::missing("instances").into());
        }
        Ok(())
    }

    fn subnet_id(&self, instance: &InstanceConfig) -> Value {
        self.subnet_ids
            .get(&instance.subnet_id)
            .cloned()
            .unwrap_or_else(|| Value::string(&instance.subnet_id))
    }

    fn instance_resource(&self, instance: &InstanceConfig) -> Resource {
        let shape_config = shape_config(instance);

        Resource::new(resources::INSTANCE, &instance.name)
            .with_attribute("compartment_id", Value::string(&self.config.base.compartment_id))
            .with_attribute(
                "availability_domain",
                Value::string(self.config.availability_domain()),
            )
            .with_attribute("shape", Value::string(self.config.shape_of(instance)))
            .with_attribute("display_name", Value::string(instance.display_name()))
            .with_attribute(
                "source_details",
                Value::map([
                    ("source_type", Value::string("image")),
                    ("source_id", Value::string(&instance.image_ocid)),
                ]),
            )
            .with_attribute(
                "create_vnic_details",
                Value::map([("subnet_id", self.subnet_id(instance))]),
            )
            .with_attribute(
                "metadata",
                Value::map([("ssh_authorized_keys", Value::string(&instance.ssh_public_key))]),
            )
            .with_optional_attribute("shape_config", shape_config)
    }
}

/// Flexible shape sizing; only positive values are set
fn shape_config(instance: &InstanceConfig) -> Option<Value> {
    let entries: Vec<_> = [
        ("ocpus", instance.ocpus()),
        ("memory_in_gbs", instance.memory_in_gbs()),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key, Value::Float(v))))
    .collect();

    (!entries.is_empty()).then(|| Value::map(entries))
}
