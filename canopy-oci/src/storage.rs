//! Compartment and object-storage bucket provisioned next to the topology

use canopy_core::context::{ResourceHandle, Stack};
use canopy_core::resource::{Resource, Value};
use log::info;

use crate::config::StorageConfig;
use crate::error::{InfraError, InfraResult};
use crate::resources;

/// Handles to the storage resources of one run
#[derive(Debug, Clone)]
pub struct StorageHandles {
    pub compartment: ResourceHandle,
    pub namespace: ResourceHandle,
    pub bucket: ResourceHandle,
}

#[derive(Debug, Clone, Copy)]
pub struct StorageBuilder<'a> {
    config: &'a StorageConfig,
}

impl<'a> StorageBuilder<'a> {
    pub fn new(config: &'a StorageConfig) -> Self {
        Self { config }
    }

    /// Register the compartment, look up the object storage namespace for it
    /// and register the bucket inside both.
    pub fn provision(&self, stack: &mut Stack) -> InfraResult<StorageHandles> {
        self.config.validate()?;
        let config = self.config;

        let compartment = stack
            .register(
                Resource::new(resources::COMPARTMENT, &config.compartment_name)
                    .with_attribute("compartment_id", Value::string(&config.base.compartment_id))
                    .with_attribute("name", Value::string(&config.compartment_name))
                    .with_attribute("description", Value::string(&config.compartment_description))
                    .with_attribute("enable_delete", Value::Bool(config.enable_delete)),
            )
            .map_err(|e| InfraError::provider(&config.compartment_name, e))?;

        let namespace = stack
            .read(
                Resource::new(resources::NAMESPACE, &config.compartment_name)
                    .with_attribute("compartment_id", compartment.id_ref()),
            )
            .map_err(|e| InfraError::provider(&config.compartment_name, e))?;

        let bucket = stack
            .register(
                Resource::new(resources::BUCKET, &config.bucket_name)
                    .with_attribute("name", Value::string(&config.bucket_name))
                    .with_attribute("namespace", namespace.output("namespace"))
                    .with_attribute("compartment_id", compartment.id_ref()),
            )
            .map_err(|e| InfraError::provider(&config.bucket_name, e))?;

        info!(
            "Bucket {} in compartment {}",
            config.bucket_name, config.compartment_name
        );
        Ok(StorageHandles {
            compartment,
            namespace,
            bucket,
        })
    }
}
