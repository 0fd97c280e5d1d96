//! Configuration model loaded from the YAML stack description
//!
//! The file is read once, validated, and then passed by reference to every
//! builder. Nothing mutates it afterwards.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::{ConfigError, InfraResult, ValidationError};

/// Default location of the stack description, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/dev/config.yaml";

/// Default availability domain for instances that do not name one
pub const DEFAULT_AVAILABILITY_DOMAIN: &str = "ad-1";

/// Fields shared by every section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    pub compartment_id: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubnetConfig {
    pub name: String,
    pub cidr_block: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TcpOptionConfig {
    pub min_port: u16,
    pub max_port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SecurityListConfig {
    pub display_name: String,
    pub protocol: String,
    pub description: String,
    /// Egress CIDR
    pub destination: Option<String>,
    /// Ingress CIDR
    pub source: Option<String>,
    pub stateless: bool,
    pub tcp_options: Vec<TcpOptionConfig>,
    /// Name of the subnet this list is attached to (plain string match)
    pub subnet_name: Option<String>,
}

impl SecurityListConfig {
    /// The egress CIDR, if one is really configured
    pub fn egress_cidr(&self) -> Option<&str> {
        configured(&self.destination)
    }

    /// The ingress CIDR, if one is really configured
    pub fn ingress_cidr(&self) -> Option<&str> {
        configured(&self.source)
    }

    /// The attachment tag, if non-empty
    pub fn subnet_tag(&self) -> Option<&str> {
        self.subnet_name.as_deref().filter(|s| !s.is_empty())
    }
}

/// Empty strings and the literal "null" both mean "not set"
fn configured(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "null")
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub cidr_block: String,
    pub display_name: String,
    pub subnets: Vec<SubnetConfig>,
    pub security_lists: Vec<SecurityListConfig>,
}

impl NetworkConfig {
    pub fn validate(&self) -> InfraResult<()> {
        if self.base.compartment_id.is_empty() {
            return Err(ValidationError::missing("compartment_id").into());
        }
        self.validate_references()
    }

    /// Structural checks run at load time: subnet names are present and
    /// unique, and every security-list tag names a configured subnet.
    pub fn validate_references(&self) -> InfraResult<()> {
        let mut names = HashSet::new();
        for (i, subnet) in self.subnets.iter().enumerate() {
            if subnet.name.is_empty() {
                return Err(ValidationError::missing_in("subnet", i, "name").into());
            }
            if !names.insert(subnet.name.as_str()) {
                return Err(ValidationError::DuplicateSubnet {
                    name: subnet.name.clone(),
                }
                .into());
            }
        }

        for list in &self.security_lists {
            if let Some(tag) = list.subnet_tag() {
                if !names.contains(tag) {
                    return Err(ValidationError::UnknownSubnet {
                        security_list: list.display_name.clone(),
                        subnet_name: tag.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub name: String,
    pub display_name: Option<String>,
    pub shape: String,
    /// Subnet OCID, or the name of a subnet defined in the network section
    pub subnet_id: String,
    pub image_ocid: String,
    pub ssh_public_key: String,
    pub ocpu_count: Option<f64>,
    pub memory_gb: Option<f64>,
}

impl InstanceConfig {
    /// Display name, falling back to the instance name
    pub fn display_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }

    pub fn ocpus(&self) -> Option<f64> {
        self.ocpu_count.filter(|n| n.is_finite() && *n > 0.0)
    }

    pub fn memory_in_gbs(&self) -> Option<f64> {
        self.memory_gb.filter(|n| n.is_finite() && *n > 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    /// Shape for instances that leave `shape` empty
    pub instance_shape: Option<String>,
    pub availability_domain: Option<String>,
    pub instances: Vec<InstanceConfig>,
}

impl ComputeConfig {
    /// Check the fields every instance needs before anything is created
    pub fn validate(&self) -> InfraResult<()> {
        if self.base.compartment_id.is_empty() {
            return Err(ValidationError::missing("compartment_id").into());
        }

        if self.instances.is_empty() {
            return Err(ValidationError::missing("instances").into());
        }

        for (i, instance) in self.instances.iter().enumerate() {
            let missing = if instance.name.is_empty() {
                Some("name")
            } else if self.shape_of(instance).is_empty() {
                Some("shape")
            } else if instance.subnet_id.is_empty() {
                Some("subnet_id")
            } else if instance.image_ocid.is_empty() {
                Some("image_ocid")
            } else if instance.ssh_public_key.is_empty() {
                Some("ssh_public_key")
            } else {
                None
            };

            if let Some(field) = missing {
                return Err(ValidationError::missing_in("instance", i, field).into());
            }
        }

        Ok(())
    }

    /// Shape of an instance, falling back to the section-wide default
    pub fn shape_of<'a>(&'a self, instance: &'a InstanceConfig) -> &'a str {
        if !instance.shape.is_empty() {
            return &instance.shape;
        }
        self.instance_shape.as_deref().unwrap_or_default()
    }

    pub fn availability_domain(&self) -> &str {
        match self.availability_domain.as_deref() {
            Some(ad) if !ad.is_empty() => ad,
            _ => DEFAULT_AVAILABILITY_DOMAIN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BastionConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatwaveConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
}

/// Compartment and object-storage bucket created next to the topology
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `compartment_id` is the parent of the new compartment
    #[serde(flatten)]
    pub base: BaseConfig,
    pub compartment_name: String,
    pub compartment_description: String,
    pub bucket_name: String,
    pub enable_delete: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            compartment_name: String::new(),
            compartment_description: String::new(),
            bucket_name: String::new(),
            enable_delete: true,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> InfraResult<()> {
        let missing = if self.base.compartment_id.is_empty() {
            Some("compartment_id")
        } else if self.compartment_name.is_empty() {
            Some("compartment_name")
        } else if self.bucket_name.is_empty() {
            Some("bucket_name")
        } else {
            None
        };

        match missing {
            Some(field) => Err(ValidationError::missing(field).into()),
            None => Ok(()),
        }
    }
}

/// Root of the stack description
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub compute: ComputeConfig,
    pub bastion: BastionConfig,
    pub heatwave: HeatwaveConfig,
    pub storage: Option<StorageConfig>,
}

impl Config {
    /// Read, parse and structurally validate the stack description
    pub fn load(path: impl AsRef<Path>) -> InfraResult<Self> {
        let path = path.as_ref();
        debug!("Reading configuration from {:?}", path);

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

        config.network.validate_references()?;
        Ok(config)
    }

    /// Parse without touching the filesystem or validating
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}
