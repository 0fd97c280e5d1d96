//! Error types for building OCI topology

use std::path::PathBuf;

use canopy_core::provider::ProviderError;
use thiserror::Error;

/// Result type alias for topology operations
pub type InfraResult<T> = Result<T, InfraError>;

/// Errors raised while loading configuration from disk
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A configuration value is missing or inconsistent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is empty. `entry` is the list entry kind and its
    /// position when the field belongs to a list item (e.g. `("instance", 2)`).
    #[error("{}", describe_missing(field, entry))]
    MissingField {
        field: &'static str,
        entry: Option<(&'static str, usize)>,
    },

    #[error("subnet '{name}' is defined more than once")]
    DuplicateSubnet { name: String },

    #[error("security list '{security_list}' references unknown subnet '{subnet_name}'")]
    UnknownSubnet {
        security_list: String,
        subnet_name: String,
    },
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field, entry: None }
    }

    pub fn missing_in(entry: &'static str, index: usize, field: &'static str) -> Self {
        Self::MissingField {
            field,
            entry: Some((entry, index)),
        }
    }
}

fn describe_missing(field: &str, entry: &Option<(&'static str, usize)>) -> String {
    match entry {
        Some((kind, index)) => format!("{}[{}]: {} is required", kind, index, field),
        None if field == "instances" => "at least one instance must be defined".to_string(),
        None => format!("{} is required", field),
    }
}

/// Errors that can occur while building topology
#[derive(Error, Debug)]
pub enum InfraError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} index {index} out of range (have {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("provisioning context cannot be absent")]
    NilContext,

    #[error("failed to register {resource}: {source}")]
    Provider {
        resource: String,
        #[source]
        source: ProviderError,
    },

    #[error("failed to create {kind} {name}: {source}")]
    Resource {
        kind: &'static str,
        name: String,
        #[source]
        source: Box<InfraError>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl InfraError {
    pub(crate) fn provider(resource: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            resource: resource.into(),
            source,
        }
    }

    pub(crate) fn wrap(kind: &'static str, name: impl Into<String>, source: InfraError) -> Self {
        Self::Resource {
            kind,
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, past any per-resource wrapping
    pub fn root(&self) -> &InfraError {
        match self {
            Self::Resource { source, .. } => source.root(),
            other => other,
        }
    }
}
