//! Effect - A side effect described as a value
//!
//! Builders never touch infrastructure directly. Registering a resource
//! records an Effect; only the Interpreter performs it.

use crate::resource::{Resource, ResourceId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Look up a data source
    Read(Resource),
    /// Create a resource
    Create(Resource),
}

impl Effect {
    pub fn resource(&self) -> &Resource {
        match self {
            Effect::Read(r) | Effect::Create(r) => r,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.resource().id
    }

    /// Whether performing this Effect changes infrastructure
    pub fn is_mutating(&self) -> bool {
        matches!(self, Effect::Create(_))
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Read(r) => write!(f, "Read {}", r.id),
            Effect::Create(r) => write!(f, "Create {}", r.id),
        }
    }
}
