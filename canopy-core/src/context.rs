//! Context - The provisioning context that builders register resources into
//!
//! A [`Stack`] is handed to every resource-creating call. Registering a
//! resource validates it against the provider's schema and records a
//! [`Effect`] in the stack's [`Plan`]; nothing is created until the plan is
//! applied by an [`Interpreter`](crate::interpreter::Interpreter).

use std::collections::HashMap;

use log::{debug, warn};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{ProviderError, ProviderResult, ResourceType};
use crate::resource::{Resource, ResourceId, Value};
use crate::schema::ResourceSchema;

/// Handle to a registered resource, used to reference its outputs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    id: ResourceId,
}

impl ResourceHandle {
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Reference to an attribute known once the resource exists
    pub fn output(&self, attribute: impl Into<String>) -> Value {
        Value::ResourceRef(self.id.to_string(), attribute.into())
    }

    /// Reference to the provider identifier (OCID) of the resource
    pub fn id_ref(&self) -> Value {
        self.output("id")
    }
}

/// Provisioning context for one stack
#[derive(Debug, Default)]
pub struct Stack {
    project: String,
    name: String,
    schemas: HashMap<String, ResourceSchema>,
    plan: Plan,
    outputs: Vec<(String, Value)>,
}

impl Stack {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Restrict registration to these resource types and check their schemas.
    /// A stack without resource types accepts anything.
    pub fn with_resource_types(mut self, types: Vec<Box<dyn ResourceType>>) -> Self {
        for t in types {
            self.schemas.insert(t.name().to_string(), t.schema());
        }
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a resource to be created
    pub fn register(&mut self, resource: Resource) -> ProviderResult<ResourceHandle> {
        let resource = resource.with_read_only(false);
        self.check(&resource)?;

        if self.plan.find(&resource.id).is_some() {
            warn!("{} registered more than once; the last registration wins", resource.id);
        }
        debug!("Registering {}", resource.id);

        let handle = ResourceHandle {
            id: resource.id.clone(),
        };
        self.plan.add(Effect::Create(resource));
        Ok(handle)
    }

    /// Register a data source lookup
    pub fn read(&mut self, resource: Resource) -> ProviderResult<ResourceHandle> {
        let resource = resource.with_read_only(true);
        self.check(&resource)?;
        debug!("Registering data source {}", resource.id);

        let handle = ResourceHandle {
            id: resource.id.clone(),
        };
        self.plan.add(Effect::Read(resource));
        Ok(handle)
    }

    fn check(&self, resource: &Resource) -> ProviderResult<()> {
        if self.schemas.is_empty() {
            return Ok(());
        }

        let schema = self.schemas.get(&resource.id.resource_type).ok_or_else(|| {
            ProviderError::new(format!(
                "unsupported resource type '{}'",
                resource.id.resource_type
            ))
            .for_resource(resource.id.clone())
        })?;

        schema.validate(&resource.attributes).map_err(|errors| {
            let messages: Vec<_> = errors.iter().map(|e| e.to_string()).collect();
            ProviderError::new(format!("invalid arguments: {}", messages.join("; ")))
                .for_resource(resource.id.clone())
        })
    }

    /// Export a value under a key; exporting the same key again replaces it
    pub fn export(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(existing) = self.outputs.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.outputs.push((key, value));
        }
    }

    pub fn outputs(&self) -> &[(String, Value)] {
        &self.outputs
    }

    pub fn output(&self, key: &str) -> Option<&Value> {
        self.outputs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Resources registered for creation, in registration order
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.plan.effects().iter().filter_map(|e| match e {
            Effect::Create(r) => Some(r),
            Effect::Read(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType, types};

    struct NetworkType;

    impl ResourceType for NetworkType {
        fn name(&self) -> &'static str {
            "net"
        }

        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new("net")
                .attribute(AttributeSchema::new("cidr_block", types::cidr()).required())
                .attribute(AttributeSchema::new("display_name", AttributeType::String))
        }
    }

    fn typed_stack() -> Stack {
        Stack::new("canopy", "test").with_resource_types(vec![Box::new(NetworkType)])
    }

    #[test]
    fn register_records_create_effect() {
        let mut stack = Stack::new("canopy", "test");
        let handle = stack
            .register(Resource::new("net", "main").with_attribute("x", Value::Int(1)))
            .unwrap();

        assert_eq!(handle.id(), &ResourceId::new("net", "main"));
        assert_eq!(stack.plan().len(), 1);
        assert!(matches!(stack.plan().effects()[0], Effect::Create(_)));
        assert_eq!(
            handle.id_ref(),
            Value::ResourceRef("net.main".to_string(), "id".to_string())
        );
    }

    #[test]
    fn read_records_data_source() {
        let mut stack = Stack::new("canopy", "test");
        stack.read(Resource::new("lookup", "ns")).unwrap();

        let effect = &stack.plan().effects()[0];
        assert!(matches!(effect, Effect::Read(r) if r.is_data_source()));
        assert_eq!(stack.resources().count(), 0);
    }

    #[test]
    fn schema_violation_is_provider_error() {
        let mut stack = typed_stack();
        let err = stack
            .register(Resource::new("net", "main").with_attribute("cidr_block", Value::string("10.0.0.0/99")))
            .unwrap_err();

        assert_eq!(err.resource_id, Some(ResourceId::new("net", "main")));
        assert!(err.message.contains("cidr_block"));
        assert!(stack.plan().is_empty());
    }

    #[test]
    fn unknown_type_rejected_when_types_registered() {
        let mut stack = typed_stack();
        let err = stack.register(Resource::new("bucket", "b")).unwrap_err();
        assert!(err.message.contains("unsupported resource type"));
    }

    #[test]
    fn export_replaces_existing_key() {
        let mut stack = Stack::new("canopy", "test");
        stack.export("vcn_id", Value::string("a"));
        stack.export("subnet-0", Value::string("b"));
        stack.export("vcn_id", Value::string("c"));

        assert_eq!(stack.outputs().len(), 2);
        assert_eq!(stack.outputs()[0].0, "vcn_id");
        assert_eq!(stack.output("vcn_id"), Some(&Value::string("c")));
    }
}
