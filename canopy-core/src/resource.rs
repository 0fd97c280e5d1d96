//! Resource - Representing resources and their state

use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "core.vcn", "core.instance")
    pub resource_type: String,
    /// Resource name (logical name given by the builder)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to another resource's attribute (binding, attribute_name).
    /// Only known once the referenced resource has been created.
    ResourceRef(String, String),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Build a map value from key/value pairs
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true if this value (or anything nested in it) is still a reference
    pub fn is_unresolved(&self) -> bool {
        match self {
            Value::ResourceRef(_, _) => true,
            Value::List(items) => items.iter().any(Value::is_unresolved),
            Value::Map(map) => map.values().any(Value::is_unresolved),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                let strs: Vec<_> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", strs.join(", "))
            }
            Value::Map(map) => {
                // Sorted so that plan output is stable between runs
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                let strs: Vec<_> = keys
                    .into_iter()
                    .map(|k| format!("{}: {}", k, map[k]))
                    .collect();
                write!(f, "{{{}}}", strs.join(", "))
            }
            Value::ResourceRef(binding, attr) => write!(f, "${{{}.{}}}", binding, attr),
        }
    }
}

/// Desired state declared by a builder
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// If true, this is a data source (read-only) that won't be modified
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Insert the attribute only when a value is present
    pub fn with_optional_attribute(self, key: impl Into<String>, value: Option<Value>) -> Self {
        match value {
            Some(value) => self.with_attribute(key, value),
            None => self,
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Binding under which other resources reference this one
    pub fn binding(&self) -> String {
        self.id.to_string()
    }
}

/// Current state returned by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Provider internal identifier (e.g., an OCID)
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Attributes visible to references, with `id` filled from the identifier
    pub fn referenceable_attributes(&self) -> HashMap<String, Value> {
        let mut attrs = self.attributes.clone();
        if let Some(identifier) = &self.identifier {
            attrs
                .entry("id".to_string())
                .or_insert_with(|| Value::String(identifier.clone()));
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_display() {
        let id = ResourceId::new("core.vcn", "main");
        assert_eq!(id.to_string(), "core.vcn.main");
    }

    #[test]
    fn optional_attribute_is_skipped_when_none() {
        let resource = Resource::new("core.subnet", "public")
            .with_optional_attribute("dns_label", None)
            .with_optional_attribute("cidr_block", Some(Value::string("10.0.1.0/24")));

        assert!(resource.get("dns_label").is_none());
        assert_eq!(
            resource.get("cidr_block"),
            Some(&Value::string("10.0.1.0/24"))
        );
    }

    #[test]
    fn nested_reference_is_unresolved() {
        let value = Value::List(vec![
            Value::string("a"),
            Value::map([(
                "subnet_id",
                Value::ResourceRef("core.subnet.public".to_string(), "id".to_string()),
            )]),
        ]);
        assert!(value.is_unresolved());
        assert!(!Value::string("a").is_unresolved());
    }

    #[test]
    fn referenceable_attributes_include_identifier() {
        let state = State::existing(ResourceId::new("core.vcn", "main"), HashMap::new())
            .with_identifier("ocid1.vcn.oc1..abc");
        let attrs = state.referenceable_attributes();
        assert_eq!(attrs.get("id"), Some(&Value::string("ocid1.vcn.oc1..abc")));
    }

    #[test]
    fn map_display_is_sorted() {
        let value = Value::map([("max", Value::Int(22)), ("min", Value::Int(22))]);
        assert_eq!(value.to_string(), "{max: 22, min: 22}");
    }
}
