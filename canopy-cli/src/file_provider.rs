//! File-based local Provider
//!
//! Stands in for the OCI API: created resources are recorded in
//! `<state_dir>/state.json` under their `type.name` key and receive a
//! synthetic OCID. The object storage namespace lookup is answered with a
//! namespace generated once and then kept in the same file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use canopy_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ResourceType};
use canopy_core::resource::{Resource, ResourceId, State, Value};
use canopy_oci::resources;

/// Attribute under which the synthetic OCID is stored
const ID_KEY: &str = "id";

type StateMap = HashMap<String, HashMap<String, serde_json::Value>>;

pub struct FileProvider {
    state_file: PathBuf,
}

impl FileProvider {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_file: state_dir.as_ref().join("state.json"),
        }
    }

    fn load_states(&self) -> ProviderResult<StateMap> {
        if !self.state_file.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.state_file).map_err(|e| {
            ProviderError::new(format!("Failed to read {}", self.state_file.display())).with_cause(e)
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ProviderError::new(format!("Corrupt state file {}", self.state_file.display()))
                .with_cause(e)
        })
    }

    fn save_states(&self, states: &StateMap) -> ProviderResult<()> {
        let write = || -> Result<(), std::io::Error> {
            if let Some(parent) = self.state_file.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(states)?;
            fs::write(&self.state_file, content)
        };
        write().map_err(|e| ProviderError::new("Failed to save state").with_cause(e))
    }

    fn resource_key(id: &ResourceId) -> String {
        id.to_string()
    }

    fn to_state(id: ResourceId, attrs: &HashMap<String, serde_json::Value>) -> State {
        let mut attributes: HashMap<String, Value> = attrs
            .iter()
            .map(|(k, v)| (k.clone(), json_to_value(v)))
            .collect();
        let identifier = match attributes.remove(ID_KEY) {
            Some(Value::String(ocid)) => Some(ocid),
            _ => None,
        };
        let state = State::existing(id, attributes);
        match identifier {
            Some(ocid) => state.with_identifier(ocid),
            None => state,
        }
    }
}

/// Synthetic OCID, e.g. `ocid1.securitylist.oc1..<uuid>`
pub fn synthetic_ocid(resource_type: &str) -> String {
    let kind = resource_type
        .rsplit('.')
        .next()
        .unwrap_or(resource_type)
        .replace('_', "");
    format!("ocid1.{}.oc1..{}", kind, uuid::Uuid::new_v4().simple())
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Int(n) => serde_json::Value::Number((*n).into()),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => {
            let obj: serde_json::Map<_, _> = map
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect();
            serde_json::Value::Object(obj)
        }
        // References are resolved before a resource reaches the provider
        Value::ResourceRef(binding, attr) => {
            serde_json::Value::String(format!("${{{}.{}}}", binding, attr))
        }
    }
}

pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        ),
        serde_json::Value::Null => Value::String("null".to_string()),
    }
}

impl Provider for FileProvider {
    fn name(&self) -> &'static str {
        "file"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn read(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let mut states = self.load_states()?;
            let key = Self::resource_key(&resource.id);

            if let Some(attrs) = states.get(&key) {
                return Ok(Self::to_state(resource.id, attrs));
            }

            if resource.id.resource_type != resources::NAMESPACE {
                return Ok(State::not_found(resource.id));
            }

            let namespace = uuid::Uuid::new_v4().simple().to_string()[..12].to_string();
            let mut attrs: HashMap<String, serde_json::Value> = resource
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect();
            attrs.insert("namespace".to_string(), serde_json::Value::String(namespace));

            let state = Self::to_state(resource.id.clone(), &attrs);
            states.insert(key, attrs);
            self.save_states(&states)?;
            Ok(state)
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let mut states = self.load_states()?;
            let key = Self::resource_key(&resource.id);
            let ocid = synthetic_ocid(&resource.id.resource_type);

            let mut attrs: HashMap<String, serde_json::Value> = resource
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect();
            attrs.insert(ID_KEY.to_string(), serde_json::Value::String(ocid.clone()));

            states.insert(key, attrs);
            self.save_states(&states)?;

            Ok(State::existing(resource.id, resource.attributes).with_identifier(ocid))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocid_kind_follows_resource_type() {
        assert!(synthetic_ocid("core.vcn").starts_with("ocid1.vcn.oc1.."));
        assert!(synthetic_ocid("core.security_list").starts_with("ocid1.securitylist.oc1.."));
        assert!(synthetic_ocid("objectstorage.bucket").starts_with("ocid1.bucket.oc1.."));
        assert_ne!(synthetic_ocid("core.vcn"), synthetic_ocid("core.vcn"));
    }

    #[test]
    fn json_conversion_keeps_numbers_apart() {
        let value = Value::map([
            ("ocpus", Value::Float(1.5)),
            ("count", Value::Int(2)),
            ("tags", Value::List(vec![Value::string("a")])),
        ]);
        assert_eq!(json_to_value(&value_to_json(&value)), value);
    }

    #[tokio::test]
    async fn create_persists_state_with_ocid() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileProvider::new(dir.path());
        let resource = Resource::new("core.vcn", "dev-vcn")
            .with_attribute("cidr_block", Value::string("10.0.0.0/16"));

        let created = provider.create(&resource).await.unwrap();
        let ocid = created.identifier.clone().unwrap();
        assert!(ocid.starts_with("ocid1.vcn.oc1.."));

        let read = provider.read(&resource).await.unwrap();
        assert!(read.exists);
        assert_eq!(read.identifier, Some(ocid));
        assert_eq!(read.attributes.get("cidr_block"), Some(&Value::string("10.0.0.0/16")));
        assert!(!read.attributes.contains_key("id"));
    }

    #[tokio::test]
    async fn read_unknown_resource_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileProvider::new(dir.path());

        let state = provider.read(&Resource::new("core.vcn", "missing")).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn namespace_lookup_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileProvider::new(dir.path());
        let lookup = Resource::new(resources::NAMESPACE, "my-compartment")
            .with_attribute("compartment_id", Value::string("ocid1.compartment.oc1..x"))
            .with_read_only(true);

        let first = provider.read(&lookup).await.unwrap();
        let second = provider.read(&lookup).await.unwrap();

        let namespace = first.attributes.get("namespace").unwrap();
        assert_eq!(namespace.as_str().map(str::len), Some(12));
        assert_eq!(second.attributes.get("namespace"), Some(namespace));
    }

    #[tokio::test]
    async fn corrupt_state_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("state.json"), "{not json").unwrap();
        let provider = FileProvider::new(dir.path());

        let err = provider
            .create(&Resource::new("core.vcn", "dev-vcn"))
            .await
            .unwrap_err();
        assert!(err.message.contains("Corrupt state file"));
    }
}
