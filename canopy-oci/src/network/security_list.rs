use std::collections::HashMap;

use canopy_core::context::{ResourceHandle, Stack};
use canopy_core::resource::{Resource, Value};
use log::{debug, warn};

use super::NetworkBuilder;
use crate::config::SecurityListConfig;
use crate::error::{InfraError, InfraResult};
use crate::resources;

impl NetworkBuilder<'_> {
    /// Register one security list per configured entry, in order
    pub fn create_security_lists(
        &self,
        stack: &mut Stack,
        vcn_id: &Value,
    ) -> InfraResult<Vec<ResourceHandle>> {
        let mut handles = Vec::with_capacity(self.config.security_lists.len());
        for (i, list) in self.config.security_lists.iter().enumerate() {
            handles.push(self.create_security_list(stack, i, list, vcn_id)?);
        }
        Ok(handles)
    }

    /// Register every security list and key the handles by display name.
    /// Unnamed lists are keyed by their generated `security-list-<i>` name.
    ///
    /// Display names are not checked for uniqueness: when two lists share a
    /// name both are registered and the later one wins the map entry.
    pub fn create_security_list_map(
        &self,
        stack: &mut Stack,
        vcn_id: &Value,
    ) -> InfraResult<HashMap<String, ResourceHandle>> {
        let mut map = HashMap::new();
        for (i, list) in self.config.security_lists.iter().enumerate() {
            let handle = self.create_security_list(stack, i, list, vcn_id)?;
            let name = handle.name().to_string();
            if map.insert(name.clone(), handle).is_some() {
                warn!(
                    "Security list '{}' is defined more than once; the last definition is attached",
                    name
                );
            }
        }
        Ok(map)
    }

    /// Group security-list display names by the subnet they are tagged for.
    /// Untagged lists are not attached anywhere.
    pub fn subnet_security_list_map(&self) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for list in &self.config.security_lists {
            if let Some(subnet) = list.subnet_tag() {
                map.entry(subnet.to_string())
                    .or_default()
                    .push(list.display_name.clone());
            }
        }
        map
    }

    /// Ids of the security lists tagged for `subnet_name`, in configuration
    /// order. Names with no entry in `security_lists` are skipped.
    pub fn resolve_security_list_ids(
        &self,
        subnet_name: &str,
        security_lists: &HashMap<String, ResourceHandle>,
    ) -> Vec<Value> {
        let by_subnet = self.subnet_security_list_map();
        let Some(names) = by_subnet.get(subnet_name) else {
            return Vec::new();
        };

        names
            .iter()
            .filter_map(|name| match security_lists.get(name) {
                Some(handle) => Some(handle.id_ref()),
                None => {
                    debug!("No security list '{}' created for subnet {}", name, subnet_name);
                    None
                }
            })
            .collect()
    }

    fn create_security_list(
        &self,
        stack: &mut Stack,
        index: usize,
        list: &SecurityListConfig,
        vcn_id: &Value,
    ) -> InfraResult<ResourceHandle> {
        let name = if list.display_name.is_empty() {
            format!("security-list-{}", index)
        } else {
            list.display_name.clone()
        };

        let resource = Resource::new(resources::SECURITY_LIST, &name)
            .with_attribute("compartment_id", self.compartment_id())
            .with_attribute("vcn_id", vcn_id.clone())
            .with_attribute("display_name", Value::string(&list.display_name))
            .with_optional_attribute(
                "egress_security_rules",
                list.egress_cidr()
                    .map(|cidr| Value::List(vec![security_rule(list, "destination", cidr)])),
            )
            .with_optional_attribute(
                "ingress_security_rules",
                list.ingress_cidr()
                    .map(|cidr| Value::List(vec![security_rule(list, "source", cidr)])),
            );

        stack
            .register(resource)
            .map_err(|e| InfraError::provider(name, e))
    }
}

fn security_rule(list: &SecurityListConfig, peer: &str, cidr: &str) -> Value {
    let mut rule = HashMap::from([
        ("protocol".to_string(), Value::string(&list.protocol)),
        (peer.to_string(), Value::string(cidr)),
        ("stateless".to_string(), Value::Bool(list.stateless)),
    ]);
    if !list.description.is_empty() {
        rule.insert("description".to_string(), Value::string(&list.description));
    }
    if !list.tcp_options.is_empty() {
        let ranges = list
            .tcp_options
            .iter()
            .map(|opt| {
                Value::map([
                    ("min", Value::Int(i64::from(opt.min_port))),
                    ("max", Value::Int(i64::from(opt.max_port))),
                ])
            })
            .collect();
        rule.insert("tcp_options".to_string(), Value::List(ranges));
    }
    Value::Map(rule)
}
