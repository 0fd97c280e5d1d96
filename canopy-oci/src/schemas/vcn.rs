//! VCN resource schema definitions

use canopy_core::resource::Value;
use canopy_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

/// Security rule protocol: "all", or an IANA protocol number ("6" for TCP)
pub fn protocol() -> AttributeType {
    AttributeType::Custom {
        name: "Protocol".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            let Value::String(s) = value else {
                return Err("Expected string".to_string());
            };
            if s == "all" || s.parse::<u8>().is_ok() {
                Ok(())
            } else {
                Err(format!(
                    "Invalid protocol '{}', expected \"all\" or a protocol number 0-255",
                    s
                ))
            }
        },
    }
}

fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

/// A security rule; `peer` is "destination" for egress and "source" for ingress
fn security_rule(name: &str, peer: &str) -> AttributeType {
    AttributeType::Struct {
        name: name.to_string(),
        fields: vec![
            AttributeSchema::new("protocol", protocol()).required(),
            AttributeSchema::new(peer, types::cidr()).required(),
            AttributeSchema::new("description", AttributeType::String),
            AttributeSchema::new("stateless", AttributeType::Bool),
            AttributeSchema::new("tcp_options", AttributeType::List(Box::new(types::port_range())))
                .with_description("Destination port ranges; absent means all ports"),
        ],
    }
}

pub fn vcn_schema() -> ResourceSchema {
    ResourceSchema::new("core.vcn")
        .with_description("An OCI Virtual Cloud Network")
        .attribute(AttributeSchema::new("compartment_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("cidr_block", types::cidr()).required())
        .attribute(AttributeSchema::new("display_name", AttributeType::String))
}

pub fn subnet_schema() -> ResourceSchema {
    ResourceSchema::new("core.subnet")
        .with_description("A subnet within a VCN")
        .attribute(AttributeSchema::new("compartment_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("vcn_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("cidr_block", types::cidr()).required())
        .attribute(AttributeSchema::new("display_name", AttributeType::String))
        .attribute(
            AttributeSchema::new("security_list_ids", string_list())
                .with_description("Security lists attached to the subnet; absent means the VCN default"),
        )
}

pub fn security_list_schema() -> ResourceSchema {
    ResourceSchema::new("core.security_list")
        .with_description("A set of stateful or stateless firewall rules for a VCN")
        .attribute(AttributeSchema::new("compartment_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("vcn_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("display_name", AttributeType::String))
        .attribute(AttributeSchema::new(
            "egress_security_rules",
            AttributeType::List(Box::new(security_rule("EgressSecurityRule", "destination"))),
        ))
        .attribute(AttributeSchema::new(
            "ingress_security_rules",
            AttributeType::List(Box::new(security_rule("IngressSecurityRule", "source"))),
        ))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        vcn_schema(),
        subnet_schema(),
        security_list_schema(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn protocol_accepts_all_and_numbers() {
        let t = protocol();
        assert!(t.validate(&Value::string("all")).is_ok());
        assert!(t.validate(&Value::string("6")).is_ok());
        assert!(t.validate(&Value::string("17")).is_ok());
        assert!(t.validate(&Value::string("tcp")).is_err());
        assert!(t.validate(&Value::string("256")).is_err());
        assert!(t.validate(&Value::string("")).is_err());
    }

    #[test]
    fn security_list_rules_are_checked() {
        let schema = security_list_schema();
        let mut attrs: HashMap<String, Value> = [
            ("compartment_id".to_string(), Value::string("c")),
            ("vcn_id".to_string(), Value::string("v")),
        ]
        .into();
        attrs.insert(
            "ingress_security_rules".to_string(),
            Value::List(vec![Value::map([
                ("protocol", Value::string("6")),
                ("source", Value::string("0.0.0.0/0")),
                (
                    "tcp_options",
                    Value::List(vec![Value::map([("min", Value::Int(22)), ("max", Value::Int(22))])]),
                ),
            ])]),
        );
        assert!(schema.validate(&attrs).is_ok());

        attrs.insert(
            "ingress_security_rules".to_string(),
            Value::List(vec![Value::map([
                ("protocol", Value::string("6")),
                ("source", Value::string("0.0.0.0/0")),
                (
                    "tcp_options",
                    Value::List(vec![Value::map([("min", Value::Int(443)), ("max", Value::Int(80))])]),
                ),
            ])]),
        );
        assert!(schema.validate(&attrs).is_err());
    }
}
