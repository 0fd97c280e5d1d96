//! Compute instance schema definitions

use canopy_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

pub fn instance_schema() -> ResourceSchema {
    ResourceSchema::new("core.instance")
        .with_description("A compute instance launched from an image")
        .attribute(AttributeSchema::new("compartment_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("availability_domain", AttributeType::String).required())
        .attribute(AttributeSchema::new("shape", AttributeType::String).required())
        .attribute(AttributeSchema::new("display_name", AttributeType::String))
        .attribute(
            AttributeSchema::new(
                "source_details",
                AttributeType::Struct {
                    name: "InstanceSourceDetails".to_string(),
                    fields: vec![
                        AttributeSchema::new(
                            "source_type",
                            AttributeType::Enum(vec!["image".to_string(), "bootVolume".to_string()]),
                        )
                        .required(),
                        AttributeSchema::new("source_id", AttributeType::String).required(),
                    ],
                },
            )
            .required(),
        )
        .attribute(
            AttributeSchema::new(
                "create_vnic_details",
                AttributeType::Struct {
                    name: "CreateVnicDetails".to_string(),
                    fields: vec![AttributeSchema::new("subnet_id", AttributeType::String).required()],
                },
            )
            .required(),
        )
        .attribute(
            AttributeSchema::new("metadata", AttributeType::Map(Box::new(AttributeType::String)))
                .with_description("Instance metadata, e.g. ssh_authorized_keys"),
        )
        .attribute(AttributeSchema::new(
            "shape_config",
            AttributeType::Struct {
                name: "InstanceShapeConfig".to_string(),
                fields: vec![
                    AttributeSchema::new("ocpus", types::positive_float()),
                    AttributeSchema::new("memory_in_gbs", types::positive_float()),
                ],
            },
        ))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![instance_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::resource::Value;
    use std::collections::HashMap;

    #[test]
    fn instance_requires_source_and_vnic() {
        let schema = instance_schema();
        let attrs: HashMap<String, Value> = [
            ("compartment_id".to_string(), Value::string("c")),
            ("availability_domain".to_string(), Value::string("ad-1")),
            ("shape".to_string(), Value::string("VM.Standard.E4.Flex")),
        ]
        .into();

        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn shape_config_rejects_non_positive() {
        let schema = instance_schema();
        let t = &schema.attributes["shape_config"].attr_type;
        assert!(t.validate(&Value::map([("ocpus", Value::Float(2.0))])).is_ok());
        assert!(t.validate(&Value::map([("memory_in_gbs", Value::Float(0.0))])).is_err());
    }
}
