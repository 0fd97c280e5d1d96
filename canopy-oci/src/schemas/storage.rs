//! Identity and object storage schema definitions

use std::sync::LazyLock;

use canopy_core::resource::Value;
use canopy_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use regex::Regex;

static COMPARTMENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,100}$").unwrap());

static BUCKET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,256}$").unwrap());

/// Compartment name: 1-100 letters, digits, periods, hyphens or underscores
pub fn compartment_name() -> AttributeType {
    AttributeType::Custom {
        name: "CompartmentName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if COMPARTMENT_NAME.is_match(s) => Ok(()),
            Value::String(s) => Err(format!(
                "Invalid compartment name '{}': use 1-100 letters, digits, '.', '-' or '_'",
                s
            )),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// Bucket name: 1-256 letters, digits, hyphens or underscores
pub fn bucket_name() -> AttributeType {
    AttributeType::Custom {
        name: "BucketName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if BUCKET_NAME.is_match(s) => Ok(()),
            Value::String(s) => Err(format!(
                "Invalid bucket name '{}': use 1-256 letters, digits, '-' or '_'",
                s
            )),
            _ => Err("Expected string".to_string()),
        },
    }
}

pub fn compartment_schema() -> ResourceSchema {
    ResourceSchema::new("identity.compartment")
        .with_description("An IAM compartment")
        .attribute(
            AttributeSchema::new("compartment_id", AttributeType::String)
                .required()
                .with_description("Parent compartment or tenancy"),
        )
        .attribute(AttributeSchema::new("name", compartment_name()).required())
        .attribute(AttributeSchema::new("description", AttributeType::String).required())
        .attribute(AttributeSchema::new("enable_delete", AttributeType::Bool))
}

pub fn namespace_schema() -> ResourceSchema {
    ResourceSchema::new("objectstorage.namespace")
        .with_description("Object storage namespace lookup (data source)")
        .attribute(AttributeSchema::new("compartment_id", AttributeType::String))
        .attribute(
            AttributeSchema::new("namespace", AttributeType::String)
                .with_description("The namespace (read-only)"),
        )
}

pub fn bucket_schema() -> ResourceSchema {
    ResourceSchema::new("objectstorage.bucket")
        .with_description("An object storage bucket")
        .attribute(AttributeSchema::new("compartment_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("namespace", AttributeType::String).required())
        .attribute(AttributeSchema::new("name", bucket_name()).required())
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![compartment_schema(), namespace_schema(), bucket_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_compartment_name() {
        let t = compartment_name();
        assert!(t.validate(&Value::string("my-compartment")).is_ok());
        assert!(t.validate(&Value::string("dev.team_1")).is_ok());
        assert!(t.validate(&Value::string("")).is_err());
        assert!(t.validate(&Value::string("has space")).is_err());
    }

    #[test]
    fn validate_bucket_name() {
        let t = bucket_name();
        assert!(t.validate(&Value::string("my-bucket")).is_ok());
        assert!(t.validate(&Value::string("my.bucket")).is_err());
        assert!(t.validate(&Value::string("x".repeat(257))).is_err());
        assert!(
            t.validate(&Value::ResourceRef("a".to_string(), "b".to_string()))
                .is_ok()
        );
    }
}
