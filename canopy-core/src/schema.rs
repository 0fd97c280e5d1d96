//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type,
//! enabling type validation when a resource is registered.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Floating point number
    Float,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map with values of a single type
    Map(Box<AttributeType>),
    /// Map with a fixed set of typed fields
    Struct {
        name: String,
        fields: Vec<AttributeSchema>,
    },
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            // ResourceRef values resolve to strings at apply time
            (AttributeType::String, Value::String(_) | Value::ResourceRef(_, _)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Float, Value::Float(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            // References cannot be checked until they are resolved
            (AttributeType::Custom { .. }, Value::ResourceRef(_, _)) => Ok(()),
            (AttributeType::Custom { validate, .. }, v) => {
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Struct { fields, .. }, Value::Map(map)) => {
                for field in fields {
                    match map.get(&field.name) {
                        Some(v) => {
                            field
                                .attr_type
                                .validate(v)
                                .map_err(|e| TypeError::FieldError {
                                    field: field.name.clone(),
                                    inner: Box::new(e),
                                })?
                        }
                        None if field.required => {
                            return Err(TypeError::MissingRequired {
                                name: field.name.clone(),
                            });
                        }
                        None => {}
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Float => "Float".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Struct { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("Field '{field}': {inner}")]
    FieldError { field: String, inner: Box<TypeError> },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::ResourceRef(binding, attr) => format!("ResourceRef({}.{})", binding, attr),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        for (name, value) in attributes {
            if let Some(schema) = self.attributes.get(name)
                && let Err(e) = schema.attr_type.validate(value)
            {
                errors.push(TypeError::AttributeError {
                    name: name.clone(),
                    inner: Box::new(e),
                });
            }
            // Unknown attributes are allowed (for flexibility)
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if *n > 0 => Ok(()),
                Value::Int(_) => Err("Value must be positive".to_string()),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// Positive floating point type (e.g., OCPU count)
    pub fn positive_float() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveFloat".to_string(),
            base: Box::new(AttributeType::Float),
            validate: |value| match value {
                Value::Float(n) if *n > 0.0 => Ok(()),
                Value::Float(_) => Err("Value must be positive".to_string()),
                _ => Err("Expected float".to_string()),
            },
        }
    }

    /// CIDR block type (e.g., "10.0.0.0/16")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_cidr(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }

    /// Port number type (1-65535)
    pub fn port_number() -> AttributeType {
        AttributeType::Custom {
            name: "PortNumber".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if (1..=65535).contains(n) => Ok(()),
                Value::Int(_) => Err("Port number must be between 1 and 65535".to_string()),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// Port range type: a map with `min` and `max` ports, `min <= max`
    pub fn port_range() -> AttributeType {
        AttributeType::Custom {
            name: "PortRange".to_string(),
            base: Box::new(AttributeType::Map(Box::new(AttributeType::Int))),
            validate: |value| {
                let Value::Map(map) = value else {
                    return Err("Expected map with min and max".to_string());
                };
                let port = |key: &str| -> Result<i64, String> {
                    let value = map
                        .get(key)
                        .ok_or_else(|| format!("Port range is missing '{}'", key))?;
                    port_number()
                        .validate(value)
                        .map_err(|e| format!("Port '{}': {}", key, e))?;
                    match value {
                        Value::Int(n) => Ok(*n),
                        _ => Err(format!("Port '{}' must be an integer", key)),
                    }
                };
                let min = port("min")?;
                let max = port("max")?;
                if min > max {
                    return Err(format!("Port range min {} is greater than max {}", min, max));
                }
                Ok(())
            },
        }
    }
}

/// Validate CIDR block format (e.g., "10.0.0.0/16")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let parts: Vec<&str> = cidr.split('/').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid CIDR format '{}': expected IP/prefix", cidr));
    }

    let ip = parts[0];
    let prefix = parts[1];

    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("Invalid IP address '{}': expected 4 octets", ip));
    }

    for octet in &octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!(
                "Invalid octet '{}' in IP address: must be 0-255",
                octet
            ));
        }
    }

    match prefix.parse::<u8>() {
        Ok(p) if p <= 32 => Ok(()),
        Ok(p) => Err(format!("Invalid prefix length '{}': must be 0-32", p)),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}
