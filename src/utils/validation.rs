use crate::utils::error::{BinderError, Result};
use serde_json::Value;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BinderError::ConfigValidationError {
            field: field_name.to_string(),
            message: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Property names end up in template markers and element attributes, so they
/// must survive both without quoting.
pub fn validate_property_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BinderError::InvalidPropertyName {
            name: name.to_string(),
            reason: "Name cannot be empty".to_string(),
        });
    }

    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '{' | '}' | '"' | '\''))
    {
        return Err(BinderError::InvalidPropertyName {
            name: name.to_string(),
            reason: format!("Name contains forbidden character {:?}", c),
        });
    }

    Ok(())
}

pub fn validate_session_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(BinderError::InvalidSessionId {
            id: id.to_string(),
            reason: "Session id cannot be empty".to_string(),
        });
    }

    if id.chars().any(|c| c.is_whitespace() || c == ':') {
        return Err(BinderError::InvalidSessionId {
            id: id.to_string(),
            reason: "Session id cannot contain whitespace or ':'".to_string(),
        });
    }

    Ok(())
}

pub fn validate_primitive_value(property: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(_) => Err(BinderError::InvalidValue {
            property: property.to_string(),
            reason: "Arrays cannot be bound to a single property".to_string(),
        }),
        Value::Object(_) => Err(BinderError::InvalidValue {
            property: property.to_string(),
            reason: "Nested objects cannot be bound to a single property".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Checks that `model` is a flat object of primitives and hands back its entries.
pub fn validate_flat_model(model: &Value) -> Result<&serde_json::Map<String, Value>> {
    let entries = match model {
        Value::Object(entries) => entries,
        Value::Array(_) => {
            return Err(BinderError::InvalidModel {
                reason: "expected an object, got an array".to_string(),
            })
        }
        other => {
            return Err(BinderError::InvalidModel {
                reason: format!("expected an object, got {}", json_kind(other)),
            })
        }
    };

    for (name, value) in entries {
        validate_property_name(name)?;
        validate_primitive_value(name, value)?;
    }

    Ok(entries)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
