use crate::core::template::Template;
use crate::utils::error::Result;
use crate::utils::validation::validate_session_id;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Names written through `set` with this prefix declare calculated properties.
pub const CALCULATED_PREFIX: char = '_';

pub fn is_calculated_name(name: &str) -> bool {
    name.starts_with(CALCULATED_PREFIX)
}

/// Text shown for a value in a view or substituted into a template.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => value.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Base(Value),
    Calculated(Template),
}

impl Property {
    pub fn is_calculated(&self) -> bool {
        matches!(self, Property::Calculated(_))
    }

    /// Stored form: the value for base properties, the template text otherwise.
    pub fn raw(&self) -> Value {
        match self {
            Property::Base(value) => value.clone(),
            Property::Calculated(template) => Value::String(template.source().to_string()),
        }
    }

    pub fn raw_text(&self) -> String {
        match self {
            Property::Base(value) => display_value(value),
            Property::Calculated(template) => template.source().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Already applied to the model.
    Model,
    /// Produced by a view edit; still has to reach the model.
    View,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub property: String,
    pub value: Value,
    pub origin: Origin,
}

impl ChangeEvent {
    pub fn from_model(property: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
            origin: Origin::Model,
        }
    }

    pub fn from_view(property: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
            origin: Origin::View,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    Updated,
}

impl EventKind {
    pub fn suffix(self) -> &'static str {
        match self {
            EventKind::Change => "change",
            EventKind::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Change(ChangeEvent),
    Updated,
}

impl ChannelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChannelEvent::Change(_) => EventKind::Change,
            ChannelEvent::Updated => EventKind::Updated,
        }
    }
}

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Namespaces every event name and element attribute of one binding session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_session_id(&id)?;
        Ok(Self(id))
    }

    /// Process-unique id for views that carry none of their own.
    pub fn generate() -> Self {
        Self(format!("binder-{}", NEXT_SESSION.fetch_add(1, Ordering::Relaxed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn event_name(&self, kind: EventKind) -> String {
        format!("{}:{}", self.0, kind.suffix())
    }

    pub fn parse_event_name(&self, name: &str) -> Option<EventKind> {
        let suffix = name.strip_prefix(self.0.as_str())?.strip_prefix(':')?;
        [EventKind::Change, EventKind::Updated]
            .into_iter()
            .find(|kind| kind.suffix() == suffix)
    }

    /// Attribute tagging each bound element; its value is the property name.
    pub fn link_attribute(&self) -> String {
        format!("form-binder-{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
