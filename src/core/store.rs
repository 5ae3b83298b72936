use crate::core::template::Template;
use crate::domain::model::{display_value, Property};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Name -> property mapping owned by one binding session.
#[derive(Debug, Default)]
pub struct ModelStore {
    properties: IndexMap<String, Property>,
    revision: u64,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Raw accessor: base value, or the unresolved template of a calculated property.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.properties.get(name).map(Property::raw)
    }

    pub fn is_calculated(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .is_some_and(Property::is_calculated)
    }

    pub fn set_base(&mut self, name: &str, value: Value) {
        self.properties
            .insert(name.to_string(), Property::Base(value));
        self.revision += 1;
    }

    pub fn set_calculated(&mut self, name: &str, template: Template) {
        self.properties
            .insert(name.to_string(), Property::Calculated(template));
        self.revision += 1;
    }

    /// Text a template marker resolves to. Calculated properties contribute
    /// their template text, so substitution stays one level deep.
    pub fn lookup_text(&self, name: &str) -> Option<String> {
        self.properties.get(name).map(Property::raw_text)
    }

    /// Resolved value: base values as stored, calculated properties re-rendered.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        match self.properties.get(name)? {
            Property::Base(value) => Some(value.clone()),
            Property::Calculated(template) => {
                Some(Value::String(template.render(|n| self.lookup_text(n))))
            }
        }
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(name, property)| (name.clone(), property.raw()))
            .collect()
    }

    pub fn resolved_snapshot(&self) -> Map<String, Value> {
        self.properties
            .keys()
            .filter_map(|name| self.resolve(name).map(|value| (name.clone(), value)))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn display(&self, name: &str) -> Option<String> {
        self.resolve(name).map(|value| display_value(&value))
    }

    /// Number of writes since creation; clearing does not reset it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn clear(&mut self) {
        self.properties.clear();
    }
}
