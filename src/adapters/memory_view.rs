use crate::domain::model::display_value;
use crate::domain::ports::{ElementId, ElementQuery, ViewTree};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Input,
    Checkbox,
    Radio,
    Textarea,
    Select,
    Other,
}

impl ElementKind {
    fn is_input(self) -> bool {
        matches!(self, ElementKind::Input | ElementKind::Checkbox | ElementKind::Radio)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    /// Current value of text-like controls, fixed value of checkboxes and radios.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            name: None,
            id: None,
            value: String::new(),
            checked: false,
            text: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }
}

/// A flat, in-memory element list standing in for a rendered form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryView {
    elements: Vec<Element>,
}

impl MemoryView {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn push(&mut self, element: Element) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Simulates a user typing into a text-like control.
    pub fn type_into(&mut self, id: ElementId, value: &str) -> bool {
        match self.elements.get_mut(id.0) {
            Some(element) => {
                element.value = value.to_string();
                true
            }
            None => false,
        }
    }

    fn paint_radio_group(&mut self, name: &str, text: &str) {
        for element in self
            .elements
            .iter_mut()
            .filter(|e| e.kind == ElementKind::Radio && e.name.as_deref() == Some(name))
        {
            element.checked = element.value == text;
        }
    }
}

impl ViewTree for MemoryView {
    fn find(&self, query: &ElementQuery<'_>) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| match query {
                ElementQuery::InputNamed(name) => {
                    e.kind.is_input() && e.name.as_deref() == Some(*name)
                }
                ElementQuery::TextAreaNamed(name) => {
                    e.kind == ElementKind::Textarea && e.name.as_deref() == Some(*name)
                }
                ElementQuery::WithId(id) => e.id.as_deref() == Some(*id),
            })
            .map(ElementId)
    }

    fn set_attribute(&mut self, element: ElementId, attribute: &str, value: &str) {
        if let Some(e) = self.elements.get_mut(element.0) {
            e.attributes.insert(attribute.to_string(), value.to_string());
        }
    }

    fn attribute(&self, element: ElementId, attribute: &str) -> Option<String> {
        self.elements
            .get(element.0)
            .and_then(|e| e.attributes.get(attribute).cloned())
    }

    fn elements_with_attribute(&self, attribute: &str, value: &str) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.attributes.get(attribute).map(String::as_str) == Some(value))
            .map(|(i, _)| ElementId(i))
            .collect()
    }

    fn paint(&mut self, element: ElementId, value: &Value) {
        let text = display_value(value);
        let Some(e) = self.elements.get_mut(element.0) else {
            return;
        };

        match e.kind {
            ElementKind::Radio => {
                if let Some(name) = e.name.clone() {
                    self.paint_radio_group(&name, &text);
                }
            }
            ElementKind::Checkbox => e.checked = e.value == text,
            ElementKind::Input | ElementKind::Textarea | ElementKind::Select => e.value = text,
            ElementKind::Other => e.text = text,
        }
    }
}
