use serde_json::Value;

/// Opaque handle to an element owned by a [`ViewTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementQuery<'a> {
    InputNamed(&'a str),
    TextAreaNamed(&'a str),
    WithId(&'a str),
}

impl<'a> ElementQuery<'a> {
    /// Lookup order used when binding a property to an element.
    pub fn for_property(property: &'a str) -> [ElementQuery<'a>; 3] {
        [
            ElementQuery::InputNamed(property),
            ElementQuery::TextAreaNamed(property),
            ElementQuery::WithId(property),
        ]
    }
}

/// The rendering layer: element lookup, attribute tagging and painting.
pub trait ViewTree {
    fn find(&self, query: &ElementQuery<'_>) -> Option<ElementId>;

    fn set_attribute(&mut self, element: ElementId, attribute: &str, value: &str);

    fn attribute(&self, element: ElementId, attribute: &str) -> Option<String>;

    fn elements_with_attribute(&self, attribute: &str, value: &str) -> Vec<ElementId>;

    fn paint(&mut self, element: ElementId, value: &Value);
}

/// Decides, per initial-model entry, whether the entry is bound to the view.
pub trait PropertyLinker {
    fn link(&self, property: &str) -> bool;
}

/// Binds every entry; used when no view is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl PropertyLinker for Headless {
    fn link(&self, _property: &str) -> bool {
        true
    }
}
