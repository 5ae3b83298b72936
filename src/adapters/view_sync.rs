use crate::core::channel::{EventChannel, Subscription};
use crate::domain::model::{ChangeEvent, Origin};
use crate::domain::ports::{ElementId, ElementQuery, PropertyLinker, ViewTree};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// View side of a binding session: paints model-origin changes into every
/// element tagged with the property, and turns element edits into
/// view-origin changes.
pub struct ViewSync<V: ViewTree + 'static> {
    channel: EventChannel,
    view: Rc<RefCell<V>>,
    attribute: String,
    _painter: Subscription,
}

impl<V: ViewTree + 'static> ViewSync<V> {
    pub fn attach(channel: &EventChannel, view: Rc<RefCell<V>>) -> Self {
        let attribute = channel.session().link_attribute();

        let target = Rc::clone(&view);
        let attr = attribute.clone();
        let painter = channel.on_change_from(Origin::Model, move |change| {
            paint_bound(&target, &attr, change);
        });

        Self {
            channel: channel.clone(),
            view,
            attribute,
            _painter: painter,
        }
    }

    pub fn view(&self) -> &Rc<RefCell<V>> {
        &self.view
    }

    /// Name of the attribute linking elements to properties for this session.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Input by name, then textarea by name, then any element by id.
    pub fn locate(&self, property: &str) -> Option<ElementId> {
        let view = self.view.borrow();
        let found = ElementQuery::for_property(property)
            .iter()
            .find_map(|query| view.find(query));
        found
    }

    /// Property an element is bound to in this session, if any.
    pub fn bound_property(&self, element: ElementId) -> Option<String> {
        self.view.borrow().attribute(element, &self.attribute)
    }

    /// Reports a user edit of `element`. Returns false when the element is not
    /// bound in this session.
    pub fn edited(&self, element: ElementId, value: impl Into<Value>) -> bool {
        let Some(property) = self.bound_property(element) else {
            tracing::debug!(
                "{}: edit of unbound element {:?} ignored",
                self.channel.session(),
                element
            );
            return false;
        };

        self.channel
            .publish_change(ChangeEvent::from_view(property, value.into()));
        true
    }
}

impl<V: ViewTree + 'static> PropertyLinker for ViewSync<V> {
    fn link(&self, property: &str) -> bool {
        match self.locate(property) {
            Some(element) => {
                self.view
                    .borrow_mut()
                    .set_attribute(element, &self.attribute, property);
                true
            }
            None => {
                tracing::warn!(
                    "{}: no view element for property '{}', skipping",
                    self.channel.session(),
                    property
                );
                false
            }
        }
    }
}

fn paint_bound<V: ViewTree>(view: &RefCell<V>, attribute: &str, change: &ChangeEvent) {
    let Ok(mut view) = view.try_borrow_mut() else {
        tracing::warn!("view busy, '{}' not painted", change.property);
        return;
    };

    for element in view.elements_with_attribute(attribute, &change.property) {
        view.paint(element, &change.value);
    }
}
