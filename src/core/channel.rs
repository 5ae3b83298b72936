//! Per-session publish/subscribe bus carrying `change` and `updated` events.
//!
//! One `EventChannel` is created per binding session and handed by reference
//! to both the session and the view side. Listeners are registered by event
//! kind, and change listeners may additionally filter on the event origin.
//! Dispatch runs over a snapshot of the listener list with no borrow held, so
//! a listener can publish, subscribe or drop its own [`Subscription`] while
//! being called. Listeners removed mid-dispatch still see the event being
//! dispatched, never the next one.

use crate::domain::model::{ChangeEvent, ChannelEvent, EventKind, Origin, SessionId};
use crate::utils::error::{BinderError, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn(&ChannelEvent)>;

struct Entry {
    id: u64,
    kind: EventKind,
    origin: Option<Origin>,
    listener: Listener,
}

impl Entry {
    fn accepts(&self, event: &ChannelEvent) -> bool {
        if self.kind != event.kind() {
            return false;
        }
        match (self.origin, event) {
            (Some(origin), ChannelEvent::Change(change)) => change.origin == origin,
            _ => true,
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
    disposed: bool,
}

#[derive(Clone)]
pub struct EventChannel {
    session: SessionId,
    registry: Rc<RefCell<Registry>>,
}

impl EventChannel {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn event_name(&self, kind: EventKind) -> String {
        self.session.event_name(kind)
    }

    pub fn on_change(&self, handler: impl Fn(&ChangeEvent) + 'static) -> Subscription {
        self.register(EventKind::Change, None, change_listener(handler))
    }

    /// Change listener that only sees events of the given origin.
    pub fn on_change_from(
        &self,
        origin: Origin,
        handler: impl Fn(&ChangeEvent) + 'static,
    ) -> Subscription {
        self.register(EventKind::Change, Some(origin), change_listener(handler))
    }

    pub fn on_updated(&self, handler: impl Fn() + 'static) -> Subscription {
        self.register(EventKind::Updated, None, Rc::new(move |_| handler()))
    }

    /// Subscribes by full event name, `<session>:change` or `<session>:updated`.
    pub fn on(
        &self,
        name: &str,
        handler: impl Fn(&ChannelEvent) + 'static,
    ) -> Result<Subscription> {
        let kind = self
            .session
            .parse_event_name(name)
            .ok_or_else(|| BinderError::UnknownEvent {
                name: name.to_string(),
                session: self.session.to_string(),
            })?;
        Ok(self.register(kind, None, Rc::new(handler)))
    }

    pub fn publish(&self, event: ChannelEvent) {
        let listeners: Vec<Listener> = {
            let registry = self.registry.borrow();
            if registry.disposed {
                tracing::debug!("{}: dropping event on disposed channel", self.session);
                return;
            }
            registry
                .entries
                .iter()
                .filter(|entry| entry.accepts(&event))
                .map(|entry| Rc::clone(&entry.listener))
                .collect()
        };

        match &event {
            ChannelEvent::Change(change) => tracing::debug!(
                "{} -> {} listener(s): {} = {} ({:?})",
                self.event_name(EventKind::Change),
                listeners.len(),
                change.property,
                change.value,
                change.origin
            ),
            ChannelEvent::Updated => tracing::debug!(
                "{} -> {} listener(s)",
                self.event_name(EventKind::Updated),
                listeners.len()
            ),
        }

        for listener in listeners {
            listener(&event);
        }
    }

    pub fn publish_change(&self, change: ChangeEvent) {
        self.publish(ChannelEvent::Change(change));
    }

    pub fn publish_updated(&self) {
        self.publish(ChannelEvent::Updated);
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    /// Drops every listener; later publishes and subscriptions are inert.
    pub fn dispose(&self) {
        let removed = {
            let mut registry = self.registry.borrow_mut();
            registry.disposed = true;
            std::mem::take(&mut registry.entries)
        };
        tracing::info!(
            "{}: channel disposed, {} listener(s) removed",
            self.session,
            removed.len()
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.registry.borrow().disposed
    }

    fn register(&self, kind: EventKind, origin: Option<Origin>, listener: Listener) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        if registry.disposed {
            tracing::warn!(
                "{}: ignoring subscription to '{}' on disposed channel",
                self.session,
                kind.suffix()
            );
            return Subscription::inert();
        }

        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push(Entry {
            id,
            kind,
            origin,
            listener,
        });

        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("session", &self.session)
            .field("listeners", &self.listener_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

fn change_listener(handler: impl Fn(&ChangeEvent) + 'static) -> Listener {
    Rc::new(move |event: &ChannelEvent| {
        if let ChannelEvent::Change(change) = event {
            handler(change);
        }
    })
}

/// RAII guard: the listener is removed when this is dropped.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            id: 0,
            registry: Weak::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let active = registry.borrow().entries.iter().any(|e| e.id == self.id);
        active
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().entries.retain(|entry| entry.id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn channel() -> EventChannel {
        EventChannel::new(SessionId::new("test").unwrap())
    }

    #[test]
    fn test_listeners_called_in_registration_order() {
        let channel = channel();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _a = channel.on_change(move |c| l1.borrow_mut().push(format!("a:{}", c.property)));
        let l2 = Rc::clone(&log);
        let _b = channel.on_change(move |c| l2.borrow_mut().push(format!("b:{}", c.property)));

        channel.publish_change(ChangeEvent::from_model("name", json!("x")));
        assert_eq!(*log.borrow(), vec!["a:name", "b:name"]);
    }

    #[test]
    fn test_origin_filter() {
        let channel = channel();
        let from_view = Rc::new(Cell::new(0));
        let from_model = Rc::new(Cell::new(0));

        let v = Rc::clone(&from_view);
        let _v = channel.on_change_from(Origin::View, move |_| v.set(v.get() + 1));
        let m = Rc::clone(&from_model);
        let _m = channel.on_change_from(Origin::Model, move |_| m.set(m.get() + 1));

        channel.publish_change(ChangeEvent::from_view("a", json!(1)));
        channel.publish_change(ChangeEvent::from_model("a", json!(1)));
        channel.publish_change(ChangeEvent::from_model("b", json!(2)));

        assert_eq!(from_view.get(), 1);
        assert_eq!(from_model.get(), 2);
    }

    #[test]
    fn test_updated_listeners_ignore_change_events() {
        let channel = channel();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _sub = channel.on_updated(move || c.set(c.get() + 1));

        channel.publish_change(ChangeEvent::from_model("a", json!(1)));
        assert_eq!(count.get(), 0);
        channel.publish_updated();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_subscribe_by_name() {
        let channel = channel();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _sub = channel
            .on("test:updated", move |event| {
                assert_eq!(event, &ChannelEvent::Updated);
                c.set(c.get() + 1);
            })
            .unwrap();
        channel.publish_updated();
        assert_eq!(count.get(), 1);

        assert!(matches!(
            channel.on("test:click", |_| {}),
            Err(BinderError::UnknownEvent { .. })
        ));
        assert!(matches!(
            channel.on("other:change", |_| {}),
            Err(BinderError::UnknownEvent { .. })
        ));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let channel = channel();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = channel.on_updated(move || c.set(c.get() + 1));
        assert!(sub.is_active());
        assert_eq!(channel.listener_count(), 1);

        drop(sub);
        channel.publish_updated();
        assert_eq!(count.get(), 0);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn test_reentrant_publish_from_listener() {
        let channel = channel();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let inner = channel.clone();
        let _relay = channel.on_change_from(Origin::View, move |c| {
            inner.publish_change(ChangeEvent::from_model(c.property.clone(), c.value.clone()));
        });
        let s = Rc::clone(&seen);
        let _log = channel.on_change(move |c| s.borrow_mut().push(c.origin));

        channel.publish_change(ChangeEvent::from_view("a", json!(1)));
        assert_eq!(*seen.borrow(), vec![Origin::Model, Origin::View]);
    }

    #[test]
    fn test_listener_can_drop_its_own_subscription() {
        let channel = channel();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0));

        let s = Rc::clone(&slot);
        let c = Rc::clone(&count);
        let sub = channel.on_updated(move || {
            c.set(c.get() + 1);
            s.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        channel.publish_updated();
        channel.publish_updated();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_dispose_removes_everything() {
        let channel = channel();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = channel.on_updated(move || c.set(c.get() + 1));

        channel.dispose();
        assert!(channel.is_disposed());
        assert!(!sub.is_active());
        channel.publish_updated();
        assert_eq!(count.get(), 0);

        let late = channel.on_updated(|| {});
        assert!(!late.is_active());
        assert_eq!(channel.listener_count(), 0);
    }
}
