use crate::core::channel::{EventChannel, Subscription};
use crate::core::dependency::DependencyGraph;
use crate::core::store::ModelStore;
use crate::core::template::Template;
use crate::domain::model::{is_calculated_name, ChangeEvent, Origin, SessionId};
use crate::domain::ports::{Headless, PropertyLinker};
use crate::utils::error::{BinderError, Result};
use crate::utils::validation::{
    validate_flat_model, validate_primitive_value, validate_property_name,
};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Outcome of loading an initial (or replacement) model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub linked: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Default)]
struct SessionState {
    store: ModelStore,
    graph: DependencyGraph,
}

/// State shared with the channel listener that applies view edits.
struct SessionCore {
    channel: EventChannel,
    state: RefCell<SessionState>,
    suppress_updates: Cell<bool>,
}

impl SessionCore {
    fn set(&self, name: &str, value: Value) -> Result<()> {
        validate_property_name(name)?;

        let calculated =
            is_calculated_name(name) || self.state.borrow().store.is_calculated(name);
        if calculated {
            return match value {
                Value::String(template) => self.set_calculated(name, &template),
                _ => Err(template_not_string(name)),
            };
        }

        validate_primitive_value(name, &value)?;

        let dependents = {
            let mut state = self.state.borrow_mut();
            state.store.set_base(name, value.clone());
            state.graph.dependents_of(name)
        };

        // No borrow may be held from here on: listeners can call back into the session.
        self.channel
            .publish_change(ChangeEvent::from_model(name, value));

        for calculated in dependents {
            let resolved = self.state.borrow().store.resolve(&calculated);
            if let Some(resolved) = resolved {
                self.channel
                    .publish_change(ChangeEvent::from_model(calculated, resolved));
            }
        }

        if !self.suppress_updates.get() {
            self.channel.publish_updated();
        }

        Ok(())
    }

    fn set_calculated(&self, name: &str, source: &str) -> Result<()> {
        validate_property_name(name)?;
        let resolved = {
            let mut state = self.state.borrow_mut();
            declare(&mut state, name, source)?;
            state.store.resolve(name).unwrap_or_default()
        };

        self.channel
            .publish_change(ChangeEvent::from_model(name, resolved));
        Ok(())
    }

    /// Raw write: no events, no recalculation. Calculated names take a
    /// string template, as with `set`.
    fn store_silently(&self, name: &str, value: Value) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if is_calculated_name(name) || state.store.is_calculated(name) {
            let Value::String(source) = value else {
                return Err(template_not_string(name));
            };
            return declare(&mut state, name, &source);
        }

        validate_primitive_value(name, &value)?;
        state.store.set_base(name, value);
        Ok(())
    }

    fn load(&self, entries: &Map<String, Value>, linker: &dyn PropertyLinker) -> Result<LoadReport> {
        let previous = self.suppress_updates.replace(true);
        let result = self.load_entries(entries, linker);
        self.suppress_updates.set(previous);
        result
    }

    fn load_entries(
        &self,
        entries: &Map<String, Value>,
        linker: &dyn PropertyLinker,
    ) -> Result<LoadReport> {
        // The whole model is stored before anything is published, so every
        // calculated property resolves against complete values.
        for (name, value) in entries {
            self.store_silently(name, value.clone())?;
        }

        let mut report = LoadReport::default();
        for name in entries.keys() {
            if !linker.link(name) {
                report.skipped.push(name.clone());
                continue;
            }

            let resolved = self.state.borrow().store.resolve(name);
            if let Some(value) = resolved {
                self.channel
                    .publish_change(ChangeEvent::from_model(name.as_str(), value));
            }
            report.linked.push(name.clone());
        }
        Ok(report)
    }
}

fn template_not_string(name: &str) -> BinderError {
    BinderError::InvalidValue {
        property: name.to_string(),
        reason: "Calculated property templates must be strings".to_string(),
    }
}

fn declare(state: &mut SessionState, name: &str, source: &str) -> Result<()> {
    let template = Template::parse(source);
    state.graph.declare(name, template.references())?;
    state.store.set_calculated(name, template);
    Ok(())
}

/// Rejects calculated entries that are not strings or whose templates form a
/// cycle among themselves, before anything is stored.
fn preflight(entries: &Map<String, Value>) -> Result<()> {
    let mut scratch = DependencyGraph::new();
    for (name, value) in entries.iter().filter(|(name, _)| is_calculated_name(name)) {
        let Value::String(source) = value else {
            return Err(template_not_string(name));
        };
        scratch.declare(name, Template::parse(source.as_str()).references())?;
    }
    Ok(())
}

/// Owns the model of one bound view subtree and keeps it in sync with the
/// session's [`EventChannel`].
pub struct BindingSession {
    core: Rc<SessionCore>,
    scope: RefCell<Vec<Subscription>>,
    load_report: RefCell<LoadReport>,
}

impl BindingSession {
    /// Headless session: every entry of `model` is bound.
    pub fn new(id: impl Into<String>, model: &Value) -> Result<Self> {
        let channel = EventChannel::new(SessionId::new(id)?);
        Self::bind(&channel, model, &Headless)
    }

    /// Headless session with a generated id.
    pub fn anonymous(model: &Value) -> Result<Self> {
        Self::bind(&EventChannel::new(SessionId::generate()), model, &Headless)
    }

    /// Binds `model` on `channel`. Every entry is stored first; then each entry
    /// the linker accepts publishes one change with its resolved value. Entries
    /// the linker refuses are kept in the store but publish nothing. Fails before storing anything when the model
    /// is not a flat object of primitives.
    pub fn bind(
        channel: &EventChannel,
        model: &Value,
        linker: &dyn PropertyLinker,
    ) -> Result<Self> {
        let entries = validate_flat_model(model)?;
        preflight(entries)?;

        let core = Rc::new(SessionCore {
            channel: channel.clone(),
            state: RefCell::new(SessionState::default()),
            suppress_updates: Cell::new(false),
        });

        let weak = Rc::downgrade(&core);
        let applier = channel.on_change_from(Origin::View, move |change| {
            let Some(core) = weak.upgrade() else {
                return;
            };
            if let Err(e) = core.set(&change.property, change.value.clone()) {
                tracing::warn!(
                    "{}: view edit of '{}' rejected: {}",
                    core.channel.session(),
                    change.property,
                    e
                );
            }
        });

        let load_report = match core.load(entries, linker) {
            Ok(report) => report,
            Err(e) => {
                drop(applier);
                return Err(e);
            }
        };

        tracing::info!(
            "{}: session bound ({} linked, {} skipped)",
            channel.session(),
            load_report.linked.len(),
            load_report.skipped.len()
        );

        Ok(Self {
            core,
            scope: RefCell::new(vec![applier]),
            load_report: RefCell::new(load_report),
        })
    }

    pub fn id(&self) -> &SessionId {
        self.core.channel.session()
    }

    pub fn channel(&self) -> &EventChannel {
        &self.core.channel
    }

    /// Outcome of the latest load, construction or `replace_model`.
    pub fn load_report(&self) -> LoadReport {
        self.load_report.borrow().clone()
    }

    /// Raw value: base values as stored, calculated properties as their template.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.core.state.borrow().store.get(name)
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.core.set(name, value.into())
    }

    pub fn set_calculated(&self, name: &str, template: &str) -> Result<()> {
        self.core.set_calculated(name, template)
    }

    /// Freshly resolved value of a calculated property; `None` for anything else.
    pub fn get_calculated(&self, name: &str) -> Option<String> {
        let state = self.core.state.borrow();
        if !state.store.is_calculated(name) {
            return None;
        }
        state.store.display(name)
    }

    /// Base value or resolved calculated value.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        self.core.state.borrow().store.resolve(name)
    }

    pub fn get_property(&self, name: &str) -> Option<Value> {
        let value = self.get(name);
        tracing::debug!("get_property: {} => {:?}", name, value);
        value
    }

    /// Writes without publishing events or recalculating dependents.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        validate_property_name(name)?;
        let value = value.into();
        tracing::debug!("set_property: {} => {}", name, value);
        self.core.store_silently(name, value)
    }

    pub fn get_model(&self) -> Map<String, Value> {
        self.core.state.borrow().store.snapshot()
    }

    pub fn resolved_model(&self) -> Map<String, Value> {
        self.core.state.borrow().store.resolved_snapshot()
    }

    /// Replaces the whole model, loading it like construction does through
    /// `linker`, then publishes a single `updated`.
    pub fn replace_model(
        &self,
        model: &Value,
        linker: &dyn PropertyLinker,
    ) -> Result<LoadReport> {
        let entries = validate_flat_model(model)?;
        preflight(entries)?;

        {
            let mut state = self.core.state.borrow_mut();
            state.store.clear();
            state.graph.clear();
        }

        let report = self.core.load(entries, linker)?;
        tracing::info!(
            "{}: model replaced ({} linked, {} skipped)",
            self.id(),
            report.linked.len(),
            report.skipped.len()
        );
        *self.load_report.borrow_mut() = report.clone();

        if !self.core.suppress_updates.get() {
            self.core.channel.publish_updated();
        }
        Ok(report)
    }

    /// Runs `f` with `updated` events held back; change events still flow.
    pub fn with_updates_suppressed<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let previous = self.core.suppress_updates.replace(true);
        let result = f(self);
        self.core.suppress_updates.set(previous);
        result
    }

    pub fn updates_suppressed(&self) -> bool {
        self.core.suppress_updates.get()
    }

    /// Calls `callback` after every completed `set`; lives until `dispose`.
    pub fn on_updated(&self, callback: impl Fn() + 'static) {
        let sub = self.core.channel.on_updated(callback);
        self.scope.borrow_mut().push(sub);
    }

    /// Calls `callback` for every change already applied to the model.
    pub fn on_change(&self, callback: impl Fn(&ChangeEvent) + 'static) {
        let sub = self.core.channel.on_change_from(Origin::Model, callback);
        self.scope.borrow_mut().push(sub);
    }

    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.core.state.borrow().graph.dependents_of(name)
    }

    /// Number of store writes so far.
    pub fn revision(&self) -> u64 {
        self.core.state.borrow().store.revision()
    }

    /// Unsubscribes every listener on the session's channel, view side included.
    pub fn dispose(&self) {
        self.scope.borrow_mut().clear();
        self.core.channel.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.core.channel.is_disposed()
    }
}

impl std::fmt::Debug for BindingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingSession")
            .field("id", self.id())
            .field("properties", &self.core.state.borrow().store.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
