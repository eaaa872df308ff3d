//! Action dispatch
//!
//! One entry point mutates state: look up a named action on a named store,
//! run the middleware hooks, invoke the action inside the engine's mutation
//! scope, flush the bindings it touched, and hand back its return value.
//! A missing store or action is a warning and `None`, never a panic.

use std::sync::Arc;

use serde_json::Value;

use crate::registry::{HubInner, StateHub};

/// A registered action: explicit store scope in, optional payload, optional
/// result out.
pub type ActionFn =
    Arc<dyn Fn(&mut ActionScope<'_>, Option<&Value>) -> Option<Value> + Send + Sync>;

/// Observation hook run before an action executes. Middlewares inspect; they
/// cannot cancel or alter the action.
pub type Middleware = Arc<dyn Fn(&StateHub, &ActionEnvelope) + Send + Sync>;

/// A dispatch request: target store, action name, optional payload.
#[derive(Clone, Debug)]
pub struct ActionEnvelope {
    pub store: String,
    pub action: String,
    pub payload: Option<Value>,
}

impl ActionEnvelope {
    pub fn new(store: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            action: action.into(),
            payload: None,
        }
    }

    /// Attach a payload.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// The store scope handed to an executing action - the explicit stand-in
/// for the original's `this`-bound store record. All writes made through it
/// are legitimate under strict mode and are batched until the action
/// returns.
pub struct ActionScope<'a> {
    store: &'a str,
    inner: &'a mut HubInner,
}

impl ActionScope<'_> {
    /// Name of the store this action runs against.
    pub fn store(&self) -> &str {
        self.store
    }

    /// The store's current state tree.
    pub fn state(&self) -> &Value {
        &self
            .inner
            .stores
            .get(self.store)
            .expect("action scope over a registered store")
            .state
    }

    /// Read the value at `path`; `None` on any missing segment.
    pub fn get(&self, path: &str) -> Option<Value> {
        crate::path::resolve_in(self.state(), &crate::path::split_path(path)).cloned()
    }

    /// Write `value` at `path`, creating missing map segments. Returns
    /// whether the write landed.
    pub fn set(&mut self, path: &str, value: Value) -> bool {
        self.inner.write_path(self.store, path, value)
    }

    /// Edit the node at `path` in place (push to a sequence, rewrite a
    /// subtree). Returns `false` when the path is absent.
    pub fn update<F>(&mut self, path: &str, edit: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        self.inner.update_path(self.store, path, edit)
    }

    /// Remove and return the node at `path`.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.inner.remove_path(self.store, path)
    }
}

impl StateHub {
    /// Dispatch an action.
    ///
    /// Middlewares run first, in declaration order, with this hub and the
    /// envelope. If the store or the action is missing a warning is logged
    /// and the call yields `None`. Otherwise the action runs inside the
    /// engine's mutation scope; bindings it affected re-fire once before
    /// this returns, and the action's own return value is passed through.
    pub fn dispatch(&self, middlewares: &[Middleware], envelope: ActionEnvelope) -> Option<Value> {
        for middleware in middlewares {
            middleware(self, &envelope);
        }

        let (result, ready) = {
            let mut inner = self.lock();
            let action = inner
                .stores
                .get(&envelope.store)
                .and_then(|record| record.actions.get(&envelope.action))
                .cloned();
            let Some(action) = action else {
                tracing::warn!(
                    "No action \"{}\" for \"{}\" store",
                    envelope.action,
                    envelope.store
                );
                return None;
            };

            inner.engine.begin_mutation();
            let result = {
                let mut scope = ActionScope {
                    store: &envelope.store,
                    inner: &mut *inner,
                };
                action(&mut scope, envelope.payload.as_ref())
            };
            let ready = inner.engine.end_mutation();
            (result, ready)
        };

        self.flush(ready);
        result
    }
}
