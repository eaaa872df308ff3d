//! Store registry
//!
//! `StateHub` is the context object everything else hangs off: named store
//! records (state tree + action table), the engine, and the live binding
//! closures. It is a value, not a process-wide singleton - clone handles
//! freely, build as many independent hubs as needed, and drop the last
//! handle to tear everything down.
//!
//! Reactivity over the dynamic trees is path-keyed: each store lazily owns
//! one *node* signal per path read through it (bumped when that node is
//! replaced) and one *subtree* signal per resolved node (bumped when
//! anything beneath it changes). A tracked read of `"a.b"` registers the
//! node signals of every prefix plus the subtree signal of `"a.b"`, which
//! is exactly the set of writes that can change its resolved value.

use std::sync::{Arc, Mutex, MutexGuard};

use resin_core::{ReactiveEngine, ReactiveGraph, SignalId};
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::binding::BindingFn;
use crate::dispatch::ActionFn;
use crate::error::StateError;
use crate::path::{apply_remove, apply_write, resolve_in, resolve_in_mut, split_path};

/// One registered store: its state tree, actions, and path signals.
pub(crate) struct StoreRecord {
    pub(crate) state: Value,
    pub(crate) actions: FxHashMap<String, ActionFn>,
    /// Signal per path key, bumped when the node at that path is replaced
    node_signals: FxHashMap<String, SignalId>,
    /// Signal per path key, bumped when anything under that path changes
    /// (`""` is the whole store)
    deep_signals: FxHashMap<String, SignalId>,
}

pub(crate) struct HubInner {
    pub(crate) engine: Box<dyn ReactiveEngine>,
    pub(crate) stores: FxHashMap<String, StoreRecord>,
    pub(crate) bindings: FxHashMap<resin_core::ComputationId, BindingFn>,
}

/// Definition of a store handed to [`StateHub::combine`]: an initial state
/// tree plus named actions.
pub struct StoreDef {
    state: Value,
    actions: FxHashMap<String, ActionFn>,
}

impl StoreDef {
    /// Start a definition from an initial state tree.
    pub fn new(state: Value) -> Self {
        Self {
            state,
            actions: FxHashMap::default(),
        }
    }

    /// Register a named action.
    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut crate::dispatch::ActionScope<'_>, Option<&Value>) -> Option<Value>
            + Send
            + Sync
            + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }
}

/// Explicit store container: registry, dispatcher, and binding manager in
/// one handle. Clones share the same hub.
pub struct StateHub {
    pub(crate) inner: Arc<Mutex<HubInner>>,
}

impl Clone for StateHub {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for StateHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHub {
    /// Create a hub over the default [`ReactiveGraph`] engine.
    ///
    /// Strict mode starts enabled: state changes are allowed only through
    /// actions until [`set_strict`](Self::set_strict) turns it off.
    pub fn new() -> Self {
        Self::with_engine(Box::new(ReactiveGraph::new()))
    }

    /// Create a hub over a caller-supplied engine.
    pub fn with_engine(mut engine: Box<dyn ReactiveEngine>) -> Self {
        engine.set_strict(true);
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                engine,
                stores: FxHashMap::default(),
                bindings: FxHashMap::default(),
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap()
    }

    /// Register stores. A name seen before is kept as-is - the first
    /// registration wins and the duplicate definition is dropped.
    pub fn combine<I, N>(&self, stores: I)
    where
        I: IntoIterator<Item = (N, StoreDef)>,
        N: Into<String>,
    {
        let mut inner = self.lock();
        for (name, def) in stores {
            let name = name.into();
            if inner.stores.contains_key(&name) {
                tracing::debug!("Store already registered, keeping first registration: {}", name);
                continue;
            }
            inner.stores.insert(
                name,
                StoreRecord {
                    state: def.state,
                    actions: def.actions,
                    node_signals: FxHashMap::default(),
                    deep_signals: FxHashMap::default(),
                },
            );
        }
    }

    /// Whether a store is registered.
    pub fn has_store(&self, store: &str) -> bool {
        self.lock().stores.contains_key(store)
    }

    /// Names of all registered stores.
    pub fn store_names(&self) -> Vec<String> {
        self.lock().stores.keys().cloned().collect()
    }

    /// Untracked deep-path read: the value at `path`, or `None` when the
    /// store is unknown or any segment is absent.
    pub fn resolve(&self, store: &str, path: &str) -> Option<Value> {
        let inner = self.lock();
        let record = inner.stores.get(store)?;
        resolve_in(&record.state, &split_path(path)).cloned()
    }

    /// Plain deep snapshot of a store's whole state tree.
    pub fn get_state(&self, store: &str) -> Option<Value> {
        let inner = self.lock();
        inner.stores.get(store).map(|record| record.state.clone())
    }

    /// Direct out-of-action write.
    ///
    /// Fails with [`StateError::IllegalMutation`] while strict mode is on
    /// and with [`StateError::UnknownStore`] for an unregistered store.
    /// Otherwise the write runs in an implicit mutation scope and affected
    /// bindings re-fire before this returns. A write that cannot land (an
    /// out-of-bounds sequence index, a scalar in an intermediate position)
    /// is dropped. Actions must not call this; they mutate through their
    /// [`ActionScope`](crate::ActionScope).
    pub fn set(&self, store: &str, path: &str, value: Value) -> Result<(), StateError> {
        let ready = {
            let mut inner = self.lock();
            if !inner.stores.contains_key(store) {
                return Err(StateError::UnknownStore(store.to_string()));
            }
            if inner.engine.strict() {
                return Err(StateError::IllegalMutation {
                    store: store.to_string(),
                    path: path.to_string(),
                });
            }
            inner.engine.begin_mutation();
            inner.write_path(store, path, value);
            inner.engine.end_mutation()
        };
        self.flush(ready);
        Ok(())
    }

    /// Toggle strict mode on the engine.
    pub fn set_strict(&self, strict: bool) {
        self.lock().engine.set_strict(strict);
    }

    /// Whether strict mode is enabled.
    pub fn strict(&self) -> bool {
        self.lock().engine.strict()
    }
}

impl HubInner {
    /// Tracked deep-path read used inside computations. Registers the node
    /// signal of every path prefix plus the subtree signal of the resolved
    /// node, creating signals lazily so absent paths still re-fire once
    /// they appear.
    pub(crate) fn resolve_tracked(&mut self, store: &str, path: &str) -> Option<Value> {
        let Self { engine, stores, .. } = self;
        let record = stores.get_mut(store)?;
        let segments = split_path(path);
        let mut key = String::with_capacity(path.len());
        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                key.push('.');
            }
            key.push_str(segment);
            let signal = *record
                .node_signals
                .entry(key.clone())
                .or_insert_with(|| engine.create_signal());
            engine.track_read(signal);
        }
        let subtree = *record
            .deep_signals
            .entry(key)
            .or_insert_with(|| engine.create_signal());
        engine.track_read(subtree);
        resolve_in(&record.state, &segments).cloned()
    }

    /// Tracked whole-store snapshot; depends on the root subtree signal, so
    /// any write in the store re-fires the computation.
    pub(crate) fn snapshot_tracked(&mut self, store: &str) -> Option<Value> {
        let Self { engine, stores, .. } = self;
        let record = stores.get_mut(store)?;
        let root = *record
            .deep_signals
            .entry(String::new())
            .or_insert_with(|| engine.create_signal());
        engine.track_read(root);
        Some(record.state.clone())
    }

    /// Write `value` at `path`, bumping the affected signals.
    pub(crate) fn write_path(&mut self, store: &str, path: &str, value: Value) -> bool {
        let Self { engine, stores, .. } = self;
        let Some(record) = stores.get_mut(store) else {
            return false;
        };
        let segments = split_path(path);
        if !apply_write(&mut record.state, &segments, value) {
            return false;
        }
        invalidate_written(engine.as_mut(), record, &segments.join("."));
        true
    }

    /// Edit the node at `path` in place, bumping as if the node were
    /// replaced.
    pub(crate) fn update_path<F>(&mut self, store: &str, path: &str, edit: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        let Self { engine, stores, .. } = self;
        let Some(record) = stores.get_mut(store) else {
            return false;
        };
        let segments = split_path(path);
        let Some(node) = resolve_in_mut(&mut record.state, &segments) else {
            return false;
        };
        edit(node);
        invalidate_written(engine.as_mut(), record, &segments.join("."));
        true
    }

    /// Remove the node at `path`, bumping the affected signals.
    pub(crate) fn remove_path(&mut self, store: &str, path: &str) -> Option<Value> {
        let Self { engine, stores, .. } = self;
        let record = stores.get_mut(store)?;
        let segments = split_path(path);
        let removed = apply_remove(&mut record.state, &segments)?;
        invalidate_written(engine.as_mut(), record, &segments.join("."));
        Some(removed)
    }
}

/// Bump every signal a write at `written` can affect: the written node
/// itself, every node and subtree beneath it (the subtree was replaced),
/// and the subtree signal of every ancestor up to the root.
fn invalidate_written(engine: &mut dyn ReactiveEngine, record: &StoreRecord, written: &str) {
    for (key, &signal) in &record.node_signals {
        if key == written || is_strictly_below(key, written) {
            engine.invalidate(signal);
        }
    }
    for (key, &signal) in &record.deep_signals {
        if key == written || is_strictly_below(key, written) || is_strict_ancestor(key, written) {
            engine.invalidate(signal);
        }
    }
}

/// Whether `key` lies strictly below `written` in the tree.
fn is_strictly_below(key: &str, written: &str) -> bool {
    key.len() > written.len()
        && key.starts_with(written)
        && (written.is_empty() || key.as_bytes()[written.len()] == b'.')
}

/// Whether `key` is a strict ancestor of `written` (`""` is the root).
fn is_strict_ancestor(key: &str, written: &str) -> bool {
    if key.is_empty() {
        return !written.is_empty();
    }
    written.len() > key.len()
        && written.starts_with(key)
        && written.as_bytes()[key.len()] == b'.'
}
