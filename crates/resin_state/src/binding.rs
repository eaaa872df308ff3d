//! State-path bindings
//!
//! One reactive computation per bound element property or declared
//! observer. A computation's life is split in two: the *read phase* runs
//! under the hub lock with dependency tracking on (resolve the path, clone
//! the value), the *apply phase* runs after the lock is released (push the
//! value into the element or invoke the observer). Callbacks may therefore
//! re-enter the hub - an observer is free to dispatch.
//!
//! Every bind call returns the disposers it created; the component layer
//! collects them on attach and consumes them on detach. A dropped,
//! undisposed disposer leaks its subscription - the binding keeps firing
//! into the detached element, which is a resource leak rather than an
//! error.

use std::sync::Arc;

use resin_core::ComputationId;
use serde_json::Value;

use crate::registry::{HubInner, StateHub};

/// How a bound value lands on the element property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyAccess {
    /// Public setter ([`StateTarget::set_property`])
    Writable,
    /// Internal setter path for read-only properties
    /// ([`StateTarget::set_internal`])
    ReadOnly,
}

/// Declaration binding one element property to a `(store, path)` pair.
#[derive(Clone, Debug)]
pub struct PathBinding {
    pub property: String,
    pub store: String,
    pub path: String,
    pub access: PropertyAccess,
}

impl PathBinding {
    pub fn new(
        property: impl Into<String>,
        store: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            store: store.into(),
            path: path.into(),
            access: PropertyAccess::Writable,
        }
    }

    /// Route the value through the internal setter path.
    pub fn read_only(mut self) -> Self {
        self.access = PropertyAccess::ReadOnly;
        self
    }
}

/// Observer callback: the element plus the freshly-resolved value (`None`
/// for a missing path).
pub type ObserverFn = Arc<dyn Fn(&dyn StateTarget, Option<&Value>) + Send + Sync>;

/// Declaration invoking a callback on state changes instead of setting a
/// property. With a path the callback receives the value at that path; with
/// no path it receives the store's whole state snapshot and re-fires on any
/// change within the store.
#[derive(Clone)]
pub struct StateObserver {
    pub store: String,
    pub path: Option<String>,
    observer: ObserverFn,
}

impl StateObserver {
    pub fn new<F>(store: impl Into<String>, observer: F) -> Self
    where
        F: Fn(&dyn StateTarget, Option<&Value>) + Send + Sync + 'static,
    {
        Self {
            store: store.into(),
            path: None,
            observer: Arc::new(observer),
        }
    }

    /// Observe one path instead of the whole store.
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// The element seam: whatever can receive bound values.
///
/// `set_internal` exists for read-only properties that bypass the public
/// setter; the default forwards to `set_property` for targets without the
/// distinction.
pub trait StateTarget: Send + Sync {
    /// Apply a bound value through the public setter. `None` means the
    /// bound path resolved to nothing.
    fn set_property(&self, property: &str, value: Option<Value>);

    /// Apply a bound value through the internal setter path.
    fn set_internal(&self, property: &str, value: Option<Value>) {
        self.set_property(property, value);
    }
}

/// Tracked read view handed to mapped-state selectors.
pub struct StateView<'a> {
    inner: &'a mut HubInner,
}

impl StateView<'_> {
    /// Value at `path` in `store`; `None` on any miss. The read is tracked,
    /// so the selector re-runs when it changes.
    pub fn get(&mut self, store: &str, path: &str) -> Option<Value> {
        self.inner.resolve_tracked(store, path)
    }

    /// Whole-store snapshot; the selector re-runs on any change in the
    /// store.
    pub fn snapshot(&mut self, store: &str) -> Option<Value> {
        self.inner.snapshot_tracked(store)
    }
}

/// Cancels exactly one reactive subscription. Consuming it is the only way
/// to fire it, so it runs at most once; dropping it unfired leaks the
/// subscription.
pub struct Disposer {
    run: Box<dyn FnOnce() + Send>,
}

impl Disposer {
    /// Tear the subscription down.
    pub fn dispose(self) {
        (self.run)();
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer").finish()
    }
}

/// Collects the disposers of one element so attach/detach bookkeeping stays
/// in one place.
#[derive(Debug, Default)]
pub struct DisposerSet {
    disposers: Vec<Disposer>,
}

impl DisposerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one disposer.
    pub fn hold(&mut self, disposer: Disposer) {
        self.disposers.push(disposer);
    }

    /// Add a batch of disposers (the return value of a bind call).
    pub fn extend(&mut self, disposers: Vec<Disposer>) {
        self.disposers.extend(disposers);
    }

    /// Number of held subscriptions.
    pub fn len(&self) -> usize {
        self.disposers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disposers.is_empty()
    }

    /// Tear down every held subscription.
    pub fn dispose(self) {
        for disposer in self.disposers {
            disposer.dispose();
        }
    }
}

/// Deferred apply phase of one computation run; executed after the hub lock
/// is released.
pub(crate) type ApplyFn = Box<dyn FnOnce() + Send>;

/// One binding's read phase: tracked resolution under the lock, returning
/// the apply phase to run outside it.
pub(crate) type BindingFn = Arc<dyn Fn(&mut HubInner) -> ApplyFn + Send + Sync>;

impl StateHub {
    /// Create one reactive path binding per declaration.
    ///
    /// Each binding resolves its path now and on every relevant change, and
    /// pushes the value into the element property - through the public or
    /// the internal setter per the declaration. Declarations against an
    /// unregistered store are skipped with a warning and produce no
    /// disposer.
    pub fn bind_paths(
        &self,
        target: Arc<dyn StateTarget>,
        declarations: Vec<PathBinding>,
    ) -> Vec<Disposer> {
        let mut disposers = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            if !self.has_store(&declaration.store) {
                tracing::warn!(
                    "No \"{}\" store for state path binding \"{}\"",
                    declaration.store,
                    declaration.property
                );
                continue;
            }
            let PathBinding {
                property,
                store,
                path,
                access,
            } = declaration;
            let target = Arc::clone(&target);
            let binding: BindingFn = Arc::new(move |inner| {
                let value = inner.resolve_tracked(&store, &path);
                let target = Arc::clone(&target);
                let property = property.clone();
                Box::new(move || match access {
                    PropertyAccess::Writable => target.set_property(&property, value),
                    PropertyAccess::ReadOnly => target.set_internal(&property, value),
                })
            });
            disposers.push(self.install_binding(binding));
        }
        disposers
    }

    /// Create one reactive computation per observer declaration.
    ///
    /// Path observers receive the value at their path; store observers
    /// receive the whole state snapshot. Declarations against an
    /// unregistered store are skipped with a warning.
    pub fn bind_observers(
        &self,
        target: Arc<dyn StateTarget>,
        declarations: Vec<StateObserver>,
    ) -> Vec<Disposer> {
        let mut disposers = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            if !self.has_store(&declaration.store) {
                tracing::warn!("No \"{}\" store for state observer", declaration.store);
                continue;
            }
            let StateObserver {
                store,
                path,
                observer,
            } = declaration;
            let target = Arc::clone(&target);
            let binding: BindingFn = Arc::new(move |inner| {
                let value = match &path {
                    Some(path) => inner.resolve_tracked(&store, path),
                    None => inner.snapshot_tracked(&store),
                };
                let target = Arc::clone(&target);
                let observer = Arc::clone(&observer);
                Box::new(move || observer(&*target, value.as_ref()))
            });
            disposers.push(self.install_binding(binding));
        }
        disposers
    }

    /// Create a single mapped-state binding.
    ///
    /// The selector runs in one computation; every property it returns is
    /// applied to the element on each re-run.
    pub fn bind_selector<F>(&self, target: Arc<dyn StateTarget>, selector: F) -> Vec<Disposer>
    where
        F: Fn(&mut StateView<'_>) -> Vec<(String, Value)> + Send + Sync + 'static,
    {
        let binding: BindingFn = Arc::new(move |inner| {
            let props = selector(&mut StateView { inner });
            let target = Arc::clone(&target);
            Box::new(move || {
                for (property, value) in props {
                    target.set_property(&property, Some(value));
                }
            })
        });
        vec![self.install_binding(binding)]
    }

    /// Register a binding closure, run its initial evaluation, and return
    /// its disposer.
    fn install_binding(&self, binding: BindingFn) -> Disposer {
        let computation = {
            let mut inner = self.lock();
            let computation = inner.engine.create_computation();
            inner.bindings.insert(computation, binding);
            computation
        };
        self.run_computation(computation);

        let hub = self.clone();
        Disposer {
            run: Box::new(move || {
                let mut inner = hub.lock();
                inner.bindings.remove(&computation);
                inner.engine.dispose_computation(computation);
            }),
        }
    }

    /// Re-run one computation: tracked read phase under the lock, apply
    /// phase after it. Disposed computations are skipped.
    pub(crate) fn run_computation(&self, computation: ComputationId) {
        let apply = {
            let mut inner = self.lock();
            let Some(binding) = inner.bindings.get(&computation).cloned() else {
                return;
            };
            inner.engine.begin_tracking(computation);
            let apply = binding(&mut *inner);
            inner.engine.end_tracking();
            apply
        };
        apply();
    }

    /// Run every computation a closed mutation scope left ready.
    pub(crate) fn flush(&self, ready: Vec<ComputationId>) {
        for computation in ready {
            self.run_computation(computation);
        }
    }
}
