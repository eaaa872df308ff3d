//! Default reactive engine
//!
//! `ReactiveGraph` keeps one version counter per signal and one dependency
//! set per computation. Invalidations collect into an insertion-ordered
//! pending queue that drains when the outermost mutation scope closes, so a
//! batch of writes re-runs each affected computation once.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;

use crate::engine::{ComputationId, ReactiveEngine, SignalId};

struct SignalNode {
    version: u64,
    /// Dependent computations, in registration order
    subscribers: IndexSet<ComputationId>,
}

struct ComputationNode {
    deps: FxHashSet<SignalId>,
}

/// In-memory dependency graph implementing [`ReactiveEngine`].
pub struct ReactiveGraph {
    signals: SlotMap<SignalId, SignalNode>,
    computations: SlotMap<ComputationId, ComputationNode>,
    /// Stack of computations currently re-tracking (innermost last)
    tracking: Vec<ComputationId>,
    /// Computations invalidated since the outermost scope opened
    pending: IndexSet<ComputationId>,
    mutation_depth: u32,
    strict: bool,
}

impl ReactiveGraph {
    pub fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            computations: SlotMap::with_key(),
            tracking: Vec::new(),
            pending: IndexSet::new(),
            mutation_depth: 0,
            strict: false,
        }
    }

    /// Current version of a signal; `None` for a disposed id.
    pub fn version(&self, signal: SignalId) -> Option<u64> {
        self.signals.get(signal).map(|node| node.version)
    }

    /// Number of live signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Number of live computations.
    pub fn computation_count(&self) -> usize {
        self.computations.len()
    }
}

impl Default for ReactiveGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveEngine for ReactiveGraph {
    fn create_signal(&mut self) -> SignalId {
        self.signals.insert(SignalNode {
            version: 0,
            subscribers: IndexSet::new(),
        })
    }

    fn track_read(&mut self, signal: SignalId) {
        let Some(&current) = self.tracking.last() else {
            return;
        };
        if let Some(node) = self.signals.get_mut(signal) {
            node.subscribers.insert(current);
        }
        if let Some(computation) = self.computations.get_mut(current) {
            computation.deps.insert(signal);
        }
    }

    fn invalidate(&mut self, signal: SignalId) {
        let Some(node) = self.signals.get_mut(signal) else {
            return;
        };
        node.version = node.version.wrapping_add(1);
        for &subscriber in &node.subscribers {
            self.pending.insert(subscriber);
        }
    }

    fn create_computation(&mut self) -> ComputationId {
        self.computations.insert(ComputationNode {
            deps: FxHashSet::default(),
        })
    }

    fn dispose_computation(&mut self, computation: ComputationId) {
        if let Some(node) = self.computations.remove(computation) {
            for signal in node.deps {
                if let Some(signal) = self.signals.get_mut(signal) {
                    signal.subscribers.shift_remove(&computation);
                }
            }
        }
        self.pending.shift_remove(&computation);
    }

    fn begin_tracking(&mut self, computation: ComputationId) {
        if let Some(node) = self.computations.get_mut(computation) {
            for signal in node.deps.drain() {
                if let Some(signal) = self.signals.get_mut(signal) {
                    signal.subscribers.shift_remove(&computation);
                }
            }
        }
        self.tracking.push(computation);
    }

    fn end_tracking(&mut self) {
        self.tracking.pop();
    }

    fn begin_mutation(&mut self) {
        self.mutation_depth += 1;
    }

    fn end_mutation(&mut self) -> Vec<ComputationId> {
        self.mutation_depth = self.mutation_depth.saturating_sub(1);
        if self.mutation_depth == 0 {
            self.pending.drain(..).collect()
        } else {
            Vec::new()
        }
    }

    fn in_mutation(&self) -> bool {
        self.mutation_depth > 0
    }

    fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    fn strict(&self) -> bool {
        self.strict
    }
}
