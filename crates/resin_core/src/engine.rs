//! The engine seam
//!
//! `ReactiveEngine` is the capability the state layer is written against:
//! an id-based dependency graph that schedules opaque computations. The
//! engine never sees state values or closures - callers register reads
//! between `begin_tracking`/`end_tracking`, invalidate signals when they
//! write, and run whatever `end_mutation` hands back. Any reactive library
//! that can answer "which computations read these signals" can stand in for
//! the default [`ReactiveGraph`](crate::ReactiveGraph).

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a version signal
    pub struct SignalId;
}

new_key_type! {
    /// Unique identifier for a tracked computation
    pub struct ComputationId;
}

/// Dependency-tracking and scheduling capability consumed by the state layer.
///
/// Contract:
/// - Reads recorded between `begin_tracking(c)` and `end_tracking` replace
///   computation `c`'s previous dependency set.
/// - `invalidate` queues each dependent computation at most once per flush,
///   in invalidation order.
/// - The queue drains only from the `end_mutation` that closes the outermost
///   mutation scope; inner scopes return an empty set.
/// - `dispose_computation` removes the computation from every dependency set
///   and from the pending queue.
/// - The strict flag is a plain queryable bit; write-site enforcement belongs
///   to the caller.
pub trait ReactiveEngine: Send {
    /// Mint a new version signal.
    fn create_signal(&mut self) -> SignalId;

    /// Record a read of `signal` by the innermost tracking computation.
    /// A no-op when no computation is being tracked.
    fn track_read(&mut self, signal: SignalId);

    /// Mark `signal` changed, queueing its dependents for the next flush.
    fn invalidate(&mut self, signal: SignalId);

    /// Register a new computation with an empty dependency set.
    fn create_computation(&mut self) -> ComputationId;

    /// Drop a computation, its dependency edges, and any pending run.
    fn dispose_computation(&mut self, computation: ComputationId);

    /// Start re-tracking `computation`: clear its old dependencies and make
    /// it the target of subsequent `track_read` calls.
    fn begin_tracking(&mut self, computation: ComputationId);

    /// Finish the innermost tracking scope.
    fn end_tracking(&mut self);

    /// Open a mutation scope. Scopes nest.
    fn begin_mutation(&mut self);

    /// Close a mutation scope. Closing the outermost scope drains and
    /// returns the computations invalidated since it opened, in
    /// invalidation order; inner closes return nothing.
    fn end_mutation(&mut self) -> Vec<ComputationId>;

    /// Whether a mutation scope is currently open.
    fn in_mutation(&self) -> bool;

    /// Set the strict flag.
    fn set_strict(&mut self, strict: bool);

    /// Read the strict flag.
    fn strict(&self) -> bool;
}
