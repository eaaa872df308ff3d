//! Resin Core Runtime
//!
//! This crate provides the reactive foundation for the Resin state layer:
//!
//! - **Engine seam**: the [`ReactiveEngine`] trait - an id-based dependency
//!   graph contract that concrete reactive libraries can implement
//! - **Default engine**: [`ReactiveGraph`], version signals plus an
//!   insertion-ordered invalidation queue with mutation-scope batching
//!
//! The engine deliberately never sees state values or user closures. Callers
//! own both; the engine only answers which computations must re-run.
//!
//! # Example
//!
//! ```rust
//! use resin_core::{ReactiveEngine, ReactiveGraph};
//!
//! let mut graph = ReactiveGraph::new();
//! let signal = graph.create_signal();
//! let computation = graph.create_computation();
//!
//! // Re-track the computation: it reads one signal.
//! graph.begin_tracking(computation);
//! graph.track_read(signal);
//! graph.end_tracking();
//!
//! // A write invalidates the signal; the flush names the computation.
//! graph.begin_mutation();
//! graph.invalidate(signal);
//! assert_eq!(graph.end_mutation(), vec![computation]);
//! ```

pub mod engine;
pub mod graph;

pub use engine::{ComputationId, ReactiveEngine, SignalId};
pub use graph::ReactiveGraph;
