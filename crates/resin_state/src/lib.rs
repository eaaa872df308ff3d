//! Resin State Layer
//!
//! Two-way glue between named observable stores and a component UI layer:
//!
//! - **Store registry**: [`StateHub`] holds named state trees
//!   (`serde_json::Value`) and their actions; [`StateHub::combine`] wires
//!   them once at startup
//! - **Path bindings**: elements declare `(store, path)` pairs and receive
//!   fine-grained updates whenever the referenced state changes
//! - **Dispatch**: [`StateHub::dispatch`] is the single mutation entry
//!   point - actions run inside the engine's mutation scope, which strict
//!   mode (on by default) makes the only sanctioned way to write
//!
//! The reactive engine behind the hub is the
//! [`ReactiveEngine`](resin_core::ReactiveEngine) seam from `resin_core`;
//! [`StateHub::with_engine`] substitutes any other implementation.
//!
//! # Example
//!
//! ```rust
//! use resin_state::{ActionEnvelope, StateHub, StoreDef};
//! use serde_json::json;
//!
//! let hub = StateHub::new();
//! hub.combine([(
//!     "cart",
//!     StoreDef::new(json!({ "items": [], "total": 0 })).action(
//!         "set_total",
//!         |scope, payload| {
//!             scope.set("total", payload.cloned().unwrap_or(json!(0)));
//!             None
//!         },
//!     ),
//! )]);
//!
//! hub.dispatch(&[], ActionEnvelope::new("cart", "set_total").payload(json!(42)));
//! assert_eq!(hub.resolve("cart", "total"), Some(json!(42)));
//! ```

pub mod binding;
pub mod dispatch;
pub mod error;
pub mod path;
pub mod registry;
pub mod testing;

pub use binding::{
    Disposer, DisposerSet, ObserverFn, PathBinding, PropertyAccess, StateObserver, StateTarget,
    StateView,
};
pub use dispatch::{ActionEnvelope, ActionFn, ActionScope, Middleware};
pub use error::StateError;
pub use path::resolve_in;
pub use registry::{StateHub, StoreDef};
