use thiserror::Error;

/// Errors surfaced by the state layer.
///
/// Lookup misses on the read and dispatch paths are swallowed (logged and
/// `None`); only direct writes carry errors, because a mutation-discipline
/// violation must reach the writer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("unknown store \"{0}\"")]
    UnknownStore(String),

    #[error("write to \"{store}.{path}\" outside an action while strict mode is enabled")]
    IllegalMutation { store: String, path: String },
}
