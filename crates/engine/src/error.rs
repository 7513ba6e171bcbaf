//! Engine error taxonomy.
//!
//! Every error carries the offending parameter key and a message; `kind()` is
//! the stable wire code. Validation, role, and unknown-parameter errors are
//! user-recoverable; lookup and computation errors indicate a registry/table
//! inconsistency and reject the write that triggered them. In every case the
//! sheet is left at its last fully-consistent state.

use crate::param::ParamKey;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Input value outside its declared domain.
    Validation { key: ParamKey, message: String },
    /// Write to a computed parameter.
    Role { key: ParamKey, message: String },
    /// Key is not registered.
    UnknownParameter { key: String },
    /// Reference table has no entry for the requested code combination.
    Lookup { key: ParamKey, message: String },
    /// Formula received an out-of-domain numeric input.
    Computation { key: ParamKey, message: String },
}

impl EngineError {
    /// Stable wire code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "validation",
            EngineError::Role { .. } => "role",
            EngineError::UnknownParameter { .. } => "unknown_parameter",
            EngineError::Lookup { .. } => "lookup",
            EngineError::Computation { .. } => "computation",
        }
    }

    /// The offending parameter key.
    pub fn key(&self) -> &str {
        match self {
            EngineError::Validation { key, .. }
            | EngineError::Role { key, .. }
            | EngineError::Lookup { key, .. }
            | EngineError::Computation { key, .. } => key.as_str(),
            EngineError::UnknownParameter { key } => key,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation { key, message } => {
                write!(f, "validation failed for '{}': {}", key, message)
            }
            EngineError::Role { key, message } => {
                write!(f, "role violation for '{}': {}", key, message)
            }
            EngineError::UnknownParameter { key } => {
                write!(f, "unknown parameter '{}'", key)
            }
            EngineError::Lookup { key, message } => {
                write!(f, "lookup failed for '{}': {}", key, message)
            }
            EngineError::Computation { key, message } => {
                write!(f, "computation failed for '{}': {}", key, message)
            }
        }
    }
}

impl std::error::Error for EngineError {}
