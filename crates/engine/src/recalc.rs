//! Recompute reporting and cycle detection types.

use crate::param::ParamKey;

/// Report from one cascade recompute (or the initial full compute).
#[derive(Debug, Clone, Default)]
pub struct RecalcReport {
    /// Time taken in milliseconds.
    pub duration_ms: u64,

    /// Number of computed parameters that were re-evaluated.
    pub params_recomputed: usize,

    /// Maximum dependency depth encountered.
    /// A computed parameter fed only by inputs has depth 1; one fed by another
    /// computed parameter has depth = max(precedent depths) + 1.
    pub max_depth: usize,

    /// Keys whose value actually changed, in evaluation order.
    /// Includes the written input when its value differed from before.
    pub changed: Vec<ParamKey>,
}

impl RecalcReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format as a concise one-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} params in {}ms, depth={}, changed={}",
            self.params_recomputed,
            self.duration_ms,
            self.max_depth,
            self.changed.len()
        )
    }

    /// Format as a one-line log entry.
    ///
    /// Format: `[recalc/cascade]    0ms  4 params  depth=3  changed=5`
    pub fn log_line(&self) -> String {
        format!(
            "[recalc/cascade] {:>4}ms  {} params  depth={}  changed={}",
            self.duration_ms,
            self.params_recomputed,
            self.max_depth,
            self.changed.len()
        )
    }
}

/// Report when cycle detection finds a circular dependency.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Parameters participating in the cycle.
    pub keys: Vec<ParamKey>,

    /// Human-readable description of the cycle.
    pub message: String,
}

impl CycleReport {
    pub fn new(keys: Vec<ParamKey>, message: impl Into<String>) -> Self {
        Self {
            keys,
            message: message.into(),
        }
    }

    /// Cycle report for a self-referencing parameter.
    pub fn self_reference(key: ParamKey) -> Self {
        Self {
            keys: vec![key],
            message: format!("Parameter '{}' depends on itself", key),
        }
    }

    /// Cycle report for a multi-parameter cycle.
    pub fn cycle(keys: Vec<ParamKey>) -> Self {
        let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        let message = format!("Circular dependency: {}", names.join(" → "));
        Self { keys, message }
    }
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CycleReport {}
