//! The per-session sheet value.
//!
//! A `Sheet` owns its values map exclusively — one instance per session,
//! never shared for mutation. All reads and writes go through `SheetEngine`;
//! the sheet itself is a dumb store plus a revision counter.

use rustc_hash::FxHashMap;

use crate::param::{ParamKey, ParamValue};

/// One live instance of the data sheet.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    values: FxHashMap<ParamKey, ParamValue>,
    /// Bumped once per successful write that changed anything.
    revision: u64,
}

impl Sheet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current value of a parameter, if the sheet holds one.
    pub fn value(&self, key: ParamKey) -> Option<&ParamValue> {
        self.values.get(&key)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set(&mut self, key: ParamKey, value: ParamValue) {
        self.values.insert(key, value);
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }

    /// Number of parameters currently held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
