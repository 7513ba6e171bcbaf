//! Dependency graph over sheet parameters.
//!
//! Tracks precedents (parameters a computed value is derived from) and
//! dependents (parameters derived from a given one) for ordered recompute.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B depends on A"  (A is a precedent of B)
//! ```
//!
//! This makes "what must be recomputed if A changes?" trivial: follow
//! outgoing edges.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::param::ParamKey;
use crate::recalc::CycleReport;

/// Dependency graph for computed parameters.
///
/// Maintains bidirectional adjacency for O(1) lookups:
/// - `preds[B]` = parameters that B depends on (precedents)
/// - `succs[A]` = parameters that depend on A (dependents)
///
/// # Invariants
///
/// 1. **Bidirectional consistency:** If A ∈ preds[B] then B ∈ succs[A], and vice versa.
/// 2. **No dangling entries:** Empty sets are removed, not stored.
/// 3. **No duplicate edges:** Set semantics enforced by FxHashSet.
/// 4. **Atomic updates:** `replace_edges` is the only mutator that touches both maps.
#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// Precedents: for each computed parameter B, the parameters A it depends on.
    preds: FxHashMap<ParamKey, FxHashSet<ParamKey>>,

    /// Dependents: for each referenced parameter A, the computed parameters B
    /// that depend on it.
    succs: FxHashMap<ParamKey, FxHashSet<ParamKey>>,
}

impl DepGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parameters this computed parameter depends on (precedents).
    pub fn precedents(&self, key: ParamKey) -> impl Iterator<Item = ParamKey> + '_ {
        self.preds
            .get(&key)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Returns the parameters that depend on this parameter (dependents).
    pub fn dependents(&self, key: ParamKey) -> impl Iterator<Item = ParamKey> + '_ {
        self.succs
            .get(&key)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Returns true if this parameter has precedents tracked in the graph.
    pub fn is_derived(&self, key: ParamKey) -> bool {
        self.preds.contains_key(&key)
    }

    /// Number of parameters with precedents (computed parameters).
    pub fn derived_count(&self) -> usize {
        self.preds.len()
    }

    /// Number of parameters referenced by at least one computed parameter.
    pub fn referenced_count(&self) -> usize {
        self.succs.len()
    }

    /// Replace all edges for a computed parameter atomically.
    ///
    /// Pass an empty set to clear all edges for this parameter.
    pub fn replace_edges(&mut self, key: ParamKey, new_preds: FxHashSet<ParamKey>) {
        // Step 1: Remove old edges
        if let Some(old_preds) = self.preds.remove(&key) {
            for pred in old_preds {
                if let Some(deps) = self.succs.get_mut(&pred) {
                    deps.remove(&key);
                    // Clean up empty entries (invariant: no dangling)
                    if deps.is_empty() {
                        self.succs.remove(&pred);
                    }
                }
            }
        }

        // Step 2: If no new precedents, we're done
        if new_preds.is_empty() {
            return;
        }

        // Step 3: Add new edges
        for pred in &new_preds {
            self.succs.entry(*pred).or_default().insert(key);
        }

        // Step 4: Store new precedents
        self.preds.insert(key, new_preds);
    }

    /// Compute topological order of all computed parameters.
    ///
    /// Returns parameters in dependency order: precedents before dependents.
    /// Uses Kahn's algorithm; ties are broken by position in `registration`
    /// (the registry's stable registration order) for determinism.
    ///
    /// # Returns
    ///
    /// - `Ok(order)` - Valid topological order
    /// - `Err(CycleReport)` - Graph contains cycles
    ///
    /// Only edges between derived parameters count toward in-degree; input
    /// parameters are not ordered since they are never recomputed.
    pub fn topo_order(&self, registration: &[ParamKey]) -> Result<Vec<ParamKey>, CycleReport> {
        let derived: FxHashSet<ParamKey> = self.preds.keys().copied().collect();

        if derived.is_empty() {
            return Ok(Vec::new());
        }

        let index: FxHashMap<ParamKey, usize> = registration
            .iter()
            .enumerate()
            .map(|(i, &k)| (k, i))
            .collect();
        let pos = |k: ParamKey| index.get(&k).copied().unwrap_or(usize::MAX);

        // In-degree counts only precedents that are themselves derived
        let mut in_degree: FxHashMap<ParamKey, usize> = FxHashMap::default();
        for &key in &derived {
            let count = self
                .preds
                .get(&key)
                .map(|preds| preds.iter().filter(|p| derived.contains(p)).count())
                .unwrap_or(0);
            in_degree.insert(key, count);
        }

        // Seed queue with zero in-degree parameters, sorted in DESCENDING
        // registration order so the earliest-registered is at the end
        // (popped first).
        let mut queue: Vec<ParamKey> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&key, _)| key)
            .collect();
        queue.sort_by(|a, b| pos(*b).cmp(&pos(*a)));

        let mut result = Vec::with_capacity(derived.len());

        while let Some(key) = queue.pop() {
            result.push(key);

            if let Some(deps) = self.succs.get(&key) {
                let mut new_zero_degree = Vec::new();

                for &dep in deps {
                    if derived.contains(&dep) {
                        if let Some(deg) = in_degree.get_mut(&dep) {
                            *deg = deg.saturating_sub(1);
                            if *deg == 0 {
                                new_zero_degree.push(dep);
                            }
                        }
                    }
                }

                new_zero_degree.sort_by(|a, b| pos(*a).cmp(&pos(*b)));
                // Add in reverse order so the earliest-registered pops first
                for key in new_zero_degree.into_iter().rev() {
                    queue.push(key);
                }
            }
        }

        // If not all parameters are in result, we have a cycle
        if result.len() < derived.len() {
            let mut cycle_keys: Vec<ParamKey> = derived
                .iter()
                .filter(|k| !result.contains(k))
                .copied()
                .collect();
            cycle_keys.sort_by(|a, b| pos(*a).cmp(&pos(*b)));
            return Err(CycleReport::cycle(cycle_keys));
        }

        Ok(result)
    }

    /// Check all invariants. Panics if any are violated.
    ///
    /// Only available in test builds.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        // Invariant 1: Bidirectional consistency (preds → succs)
        for (key, preds) in &self.preds {
            for pred in preds {
                assert!(
                    self.succs.get(pred).map_or(false, |s| s.contains(key)),
                    "Missing succ edge: {:?} should have {:?} in dependents",
                    pred,
                    key
                );
            }
        }

        // Invariant 1: Bidirectional consistency (succs → preds)
        for (key, dependents) in &self.succs {
            for dep in dependents {
                assert!(
                    self.preds.get(dep).map_or(false, |s| s.contains(key)),
                    "Missing pred edge: {:?} should have {:?} in precedents",
                    dep,
                    key
                );
            }
        }

        // Invariant 2: No empty sets stored
        for (key, preds) in &self.preds {
            assert!(!preds.is_empty(), "Empty preds set stored for {:?}", key);
        }
        for (key, succs) in &self.succs {
            assert!(!succs.is_empty(), "Empty succs set stored for {:?}", key);
        }
    }
}
