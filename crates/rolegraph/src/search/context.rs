//! Per-descent search context, configuration and pruning statistics.

use serde::{Deserialize, Serialize};

use crate::expression::{Role, Weight};

/// Tunables for a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Branches whose composed weight falls below this are pruned.
    pub min_weight: Weight,
    /// Maximum number of role nodes on one descent.
    pub max_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_weight: Weight::MIN,
            max_depth: 32,
        }
    }
}

/// Context threaded through one descent: the roles currently being
/// resolved above this point and the weight budget left.
///
/// Contexts are values. Every branch gets its own copy, so sibling
/// branches never see each other's roles as cycles.
#[derive(Debug, Clone)]
pub struct SearchContext {
    stack: Vec<Role>,
    budget: Weight,
}

impl SearchContext {
    /// Context for the queried role.
    pub fn root() -> Self {
        Self {
            stack: Vec::new(),
            budget: Weight::MAX,
        }
    }

    pub fn is_on_stack(&self, role: &Role) -> bool {
        self.stack.contains(role)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn budget(&self) -> Weight {
        self.budget
    }

    /// Context for the children of `role`.
    pub fn enter(&self, role: &Role) -> Self {
        let mut stack = Vec::with_capacity(self.stack.len() + 1);
        stack.extend_from_slice(&self.stack);
        stack.push(role.clone());
        Self {
            stack,
            budget: self.budget,
        }
    }

    /// Spend `weight` from the budget. `None` when the composed weight
    /// would fall below `floor`.
    pub fn spend(&self, weight: Weight, floor: Weight) -> Option<Self> {
        let budget = self.budget.compose(weight);
        if budget < floor {
            return None;
        }
        Some(Self {
            stack: self.stack.clone(),
            budget,
        })
    }
}

/// Why a branch contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneReason {
    /// The role has no assertions.
    UnknownRole,
    /// The role is already being resolved on this descent.
    CycleDetected,
    /// Composed weight fell below the configured floor.
    BudgetExhausted,
    /// Descent went deeper than `max_depth`.
    DepthExceeded,
    /// A member found in one intersection branch is missing from the other.
    IntersectionMismatch,
}

/// Counters collected over one search pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub roles_expanded: usize,
    pub unknown_roles: usize,
    pub cycles_pruned: usize,
    pub budget_pruned: usize,
    pub depth_pruned: usize,
    pub intersection_mismatches: usize,
}

impl SearchStats {
    pub fn record(&mut self, reason: PruneReason) {
        match reason {
            PruneReason::UnknownRole => self.unknown_roles += 1,
            PruneReason::CycleDetected => self.cycles_pruned += 1,
            PruneReason::BudgetExhausted => self.budget_pruned += 1,
            PruneReason::DepthExceeded => self.depth_pruned += 1,
            PruneReason::IntersectionMismatch => self.intersection_mismatches += 1,
        }
    }

    /// Total number of pruned branches.
    pub fn pruned(&self) -> usize {
        self.unknown_roles
            + self.cycles_pruned
            + self.budget_pruned
            + self.depth_pruned
            + self.intersection_mismatches
    }
}
