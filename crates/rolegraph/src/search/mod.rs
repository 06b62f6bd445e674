//! Discovery engine — backward-chaining credential chain search.
//!
//! Starting from the queried role, every assertion on the role is followed
//! down to `SimpleMember` leaves:
//!
//! - `SimpleMember(m)`: `m` with the assertion's weight.
//! - `SimpleInclusion(p.r)`: every solution of `p.r`.
//! - `LinkedInclusion(p.a.b)`: for each member `X` of `p.a`, every solution
//!   of `X.b`.
//! - `IntersectionInclusion(p.a ∩ q.b)`: members found in both branches.
//!
//! Weights compose by minimum. Re-entering a role already being resolved on
//! the current descent prunes that branch, as does a composed weight below
//! [`SearchConfig::min_weight`] or a descent deeper than
//! [`SearchConfig::max_depth`]. Pruned branches contribute nothing and never
//! fail the search.

pub mod context;
pub mod solution;

use log::debug;

use crate::expression::{Expression, Role};
use crate::graph::{Assertion, CredentialGraph};

pub use context::{PruneReason, SearchConfig, SearchContext, SearchStats};
pub use solution::{Edge, EdgeKind, Solution, SolutionSet};

use solution::{admit, best_of, Frontier};

/// Search `role` in `graph` with the default configuration.
pub fn search(graph: &CredentialGraph, role: &Role) -> SolutionSet {
    DiscoveryEngine::new(graph, SearchConfig::default()).search(role)
}

/// Discovery over one frozen graph snapshot.
///
/// The engine only reads the graph, so one engine (or many) can serve
/// searches from several threads at once.
pub struct DiscoveryEngine<'g> {
    graph: &'g CredentialGraph,
    config: SearchConfig,
}

impl<'g> DiscoveryEngine<'g> {
    pub fn new(graph: &'g CredentialGraph, config: SearchConfig) -> Self {
        Self { graph, config }
    }

    /// Best solution per member of `role`.
    pub fn search(&self, role: &Role) -> SolutionSet {
        self.search_with_stats(role).0
    }

    /// Like [`search`](Self::search), also returning pruning counters.
    pub fn search_with_stats(&self, role: &Role) -> (SolutionSet, SearchStats) {
        let mut stats = SearchStats::default();
        let solutions = best_of(self.resolve(role, &SearchContext::root(), &mut stats));
        debug!(
            "search {role}: {} solutions, {} roles expanded, {} branches pruned",
            solutions.len(),
            stats.roles_expanded,
            stats.pruned()
        );
        (solutions, stats)
    }

    fn prune(&self, stats: &mut SearchStats, reason: PruneReason, role: &Role) {
        debug!("prune {role}: {reason:?}");
        stats.record(reason);
    }

    /// Candidate chains per member of `role`. Ranking happens once, on the
    /// queried role, after every weight has been composed.
    fn resolve(&self, role: &Role, ctx: &SearchContext, stats: &mut SearchStats) -> Frontier {
        let mut found = Frontier::new();

        if ctx.is_on_stack(role) {
            self.prune(stats, PruneReason::CycleDetected, role);
            return found;
        }
        if ctx.depth() >= self.config.max_depth {
            self.prune(stats, PruneReason::DepthExceeded, role);
            return found;
        }
        let assertions = self.graph.assertions_of(role);
        let head = match self.graph.role_id(role) {
            Some(head) if !assertions.is_empty() => head,
            _ => {
                self.prune(stats, PruneReason::UnknownRole, role);
                return found;
            }
        };

        stats.roles_expanded += 1;
        let ctx = ctx.enter(role);
        let cap = ctx.budget();

        for assertion in assertions {
            let Some(branch) = ctx.spend(assertion.weight, self.config.min_weight) else {
                self.prune(stats, PruneReason::BudgetExhausted, role);
                continue;
            };
            let edge = Edge::credential(head, assertion.expression_id, assertion.weight);

            match &assertion.expression {
                Expression::SimpleMember { member } => {
                    admit(&mut found, Solution::leaf(member.clone(), edge), cap);
                }
                Expression::SimpleInclusion { role: sub } => {
                    for sol in self.resolve(sub, &branch, stats).values().flatten() {
                        admit(&mut found, Solution::through(edge.clone(), sol), cap);
                    }
                }
                Expression::LinkedInclusion { .. } => {
                    self.resolve_linked(assertion, edge, &branch, stats, &mut found);
                }
                Expression::IntersectionInclusion { a, b } => {
                    self.resolve_intersection(a, b, edge, &branch, stats, &mut found);
                }
            }
        }

        found
    }

    fn resolve_linked(
        &self,
        assertion: &Assertion,
        edge: Edge,
        ctx: &SearchContext,
        stats: &mut SearchStats,
        found: &mut Frontier,
    ) {
        let (Some(first), Expression::LinkedInclusion { name_b, .. }) =
            (assertion.expression.linked_first_hop(), &assertion.expression)
        else {
            return;
        };

        let intermediates = self.resolve(&first, ctx, stats);
        let Some(first_id) = self.graph.role_id(&first) else {
            return;
        };

        for (via_member, vias) in &intermediates {
            let second = Role::new(via_member.clone(), *name_b);
            let Some(strongest) = vias.iter().map(|v| v.weight).max() else {
                continue;
            };
            let Some(inner_ctx) = ctx.spend(strongest, self.config.min_weight) else {
                self.prune(stats, PruneReason::BudgetExhausted, &second);
                continue;
            };
            let members = self.resolve(&second, &inner_ctx, stats);
            let Some(second_id) = self.graph.role_id(&second) else {
                continue;
            };
            for via in vias {
                for inner in members.values().flatten() {
                    admit(
                        found,
                        Solution::linked(edge.clone(), first_id, via, second_id, inner),
                        ctx.budget(),
                    );
                }
            }
        }
    }

    fn resolve_intersection(
        &self,
        a: &Role,
        b: &Role,
        edge: Edge,
        ctx: &SearchContext,
        stats: &mut SearchStats,
        found: &mut Frontier,
    ) {
        let left = self.resolve(a, ctx, stats);
        let right = self.resolve(b, ctx, stats);
        let (Some(a_id), Some(b_id)) = (self.graph.role_id(a), self.graph.role_id(b)) else {
            return;
        };

        for (member, lefts) in &left {
            let Some(rights) = right.get(member) else {
                self.prune(stats, PruneReason::IntersectionMismatch, a);
                continue;
            };
            for l in lefts {
                for r in rights {
                    admit(
                        found,
                        Solution::intersection(edge.clone(), a_id, l, b_id, r),
                        ctx.budget(),
                    );
                }
            }
        }
        for member in right.keys().filter(|m| !left.contains_key(*m)) {
            debug!("intersection {a} ∩ {b}: {member} only in right branch");
            stats.record(PruneReason::IntersectionMismatch);
        }
    }
}
