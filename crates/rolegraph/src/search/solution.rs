//! Edges, solutions and the ranking used to pick one solution per member.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::expression::{ExpressionId, Weight};
use crate::principal::PrincipalId;

/// How an edge was materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A stored assertion `role ← body`.
    Credential,
    /// An intersection node taking one of its two component roles.
    Intersection,
    /// A linked inclusion node taking one of its two sub-roles. Structural:
    /// never part of a proof.
    Linked,
}

/// `to ← from`, as walked during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub to: ExpressionId,
    pub from: ExpressionId,
    pub kind: EdgeKind,
    pub weight: Weight,
}

impl Edge {
    pub fn credential(to: ExpressionId, from: ExpressionId, weight: Weight) -> Self {
        Self {
            to,
            from,
            kind: EdgeKind::Credential,
            weight,
        }
    }

    pub fn intersection(to: ExpressionId, from: ExpressionId) -> Self {
        Self {
            to,
            from,
            kind: EdgeKind::Intersection,
            weight: Weight::MAX,
        }
    }

    pub fn linked(to: ExpressionId, from: ExpressionId) -> Self {
        Self {
            to,
            from,
            kind: EdgeKind::Linked,
            weight: Weight::MAX,
        }
    }
}

/// One resolved member of a queried role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// The member holding the role.
    pub member: PrincipalId,
    /// Composed weight of the whole chain.
    pub weight: Weight,
    /// Edges from the queried role down to the justifying leaves, pre-order.
    pub path: Vec<Edge>,
    /// Stack entries needed to replay the proof of this solution.
    pub req_stack_size: usize,
}

/// Best solution per member, ordered by member id.
pub type SolutionSet = BTreeMap<PrincipalId, Solution>;

impl Solution {
    /// Direct membership through a `SimpleMember` assertion.
    pub(crate) fn leaf(member: PrincipalId, edge: Edge) -> Self {
        Self {
            member,
            weight: edge.weight,
            path: vec![edge],
            req_stack_size: 1,
        }
    }

    /// Prefix `edge` to a sub-role's solution (`SimpleInclusion`).
    pub(crate) fn through(edge: Edge, branch: &Solution) -> Self {
        let mut path = Vec::with_capacity(branch.path.len() + 1);
        let weight = edge.weight.compose(branch.weight);
        path.push(edge);
        path.extend_from_slice(&branch.path);
        Self {
            member: branch.member.clone(),
            weight,
            path,
            req_stack_size: branch.req_stack_size,
        }
    }

    /// Stitch the two hops of a linked inclusion: `via` proves X in the
    /// first-hop role, `inner` proves the member in `X`'s second role.
    pub(crate) fn linked(
        edge: Edge,
        first_hop: ExpressionId,
        via: &Solution,
        second_hop: ExpressionId,
        inner: &Solution,
    ) -> Self {
        let node = edge.from;
        let weight = edge.weight.compose(via.weight).compose(inner.weight);
        let mut path = Vec::with_capacity(via.path.len() + inner.path.len() + 3);
        path.push(edge);
        path.push(Edge::linked(node, first_hop));
        path.extend_from_slice(&via.path);
        path.push(Edge::linked(node, second_hop));
        path.extend_from_slice(&inner.path);
        Self {
            member: inner.member.clone(),
            weight,
            path,
            req_stack_size: via.req_stack_size.max(inner.req_stack_size) + 1,
        }
    }

    /// Join two branches of an intersection on the same member.
    pub(crate) fn intersection(
        edge: Edge,
        a: ExpressionId,
        left: &Solution,
        b: ExpressionId,
        right: &Solution,
    ) -> Self {
        let node = edge.from;
        let weight = edge.weight.compose(left.weight).compose(right.weight);
        let mut path = Vec::with_capacity(left.path.len() + right.path.len() + 3);
        path.push(edge);
        path.push(Edge::intersection(node, a));
        path.extend_from_slice(&left.path);
        path.push(Edge::intersection(node, b));
        path.extend_from_slice(&right.path);
        Self {
            member: left.member.clone(),
            weight,
            path,
            req_stack_size: left.req_stack_size.max(right.req_stack_size) + 1,
        }
    }

    /// Expression ids traversed, in path order.
    pub fn expression_ids(&self) -> impl Iterator<Item = ExpressionId> + '_ {
        self.path.iter().flat_map(|e| [e.to, e.from])
    }

    /// Ranking: higher weight, then shorter path, then the smaller id
    /// sequence. `Ordering::Less` means `self` is preferred.
    pub fn rank(&self, other: &Solution) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| self.path.len().cmp(&other.path.len()))
            .then_with(|| self.expression_ids().cmp(other.expression_ids()))
    }
}

/// Candidate solutions per member at one role node.
///
/// A sub-role cannot pick its best chain on its own: the parent composes
/// weights by minimum, so two chains of different weight can tie once
/// composed, and then length and ids decide. Each entry keeps every chain
/// that some composition could still prefer.
pub(crate) type Frontier = BTreeMap<PrincipalId, Vec<Solution>>;

impl Solution {
    /// Whether `self` is at least as good as `other` under any composition
    /// capped at `cap`.
    fn covers(&self, other: &Solution, cap: Weight) -> bool {
        let (mine, theirs) = (self.weight.compose(cap), other.weight.compose(cap));
        if mine < theirs {
            return false;
        }
        match self.path.len().cmp(&other.path.len()) {
            Ordering::Less => true,
            Ordering::Equal => {
                mine == theirs && self.expression_ids().cmp(other.expression_ids()).is_le()
            }
            Ordering::Greater => false,
        }
    }
}

/// Add `candidate` to its member's entry unless a kept chain covers it.
/// Kept chains it covers are dropped.
pub(crate) fn admit(frontier: &mut Frontier, candidate: Solution, cap: Weight) {
    let kept = frontier.entry(candidate.member.clone()).or_default();
    if kept.iter().any(|k| k.covers(&candidate, cap)) {
        return;
    }
    kept.retain(|k| !candidate.covers(k, cap));
    kept.push(candidate);
}

/// Collapse a frontier to the best-ranked solution per member.
pub(crate) fn best_of(frontier: Frontier) -> SolutionSet {
    frontier
        .into_iter()
        .filter_map(|(member, kept)| {
            kept.into_iter()
                .min_by(|a, b| a.rank(b))
                .map(|best| (member, best))
        })
        .collect()
}
