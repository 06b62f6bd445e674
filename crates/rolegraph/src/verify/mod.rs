//! Stack-based proof verifier.
//!
//! Replays a [`Proof`] against canonical assertion state and re-derives the
//! `(principal, role, member, weight)` it establishes. Nothing embedded in
//! the proof is trusted: every step is checked against stored expressions
//! and stored assertion weights, and weights are recomputed with the same
//! minimum rule the discovery engine uses.
//!
//! Step rules, where `to ← from` is one proof step:
//!
//! - role ← `SimpleMember(m)`: push `(role, m, w)`.
//! - role ← role node or intersection node: pop the entry resolved for
//!   `from` and push it for `role`.
//! - role ← `LinkedInclusion(p.a.b)`: pop the witness `X` of `p.a`, pop the
//!   entry resolved for `X.b`, push it for `role`.
//! - intersection ← component role: pop the component's entry, then either
//!   merge it with the pending other half below it or leave it pending.

mod stack;

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ProofRejection;
use crate::expression::{Expression, ExpressionId, Role, RoleName, Weight};
use crate::principal::PrincipalId;
use crate::proof::{Proof, ProofStep};

use stack::{BoundedStack, Slot};

/// Read access to canonical assertion state.
///
/// Implemented by the local mirror and by the ledger itself, so the exact
/// same replay runs off-ledger for validation and on-ledger for trust.
pub trait AssertionLookup {
    /// The interned expression with `id`.
    fn expression(&self, id: ExpressionId) -> Option<&Expression>;

    /// Weight of the stored assertion `head ← body`, where `head` is a role
    /// node.
    fn credential_weight(&self, head: ExpressionId, body: ExpressionId) -> Option<Weight>;
}

/// Limits applied before any replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Largest stack a proof may declare.
    pub max_stack_size: usize,
    /// Largest number of steps a proof may carry.
    pub max_steps: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_stack_size: 64,
            max_steps: 4096,
        }
    }
}

/// What a proof establishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub principal: PrincipalId,
    pub role_name: RoleName,
    pub member: PrincipalId,
    pub weight: Weight,
}

impl Resolution {
    pub fn new(role: &Role, member: impl Into<PrincipalId>, weight: Weight) -> Self {
        Self {
            principal: role.principal.clone(),
            role_name: role.name,
            member: member.into(),
            weight,
        }
    }

    pub fn role(&self) -> Role {
        Role::new(self.principal.clone(), self.role_name)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.principal, self.role_name, self.member, self.weight
        )
    }
}

/// Verify `proof` with the default limits.
pub fn verify_proof<S>(state: &S, proof: &Proof) -> Result<Resolution, ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    verify_proof_with(state, proof, &VerifierConfig::default())
}

/// Verify `proof` under `config`.
pub fn verify_proof_with<S>(
    state: &S,
    proof: &Proof,
    config: &VerifierConfig,
) -> Result<Resolution, ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    let result = replay(state, proof, config);
    match &result {
        Ok(resolution) => debug!("proof of {} steps verified: {resolution}", proof.len()),
        Err(rejection) => warn!("proof rejected: {rejection}"),
    }
    result
}

/// Verify `proof` and check that it establishes exactly `expected`.
pub fn verify_claim<S>(
    state: &S,
    proof: &Proof,
    expected: &Resolution,
) -> Result<Resolution, ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    verify_claim_with(state, proof, expected, &VerifierConfig::default())
}

/// [`verify_claim`] under `config`.
pub fn verify_claim_with<S>(
    state: &S,
    proof: &Proof,
    expected: &Resolution,
    config: &VerifierConfig,
) -> Result<Resolution, ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    let actual = verify_proof_with(state, proof, config)?;
    if &actual != expected {
        let rejection = ProofRejection::ResultMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        };
        warn!("claim rejected: {rejection}");
        return Err(rejection);
    }
    Ok(actual)
}

fn replay<S>(state: &S, proof: &Proof, config: &VerifierConfig) -> Result<Resolution, ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    if proof.is_empty() {
        return Err(ProofRejection::EmptyProof);
    }
    if proof.req_stack_size > config.max_stack_size {
        return Err(ProofRejection::StackSizeTooLarge {
            declared: proof.req_stack_size,
            limit: config.max_stack_size,
        });
    }
    if proof.len() > config.max_steps {
        return Err(ProofRejection::TooManySteps {
            steps: proof.len(),
            limit: config.max_steps,
        });
    }

    let mut stack = BoundedStack::new(proof.req_stack_size);
    for (index, step) in proof.steps.iter().enumerate() {
        let to = lookup(state, step.to)?;
        let from = lookup(state, step.from)?;
        match to {
            Expression::SimpleInclusion { .. } => {
                apply_credential(state, &mut stack, index, step, from)?
            }
            Expression::IntersectionInclusion { a, b } => {
                apply_component(state, &mut stack, index, step, from, a, b)?
            }
            Expression::SimpleMember { .. } => {
                return Err(unexpected(index, step, "a member leaf cannot take members"))
            }
            Expression::LinkedInclusion { .. } => {
                return Err(unexpected(
                    index,
                    step,
                    "linked inclusion edges are structural and never appear in proofs",
                ))
            }
        }
    }

    finish(state, stack)
}

fn lookup<S>(state: &S, id: ExpressionId) -> Result<&Expression, ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    state
        .expression(id)
        .ok_or(ProofRejection::UnknownExpression(id))
}

fn unexpected(index: usize, step: &ProofStep, reason: &str) -> ProofRejection {
    ProofRejection::UnexpectedStep {
        index,
        to: step.to,
        from: step.from,
        reason: reason.to_string(),
    }
}

/// `role ← body` backed by a stored assertion.
fn apply_credential<S>(
    state: &S,
    stack: &mut BoundedStack,
    index: usize,
    step: &ProofStep,
    body: &Expression,
) -> Result<(), ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    let local = state
        .credential_weight(step.to, step.from)
        .ok_or(ProofRejection::MissingCredential {
            to: step.to,
            from: step.from,
        })?;

    let (member, weight) = match body {
        Expression::SimpleMember { member } => (member.clone(), local),
        Expression::SimpleInclusion { .. } | Expression::IntersectionInclusion { .. } => {
            let (node, member, branch) = stack.pop_resolved(index)?;
            if node != step.from {
                return Err(ProofRejection::BranchMismatch {
                    index,
                    reason: format!("top entry resolves {node}, step consumes {}", step.from),
                });
            }
            (member, local.compose(branch))
        }
        Expression::LinkedInclusion {
            principal,
            name_a,
            name_b,
        } => {
            let (witness_node, intermediate, via) = stack.pop_resolved(index)?;
            let first_hop = Expression::inclusion(Role::new(principal.clone(), *name_a));
            expect_node(state, index, witness_node, &first_hop)?;

            let (inner_node, member, inner) = stack.pop_resolved(index)?;
            let second_hop = Expression::inclusion(Role::new(intermediate, *name_b));
            expect_node(state, index, inner_node, &second_hop)?;

            (member, local.compose(via).compose(inner))
        }
    };

    stack.push(
        index,
        Slot::Resolved {
            node: step.to,
            member,
            weight,
        },
    )
}

fn expect_node<S>(
    state: &S,
    index: usize,
    node: ExpressionId,
    expected: &Expression,
) -> Result<(), ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    match state.expression(node) {
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(ProofRejection::BranchMismatch {
            index,
            reason: format!("entry resolves {found}, expected {expected}"),
        }),
        None => Err(ProofRejection::UnknownExpression(node)),
    }
}

/// `intersection ← component role`.
fn apply_component<S>(
    state: &S,
    stack: &mut BoundedStack,
    index: usize,
    step: &ProofStep,
    from: &Expression,
    a: &Role,
    b: &Role,
) -> Result<(), ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    let component = match from.as_role() {
        Some(role) if role == a || role == b => role,
        _ => {
            return Err(unexpected(
                index,
                step,
                "an intersection only takes its two component roles",
            ))
        }
    };
    let other = if component == a { b } else { a };

    let (node, member, weight) = stack.pop_resolved(index)?;
    if node != step.from {
        return Err(ProofRejection::BranchMismatch {
            index,
            reason: format!("top entry resolves {node}, step consumes {}", step.from),
        });
    }

    let half = match stack.peek() {
        Some(Slot::Pending {
            node,
            component,
            member,
            weight,
        }) if *node == step.to => Some((*component, member.clone(), *weight)),
        _ => None,
    };

    match half {
        None => stack.push(
            index,
            Slot::Pending {
                node: step.to,
                component: step.from,
                member,
                weight,
            },
        ),
        Some((half_component, half_member, half_weight)) => {
            stack.pop(index)?;
            let half_role = state.expression(half_component).and_then(Expression::as_role);
            if half_role != Some(other) {
                return Err(ProofRejection::BranchMismatch {
                    index,
                    reason: format!("pending half came from {half_component}, expected {other}"),
                });
            }
            if half_member != member {
                return Err(ProofRejection::BranchMismatch {
                    index,
                    reason: format!("intersection branches resolve {half_member} and {member}"),
                });
            }
            stack.push(
                index,
                Slot::Resolved {
                    node: step.to,
                    member,
                    weight: half_weight.compose(weight),
                },
            )
        }
    }
}

fn finish<S>(state: &S, stack: BoundedStack) -> Result<Resolution, ProofRejection>
where
    S: AssertionLookup + ?Sized,
{
    let len = stack.len();
    let mut slots = stack.into_slots();
    match (len, slots.pop()) {
        (
            1,
            Some(Slot::Resolved {
                node,
                member,
                weight,
            }),
        ) => match state.expression(node).and_then(Expression::as_role) {
            Some(role) => Ok(Resolution::new(role, member, weight)),
            None => Err(ProofRejection::UnresolvedStack(1)),
        },
        _ => Err(ProofRejection::UnresolvedStack(len)),
    }
}
