//! Proof builder — linearizes a solution into a replayable step list.
//!
//! A solution's path is stored top-down. The proof keeps every edge except
//! the structural linked-inclusion edges and reverses the order, so the
//! verifier sees leaves before the roles that depend on them.

use serde::{Deserialize, Serialize};

use crate::error::ProofRejection;
use crate::expression::ExpressionId;
use crate::search::{EdgeKind, Solution};

/// One replay instruction: `to ← from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofStep {
    pub to: ExpressionId,
    pub from: ExpressionId,
}

/// A linearized credential chain plus the stack size its replay needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub steps: Vec<ProofStep>,
    pub req_stack_size: usize,
}

impl Proof {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Flat `[to, from, to, from, ...]` encoding used by ledger calls.
    pub fn to_flat(&self) -> Vec<u64> {
        self.steps
            .iter()
            .flat_map(|step| [step.to.0, step.from.0])
            .collect()
    }

    /// Decode the flat encoding produced by [`to_flat`](Self::to_flat).
    pub fn from_flat(flat: &[u64], req_stack_size: usize) -> Result<Self, ProofRejection> {
        if flat.len() % 2 != 0 {
            return Err(ProofRejection::OddLength(flat.len()));
        }
        let steps = flat
            .chunks_exact(2)
            .map(|pair| ProofStep {
                to: ExpressionId(pair[0]),
                from: ExpressionId(pair[1]),
            })
            .collect();
        Ok(Self {
            steps,
            req_stack_size,
        })
    }
}

/// Build the proof for `solution`.
pub fn build_proof(solution: &Solution) -> Proof {
    let steps = solution
        .path
        .iter()
        .rev()
        .filter(|edge| edge.kind != EdgeKind::Linked)
        .map(|edge| ProofStep {
            to: edge.to,
            from: edge.from,
        })
        .collect();
    Proof {
        steps,
        req_stack_size: solution.req_stack_size,
    }
}
