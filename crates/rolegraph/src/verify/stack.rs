//! Bounded replay stack.

use crate::error::ProofRejection;
use crate::expression::{ExpressionId, Weight};
use crate::principal::PrincipalId;

/// One stack entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    /// `member` holds `node` (a role node or an intersection node) with
    /// `weight`.
    Resolved {
        node: ExpressionId,
        member: PrincipalId,
        weight: Weight,
    },
    /// First half of intersection `node`: `member` was found in `component`
    /// and waits for the other component.
    Pending {
        node: ExpressionId,
        component: ExpressionId,
        member: PrincipalId,
        weight: Weight,
    },
}

/// Stack that refuses to grow past the size the proof declared.
#[derive(Debug)]
pub(crate) struct BoundedStack {
    slots: Vec<Slot>,
    limit: usize,
}

impl BoundedStack {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            slots: Vec::with_capacity(limit),
            limit,
        }
    }

    pub(crate) fn push(&mut self, index: usize, slot: Slot) -> Result<(), ProofRejection> {
        if self.slots.len() >= self.limit {
            return Err(ProofRejection::StackOverflow {
                index,
                limit: self.limit,
            });
        }
        self.slots.push(slot);
        Ok(())
    }

    pub(crate) fn pop(&mut self, index: usize) -> Result<Slot, ProofRejection> {
        self.slots
            .pop()
            .ok_or(ProofRejection::StackUnderflow { index })
    }

    /// Pop an entry that must be resolved.
    pub(crate) fn pop_resolved(
        &mut self,
        index: usize,
    ) -> Result<(ExpressionId, PrincipalId, Weight), ProofRejection> {
        match self.pop(index)? {
            Slot::Resolved {
                node,
                member,
                weight,
            } => Ok((node, member, weight)),
            Slot::Pending { node, .. } => Err(ProofRejection::BranchMismatch {
                index,
                reason: format!("expected a resolved entry, found a pending half of {node}"),
            }),
        }
    }

    pub(crate) fn peek(&self) -> Option<&Slot> {
        self.slots.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn into_slots(self) -> Vec<Slot> {
        self.slots
    }
}
