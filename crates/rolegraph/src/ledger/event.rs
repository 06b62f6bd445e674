//! Confirmed ledger events.
//!
//! The ledger emits one event per confirmed state change. Replaying the
//! events in sequence order reproduces the ledger's assertion set, ids
//! included, which is how the local mirror is built.

use serde::{Deserialize, Serialize};

use crate::expression::{Expression, ExpressionId, Role, Weight};
use crate::principal::PrincipalId;

/// A confirmed ledger change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Position in the ledger log, starting at 1.
    pub seq: u64,
    /// Confirmation time (microseconds since epoch).
    pub recorded_at: u64,
    pub kind: LedgerEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// A principal opened a role in its namespace.
    RoleRegistered { role: Role },
    /// An expression was seen for the first time and got its id.
    ExpressionInterned { id: ExpressionId, expression: Expression },
    /// An assertion `role ← expression` was stored.
    AssertionRecorded {
        role: Role,
        expression_id: ExpressionId,
        weight: Weight,
        issuer: PrincipalId,
    },
}

impl LedgerEventKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::RoleRegistered { .. } => "role_registered",
            Self::ExpressionInterned { .. } => "expression_interned",
            Self::AssertionRecorded { .. } => "assertion_recorded",
        }
    }
}
