//! Error types for rolegraph.
//!
//! Discovery never fails: unknown roles, cycles and exhausted budgets are
//! reported as the absence of a solution. The only hard failures are
//! registration rejections, persistence problems and invalid proofs.

use crate::expression::{ExpressionId, Role, Weight};
use crate::principal::PrincipalId;

/// Reasons a proof replay is rejected.
///
/// Every rejection is terminal for that proof; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofRejection {
    #[error("proof contains no steps")]
    EmptyProof,

    #[error("declared stack size {declared} exceeds the limit of {limit}")]
    StackSizeTooLarge { declared: usize, limit: usize },

    #[error("proof has {steps} steps, limit is {limit}")]
    TooManySteps { steps: usize, limit: usize },

    #[error("flat proof encoding has odd length {0}")]
    OddLength(usize),

    #[error("expression {0} is not known to the ledger")]
    UnknownExpression(ExpressionId),

    #[error("no assertion {to} <- {from} is stored on the ledger")]
    MissingCredential { to: ExpressionId, from: ExpressionId },

    #[error("step {index} ({to} <- {from}) is not a valid replay step: {reason}")]
    UnexpectedStep {
        index: usize,
        to: ExpressionId,
        from: ExpressionId,
        reason: String,
    },

    #[error("stack overflow at step {index}: limit {limit}")]
    StackOverflow { index: usize, limit: usize },

    #[error("stack underflow at step {index}")]
    StackUnderflow { index: usize },

    #[error("step {index}: {reason}")]
    BranchMismatch { index: usize, reason: String },

    #[error("replay finished with {0} stack entries instead of one resolved result")]
    UnresolvedStack(usize),

    #[error("proof resolves to {actual} but {expected} was declared")]
    ResultMismatch { expected: String, actual: String },
}

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum RoleGraphError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Transaction rejected: {0}")]
    InvalidTransaction(String),

    #[error("Role already registered: {0}")]
    RoleAlreadyExists(Role),

    #[error("Role not registered: {0}")]
    RoleNotRegistered(Role),

    #[error("{issuer} may not add assertions to {role}")]
    Unauthorized { issuer: PrincipalId, role: Role },

    #[error("Invalid weight {0}: must be between 1 and {max}", max = Weight::MAX.get())]
    InvalidWeight(u8),

    #[error("Assertion {role} <- {expression} already exists")]
    DuplicateAssertion { role: Role, expression: ExpressionId },

    #[error("Mirror out of sync with ledger: {0}")]
    MirrorDesync(String),

    #[error("Invalid role name: {0}")]
    InvalidRoleName(String),

    #[error("Proof invalid: {0}")]
    ProofInvalid(#[from] ProofRejection),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, RoleGraphError>;
