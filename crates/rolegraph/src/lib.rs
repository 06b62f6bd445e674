//! RoleGraph — Decentralized role-based trust management.
//!
//! Principals issue role assertions about other principals. Any party can
//! discover credential chains that justify a membership query against a
//! local mirror of the ledger, linearize a chain into a compact proof, and
//! have that proof checked by a bounded stack machine that re-derives the
//! result from canonical ledger state.

pub mod crypto;
pub mod error;
pub mod expression;
pub mod graph;
pub mod ledger;
pub mod principal;
pub mod proof;
pub mod search;
pub mod storage;
pub mod time;
pub mod verify;

// Re-export primary types
pub use error::{ProofRejection, Result, RoleGraphError};
pub use expression::{Expression, ExpressionId, ExpressionKind, Role, RoleName, Weight};
pub use graph::{Assertion, CredentialGraph};
pub use principal::{PrincipalId, PrincipalKey};

// Re-export discovery and proof types
pub use proof::{build_proof, Proof, ProofStep};
pub use search::{
    search, DiscoveryEngine, Edge, EdgeKind, PruneReason, SearchConfig, SearchStats, Solution,
    SolutionSet,
};
pub use verify::{
    verify_claim, verify_claim_with, verify_proof, verify_proof_with, AssertionLookup, Resolution, VerifierConfig,
};

// Re-export ledger types
pub use ledger::{
    sync_mirror, InMemoryLedger, LedgerClient, LedgerEvent, LedgerEventKind, Transaction,
    TransactionBuilder,
};
pub use storage::EventStore;
