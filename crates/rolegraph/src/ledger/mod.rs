//! Ledger boundary.
//!
//! The ledger persists roles and assertions, assigns expression ids and
//! runs the verifier as the trust-authoritative check. [`LedgerClient`] is
//! the interface the rest of the crate consumes; [`InMemoryLedger`] is an
//! in-process implementation with the same rules.

pub mod event;
pub mod memory;
pub mod transaction;

use log::debug;

use crate::error::Result;
use crate::expression::{ExpressionId, Role};
use crate::graph::{Assertion, CredentialGraph};
use crate::proof::Proof;
use crate::verify::Resolution;

pub use event::{LedgerEvent, LedgerEventKind};
pub use memory::InMemoryLedger;
pub use transaction::{Payload, Transaction, TransactionBuilder};

/// Operations a ledger exposes to this crate.
pub trait LedgerClient {
    /// Open a role in the transaction issuer's namespace.
    fn register_role(&mut self, tx: &Transaction) -> Result<Role>;

    /// Store an assertion and return the id of its body expression.
    fn register_assertion(&mut self, tx: &Transaction) -> Result<ExpressionId>;

    /// Confirmed assertions on `role`, in insertion order.
    fn read_assertions(&self, role: &Role) -> Result<Vec<Assertion>>;

    /// Replay `proof` against canonical ledger state.
    fn execute_verify_proof(&self, proof: &Proof) -> Result<Resolution>;

    /// Confirmed events with a sequence number greater than `seq`.
    fn events_since(&self, seq: u64) -> Result<Vec<LedgerEvent>>;
}

/// Apply every event confirmed after `cursor` to `mirror`.
///
/// Returns the new cursor. The batch applies as a whole: on error `mirror`
/// is left as it was, so the caller can retry from the same cursor.
pub fn sync_mirror<L>(ledger: &L, mirror: &mut CredentialGraph, cursor: u64) -> Result<u64>
where
    L: LedgerClient + ?Sized,
{
    let events = ledger.events_since(cursor)?;
    let Some(last) = events.last() else {
        return Ok(cursor);
    };

    let mut staged = mirror.clone();
    for event in &events {
        staged.apply_event(event)?;
    }
    *mirror = staged;
    debug!("mirror synced to event {}", last.seq);
    Ok(last.seq)
}
