//! In-process ledger.
//!
//! Applies the same admission rules a deployed ledger enforces and records
//! every confirmed change as a [`LedgerEvent`]. State is an ordinary
//! [`CredentialGraph`]; the event log is what gets persisted and replayed.

use log::{debug, info};

use crate::error::{Result, RoleGraphError};
use crate::expression::{Expression, ExpressionId, Role, Weight};
use crate::graph::{Assertion, CredentialGraph};
use crate::proof::Proof;
use crate::verify::{self, AssertionLookup, Resolution, VerifierConfig};

use super::event::{LedgerEvent, LedgerEventKind};
use super::transaction::{Payload, Transaction};
use super::LedgerClient;

/// A ledger held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: CredentialGraph,
    verifier: VerifierConfig,
    events: Vec<LedgerEvent>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that verifies proofs under `verifier`.
    pub fn with_config(verifier: VerifierConfig) -> Self {
        Self {
            verifier,
            ..Self::default()
        }
    }

    /// Rebuild a ledger from its event log.
    pub fn restore(events: Vec<LedgerEvent>, verifier: VerifierConfig) -> Result<Self> {
        let mut state = CredentialGraph::new();
        for (index, event) in events.iter().enumerate() {
            let expected = index as u64 + 1;
            if event.seq != expected {
                return Err(RoleGraphError::MirrorDesync(format!(
                    "event log has seq {} at position {expected}",
                    event.seq
                )));
            }
            state.apply_event(event)?;
        }
        info!("ledger restored from {} events", events.len());
        Ok(Self {
            state,
            verifier,
            events,
        })
    }

    /// The full event log.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Sequence number of the last confirmed event, 0 when empty.
    pub fn head(&self) -> u64 {
        self.events.last().map(|e| e.seq).unwrap_or(0)
    }

    /// Canonical state.
    pub fn state(&self) -> &CredentialGraph {
        &self.state
    }

    pub fn verifier_config(&self) -> &VerifierConfig {
        &self.verifier
    }

    fn emit(&mut self, kind: LedgerEventKind) {
        let event = LedgerEvent {
            seq: self.head() + 1,
            recorded_at: crate::time::now_micros(),
            kind,
        };
        debug!("ledger event {} ({})", event.seq, event.kind.as_tag());
        self.events.push(event);
    }

    fn intern(&mut self, expression: &Expression) -> ExpressionId {
        let (id, fresh) = self.state.intern(expression);
        if fresh {
            self.emit(LedgerEventKind::ExpressionInterned {
                id,
                expression: expression.clone(),
            });
        }
        id
    }
}

impl LedgerClient for InMemoryLedger {
    fn register_role(&mut self, tx: &Transaction) -> Result<Role> {
        tx.verify()?;
        let Payload::RegisterRole { name } = &tx.payload else {
            return Err(RoleGraphError::InvalidTransaction(format!(
                "expected register_role, got {}",
                tx.payload.as_tag()
            )));
        };

        let role = Role::new(tx.issuer.clone(), *name);
        if self.state.is_registered(&role) {
            return Err(RoleGraphError::RoleAlreadyExists(role));
        }

        self.intern(&Expression::inclusion(role.clone()));
        self.state.register_role(role.clone());
        self.emit(LedgerEventKind::RoleRegistered { role: role.clone() });
        info!("role registered: {role}");
        Ok(role)
    }

    fn register_assertion(&mut self, tx: &Transaction) -> Result<ExpressionId> {
        tx.verify()?;
        let Payload::RegisterAssertion {
            role,
            expression,
            weight,
        } = &tx.payload
        else {
            return Err(RoleGraphError::InvalidTransaction(format!(
                "expected register_assertion, got {}",
                tx.payload.as_tag()
            )));
        };

        if role.principal != tx.issuer {
            return Err(RoleGraphError::Unauthorized {
                issuer: tx.issuer.clone(),
                role: role.clone(),
            });
        }
        if !self.state.is_registered(role) {
            return Err(RoleGraphError::RoleNotRegistered(role.clone()));
        }
        let weight = Weight::new(*weight)?;

        // Reject duplicates before anything is interned.
        if let (Some(head), Some(body)) = (self.state.role_id(role), self.state.id_of(expression)) {
            if self.state.credential_weight(head, body).is_some() {
                return Err(RoleGraphError::DuplicateAssertion {
                    role: role.clone(),
                    expression: body,
                });
            }
        }

        let id = self.intern(expression);
        self.state
            .insert_assertion(role.clone(), id, weight, tx.issuer.clone())?;
        self.emit(LedgerEventKind::AssertionRecorded {
            role: role.clone(),
            expression_id: id,
            weight,
            issuer: tx.issuer.clone(),
        });
        info!("assertion recorded: {role} <- {expression} ({id}, weight {weight})");
        Ok(id)
    }

    fn read_assertions(&self, role: &Role) -> Result<Vec<Assertion>> {
        Ok(self.state.assertions_of(role).to_vec())
    }

    fn execute_verify_proof(&self, proof: &Proof) -> Result<Resolution> {
        Ok(verify::verify_proof_with(&self.state, proof, &self.verifier)?)
    }

    fn events_since(&self, seq: u64) -> Result<Vec<LedgerEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.seq > seq)
            .cloned()
            .collect())
    }
}

impl AssertionLookup for InMemoryLedger {
    fn expression(&self, id: ExpressionId) -> Option<&Expression> {
        self.state.expression(id)
    }

    fn credential_weight(&self, head: ExpressionId, body: ExpressionId) -> Option<Weight> {
        self.state.credential_weight(head, body)
    }
}
