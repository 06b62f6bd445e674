//! Credential graph — the local, read-mostly mirror of ledger assertions.
//!
//! Holds every interned expression and, per role, the assertions that
//! contribute to it in insertion order. The mirror is filled either by
//! replaying [`LedgerEvent`]s (ids come from the ledger) or directly via
//! [`CredentialGraph::record_assertion`] (ids are assigned locally in the
//! same way the ledger assigns them).
//!
//! A search borrows the graph immutably, so no assertion can appear or
//! disappear while a search pass is running. Callers that refresh the
//! mirror concurrently with searches hand out `Arc` snapshots.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoleGraphError};
use crate::expression::{Expression, ExpressionId, Role, Weight};
use crate::ledger::{LedgerEvent, LedgerEventKind};
use crate::principal::PrincipalId;
use crate::verify::AssertionLookup;

/// One stored assertion `role ← expression`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Role the assertion contributes to.
    pub role: Role,
    /// Id of the body expression.
    pub expression_id: ExpressionId,
    /// The body expression.
    pub expression: Expression,
    /// Weight assigned by the issuer.
    pub weight: Weight,
    /// Principal that registered the assertion.
    pub issuer: PrincipalId,
}

/// In-memory index of interned expressions and per-role assertions.
#[derive(Debug, Clone)]
pub struct CredentialGraph {
    /// Primary store: id → expression.
    expressions: HashMap<ExpressionId, Expression>,
    /// Interning table: expression → id.
    ids: HashMap<Expression, ExpressionId>,
    /// Assertions per role, insertion order.
    by_role: HashMap<Role, Vec<Assertion>>,
    /// (role node id, body id) → weight.
    credentials: HashMap<(ExpressionId, ExpressionId), Weight>,
    /// Roles opened through registration.
    registered: BTreeSet<Role>,
    next_id: u64,
}

impl CredentialGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            expressions: HashMap::new(),
            ids: HashMap::new(),
            by_role: HashMap::new(),
            credentials: HashMap::new(),
            registered: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// Rebuild a graph by replaying a ledger log in order.
    pub fn replay<'a>(events: impl IntoIterator<Item = &'a LedgerEvent>) -> Result<Self> {
        let mut graph = Self::new();
        for event in events {
            graph.apply_event(event)?;
        }
        Ok(graph)
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    /// Return the id of `expression`, assigning the next id if it is new.
    ///
    /// The flag is `true` when a new id was assigned.
    pub fn intern(&mut self, expression: &Expression) -> (ExpressionId, bool) {
        if let Some(id) = self.ids.get(expression) {
            return (*id, false);
        }
        let id = ExpressionId(self.next_id);
        self.next_id += 1;
        self.expressions.insert(id, expression.clone());
        self.ids.insert(expression.clone(), id);
        (id, true)
    }

    /// Mark `role` as registered. Returns `false` if it already was.
    pub fn register_role(&mut self, role: Role) -> bool {
        self.intern(&Expression::inclusion(role.clone()));
        self.registered.insert(role)
    }

    /// Store `role ← expression_id`. Both the role node and the body must
    /// already be interned.
    pub fn insert_assertion(
        &mut self,
        role: Role,
        expression_id: ExpressionId,
        weight: Weight,
        issuer: PrincipalId,
    ) -> Result<()> {
        let head = self.role_id(&role).ok_or_else(|| {
            RoleGraphError::MirrorDesync(format!("role node {role} was never interned"))
        })?;
        let expression = self
            .expressions
            .get(&expression_id)
            .cloned()
            .ok_or_else(|| {
                RoleGraphError::MirrorDesync(format!("expression {expression_id} is unknown"))
            })?;

        if self.credentials.contains_key(&(head, expression_id)) {
            return Err(RoleGraphError::DuplicateAssertion {
                role,
                expression: expression_id,
            });
        }

        self.credentials.insert((head, expression_id), weight);
        self.by_role.entry(role.clone()).or_default().push(Assertion {
            role,
            expression_id,
            expression,
            weight,
            issuer,
        });
        Ok(())
    }

    /// Intern `role` and `expression` and store the assertion between them.
    ///
    /// Returns the id of the body expression.
    pub fn record_assertion(
        &mut self,
        role: Role,
        expression: Expression,
        weight: Weight,
        issuer: PrincipalId,
    ) -> Result<ExpressionId> {
        self.intern(&Expression::inclusion(role.clone()));
        let (id, _) = self.intern(&expression);
        self.insert_assertion(role, id, weight, issuer)?;
        Ok(id)
    }

    /// Apply one confirmed ledger event.
    pub fn apply_event(&mut self, event: &LedgerEvent) -> Result<()> {
        debug!("mirror: applying event {} ({})", event.seq, event.kind.as_tag());
        match &event.kind {
            LedgerEventKind::RoleRegistered { role } => {
                self.registered.insert(role.clone());
                Ok(())
            }
            LedgerEventKind::ExpressionInterned { id, expression } => {
                if id.0 != self.next_id {
                    return Err(RoleGraphError::MirrorDesync(format!(
                        "event {} interns {id}, expected #{}",
                        event.seq, self.next_id
                    )));
                }
                let (assigned, fresh) = self.intern(expression);
                if !fresh {
                    return Err(RoleGraphError::MirrorDesync(format!(
                        "event {} re-interns an expression already known as {assigned}",
                        event.seq
                    )));
                }
                Ok(())
            }
            LedgerEventKind::AssertionRecorded {
                role,
                expression_id,
                weight,
                issuer,
            } => self.insert_assertion(role.clone(), *expression_id, *weight, issuer.clone()),
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// All assertions for `role`, in insertion order.
    pub fn assertions_of(&self, role: &Role) -> &[Assertion] {
        self.by_role.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Id of the role node for `role`, if it was ever interned.
    pub fn role_id(&self, role: &Role) -> Option<ExpressionId> {
        self.ids.get(&Expression::inclusion(role.clone())).copied()
    }

    pub fn expression(&self, id: ExpressionId) -> Option<&Expression> {
        self.expressions.get(&id)
    }

    pub fn id_of(&self, expression: &Expression) -> Option<ExpressionId> {
        self.ids.get(expression).copied()
    }

    /// Weight of the assertion `head ← body`, where `head` is a role node.
    pub fn credential_weight(&self, head: ExpressionId, body: ExpressionId) -> Option<Weight> {
        self.credentials.get(&(head, body)).copied()
    }

    pub fn is_registered(&self, role: &Role) -> bool {
        self.registered.contains(role)
    }

    pub fn len_expressions(&self) -> usize {
        self.expressions.len()
    }

    pub fn len_assertions(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl Default for CredentialGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AssertionLookup for CredentialGraph {
    fn expression(&self, id: ExpressionId) -> Option<&Expression> {
        CredentialGraph::expression(self, id)
    }

    fn credential_weight(&self, head: ExpressionId, body: ExpressionId) -> Option<Weight> {
        CredentialGraph::credential_weight(self, head, body)
    }
}
