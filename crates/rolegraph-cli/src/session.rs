//! Drives a policy against an in-process ledger.
//!
//! Every principal in the policy gets a fresh key; registrations are signed
//! by the principal that owns the role. Queries refresh the local mirror
//! from the ledger's confirmed events before searching.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};

use rolegraph::{
    sync_mirror, CredentialGraph, Expression, InMemoryLedger, LedgerClient, PrincipalId,
    PrincipalKey, Role, SearchConfig, TransactionBuilder, VerifierConfig,
};

use crate::labels::Labels;
use crate::policy::{BodySpec, Policy, Step};
use crate::report::{run_query, QueryReport};

pub struct Session {
    ledger: InMemoryLedger,
    mirror: CredentialGraph,
    cursor: u64,
    keys: BTreeMap<PrincipalId, PrincipalKey>,
    labels: Labels,
    search: SearchConfig,
}

impl Session {
    pub fn new(policy: &Policy, search: SearchConfig, verifier: VerifierConfig) -> Result<Self> {
        let mut keys = BTreeMap::new();
        let mut labels = Labels::default();
        for label in &policy.principals {
            if labels.find_principal(label).is_some() {
                bail!("principal '{label}' is declared twice");
            }
            let key = PrincipalKey::new(Some(label.clone()));
            labels.insert_principal(key.id(), label.clone());
            keys.insert(key.id(), key);
        }
        for (label, name) in &policy.role_names {
            labels.insert_role_name(*name, label.clone());
        }

        Ok(Self {
            ledger: InMemoryLedger::with_config(verifier),
            mirror: CredentialGraph::new(),
            cursor: 0,
            keys,
            labels,
            search,
        })
    }

    /// Apply every step in order, collecting query reports.
    pub fn run(&mut self, policy: &Policy) -> Result<Vec<QueryReport>> {
        let mut reports = Vec::with_capacity(policy.queries());
        for (index, step) in policy.steps.iter().enumerate() {
            let report = self
                .apply(step)
                .with_context(|| format!("step {} failed", index + 1))?;
            reports.extend(report);
        }
        Ok(reports)
    }

    pub fn apply(&mut self, step: &Step) -> Result<Option<QueryReport>> {
        match step {
            Step::RegisterRole(text) => {
                let role = self.labels.parse_role(text)?;
                let tx = TransactionBuilder::register_role(role.name)
                    .sign(self.key_of(&role.principal)?)?;
                self.ledger.register_role(&tx)?;
                Ok(None)
            }
            Step::Assert(spec) => {
                let role = self.labels.parse_role(&spec.role)?;
                let expression = self.expression(&spec.body)?;
                let tx = TransactionBuilder::register_assertion(role.clone(), expression, spec.weight)
                    .sign(self.key_of(&role.principal)?)?;
                self.ledger.register_assertion(&tx)?;
                Ok(None)
            }
            Step::Query(text) => {
                let role = self.labels.parse_role(text)?;
                Ok(Some(self.query(&role)?))
            }
        }
    }

    pub fn query(&mut self, role: &Role) -> Result<QueryReport> {
        self.cursor = sync_mirror(&self.ledger, &mut self.mirror, self.cursor)?;
        Ok(run_query(
            &self.mirror,
            &self.ledger,
            &self.labels,
            role,
            &self.search,
        ))
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    fn key_of(&self, principal: &PrincipalId) -> Result<&PrincipalKey> {
        self.keys
            .get(principal)
            .ok_or_else(|| anyhow!("no key for principal {}", self.labels.principal(principal)))
    }

    fn principal(&self, label: &str) -> Result<PrincipalId> {
        self.labels
            .find_principal(label)
            .ok_or_else(|| anyhow!("unknown principal '{label}'"))
    }

    fn expression(&self, body: &BodySpec) -> Result<Expression> {
        Ok(match body {
            BodySpec::SimpleMember { member } => Expression::member(self.principal(member)?),
            BodySpec::SimpleInclusion { target } => {
                Expression::inclusion(self.labels.parse_role(target)?)
            }
            BodySpec::LinkedInclusion {
                principal,
                name_a,
                name_b,
            } => {
                let name = |label: &str| {
                    self.labels
                        .find_role_name(label)
                        .ok_or_else(|| anyhow!("unknown role name '{label}'"))
                };
                Expression::linked(self.principal(principal)?, name(name_a)?, name(name_b)?)
            }
            BodySpec::IntersectionInclusion { a, b } => {
                Expression::intersection(self.labels.parse_role(a)?, self.labels.parse_role(b)?)
            }
        })
    }
}
