//! Policy documents.
//!
//! A policy names its principals and role names by label and lists the
//! steps to drive against the ledger, in order:
//!
//! ```json
//! {
//!   "principals": ["EPapers", "EOrg", "S"],
//!   "role_names": { "canAccess": "0x000a", "member": "0x000c" },
//!   "steps": [
//!     { "register_role": "EOrg.member" },
//!     { "assert": { "role": "EOrg.member", "kind": "simple_member", "member": "S", "weight": 100 } },
//!     { "query": "EOrg.member" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rolegraph::RoleName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub principals: Vec<String>,
    pub role_names: BTreeMap<String, RoleName>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Open `Principal.role`, signed by the principal.
    RegisterRole(String),
    /// Add an assertion, signed by the role's principal.
    Assert(AssertionSpec),
    /// Discover, prove and verify every member of `Principal.role`.
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSpec {
    /// `Principal.role` receiving the assertion.
    pub role: String,
    pub weight: u8,
    #[serde(flatten)]
    pub body: BodySpec,
}

/// Assertion body, by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodySpec {
    SimpleMember {
        member: String,
    },
    SimpleInclusion {
        target: String,
    },
    LinkedInclusion {
        principal: String,
        name_a: String,
        name_b: String,
    },
    IntersectionInclusion {
        a: String,
        b: String,
    },
}

impl Policy {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse policy {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize policy")?;
        std::fs::write(path, json.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn register(&mut self, role: impl Into<String>) {
        self.steps.push(Step::RegisterRole(role.into()));
    }

    pub fn assert(&mut self, role: impl Into<String>, body: BodySpec, weight: u8) {
        self.steps.push(Step::Assert(AssertionSpec {
            role: role.into(),
            weight,
            body,
        }));
    }

    pub fn query(&mut self, role: impl Into<String>) {
        self.steps.push(Step::Query(role.into()));
    }

    pub fn queries(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Query(_)))
            .count()
    }
}
