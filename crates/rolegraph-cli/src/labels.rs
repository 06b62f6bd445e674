//! Presentation labels.
//!
//! Maps opaque principal ids and binary role names to the human-readable
//! labels a policy was written with. Lookups always fall back to the raw
//! identifier, so output stays usable for ids nobody labelled.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use rolegraph::{Expression, PrincipalId, Resolution, Role, RoleName};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    pub principals: BTreeMap<PrincipalId, String>,
    pub role_names: BTreeMap<RoleName, String>,
}

impl Labels {
    pub fn insert_principal(&mut self, id: PrincipalId, label: impl Into<String>) {
        self.principals.insert(id, label.into());
    }

    pub fn insert_role_name(&mut self, name: RoleName, label: impl Into<String>) {
        self.role_names.insert(name, label.into());
    }

    pub fn principal(&self, id: &PrincipalId) -> String {
        self.principals
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn role_name(&self, name: &RoleName) -> String {
        self.role_names
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn role(&self, role: &Role) -> String {
        format!("{}.{}", self.principal(&role.principal), self.role_name(&role.name))
    }

    /// `A`, `A.r`, `A.r1.r2` or `A.r1 ∩ B.r2`.
    pub fn expression(&self, expression: &Expression) -> String {
        match expression {
            Expression::SimpleMember { member } => self.principal(member),
            Expression::SimpleInclusion { role } => self.role(role),
            Expression::LinkedInclusion {
                principal,
                name_a,
                name_b,
            } => format!(
                "{}.{}.{}",
                self.principal(principal),
                self.role_name(name_a),
                self.role_name(name_b)
            ),
            Expression::IntersectionInclusion { a, b } => {
                format!("{} ∩ {}", self.role(a), self.role(b))
            }
        }
    }

    pub fn resolution(&self, resolution: &Resolution) -> String {
        format!(
            "({}, {}, {}, {})",
            self.principal(&resolution.principal),
            self.role_name(&resolution.role_name),
            self.principal(&resolution.member),
            resolution.weight
        )
    }

    /// Principal by label, or by raw id if that id is known.
    pub fn find_principal(&self, text: &str) -> Option<PrincipalId> {
        self.principals
            .iter()
            .find(|(_, label)| label.as_str() == text)
            .map(|(id, _)| id.clone())
            .or_else(|| {
                let id = PrincipalId::from(text);
                self.principals.contains_key(&id).then_some(id)
            })
    }

    /// Role name by label, or parsed from hex.
    pub fn find_role_name(&self, text: &str) -> Option<RoleName> {
        self.role_names
            .iter()
            .find(|(_, label)| label.as_str() == text)
            .map(|(name, _)| *name)
            .or_else(|| text.parse().ok())
    }

    /// Parse `Principal.role`.
    pub fn parse_role(&self, text: &str) -> Result<Role> {
        let (principal, name) = text
            .split_once('.')
            .ok_or_else(|| anyhow!("expected Principal.role, got '{text}'"))?;
        let principal = self
            .find_principal(principal)
            .ok_or_else(|| anyhow!("unknown principal '{principal}'"))?;
        let name = self
            .find_role_name(name)
            .ok_or_else(|| anyhow!("unknown role name '{name}'"))?;
        Ok(Role::new(principal, name))
    }
}
