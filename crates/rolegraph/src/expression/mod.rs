//! Expression model — the four assertion kinds.
//!
//! An assertion `role ← expression` contributes members to `role`:
//!
//! | Kind | Contributes |
//! |------|-------------|
//! | `SimpleMember(m)` | `m` itself |
//! | `SimpleInclusion(p.r)` | every member of `p.r` |
//! | `LinkedInclusion(p.a.b)` | every member of `X.b` for each member `X` of `p.a` |
//! | `IntersectionInclusion(p.a ∩ q.b)` | members found in both `p.a` and `q.b` |
//!
//! Expressions are interned: equal expressions always carry the same
//! [`ExpressionId`]. A role node in the credential graph is identified by
//! the id of its `SimpleInclusion` expression.

pub mod role;
pub mod weight;

use serde::{Deserialize, Serialize};

use crate::principal::PrincipalId;

pub use role::{Role, RoleName, ROLE_NAME_LEN};
pub use weight::Weight;

/// Ledger-assigned identifier of an interned expression.
///
/// Assigned once, starting at 1, in order of first appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionId(pub u64);

impl std::fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant of an [`Expression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionKind {
    SimpleMember,
    SimpleInclusion,
    LinkedInclusion,
    IntersectionInclusion,
}

impl ExpressionKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::SimpleMember => "simple_member",
            Self::SimpleInclusion => "simple_inclusion",
            Self::LinkedInclusion => "linked_inclusion",
            Self::IntersectionInclusion => "intersection_inclusion",
        }
    }
}

/// The body of an assertion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    SimpleMember {
        member: PrincipalId,
    },
    SimpleInclusion {
        role: Role,
    },
    LinkedInclusion {
        principal: PrincipalId,
        name_a: RoleName,
        name_b: RoleName,
    },
    IntersectionInclusion {
        a: Role,
        b: Role,
    },
}

impl Expression {
    pub fn member(member: impl Into<PrincipalId>) -> Self {
        Self::SimpleMember {
            member: member.into(),
        }
    }

    pub fn inclusion(role: Role) -> Self {
        Self::SimpleInclusion { role }
    }

    pub fn linked(principal: impl Into<PrincipalId>, name_a: RoleName, name_b: RoleName) -> Self {
        Self::LinkedInclusion {
            principal: principal.into(),
            name_a,
            name_b,
        }
    }

    pub fn intersection(a: Role, b: Role) -> Self {
        Self::IntersectionInclusion { a, b }
    }

    pub fn kind(&self) -> ExpressionKind {
        match self {
            Self::SimpleMember { .. } => ExpressionKind::SimpleMember,
            Self::SimpleInclusion { .. } => ExpressionKind::SimpleInclusion,
            Self::LinkedInclusion { .. } => ExpressionKind::LinkedInclusion,
            Self::IntersectionInclusion { .. } => ExpressionKind::IntersectionInclusion,
        }
    }

    /// The role this expression names, if it is a role node.
    pub fn as_role(&self) -> Option<&Role> {
        match self {
            Self::SimpleInclusion { role } => Some(role),
            _ => None,
        }
    }

    /// The first-hop role of a linked inclusion.
    pub fn linked_first_hop(&self) -> Option<Role> {
        match self {
            Self::LinkedInclusion {
                principal, name_a, ..
            } => Some(Role::new(principal.clone(), *name_a)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SimpleMember { member } => write!(f, "{member}"),
            Self::SimpleInclusion { role } => write!(f, "{role}"),
            Self::LinkedInclusion {
                principal,
                name_a,
                name_b,
            } => write!(f, "{principal}.{name_a}.{name_b}"),
            Self::IntersectionInclusion { a, b } => write!(f, "{a} ∩ {b}"),
        }
    }
}
