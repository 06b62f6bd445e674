//! Role names and roles.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, RoleGraphError};
use crate::principal::PrincipalId;

/// Width of a role name in bytes.
pub const ROLE_NAME_LEN: usize = 2;

/// Fixed-width binary role name, unique within its issuer's namespace.
///
/// Rendered as `0x` followed by lowercase hex, e.g. `0x000a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleName(pub [u8; ROLE_NAME_LEN]);

impl RoleName {
    pub const fn new(bytes: [u8; ROLE_NAME_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn from_u16(value: u16) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; ROLE_NAME_LEN] {
        &self.0
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for RoleName {
    type Err = RoleGraphError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| RoleGraphError::InvalidRoleName(format!("{s}: {e}")))?;
        let bytes: [u8; ROLE_NAME_LEN] = bytes.try_into().map_err(|_| {
            RoleGraphError::InvalidRoleName(format!("{s}: expected {ROLE_NAME_LEN} bytes"))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for RoleName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RoleName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A role: a name in the namespace of the principal that issues it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Role {
    /// Issuer of the role.
    pub principal: PrincipalId,
    /// Name within the issuer's namespace.
    pub name: RoleName,
}

impl Role {
    pub fn new(principal: impl Into<PrincipalId>, name: RoleName) -> Self {
        Self {
            principal: principal.into(),
            name,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.principal, self.name)
    }
}
