//! Assertion weights.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RoleGraphError};

/// Trust weight attached to an assertion, in `1..=100`.
///
/// Weights compose by minimum along a chain, so `Weight::MAX` is the
/// neutral element used for structural edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weight(u8);

impl Weight {
    pub const MAX: Weight = Weight(100);
    pub const MIN: Weight = Weight(1);

    pub fn new(value: u8) -> Result<Self> {
        if value == 0 || value > Self::MAX.0 {
            return Err(RoleGraphError::InvalidWeight(value));
        }
        Ok(Self(value))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Compose two weights along a chain.
    pub fn compose(self, other: Weight) -> Weight {
        self.min(other)
    }
}

impl TryFrom<u8> for Weight {
    type Error = RoleGraphError;

    fn try_from(value: u8) -> Result<Self> {
        Weight::new(value)
    }
}

impl From<Weight> for u8 {
    fn from(w: Weight) -> u8 {
        w.0
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
