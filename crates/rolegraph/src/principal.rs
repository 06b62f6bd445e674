//! Principals — identities that issue and hold roles.
//!
//! A principal is only an opaque id to the credential graph. Keyed
//! principals additionally own an Ed25519 key pair and derive their id
//! from the public key, so that the ledger can authenticate the issuer of
//! every registration.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::KeyPair;

/// Opaque principal identifier.
///
/// Keyed principals use the format `prn_` + base58 of the first 16 bytes of
/// SHA-256(public_key). Any other string is accepted as an id; nothing in
/// discovery or verification looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Compute the principal id for a verifying key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let hash = Sha256::digest(key.as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("prn_{encoded}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PrincipalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A principal together with its signing key.
pub struct PrincipalKey {
    key_pair: KeyPair,
    /// Human-readable label (presentation only).
    pub label: Option<String>,
}

impl PrincipalKey {
    /// Create a principal with a fresh key pair.
    pub fn new(label: Option<String>) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label,
        }
    }

    /// Rebuild a principal from stored signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32], label: Option<String>) -> Self {
        Self {
            key_pair: KeyPair::from_signing_key_bytes(bytes),
            label,
        }
    }

    /// The principal id (derived from the public key).
    pub fn id(&self) -> PrincipalId {
        PrincipalId::from_verifying_key(self.key_pair.verifying_key())
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn public_key_base64(&self) -> String {
        self.key_pair.public_key_base64()
    }
}

impl std::fmt::Debug for PrincipalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalKey")
            .field("id", &self.id())
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
