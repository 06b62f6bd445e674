//! Signed registration transactions.
//!
//! A transaction names its issuer, carries the issuer's public key and is
//! signed over the SHA-256 of its canonical JSON signing input. The ledger
//! accepts it only if the key hashes to the issuer id and the signature
//! verifies.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto;
use crate::error::{Result, RoleGraphError};
use crate::expression::{Expression, Role, RoleName};
use crate::principal::{PrincipalId, PrincipalKey};

/// What a transaction asks the ledger to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Open `name` in the issuer's namespace.
    RegisterRole { name: RoleName },
    /// Add `role ← expression`. Weight is checked by the ledger.
    RegisterAssertion {
        role: Role,
        expression: Expression,
        weight: u8,
    },
}

impl Payload {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::RegisterRole { .. } => "register_role",
            Self::RegisterAssertion { .. } => "register_assertion",
        }
    }
}

/// A signed ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Claimed sender.
    pub issuer: PrincipalId,
    /// Sender's verifying key (base64).
    pub issuer_key: String,
    pub payload: Payload,
    /// Submission time (microseconds since epoch).
    pub submitted_at: u64,
    /// Hex SHA-256 of the signing input.
    pub payload_hash: String,
    /// Signature over `payload_hash` (base64).
    pub signature: String,
}

/// Fields covered by the hash, in a fixed order.
#[derive(Serialize)]
struct SigningInput<'a> {
    issuer: &'a PrincipalId,
    issuer_key: &'a str,
    payload: &'a Payload,
    submitted_at: u64,
}

fn payload_hash(
    issuer: &PrincipalId,
    issuer_key: &str,
    payload: &Payload,
    submitted_at: u64,
) -> Result<String> {
    let input = SigningInput {
        issuer,
        issuer_key,
        payload,
        submitted_at,
    };
    let json = serde_json::to_vec(&input)
        .map_err(|e| RoleGraphError::SerializationError(e.to_string()))?;
    Ok(hex::encode(Sha256::digest(&json)))
}

impl Transaction {
    /// Check sender authentication: key matches the issuer id, hash matches
    /// the content and the signature verifies.
    pub fn verify(&self) -> Result<()> {
        let key = crypto::verifying_key_from_base64(&self.issuer_key)?;
        if PrincipalId::from_verifying_key(&key) != self.issuer {
            return Err(RoleGraphError::InvalidTransaction(format!(
                "key does not belong to {}",
                self.issuer
            )));
        }

        let expected = payload_hash(
            &self.issuer,
            &self.issuer_key,
            &self.payload,
            self.submitted_at,
        )?;
        if expected != self.payload_hash {
            return Err(RoleGraphError::InvalidTransaction(
                "payload hash mismatch".into(),
            ));
        }

        crypto::verify_base64(&key, self.payload_hash.as_bytes(), &self.signature)
    }
}

/// Builder for signed transactions.
pub struct TransactionBuilder {
    payload: Payload,
}

impl TransactionBuilder {
    pub fn register_role(name: RoleName) -> Self {
        Self {
            payload: Payload::RegisterRole { name },
        }
    }

    pub fn register_assertion(role: Role, expression: Expression, weight: u8) -> Self {
        Self {
            payload: Payload::RegisterAssertion {
                role,
                expression,
                weight,
            },
        }
    }

    /// Sign and finalize the transaction.
    pub fn sign(self, key: &PrincipalKey) -> Result<Transaction> {
        let issuer = key.id();
        let issuer_key = key.public_key_base64();
        let submitted_at = crate::time::now_micros();

        let payload_hash = payload_hash(&issuer, &issuer_key, &self.payload, submitted_at)?;
        let signature = key.key_pair().sign_to_base64(payload_hash.as_bytes());

        Ok(Transaction {
            issuer,
            issuer_key,
            payload: self.payload,
            submitted_at,
            payload_hash,
            signature,
        })
    }
}
