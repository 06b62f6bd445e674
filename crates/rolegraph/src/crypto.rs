//! Ed25519 key material and signatures for ledger transactions.
//!
//! Signatures travel base64-encoded inside transactions; verifying keys
//! travel base64-encoded next to the issuer id they must hash to.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use zeroize::Zeroizing;

use crate::error::{Result, RoleGraphError};

/// An Ed25519 key pair. `SigningKey` wipes its secret on drop.
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a fresh random key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuild a key pair from raw signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Raw signing key bytes, wiped when the returned buffer drops.
    pub fn signing_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Sign `message` and return the signature as base64.
    pub fn sign_to_base64(&self, message: &[u8]) -> String {
        STANDARD.encode(self.signing_key.sign(message).to_bytes())
    }

    /// The verifying key as base64.
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.verifying_key.to_bytes())
    }
}

/// Decode a base64 verifying key.
pub fn verifying_key_from_base64(key_b64: &str) -> Result<VerifyingKey> {
    let bytes = STANDARD
        .decode(key_b64)
        .map_err(|e| RoleGraphError::InvalidKey(format!("invalid base64 key: {e}")))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| RoleGraphError::InvalidKey("verifying key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| RoleGraphError::InvalidKey(format!("invalid verifying key: {e}")))
}

/// Verify a base64 signature over `message`.
pub fn verify_base64(key: &VerifyingKey, message: &[u8], signature_b64: &str) -> Result<()> {
    let sig_bytes = STANDARD
        .decode(signature_b64)
        .map_err(|e| RoleGraphError::InvalidKey(format!("invalid base64 signature: {e}")))?;
    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| RoleGraphError::InvalidKey("signature must be 64 bytes".into()))?;
    key.verify(message, &Signature::from_bytes(&sig_array))
        .map_err(|_| RoleGraphError::SignatureInvalid)
}
