//! Ed25519 key management
//!
//! Key pairs used by certificate authorities and sessions, plus the seal/sign
//! keys authority servers exchange when they join each other.

use crate::{GatehouseError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ed25519 key pair for signing operations
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new Ed25519 key pair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        KeyPair {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuild a key pair from raw private key bytes
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| GatehouseError::Crypto(format!("invalid private key length {}", bytes.len())))?;
        let signing_key = SigningKey::from_bytes(&bytes);
        let verifying_key = signing_key.verifying_key();

        Ok(KeyPair {
            signing_key,
            verifying_key,
        })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Private key bytes (sensitive)
    pub fn private_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Private and public halves concatenated, the layout jwt-simple expects
    pub fn keypair_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    pub fn sign(&self, data: &[u8]) -> Signature {
        self.signing_key.sign(data)
    }

    pub fn key_id(&self) -> KeyId {
        KeyId::from_public_bytes(&self.public_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}

/// Verify `signature` over `data` with raw public key bytes
pub fn verify_signature(public_key: &[u8], data: &[u8], signature: &Signature) -> Result<()> {
    let bytes: [u8; 32] = public_key
        .try_into()
        .map_err(|_| GatehouseError::Crypto("invalid public key length".to_string()))?;
    let verifying_key = VerifyingKey::from_bytes(&bytes)
        .map_err(|e| GatehouseError::Crypto(format!("invalid public key: {}", e)))?;
    verifying_key
        .verify(data, signature)
        .map_err(|_| GatehouseError::Crypto("invalid signature".to_string()))
}

/// Unique identifier for a key: first 16 bytes of the BLAKE3 hash of the public key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(String);

impl KeyId {
    pub fn from_public_bytes(public_key: &[u8]) -> Self {
        let hash = blake3::hash(public_key);
        KeyId(hex::encode(&hash.as_bytes()[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seal or sign key of an authority server. Peers only ever receive the
/// public half.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionKey {
    pub id: KeyId,
    pub name: String,
    pub public: Vec<u8>,
    #[serde(default)]
    pub private: Vec<u8>,
}

impl EncryptionKey {
    pub fn generate(name: impl Into<String>) -> Self {
        let pair = KeyPair::generate();
        EncryptionKey {
            id: pair.key_id(),
            name: name.into(),
            public: pair.public_bytes().to_vec(),
            private: pair.private_bytes().to_vec(),
        }
    }

    /// Copy of this key without the private half
    pub fn public(&self) -> EncryptionKey {
        EncryptionKey {
            id: self.id.clone(),
            name: self.name.clone(),
            public: self.public.clone(),
            private: Vec::new(),
        }
    }

    pub fn is_public(&self) -> bool {
        self.private.is_empty()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_public", &self.is_public())
            .finish()
    }
}

/// Key an authority server seals its backend with
pub type SealKey = EncryptionKey;
/// Key an authority server signs with
pub type SignKey = EncryptionKey;
