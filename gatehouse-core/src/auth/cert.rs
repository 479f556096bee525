//! Ed25519 signing backend
//!
//! Certificates are JWTs signed by the CA key with jwt-simple. The claims bind
//! the subject public key to a principal (host FQDN or user name), and for
//! host certificates to the issuing trust domain and the node role.

use crate::{
    auth::{Authority, KeyPair, KeyPairBytes},
    CertAuthType, GatehouseError, Result, Role,
};
use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

/// Claims carried by a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertClaims {
    pub cert_type: CertAuthType,
    /// Hex encoded subject public key
    pub public_key: String,
    /// Host FQDN or user name
    pub principal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Verified certificate
#[derive(Debug, Clone)]
pub struct Certificate {
    pub claims: CertClaims,
    /// Expiry in seconds since the epoch, `None` for certificates without one
    pub expires_at: Option<u64>,
}

impl Certificate {
    /// Check the signature of `cert` against the CA public key and return its claims
    pub fn verify(cert: &[u8], ca_public_key: &[u8]) -> Result<Self> {
        let token = std::str::from_utf8(cert)
            .map_err(|_| GatehouseError::Crypto("certificate is not valid UTF-8".to_string()))?;
        let public_key = Ed25519PublicKey::from_bytes(ca_public_key)
            .map_err(|e| GatehouseError::Crypto(format!("key conversion failed: {}", e)))?;

        let claims = public_key
            .verify_token::<CertClaims>(token, None)
            .map_err(|e| GatehouseError::Crypto(format!("verification failed: {}", e)))?;

        Ok(Certificate {
            expires_at: claims.expires_at.map(|d| d.as_secs()),
            claims: claims.custom,
        })
    }
}

/// `Authority` backed by Ed25519 keys, with an optional pool of pre-generated
/// key pairs for latency-sensitive callers such as web logins
#[derive(Debug, Default)]
pub struct NativeAuthority {
    pool: Mutex<Vec<KeyPairBytes>>,
}

impl NativeAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-generate `size` key pairs
    pub fn with_pool(size: usize) -> Self {
        let pool = (0..size).map(|_| Self::fresh_key_pair()).collect();
        NativeAuthority {
            pool: Mutex::new(pool),
        }
    }

    /// Number of key pairs left in the pool
    pub fn pool_len(&self) -> usize {
        self.pool.lock().map(|pool| pool.len()).unwrap_or(0)
    }

    fn fresh_key_pair() -> KeyPairBytes {
        let pair = KeyPair::generate();
        (pair.private_bytes().to_vec(), pair.public_bytes().to_vec())
    }

    fn sign(&self, signing_key: &[u8], claims: CertClaims, ttl: std::time::Duration) -> Result<Vec<u8>> {
        if claims.public_key.len() != 64 {
            return Err(GatehouseError::bad_parameter("public_key", "expected a 32 byte Ed25519 key"));
        }

        let ca = KeyPair::from_private_bytes(signing_key)?;
        let key_pair = Ed25519KeyPair::from_bytes(&ca.keypair_bytes())
            .map_err(|e| GatehouseError::Crypto(format!("key conversion failed: {}", e)))?;

        let subject = claims.principal.clone();
        let mut jwt_claims = Claims::with_custom_claims(claims, Duration::from_secs(ttl.as_secs()))
            .with_subject(subject)
            .with_issuer(ca.key_id().as_str());
        if ttl.is_zero() {
            jwt_claims.expires_at = None;
        }

        let token = key_pair
            .sign(jwt_claims)
            .map_err(|e| GatehouseError::Crypto(format!("signing failed: {}", e)))?;
        Ok(token.into_bytes())
    }
}

impl Authority for NativeAuthority {
    fn generate_key_pair(&self, passphrase: &str) -> Result<KeyPairBytes> {
        if !passphrase.is_empty() {
            return Err(GatehouseError::bad_parameter(
                "passphrase",
                "passphrase protected keys are not supported",
            ));
        }
        Ok(Self::fresh_key_pair())
    }

    fn new_key_pair_from_pool(&self) -> Result<KeyPairBytes> {
        let pooled = self
            .pool
            .lock()
            .map_err(|_| GatehouseError::Internal("key pool lock poisoned".to_string()))?
            .pop();
        match pooled {
            Some(pair) => Ok(pair),
            None => {
                debug!("key pool empty, generating key pair");
                self.generate_key_pair("")
            }
        }
    }

    fn generate_host_cert(
        &self,
        signing_key: &[u8],
        public_key: &[u8],
        hostname: &str,
        auth_domain: &str,
        role: Role,
        ttl: std::time::Duration,
    ) -> Result<Vec<u8>> {
        let claims = CertClaims {
            cert_type: CertAuthType::Host,
            public_key: hex::encode(public_key),
            principal: hostname.to_string(),
            auth_domain: Some(auth_domain.to_string()),
            role: Some(role),
        };
        self.sign(signing_key, claims, ttl)
    }

    fn generate_user_cert(
        &self,
        signing_key: &[u8],
        public_key: &[u8],
        username: &str,
        ttl: std::time::Duration,
    ) -> Result<Vec<u8>> {
        let claims = CertClaims {
            cert_type: CertAuthType::User,
            public_key: hex::encode(public_key),
            principal: username.to_string(),
            auth_domain: None,
            role: None,
        };
        self.sign(signing_key, claims, ttl)
    }
}
