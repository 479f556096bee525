//! Signing backend interface

use crate::{Result, Role};
use std::time::Duration;

/// Private and public key bytes
pub type KeyPairBytes = (Vec<u8>, Vec<u8>);

/// Minimal key-management facility: key pair generation and host/user
/// certificate signing. The authority server never looks inside the bytes.
pub trait Authority: Send + Sync {
    /// Generate a new key pair
    fn generate_key_pair(&self, passphrase: &str) -> Result<KeyPairBytes>;

    /// Key pair from a pre-generated pool, falling back to a fresh one
    fn new_key_pair_from_pool(&self) -> Result<KeyPairBytes> {
        self.generate_key_pair("")
    }

    /// Sign a host certificate for `public_key` with the host CA key
    /// `signing_key`. A zero `ttl` means the certificate does not expire.
    fn generate_host_cert(
        &self,
        signing_key: &[u8],
        public_key: &[u8],
        hostname: &str,
        auth_domain: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<Vec<u8>>;

    /// Sign a user certificate for `public_key` with the user CA key `signing_key`
    fn generate_user_cert(
        &self,
        signing_key: &[u8],
        public_key: &[u8],
        username: &str,
        ttl: Duration,
    ) -> Result<Vec<u8>>;
}
