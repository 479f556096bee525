//! Certificate authority facade: resolve the signing key of the local domain
//! and hand the actual signing to the backend

use crate::AuthServer;
use gatehouse_core::*;
use std::time::Duration;

impl AuthServer {
    /// Sign a host certificate with the local host CA
    pub fn generate_host_cert(
        &self,
        public_key: &[u8],
        hostname: &str,
        auth_domain: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<Vec<u8>> {
        let ca = self.local_ca(CertAuthType::Host)?;
        let signing_key = ca.first_signing_key()?;

        self.authority
            .generate_host_cert(signing_key, public_key, hostname, auth_domain, role, ttl)
            .with_context(|| format!("failed to sign host certificate for {}", hostname))
    }

    /// Sign a user certificate with the local user CA
    pub fn generate_user_cert(&self, public_key: &[u8], username: &str, ttl: Duration) -> Result<Vec<u8>> {
        let ca = self.local_ca(CertAuthType::User)?;
        let signing_key = ca.first_signing_key()?;

        self.authority
            .generate_user_cert(signing_key, public_key, username, ttl)
            .with_context(|| format!("failed to sign user certificate for {}", username))
    }

    fn local_ca(&self, kind: CertAuthType) -> Result<CertAuthority> {
        let id = CertAuthId::new(kind, &self.hostname);
        self.services
            .ca
            .get_cert_authority(&id, true)
            .with_context(|| format!("failed to load {}", id))
    }
}
