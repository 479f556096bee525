//! Shared fixture for authority server tests
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use gatehouse_auth::{AuthServer, AuthServerConfig};
use gatehouse_core::auth::{Authority, KeyPairBytes, NativeAuthority};
use gatehouse_core::*;
use gatehouse_engine::StorageEngine;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const DOMAIN: &str = "cluster.example";

/// Signing backend that counts how often it is asked to sign
#[derive(Default)]
pub struct CountingAuthority {
    inner: NativeAuthority,
    signs: AtomicUsize,
}

impl CountingAuthority {
    pub fn sign_calls(&self) -> usize {
        self.signs.load(Ordering::SeqCst)
    }
}

impl Authority for CountingAuthority {
    fn generate_key_pair(&self, passphrase: &str) -> Result<KeyPairBytes> {
        self.inner.generate_key_pair(passphrase)
    }

    fn generate_host_cert(
        &self,
        signing_key: &[u8],
        public_key: &[u8],
        hostname: &str,
        auth_domain: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<Vec<u8>> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        self.inner
            .generate_host_cert(signing_key, public_key, hostname, auth_domain, role, ttl)
    }

    fn generate_user_cert(&self, signing_key: &[u8], public_key: &[u8], username: &str, ttl: Duration) -> Result<Vec<u8>> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_user_cert(signing_key, public_key, username, ttl)
    }
}

pub struct Fixture {
    pub server: Arc<AuthServer>,
    pub clock: Arc<FakeClock>,
    pub authority: Arc<CountingAuthority>,
    _temp: TempDir,
}

impl Fixture {
    /// Authority server with no CAs or keys yet
    pub fn empty() -> Self {
        let clock = Arc::new(FakeClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()));
        let (engine, temp) = StorageEngine::temp().unwrap();
        let services = engine.with_clock(clock.clone()).services().unwrap();

        let authority = Arc::new(CountingAuthority::default());
        let server = AuthServer::new(services, authority.clone(), DOMAIN, AuthServerConfig::default());

        Fixture {
            server: Arc::new(server),
            clock,
            authority,
            _temp: temp,
        }
    }

    /// Initialised authority server
    pub fn new() -> Self {
        let fixture = Self::empty();
        fixture.server.init_authority().unwrap();
        fixture
    }

    /// Public key of the local CA of `kind`
    pub fn ca_public_key(&self, kind: CertAuthType) -> Vec<u8> {
        let ca = self
            .server
            .services()
            .ca
            .get_cert_authority(&CertAuthId::new(kind, DOMAIN), false)
            .unwrap();
        ca.checking_keys[0].clone()
    }

    /// Add a user with a password
    pub fn add_user(&self, name: &str, password: &str) {
        let users = &self.server.services().users;
        users.upsert_user(User::new(name)).unwrap();
        users.upsert_password(name, password.as_bytes()).unwrap();
    }
}
