//! Directory service interfaces
//!
//! The authority server keeps no state of its own. Everything lives behind
//! these traits; implementations own their consistency and must be safe to
//! call from many threads at once.

use crate::{
    auth::{SealKey, SignKey},
    CertAuthId, CertAuthType, CertAuthority, ProvisionToken, Result, Role, Server, TokenClaim,
    User, WebSession,
};
use crate::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Certificate authority records
pub trait CaService: Send + Sync {
    fn upsert_cert_authority(&self, ca: CertAuthority) -> Result<()>;

    /// Fetch a CA; without `load_signing_keys` the private keys are stripped
    fn get_cert_authority(&self, id: &CertAuthId, load_signing_keys: bool) -> Result<CertAuthority>;

    fn get_cert_authorities(&self, kind: CertAuthType, load_signing_keys: bool) -> Result<Vec<CertAuthority>>;

    fn delete_cert_authority(&self, id: &CertAuthId) -> Result<()>;
}

/// Join token records, keyed by the raw token
pub trait ProvisioningService: Send + Sync {
    /// Store a token; a zero `ttl` never expires
    fn upsert_token(&self, token: &str, domain_name: &str, role: Role, ttl: Duration) -> Result<()>;

    /// Fetch a live token. Expired tokens are reported as not found.
    fn get_token(&self, token: &str) -> Result<ProvisionToken>;

    fn get_tokens(&self) -> Result<Vec<ProvisionToken>>;

    /// Atomically mark a live token as being redeemed. Fails if the token is
    /// missing, expired, or already claimed by someone else.
    fn claim_token(&self, token: &str) -> Result<TokenClaim>;

    /// Give up the claim `claim_id` so the token can be redeemed again. A
    /// claim that has since been taken over by another redeemer is left alone.
    fn release_token(&self, token: &str, claim_id: &str) -> Result<()>;

    /// Delete the token if present. Exactly one of several concurrent deletes
    /// succeeds; the rest see not found.
    fn delete_token(&self, token: &str) -> Result<()>;
}

/// Web sessions keyed by (user, session ID)
pub trait WebService: Send + Sync {
    fn upsert_web_session(&self, user: &str, id: &str, session: WebSession, ttl: Duration) -> Result<()>;

    fn get_web_session(&self, user: &str, id: &str) -> Result<WebSession>;

    fn get_web_sessions(&self, user: &str) -> Result<Vec<(String, WebSession)>>;

    fn delete_web_session(&self, user: &str, id: &str) -> Result<()>;
}

/// User directory and credentials
pub trait UserService: Send + Sync {
    fn upsert_user(&self, user: User) -> Result<()>;

    fn get_user(&self, name: &str) -> Result<User>;

    fn get_users(&self) -> Result<Vec<User>>;

    fn delete_user(&self, name: &str) -> Result<()>;

    /// Hash and store a password for an existing user
    fn upsert_password(&self, name: &str, password: &[u8]) -> Result<()>;

    /// Fails with `Unauthorized` unless `password` matches the stored hash
    fn check_password(&self, name: &str, password: &[u8]) -> Result<()>;
}

/// Local key-management state: peer seal keys and this server's sign key
pub trait KeyService: Send + Sync {
    /// Store a peer's public seal key
    fn add_seal_key(&self, key: SealKey) -> Result<()>;

    fn get_seal_keys(&self) -> Result<Vec<SealKey>>;

    fn set_sign_key(&self, key: SignKey) -> Result<()>;

    fn get_sign_key(&self) -> Result<SignKey>;
}

/// Named, TTL-bound locks
pub trait LockService: Send + Sync {
    /// Take the lock or fail with `AlreadyExists` while someone else holds it
    fn acquire_lock(&self, name: &str, ttl: Duration) -> Result<()>;

    fn release_lock(&self, name: &str) -> Result<()>;
}

/// Heartbeats of nodes and authority servers
pub trait PresenceService: Send + Sync {
    fn upsert_node(&self, server: Server, ttl: Duration) -> Result<()>;

    fn get_nodes(&self) -> Result<Vec<Server>>;

    fn upsert_auth_server(&self, server: Server, ttl: Duration) -> Result<()>;

    fn get_auth_servers(&self) -> Result<Vec<Server>>;
}

/// Every directory service the authority server talks to, plus the clock
/// they expire entries by
#[derive(Clone)]
pub struct Services {
    pub clock: Arc<dyn Clock>,
    pub ca: Arc<dyn CaService>,
    pub locks: Arc<dyn LockService>,
    pub presence: Arc<dyn PresenceService>,
    pub provisioning: Arc<dyn ProvisioningService>,
    pub web: Arc<dyn WebService>,
    pub users: Arc<dyn UserService>,
    pub keys: Arc<dyn KeyService>,
}
