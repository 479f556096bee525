//! Core data types for Gatehouse

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Capability tag carried by join tokens and host certificates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Peer authority server
    Auth,
    /// Regular cluster node
    Node,
    /// Proxy in front of the cluster
    Proxy,
    /// Web front end
    Web,
    /// Administrative tooling
    Admin,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Auth, Role::Node, Role::Proxy, Role::Web, Role::Admin];

    /// Tag used in output tokens and certificates
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Auth => "Auth",
            Role::Node => "Node",
            Role::Proxy => "Proxy",
            Role::Web => "Web",
            Role::Admin => "Admin",
        }
    }
}

impl FromStr for Role {
    type Err = crate::GatehouseError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| crate::GatehouseError::Validation(format!("'{}' is not a valid role", s)))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `name` is a DNS-style name: dot separated labels of ASCII
/// alphanumerics and inner hyphens.
pub fn is_valid_domain_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    name.split('.').all(|label| {
        let bytes = label.as_bytes();
        !bytes.is_empty()
            && bytes.len() <= 63
            && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
            && bytes[0] != b'-'
            && bytes[bytes.len() - 1] != b'-'
    })
}

/// Kind of certificate authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertAuthType {
    Host,
    User,
}

impl std::fmt::Display for CertAuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertAuthType::Host => write!(f, "host"),
            CertAuthType::User => write!(f, "user"),
        }
    }
}

/// Key of a certificate authority in the CA store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertAuthId {
    pub kind: CertAuthType,
    pub domain_name: String,
}

impl CertAuthId {
    pub fn new(kind: CertAuthType, domain_name: impl Into<String>) -> Self {
        CertAuthId {
            kind,
            domain_name: domain_name.into(),
        }
    }
}

impl std::fmt::Display for CertAuthId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} CA {}", self.kind, self.domain_name)
    }
}

/// Certificate authority: public checking keys plus ordered private signing keys.
/// The first signing key is the active one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertAuthority {
    pub id: CertAuthId,
    pub checking_keys: Vec<Vec<u8>>,
    pub signing_keys: Vec<Vec<u8>>,
}

impl CertAuthority {
    pub fn new(id: CertAuthId) -> Self {
        CertAuthority {
            id,
            checking_keys: Vec::new(),
            signing_keys: Vec::new(),
        }
    }

    /// Add a signing key together with its public half
    pub fn with_key_pair(mut self, private_key: Vec<u8>, public_key: Vec<u8>) -> Self {
        self.signing_keys.push(private_key);
        self.checking_keys.push(public_key);
        self
    }

    pub fn first_signing_key(&self) -> crate::Result<&[u8]> {
        self.signing_keys
            .first()
            .map(|key| key.as_slice())
            .ok_or_else(|| crate::GatehouseError::NotFound(format!("no signing key available for {}", self.id)))
    }

    /// Copy of this authority with private key material removed
    pub fn without_secrets(&self) -> Self {
        CertAuthority {
            id: self.id.clone(),
            checking_keys: self.checking_keys.clone(),
            signing_keys: Vec::new(),
        }
    }
}

/// Credentials handed to a freshly admitted node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedKeys {
    pub key: Vec<u8>,
    pub cert: Vec<u8>,
}

/// User record as seen by the authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub allowed_logins: Vec<String>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        User {
            name: name.into(),
            allowed_logins: Vec::new(),
        }
    }
}

/// Heartbeat entry in the presence store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub addr: String,
    pub hostname: String,
}

/// Time an entry stored now with `ttl` stops being visible. A zero TTL never expires.
pub fn expiry_after(now: DateTime<Utc>, ttl: std::time::Duration) -> crate::Result<Option<DateTime<Utc>>> {
    if ttl.is_zero() {
        return Ok(None);
    }
    let delta = chrono::Duration::from_std(ttl)
        .map_err(|e| crate::GatehouseError::bad_parameter("ttl", e.to_string()))?;
    Ok(Some(now + delta))
}
