//! Web sessions

use crate::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Standard web session time to live
pub const WEB_SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// Length in bytes of the random session ID and bearer token
pub const WEB_SESSION_TOKEN_LEN_BYTES: usize = 32;

/// Key material backing a web session
#[derive(Clone, Serialize, Deserialize)]
pub struct WebSession {
    /// Private key of the session key pair; empty once redacted
    #[serde(default)]
    pub priv_key: Vec<u8>,
    /// User certificate signed for the session public key
    pub pub_cert: Vec<u8>,
    pub expires: DateTime<Utc>,
    pub bearer_token: String,
}

impl WebSession {
    /// Constant-time check of a presented bearer token
    pub fn check_bearer_token(&self, presented: &str) -> bool {
        let expected = self.bearer_token.as_bytes();
        let presented = presented.as_bytes();
        expected.len() == presented.len() && bool::from(expected.ct_eq(presented))
    }
}

impl std::fmt::Debug for WebSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSession")
            .field("has_priv_key", &!self.priv_key.is_empty())
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

/// Session as returned by the authority: ID, user snapshot and key material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user: User,
    pub ws: WebSession,
}

impl Session {
    /// Drop the private key. Every session handed to anyone other than its
    /// creator goes through here.
    pub fn redacted(mut self) -> Self {
        self.ws.priv_key = Vec::new();
        self
    }
}
