//! Join tokens and the random source behind them

use crate::{GatehouseError, Result, Role};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Length in bytes of the random part of a join token
pub const TOKEN_LEN_BYTES: usize = 16;

/// Generate `len` cryptographically random bytes, hex encoded
pub fn crypto_random_hex(len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| GatehouseError::Internal(format!("failed to read random bytes: {}", e)))?;
    Ok(hex::encode(bytes))
}

/// Raw token plus the role it was issued for. Its string form, `<hex>.<Role>`,
/// is what gets handed to the joining party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinToken {
    pub token: String,
    pub role: Role,
}

impl JoinToken {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        JoinToken {
            token: token.into(),
            role,
        }
    }

    /// Fresh random token for `role`
    pub fn generate(role: Role) -> Result<Self> {
        Ok(JoinToken::new(crypto_random_hex(TOKEN_LEN_BYTES)?, role))
    }

    /// Decode an output token back into the raw token and role
    pub fn parse(output: &str) -> Result<Self> {
        let (token, role) = output
            .split_once('.')
            .ok_or_else(|| GatehouseError::bad_parameter("token", "missing role tag"))?;

        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GatehouseError::bad_parameter("token", "malformed token"));
        }

        Ok(JoinToken {
            token: token.to_string(),
            role: role.parse()?,
        })
    }
}

impl std::fmt::Display for JoinToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.token, self.role)
    }
}

/// Server-side record of an issued join token, keyed by the raw token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionToken {
    pub token: String,
    /// Name the token was issued for. Redemption compares it against the
    /// joining node's name.
    pub domain_name: String,
    pub role: Role,
    pub expires: Option<DateTime<Utc>>,
}

impl ProvisionToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(false, |expires| expires <= now)
    }
}

/// A redeemer's hold on a token. Only the holder of `id` may release it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaim {
    pub id: String,
    pub token: ProvisionToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hex_length() {
        let a = crypto_random_hex(TOKEN_LEN_BYTES).unwrap();
        let b = crypto_random_hex(TOKEN_LEN_BYTES).unwrap();
        assert_eq!(a.len(), TOKEN_LEN_BYTES * 2);
        assert_ne!(a, b);
        assert_eq!(crypto_random_hex(32).unwrap().len(), 64);
    }

    #[test]
    fn test_join_token_format() {
        let token = JoinToken::new("00ff", Role::Node);
        assert_eq!(token.to_string(), "00ff.Node");
        assert_eq!(JoinToken::parse("00ff.Node").unwrap(), token);

        let generated = JoinToken::generate(Role::Auth).unwrap();
        assert_eq!(JoinToken::parse(&generated.to_string()).unwrap(), generated);
    }

    #[test]
    fn test_join_token_rejects_garbage() {
        assert!(JoinToken::parse("").is_err());
        assert!(JoinToken::parse("abcdef").is_err());
        assert!(JoinToken::parse(".Node").is_err());
        assert!(JoinToken::parse("xyz.Node").is_err());
        assert!(matches!(
            JoinToken::parse("abcd.Pilot").unwrap_err(),
            GatehouseError::Validation(_)
        ));
    }

    #[test]
    fn test_provision_token_expiry() {
        let now = Utc::now();
        let mut record = ProvisionToken {
            token: "ab".to_string(),
            domain_name: "db1".to_string(),
            role: Role::Node,
            expires: None,
        };
        assert!(!record.is_expired(now));

        record.expires = Some(now);
        assert!(record.is_expired(now));
        assert!(!record.is_expired(now - chrono::Duration::seconds(1)));
    }
}
