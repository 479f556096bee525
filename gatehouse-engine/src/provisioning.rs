//! Join token store
//!
//! Claims and deletes run under the engine's exclusive guard, so of several
//! callers racing on one token exactly one wins.

use crate::{StorageEngine, Table};
use chrono::{DateTime, Utc};
use gatehouse_core::services::ProvisioningService;
use gatehouse_core::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How long a claim holds before another redeemer may take the token over
pub const TOKEN_CLAIM_LEASE: Duration = Duration::from_secs(60);

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: ProvisionToken,
    claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    claim_id: Option<String>,
}

pub struct ProvisioningStore {
    table: Table,
}

impl ProvisioningStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(ProvisioningStore {
            table: engine.table("tokens")?,
        })
    }

    fn key(token: &str) -> String {
        format!("token/{}", token)
    }

    fn load(&self, token: &str) -> Result<StoredToken> {
        self.table
            .get(&Self::key(token))?
            .ok_or_else(|| GatehouseError::NotFound("token not found or expired".to_string()))
    }

    fn store(&self, stored: &StoredToken) -> Result<()> {
        self.table
            .put_until(&Self::key(&stored.token.token), stored, stored.token.expires)
    }

    fn claim_is_live(&self, claimed_at: Option<DateTime<Utc>>) -> Result<bool> {
        let Some(claimed_at) = claimed_at else {
            return Ok(false);
        };
        let lease_end = expiry_after(claimed_at, TOKEN_CLAIM_LEASE)?;
        Ok(lease_end.map_or(true, |end| end > self.table.engine().clock().now()))
    }
}

impl ProvisioningService for ProvisioningStore {
    fn upsert_token(&self, token: &str, domain_name: &str, role: Role, ttl: Duration) -> Result<()> {
        let now = self.table.engine().clock().now();
        let stored = StoredToken {
            token: ProvisionToken {
                token: token.to_string(),
                domain_name: domain_name.to_string(),
                role,
                expires: expiry_after(now, ttl)?,
            },
            claimed_at: None,
            claim_id: None,
        };
        debug!("storing {} token for {}", role, domain_name);
        self.store(&stored)
    }

    fn get_token(&self, token: &str) -> Result<ProvisionToken> {
        Ok(self.load(token)?.token)
    }

    fn get_tokens(&self) -> Result<Vec<ProvisionToken>> {
        let tokens = self
            .table
            .scan::<StoredToken>("token/")?
            .into_iter()
            .map(|(_, stored)| stored.token)
            .collect();
        Ok(tokens)
    }

    fn claim_token(&self, token: &str) -> Result<TokenClaim> {
        let _guard = self.table.engine().exclusive()?;

        let mut stored = self.load(token)?;
        if self.claim_is_live(stored.claimed_at)? {
            return Err(GatehouseError::AlreadyExists("token is already being redeemed".to_string()));
        }

        let id = crypto_random_hex(TOKEN_LEN_BYTES)?;
        stored.claimed_at = Some(self.table.engine().clock().now());
        stored.claim_id = Some(id.clone());
        self.store(&stored)?;
        Ok(TokenClaim {
            id,
            token: stored.token,
        })
    }

    fn release_token(&self, token: &str, claim_id: &str) -> Result<()> {
        let _guard = self.table.engine().exclusive()?;

        let mut stored = self.load(token)?;
        if stored.claim_id.as_deref() != Some(claim_id) {
            debug!(
                "claim on {} token for {} was taken over, not releasing",
                stored.token.role, stored.token.domain_name
            );
            return Ok(());
        }
        stored.claimed_at = None;
        stored.claim_id = None;
        self.store(&stored)
    }

    fn delete_token(&self, token: &str) -> Result<()> {
        let _guard = self.table.engine().exclusive()?;

        if !self.table.remove(&Self::key(token))? {
            return Err(GatehouseError::NotFound("token not found or expired".to_string()));
        }
        Ok(())
    }
}
