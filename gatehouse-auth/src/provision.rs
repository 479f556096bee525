//! Join-token protocol: issue, validate and redeem one-shot admission tokens

use crate::AuthServer;
use gatehouse_core::*;
use std::time::Duration;
use tracing::{debug, info, warn};

impl AuthServer {
    /// Issue a token admitting `node_name` with `role`. Returns the output
    /// token to hand to the joining party.
    pub fn generate_token(&self, node_name: &str, role: Role, ttl: Duration) -> Result<String> {
        if !is_valid_domain_name(node_name) {
            return Err(GatehouseError::bad_parameter(
                "node_name",
                format!("'{}' is not a valid domain name", node_name),
            ));
        }

        let token = JoinToken::generate(role)?;
        self.services
            .provisioning
            .upsert_token(&token.token, node_name, role, ttl)
            .with_context(|| format!("failed to store {} token for {}", role, node_name))?;

        debug!(node = node_name, %role, "issued join token");
        Ok(token.to_string())
    }

    /// Check a token against `domain_name` without consuming it and return the
    /// role it was issued for
    pub fn validate_token(&self, output_token: &str, domain_name: &str) -> Result<Role> {
        let record = self.load_token(output_token)?;
        if record.domain_name != domain_name {
            return Err(GatehouseError::Unauthorized(format!(
                "token is not valid for '{}'",
                domain_name
            )));
        }
        Ok(record.role)
    }

    /// Redeem a token for a fresh key pair and a host certificate for
    /// `<node_name>.<local domain>`. The token is consumed only once the
    /// certificate has been issued; any earlier failure leaves it redeemable.
    pub fn register_using_token(&self, output_token: &str, node_name: &str, role: Role) -> Result<PackedKeys> {
        info!(node = node_name, %role, "node is joining the cluster");

        let join = JoinToken::parse(output_token)?;
        let record = self
            .load_token(output_token)
            .inspect_err(|e| warn!(node = node_name, "join rejected: {}", e))?;

        if record.domain_name != node_name {
            warn!(node = node_name, "join rejected: token issued for another node");
            return Err(GatehouseError::mismatch(
                "node_name",
                format!("token was not issued for '{}'", node_name),
            ));
        }
        if record.role != role {
            warn!(node = node_name, %role, "join rejected: role does not match token");
            return Err(GatehouseError::mismatch(
                "role",
                format!("token was issued for role {}, not {}", record.role, role),
            ));
        }

        let claim = self
            .services
            .provisioning
            .claim_token(&join.token)
            .context("failed to claim token")
            .inspect_err(|e| warn!(node = node_name, "join rejected: {}", e))?;

        let keys = match self.issue_node_keys(node_name, role) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(node = node_name, "failed to issue node certificate: {}", e);
                if let Err(release) = self.services.provisioning.release_token(&join.token, &claim.id) {
                    warn!(node = node_name, "failed to release token claim: {}", release);
                }
                return Err(e);
            }
        };

        self.services
            .provisioning
            .delete_token(&join.token)
            .context("failed to consume token")?;

        info!(node = node_name, %role, "node joined the cluster");
        Ok(keys)
    }

    /// Remove a token so it can no longer be redeemed
    pub fn delete_token(&self, output_token: &str) -> Result<()> {
        let join = JoinToken::parse(output_token)?;
        self.services
            .provisioning
            .delete_token(&join.token)
            .context("failed to delete token")
    }

    /// Every outstanding token
    pub fn get_tokens(&self) -> Result<Vec<ProvisionToken>> {
        self.services
            .provisioning
            .get_tokens()
            .context("failed to list tokens")
    }

    pub(crate) fn load_token(&self, output_token: &str) -> Result<ProvisionToken> {
        let join = JoinToken::parse(output_token)?;
        self.services
            .provisioning
            .get_token(&join.token)
            .context("failed to fetch token")
    }

    fn issue_node_keys(&self, node_name: &str, role: Role) -> Result<PackedKeys> {
        let (key, public_key) = self
            .authority
            .generate_key_pair("")
            .context("failed to generate node key pair")?;

        let fqdn = format!("{}.{}", node_name, self.hostname);
        let cert = self.generate_host_cert(&public_key, &fqdn, &self.hostname, role, Duration::ZERO)?;

        Ok(PackedKeys { key, cert })
    }
}
