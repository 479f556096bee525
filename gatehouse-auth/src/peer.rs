//! Trust bootstrap between authority servers

use crate::AuthServer;
use gatehouse_core::auth::{SealKey, SignKey};
use gatehouse_core::*;
use tracing::{info, warn};

impl AuthServer {
    /// Redeem an `Auth` token issued for `domain_name`: store the peer's public
    /// seal key and return the public half of the local sign key. The token is
    /// only consumed once the key exchange has gone through.
    pub fn register_new_auth_server(&self, domain_name: &str, output_token: &str, seal_key: SealKey) -> Result<SignKey> {
        let join = JoinToken::parse(output_token)?;
        let record = self.load_token(output_token)?;

        if record.domain_name != domain_name || record.role != Role::Auth {
            warn!(domain = domain_name, role = %record.role, "auth server registration denied");
            return Err(GatehouseError::AccessDenied(format!(
                "token does not admit authority server '{}'",
                domain_name
            )));
        }

        let sign_key = self
            .services
            .keys
            .get_sign_key()
            .context("failed to load local sign key")?;

        let claim = self
            .services
            .provisioning
            .claim_token(&join.token)
            .context("failed to claim token")?;

        let stored = self
            .services
            .keys
            .add_seal_key(seal_key)
            .with_context(|| format!("failed to store seal key of {}", domain_name));
        if let Err(e) = stored {
            if let Err(release) = self.services.provisioning.release_token(&join.token, &claim.id) {
                warn!(domain = domain_name, "failed to release token claim: {}", release);
            }
            return Err(e);
        }

        self.services
            .provisioning
            .delete_token(&join.token)
            .context("failed to consume token")?;

        info!(domain = domain_name, "registered authority server");
        Ok(sign_key.public())
    }
}
