//! First-start initialisation of the local authority

use crate::AuthServer;
use gatehouse_core::auth::EncryptionKey;
use gatehouse_core::*;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lock serializing initialisation between authority servers sharing a backend
pub const INIT_LOCK: &str = "authority-init";

const INIT_LOCK_TTL: Duration = Duration::from_secs(30);

impl AuthServer {
    /// Create the host and user CAs of the local domain and the local sign key
    /// if they are missing. Safe to run on every start.
    pub fn init_authority(&self) -> Result<()> {
        self.services
            .locks
            .acquire_lock(INIT_LOCK, INIT_LOCK_TTL)
            .context("failed to acquire init lock")?;

        let result = self.init_locked();

        if let Err(e) = self.services.locks.release_lock(INIT_LOCK) {
            warn!("failed to release init lock: {}", e);
        }
        result
    }

    fn init_locked(&self) -> Result<()> {
        for kind in [CertAuthType::Host, CertAuthType::User] {
            let id = CertAuthId::new(kind, &self.hostname);
            match self.services.ca.get_cert_authority(&id, false) {
                Ok(_) => debug!("{} already exists", id),
                Err(e) if e.is_not_found() => {
                    let (private_key, public_key) = self
                        .authority
                        .generate_key_pair("")
                        .with_context(|| format!("failed to generate key pair for {}", id))?;
                    let ca = CertAuthority::new(id.clone()).with_key_pair(private_key, public_key);
                    self.services
                        .ca
                        .upsert_cert_authority(ca)
                        .with_context(|| format!("failed to store {}", id))?;
                    info!("created {}", id);
                }
                Err(e) => return Err(e).with_context(|| format!("failed to load {}", id)),
            }
        }

        match self.services.keys.get_sign_key() {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                self.services
                    .keys
                    .set_sign_key(EncryptionKey::generate(self.hostname.as_str()))
                    .context("failed to store sign key")?;
                info!("created sign key for {}", self.hostname);
                Ok(())
            }
            Err(e) => Err(e).context("failed to load sign key"),
        }
    }
}
