//! Authority server configuration

use gatehouse_core::Clock;
use std::sync::Arc;

/// Settings for [`crate::AuthServer`]
#[derive(Clone, Default)]
pub struct AuthServerConfig {
    /// Time source for session expiry. Defaults to the clock of the
    /// directory services, so web session and TTL expiry agree.
    pub clock: Option<Arc<dyn Clock>>,
}

impl AuthServerConfig {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

impl std::fmt::Debug for AuthServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServerConfig")
            .field("now", &self.clock.as_ref().map(|c| c.now()))
            .finish()
    }
}
