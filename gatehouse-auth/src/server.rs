//! The authority server facade

use crate::AuthServerConfig;
use gatehouse_core::auth::Authority;
use gatehouse_core::services::Services;
use gatehouse_core::Clock;
use std::sync::Arc;
use tracing::warn;

/// Composes the signing backend and the directory services behind the public
/// operations of the cluster authority. Holds no state of its own besides the
/// trust domain and the clock; safe to share between threads.
pub struct AuthServer {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) hostname: String,
    pub(crate) authority: Arc<dyn Authority>,
    pub(crate) services: Services,
}

impl AuthServer {
    /// Authority for the trust domain `hostname`. Sessions are stamped with
    /// the clock of `services` unless `config` supplies one; an override that
    /// is not that same clock makes session expiry drift from the store's.
    pub fn new(
        services: Services,
        authority: Arc<dyn Authority>,
        hostname: impl Into<String>,
        config: AuthServerConfig,
    ) -> Self {
        let clock = match config.clock {
            Some(clock) => {
                if !Arc::ptr_eq(&clock, &services.clock) {
                    warn!("session clock differs from the directory services clock");
                }
                clock
            }
            None => services.clock.clone(),
        };

        AuthServer {
            clock,
            hostname: hostname.into(),
            authority,
            services,
        }
    }

    /// Trust domain this server issues certificates for
    pub fn get_local_domain(&self) -> &str {
        &self.hostname
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn authority(&self) -> &dyn Authority {
        self.authority.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
