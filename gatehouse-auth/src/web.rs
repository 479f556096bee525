//! Web session manager

use crate::AuthServer;
use gatehouse_core::*;
use std::time::Duration;
use tracing::info;

impl AuthServer {
    /// Check the user's password and open a new session
    pub fn sign_in(&self, user: &str, password: &[u8]) -> Result<Session> {
        self.services
            .users
            .check_password(user, password)
            .with_context(|| format!("sign in failed for {}", user))?;

        let session = self.new_web_session(user)?;
        self.upsert_web_session(user, &session, WEB_SESSION_TTL)?;

        info!(user = user, "user signed in");
        Ok(session.redacted())
    }

    /// Renew a session. The previous session only has to exist.
    pub fn create_web_session(&self, user: &str, prev_session_id: &str) -> Result<Session> {
        self.get_web_session(user, prev_session_id)?;

        let session = self.new_web_session(user)?;
        self.upsert_web_session(user, &session, WEB_SESSION_TTL)?;

        info!(user = user, "web session renewed");
        Ok(session.redacted())
    }

    /// Build a session for `user_name` with a fresh key pair and a user
    /// certificate valid for [`WEB_SESSION_TTL`]. Nothing is persisted and the
    /// private key is left in place.
    pub fn new_web_session(&self, user_name: &str) -> Result<Session> {
        let id = crypto_random_hex(WEB_SESSION_TOKEN_LEN_BYTES)?;
        let bearer_token = crypto_random_hex(WEB_SESSION_TOKEN_LEN_BYTES)?;

        let (priv_key, public_key) = self
            .authority
            .new_key_pair_from_pool()
            .context("failed to generate session key pair")?;
        let pub_cert = self.generate_user_cert(&public_key, user_name, WEB_SESSION_TTL)?;

        let user = self
            .services
            .users
            .get_user(user_name)
            .with_context(|| format!("failed to load user {}", user_name))?;

        let now = self.clock.now();
        let expires = expiry_after(now, WEB_SESSION_TTL)?.unwrap_or(now);

        Ok(Session {
            id,
            user,
            ws: WebSession {
                priv_key,
                pub_cert,
                expires,
                bearer_token,
            },
        })
    }

    pub fn upsert_web_session(&self, user: &str, session: &Session, ttl: Duration) -> Result<()> {
        self.services
            .web
            .upsert_web_session(user, &session.id, session.ws.clone(), ttl)
            .with_context(|| format!("failed to store web session for {}", user))
    }

    /// Full session including the private key, for internal callers
    pub fn get_web_session(&self, user_name: &str, id: &str) -> Result<Session> {
        let ws = self
            .services
            .web
            .get_web_session(user_name, id)
            .with_context(|| format!("failed to load web session for {}", user_name))?;
        let user = self
            .services
            .users
            .get_user(user_name)
            .with_context(|| format!("failed to load user {}", user_name))?;

        Ok(Session {
            id: id.to_string(),
            user,
            ws,
        })
    }

    /// Session with the private key removed, safe to hand to anyone
    pub fn get_web_session_info(&self, user_name: &str, id: &str) -> Result<Session> {
        Ok(self.get_web_session(user_name, id)?.redacted())
    }

    pub fn delete_web_session(&self, user: &str, id: &str) -> Result<()> {
        self.services
            .web
            .delete_web_session(user, id)
            .with_context(|| format!("failed to delete web session for {}", user))
    }
}
