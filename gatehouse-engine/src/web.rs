//! Web session store

use crate::{StorageEngine, Table};
use gatehouse_core::services::WebService;
use gatehouse_core::*;
use std::time::Duration;

pub struct WebStore {
    table: Table,
}

impl WebStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(WebStore {
            table: engine.table("web_sessions")?,
        })
    }

    fn prefix(user: &str) -> Result<String> {
        if user.is_empty() || user.contains('/') {
            return Err(GatehouseError::bad_parameter("user", format!("invalid user name '{}'", user)));
        }
        Ok(format!("{}/", user))
    }

    fn key(user: &str, id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(GatehouseError::bad_parameter("id", "missing session id"));
        }
        Ok(format!("{}{}", Self::prefix(user)?, id))
    }
}

impl WebService for WebStore {
    fn upsert_web_session(&self, user: &str, id: &str, session: WebSession, ttl: Duration) -> Result<()> {
        self.table.put(&Self::key(user, id)?, &session, ttl)
    }

    fn get_web_session(&self, user: &str, id: &str) -> Result<WebSession> {
        self.table
            .get(&Self::key(user, id)?)?
            .ok_or_else(|| GatehouseError::NotFound(format!("web session for user '{}' not found", user)))
    }

    fn get_web_sessions(&self, user: &str) -> Result<Vec<(String, WebSession)>> {
        let prefix = Self::prefix(user)?;
        let sessions = self
            .table
            .scan::<WebSession>(&prefix)?
            .into_iter()
            .map(|(key, session)| (key[prefix.len()..].to_string(), session))
            .collect();
        Ok(sessions)
    }

    fn delete_web_session(&self, user: &str, id: &str) -> Result<()> {
        if !self.table.remove(&Self::key(user, id)?)? {
            return Err(GatehouseError::NotFound(format!("web session for user '{}' not found", user)));
        }
        Ok(())
    }
}
