//! User directory with Argon2 password hashes

use crate::{StorageEngine, Table};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use gatehouse_core::services::UserService;
use gatehouse_core::*;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct StoredUser {
    user: User,
    password_hash: Option<String>,
}

pub struct UserStore {
    table: Table,
}

impl UserStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(UserStore {
            table: engine.table("users")?,
        })
    }

    fn key(name: &str) -> String {
        format!("user/{}", name)
    }

    fn load(&self, name: &str) -> Result<StoredUser> {
        self.table
            .get(&Self::key(name))?
            .ok_or_else(|| GatehouseError::NotFound(format!("user '{}' not found", name)))
    }
}

fn hash_password(password: &[u8]) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|e| GatehouseError::Internal(format!("failed to generate salt: {}", e)))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| GatehouseError::Crypto(format!("salt encoding error: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password, &salt)
        .map_err(|e| GatehouseError::Crypto(format!("argon2 hash error: {}", e)))?;
    Ok(hash.to_string())
}

impl UserService for UserStore {
    fn upsert_user(&self, user: User) -> Result<()> {
        if user.name.is_empty() || user.name.contains('/') {
            return Err(GatehouseError::bad_parameter("name", format!("invalid user name '{}'", user.name)));
        }

        let password_hash = match self.table.get::<StoredUser>(&Self::key(&user.name))? {
            Some(existing) => existing.password_hash,
            None => None,
        };
        debug!("upserting user {}", user.name);
        self.table
            .put(&Self::key(&user.name), &StoredUser { user, password_hash }, Duration::ZERO)
    }

    fn get_user(&self, name: &str) -> Result<User> {
        Ok(self.load(name)?.user)
    }

    fn get_users(&self) -> Result<Vec<User>> {
        let users = self
            .table
            .scan::<StoredUser>("user/")?
            .into_iter()
            .map(|(_, stored)| stored.user)
            .collect();
        Ok(users)
    }

    fn delete_user(&self, name: &str) -> Result<()> {
        if !self.table.remove(&Self::key(name))? {
            return Err(GatehouseError::NotFound(format!("user '{}' not found", name)));
        }
        Ok(())
    }

    fn upsert_password(&self, name: &str, password: &[u8]) -> Result<()> {
        if password.is_empty() {
            return Err(GatehouseError::bad_parameter("password", "empty password"));
        }
        let mut stored = self.load(name)?;
        stored.password_hash = Some(hash_password(password)?);
        self.table.put(&Self::key(name), &stored, Duration::ZERO)
    }

    fn check_password(&self, name: &str, password: &[u8]) -> Result<()> {
        let denied = || GatehouseError::Unauthorized("invalid user name or password".to_string());

        let stored = match self.load(name) {
            Ok(stored) => stored,
            Err(e) if e.is_not_found() => return Err(denied()),
            Err(e) => return Err(e),
        };
        let hash = stored.password_hash.ok_or_else(denied)?;
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| GatehouseError::Crypto(format!("hash parse error: {}", e)))?;

        Argon2::default()
            .verify_password(password, &parsed)
            .map_err(|_| denied())
    }
}
