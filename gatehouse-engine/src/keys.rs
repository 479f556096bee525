//! Local key-management store: peer seal keys and the local sign key

use crate::{StorageEngine, Table};
use gatehouse_core::auth::{SealKey, SignKey};
use gatehouse_core::services::KeyService;
use gatehouse_core::*;
use std::time::Duration;
use tracing::info;

const SIGN_KEY: &str = "sign";

pub struct KeyStore {
    table: Table,
}

impl KeyStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(KeyStore {
            table: engine.table("keys")?,
        })
    }
}

impl KeyService for KeyStore {
    fn add_seal_key(&self, key: SealKey) -> Result<()> {
        // only the public half of a peer's key is ever kept
        let key = key.public();
        info!(id = %key.id, name = %key.name, "adding seal key");
        self.table.put(&format!("seal/{}", key.id), &key, Duration::ZERO)
    }

    fn get_seal_keys(&self) -> Result<Vec<SealKey>> {
        Ok(self
            .table
            .scan::<SealKey>("seal/")?
            .into_iter()
            .map(|(_, key)| key)
            .collect())
    }

    fn set_sign_key(&self, key: SignKey) -> Result<()> {
        if key.is_public() {
            return Err(GatehouseError::bad_parameter("sign_key", "sign key has no private half"));
        }
        self.table.put(SIGN_KEY, &key, Duration::ZERO)
    }

    fn get_sign_key(&self) -> Result<SignKey> {
        self.table
            .get(SIGN_KEY)?
            .ok_or_else(|| GatehouseError::NotFound("sign key not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::auth::EncryptionKey;

    #[test]
    fn test_seal_keys_are_stored_public() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let store = KeyStore::new(&engine).unwrap();

        let peer = EncryptionKey::generate("auth2.cluster.example");
        store.add_seal_key(peer.clone()).unwrap();

        let keys = store.get_seal_keys().unwrap();
        assert_eq!(keys, vec![peer.public()]);
        assert!(keys[0].is_public());
    }

    #[test]
    fn test_sign_key() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let store = KeyStore::new(&engine).unwrap();
        assert!(store.get_sign_key().unwrap_err().is_not_found());

        let key = EncryptionKey::generate("auth.cluster.example");
        assert!(store.set_sign_key(key.public()).is_err());
        store.set_sign_key(key.clone()).unwrap();
        assert_eq!(store.get_sign_key().unwrap(), key);
    }
}
