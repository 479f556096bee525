//! Integration tests for join token claims under contention

use gatehouse_core::services::ProvisioningService;
use gatehouse_core::*;
use gatehouse_engine::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const RACERS: usize = 8;

fn race<F>(store: Arc<ProvisioningStore>, op: F) -> Vec<Result<()>>
where
    F: Fn(&ProvisioningStore) -> Result<()> + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let store = store.clone();
            let barrier = barrier.clone();
            let op = op.clone();
            thread::spawn(move || {
                barrier.wait();
                op(&store)
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn concurrent_claims_have_one_winner() {
    let (engine, _temp) = StorageEngine::temp().unwrap();
    let store = Arc::new(ProvisioningStore::new(&engine).unwrap());
    store.upsert_token("feedface", "db1", Role::Node, Duration::from_secs(300)).unwrap();

    let results = race(store.clone(), |s| s.claim_token("feedface").map(|_| ()));

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.into_iter().filter_map(|r| r.err()) {
        assert!(matches!(err, GatehouseError::AlreadyExists(_)));
    }
}

#[test]
fn concurrent_deletes_have_one_winner() {
    let (engine, _temp) = StorageEngine::temp().unwrap();
    let store = Arc::new(ProvisioningStore::new(&engine).unwrap());
    store.upsert_token("feedface", "db1", Role::Node, Duration::ZERO).unwrap();

    let results = race(store.clone(), |s| s.delete_token("feedface"));

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| e.is_not_found()));
    assert!(store.get_token("feedface").unwrap_err().is_not_found());
}

#[test]
fn released_token_can_be_claimed_again() {
    let (engine, _temp) = StorageEngine::temp().unwrap();
    let store = ProvisioningStore::new(&engine).unwrap();
    store.upsert_token("feedface", "db1", Role::Proxy, Duration::ZERO).unwrap();

    let claim = store.claim_token("feedface").unwrap();
    assert_eq!(claim.token.role, Role::Proxy);
    store.release_token("feedface", &claim.id).unwrap();
    store.claim_token("feedface").unwrap();

    store.delete_token("feedface").unwrap();
    assert!(store.claim_token("feedface").unwrap_err().is_not_found());
}
