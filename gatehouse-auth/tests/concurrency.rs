//! Racing redemptions of a single token

mod common;

use common::Fixture;
use gatehouse_core::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const JOINERS: usize = 8;

#[test]
fn concurrent_redemption_has_one_winner() {
    let f = Fixture::new();
    let token = f.server.generate_token("db1", Role::Node, Duration::from_secs(300)).unwrap();
    let barrier = Arc::new(Barrier::new(JOINERS));

    let handles: Vec<_> = (0..JOINERS)
        .map(|_| {
            let server = f.server.clone();
            let barrier = barrier.clone();
            let token = token.clone();
            thread::spawn(move || {
                barrier.wait();
                server.register_using_token(&token, "db1", Role::Node)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    for err in results.into_iter().filter_map(|r| r.err()) {
        assert!(matches!(err.class(), ErrorClass::NotFound | ErrorClass::NotAuthorized));
    }
    assert!(f.server.validate_token(&token, "db1").unwrap_err().is_not_found());
    assert_eq!(f.authority.sign_calls(), 1);
}

#[test]
fn concurrent_peer_registration_has_one_winner() {
    let f = Fixture::new();
    let token = f.server.generate_token("auth2", Role::Auth, Duration::ZERO).unwrap();
    let barrier = Arc::new(Barrier::new(JOINERS));

    let handles: Vec<_> = (0..JOINERS)
        .map(|_| {
            let server = f.server.clone();
            let barrier = barrier.clone();
            let token = token.clone();
            thread::spawn(move || {
                barrier.wait();
                server.register_new_auth_server("auth2", &token, gatehouse_core::auth::EncryptionKey::generate("auth2"))
            })
        })
        .collect();

    let wins = handles.into_iter().filter_map(|h| h.join().unwrap().ok()).count();
    assert_eq!(wins, 1);
    assert_eq!(f.server.services().keys.get_seal_keys().unwrap().len(), 1);
}
