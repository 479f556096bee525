//! Property tests for the join-token protocol

mod common;

use common::Fixture;
use gatehouse_core::*;
use proptest::prelude::*;
use std::time::Duration;

fn node_name() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9]([a-z0-9-]{0,10}[a-z0-9])?", 1..4).prop_map(|labels| labels.join("."))
}

fn role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn generate_then_validate_returns_role(name in node_name(), role in role()) {
        let f = Fixture::new();
        let token = f.server.generate_token(&name, role, Duration::from_secs(300)).unwrap();
        prop_assert_eq!(f.server.validate_token(&token, &name).unwrap(), role);
    }

    #[test]
    fn deleted_tokens_stay_invalid(name in node_name(), role in role()) {
        let f = Fixture::new();
        let token = f.server.generate_token(&name, role, Duration::ZERO).unwrap();
        f.server.delete_token(&token).unwrap();

        prop_assert!(f.server.validate_token(&token, &name).unwrap_err().is_not_found());
        prop_assert!(f.server.register_using_token(&token, &name, role).unwrap_err().is_not_found());
    }
}
