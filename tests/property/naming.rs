// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Deterministic Naming

use cim_provisioner::network::{Purpose, ResourceKind, ResourceName};
use proptest::prelude::*;

fn username() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,11}(-[a-z0-9]{1,6})?"
}

fn kind() -> impl Strategy<Value = ResourceKind> {
    prop_oneof![
        Just(ResourceKind::SecurityGroup),
        Just(ResourceKind::Router),
        Just(ResourceKind::Network),
        Just(ResourceKind::Subnet),
    ]
}

proptest! {
    /// A rendered name is always found again by its own lookup
    #[test]
    fn prop_rendered_name_matches_itself(user in username(), kind in kind()) {
        for purpose in [Purpose::Primary, Purpose::Mgmt] {
            let name = ResourceName::new(user.clone(), purpose, kind);
            prop_assert!(name.matches(&name.render()));
            prop_assert!(name.matches(&name.render().to_uppercase().replace('-', "_")));
        }
    }

    /// Mgmt and primary resources never satisfy each other's lookup
    #[test]
    fn prop_mgmt_and_primary_never_cross_match(user in username(), kind in kind()) {
        let primary = ResourceName::new(user.clone(), Purpose::Primary, kind);
        let mgmt = ResourceName::new(user, Purpose::Mgmt, kind);

        prop_assert!(!primary.matches(&mgmt.render()));
        prop_assert!(!mgmt.matches(&primary.render()));
    }

    /// Extra parts on either side break the match
    #[test]
    fn prop_affixed_names_do_not_match(
        user in username(),
        kind in kind(),
        affix in "[a-z]{1,5}",
    ) {
        let name = ResourceName::new(user, Purpose::Primary, kind);
        let rendered = name.render();

        let prefixed = format!("{}-{}", affix, rendered);
        let suffixed = format!("{}-{}", rendered, affix);
        prop_assert!(!name.matches(&prefixed));
        prop_assert!(!name.matches(&suffixed));
    }
}
