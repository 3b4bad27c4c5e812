// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Status Classification and Reconciliation

use cim_provisioner::domain::{Location, PowerState, VmState};
use cim_provisioner::state_machine::reconcile::{Action, Reconciliation};
use cim_provisioner::state_machine::StateMachine;
use proptest::prelude::*;

const KNOWN: [&str; 6] = ["running", "poweroff", "active", "shutoff", "saved", "not_created"];

fn location() -> impl Strategy<Value = Location> {
    prop_oneof![Just(Location::Local), Just(Location::Remote)]
}

fn observation() -> impl Strategy<Value = VmState> {
    prop_oneof![
        Just(VmState::NOT_CREATED),
        Just(VmState::UNKNOWN),
        (
            prop_oneof![Just(PowerState::Running), Just(PowerState::PoweredOff)],
            location()
        )
            .prop_map(|(power, location)| VmState::new(power, location)),
    ]
}

proptest! {
    /// Anything outside the six known statuses is Unknown
    #[test]
    fn prop_unmapped_status_is_unknown(raw in "\\PC{0,24}") {
        prop_assume!(!KNOWN.contains(&raw.trim()));
        prop_assert!(VmState::classify(&raw).is_unknown());
    }

    /// Known statuses never classify as Unknown, whatever the padding
    #[test]
    fn prop_known_status_is_mapped(index in 0..KNOWN.len(), pad in "[ \t]{0,3}") {
        let raw = format!("{}{}{}", pad, KNOWN[index], pad);
        prop_assert!(!VmState::classify(&raw).is_unknown());
    }

    /// At most two probes happen before the machine reaches a terminal state
    #[test]
    fn prop_reconciliation_ends_within_two_probes(
        desired in location(),
        first in observation(),
        second in observation(),
    ) {
        let (state, action) = Reconciliation::start(desired).transition(&first).unwrap();
        if matches!(action, Action::Probe(_)) {
            prop_assert!(!state.is_terminal());
            let (state, action) = state.transition(&second).unwrap();
            prop_assert!(state.is_terminal());
            prop_assert!(!matches!(action, Action::Probe(_)));
        } else {
            prop_assert!(state.is_terminal());
        }
    }

    /// A node already at the desired location is never bootstrapped or skipped
    #[test]
    fn prop_existing_node_at_desired_location_is_used(
        desired in location(),
        running in any::<bool>(),
    ) {
        let power = if running { PowerState::Running } else { PowerState::PoweredOff };
        let (_, action) = Reconciliation::start(desired)
            .transition(&VmState::new(power, desired))
            .unwrap();
        prop_assert!(matches!(action, Action::Reload(_) | Action::Boot(_)));
    }
}
