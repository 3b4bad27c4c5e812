// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reconciliation State Machine
//!
//! Pure decision core of `infra_ensure_up`. It is a **Mealy machine**: the
//! input is one probe observation, the output is the action the engine must
//! execute next.
//!
//! # States
//!
//! - `Probing(Primary)`: initial, waiting for the primary's probe
//! - `Probing(Alternate)`: primary sits at the wrong location
//! - `Finished`: terminal
//!
//! # Transitions
//!
//! | observation                        | action            | next                 |
//! |------------------------------------|-------------------|----------------------|
//! | Running at desired location        | `Reload(slot)`    | Finished             |
//! | PoweredOff at desired location     | `Boot(slot)`      | Finished             |
//! | Unknown                            | `Fail`            | Finished             |
//! | NotCreated                         | `Bootstrap(slot)` | Finished             |
//! | wrong location, on primary         | `Probe(Alternate)`| Probing(Alternate)   |
//! | wrong location, on alternate       | `Fail`            | Finished             |

use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};
use crate::domain::{Location, PowerState, Slot, VmState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Probing(Slot),
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Probing(slot) => write!(f, "probing {:?}", slot),
            Phase::Finished => f.write_str("finished"),
        }
    }
}

/// Why reconciliation gave up without touching anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Refusal {
    /// The provider reported a status we cannot interpret
    UnknownState,
    /// Both identities exist at the other location
    ChainExhausted { occupied: Location },
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::UnknownState => f.write_str("provider state is unknown"),
            Refusal::ChainExhausted { occupied } => write!(
                f,
                "both identities already exist at the {} location and no further identity is available",
                occupied
            ),
        }
    }
}

/// What the engine does next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Re-apply provisioning to the running node
    Reload(Slot),
    /// Power the existing node on
    Boot(Slot),
    /// Probe the given identity and feed the result back in
    Probe(Slot),
    /// Describe, (remote: network,) append and boot a new node
    Bootstrap(Slot),
    Fail(Slot, Refusal),
}

/// Reconciliation towards one desired location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reconciliation {
    desired: Location,
    phase: Phase,
}

impl Reconciliation {
    /// Start by probing the primary identity
    pub fn start(desired: Location) -> Self {
        Self {
            desired,
            phase: Phase::Probing(Slot::Primary),
        }
    }

    pub fn desired(&self) -> Location {
        self.desired
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn finish(&self, action: Action) -> (Self, Action) {
        (
            Self {
                desired: self.desired,
                phase: Phase::Finished,
            },
            action,
        )
    }
}

impl StateMachine for Reconciliation {
    type Input = VmState;
    type Output = Action;

    fn transition(&self, observed: &VmState) -> TransitionResult<(Self, Action)> {
        let slot = match self.phase {
            Phase::Probing(slot) => slot,
            Phase::Finished => {
                return Err(TransitionError::InvalidTransition {
                    from: self.phase.to_string(),
                    input: observed.to_string(),
                })
            }
        };

        let at_desired = observed.is_at(self.desired);
        let next = match observed.power {
            // `probe` already reports unknown statuses as errors; kept so the
            // machine answers every observation
            PowerState::Unknown => self.finish(Action::Fail(slot, Refusal::UnknownState)),
            PowerState::NotCreated => self.finish(Action::Bootstrap(slot)),
            PowerState::Running if at_desired => self.finish(Action::Reload(slot)),
            PowerState::PoweredOff if at_desired => self.finish(Action::Boot(slot)),
            PowerState::Running | PowerState::PoweredOff => match slot {
                Slot::Primary => (
                    Self {
                        desired: self.desired,
                        phase: Phase::Probing(Slot::Alternate),
                    },
                    Action::Probe(Slot::Alternate),
                ),
                Slot::Alternate => self.finish(Action::Fail(
                    slot,
                    Refusal::ChainExhausted {
                        occupied: self.desired.other(),
                    },
                )),
            },
        };
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.phase == Phase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const fn at(power: PowerState, location: Location) -> VmState {
        VmState {
            power,
            location: Some(location),
        }
    }

    #[test_case(Location::Local, at(PowerState::Running, Location::Local), Action::Reload(Slot::Primary); "running here reloads")]
    #[test_case(Location::Local, at(PowerState::PoweredOff, Location::Local), Action::Boot(Slot::Primary); "off here boots")]
    #[test_case(Location::Remote, at(PowerState::Running, Location::Remote), Action::Reload(Slot::Primary); "remote running reloads")]
    #[test_case(Location::Remote, at(PowerState::PoweredOff, Location::Remote), Action::Boot(Slot::Primary); "remote off boots")]
    #[test_case(Location::Local, VmState::NOT_CREATED, Action::Bootstrap(Slot::Primary); "missing bootstraps")]
    #[test_case(Location::Local, VmState::UNKNOWN, Action::Fail(Slot::Primary, Refusal::UnknownState); "unknown fails")]
    #[test_case(Location::Local, at(PowerState::Running, Location::Remote), Action::Probe(Slot::Alternate); "elsewhere switches")]
    #[test_case(Location::Remote, at(PowerState::PoweredOff, Location::Local), Action::Probe(Slot::Alternate); "off elsewhere switches")]
    fn test_primary_transitions(desired: Location, observed: VmState, expected: Action) {
        let (next, action) = Reconciliation::start(desired).transition(&observed).unwrap();
        assert_eq!(action, expected);
        assert_eq!(next.is_terminal(), !matches!(expected, Action::Probe(_)));
    }

    #[test]
    fn test_alternate_is_the_last_resort() {
        let elsewhere = at(PowerState::Running, Location::Remote);
        let (on_alternate, _) = Reconciliation::start(Location::Local)
            .transition(&elsewhere)
            .unwrap();
        assert_eq!(on_alternate.phase(), Phase::Probing(Slot::Alternate));

        let (done, action) = on_alternate.transition(&elsewhere).unwrap();
        assert!(done.is_terminal());
        assert_eq!(
            action,
            Action::Fail(
                Slot::Alternate,
                Refusal::ChainExhausted {
                    occupied: Location::Remote
                }
            )
        );
    }

    #[test]
    fn test_alternate_not_created_bootstraps_alternate() {
        let (on_alternate, _) = Reconciliation::start(Location::Local)
            .transition(&at(PowerState::Running, Location::Remote))
            .unwrap();
        let (_, action) = on_alternate.transition(&VmState::NOT_CREATED).unwrap();
        assert_eq!(action, Action::Bootstrap(Slot::Alternate));
    }

    #[test]
    fn test_finished_accepts_nothing() {
        let (done, _) = Reconciliation::start(Location::Local)
            .transition(&VmState::NOT_CREATED)
            .unwrap();
        assert!(!done.can_transition(&VmState::NOT_CREATED));
    }
}
