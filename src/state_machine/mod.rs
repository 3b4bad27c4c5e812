// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Decision logic is kept pure: a machine maps `(state, input)` to
//! `(state, output)` and never performs I/O. Callers execute the output.
//!
//! ## Mealy Machine
//!
//! Output depends on both current state and input:
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! [`reconcile`] is the one machine the crate runs: it decides, probe by
//! probe, what `infra_ensure_up` does next.

pub mod reconcile;

/// Result of a state transition
pub type TransitionResult<S> = Result<S, TransitionError>;

/// Errors that can occur during state transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Transition from current state to target state is not allowed
    #[error("Invalid transition from {from} on {input}")]
    InvalidTransition { from: String, input: String },
}

/// Trait for finite state machines
pub trait StateMachine: Sized + Clone {
    /// Input type that triggers transitions
    type Input;

    /// Output type produced by transitions (use () if none)
    type Output;

    /// Attempt to transition to a new state given an input
    ///
    /// # Returns
    /// - Ok((new_state, output)) if transition is valid
    /// - Err(TransitionError) if transition is invalid
    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    /// Check if a transition is valid without performing it
    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }

    /// Whether no input is accepted any more
    fn is_terminal(&self) -> bool;
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S, I, O> {
    pub from: S,
    pub to: S,
    pub input: I,
    pub output: O,
}

/// State machine with history
///
/// Wraps a state machine and tracks every transition taken, so a finished
/// run can be explained after the fact.
#[derive(Debug, Clone)]
pub struct StateMachineWithHistory<FSM: StateMachine> {
    current: FSM,
    history: Vec<Transition<FSM, FSM::Input, FSM::Output>>,
}

impl<FSM> StateMachineWithHistory<FSM>
where
    FSM: StateMachine,
    FSM::Input: Clone,
    FSM::Output: Clone,
{
    pub fn new(initial: FSM) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
        }
    }

    /// Transition and record the step
    pub fn step(&mut self, input: FSM::Input) -> TransitionResult<FSM::Output> {
        let (to, output) = self.current.transition(&input)?;
        self.history.push(Transition {
            from: self.current.clone(),
            to: to.clone(),
            input,
            output: output.clone(),
        });
        self.current = to;
        Ok(output)
    }

    pub fn history(&self) -> &[Transition<FSM, FSM::Input, FSM::Output>] {
        &self.history
    }

    pub fn current_state(&self) -> &FSM {
        &self.current
    }
}
