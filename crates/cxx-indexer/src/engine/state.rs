//! Indexer state and the wait protocol readers use to gate on it.
//!
//! States cycle `Idle -> Indexing -> CollectingNames -> Idle`, with
//! `Starting` only before the first cycle. Every entry into a state bumps a
//! counter, so a reader that slept through a whole cycle still notices the
//! phase it was waiting for went by.

use std::fmt;
use std::sync::{Condvar, MutexGuard};

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngineState {
    Starting,
    Indexing,
    CollectingNames,
    Idle,
}

impl EngineState {
    pub const ALL: [EngineState; 4] = [
        EngineState::Starting,
        EngineState::Indexing,
        EngineState::CollectingNames,
        EngineState::Idle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EngineState::Starting => "starting",
            EngineState::Indexing => "indexing",
            EngineState::CollectingNames => "collectingnames",
            EngineState::Idle => "idle",
        }
    }

    fn ordinal(self) -> usize {
        self as usize
    }

    /// Whether the worker may move from `self` to `next`.
    pub fn can_transition_to(
        self,
        next: EngineState,
    ) -> bool {
        matches!(
            (self, next),
            (EngineState::Starting, EngineState::Indexing)
                | (EngineState::Starting, EngineState::Idle)
                | (EngineState::Idle, EngineState::Indexing)
                | (EngineState::Indexing, EngineState::CollectingNames)
                | (EngineState::CollectingNames, EngineState::Idle)
                | (EngineState::CollectingNames, EngineState::Indexing)
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// State is at or past the target within the current cycle, or the
    /// target phase was entered since the wait began.
    AtLeast,
    /// State equals the target, or the target was entered since the wait began.
    Exactly,
}

/// What a waiter saw when it started waiting.
#[derive(Debug, Clone, Copy)]
pub struct WaitMark {
    mode: WaitMode,
    target: EngineState,
    seen: u64,
}

#[derive(Debug)]
pub struct StateMachine {
    state: EngineState,
    entered: [u64; 4],
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        let mut entered = [0; 4];
        entered[EngineState::Starting.ordinal()] = 1;
        Self {
            state: EngineState::Starting,
            entered,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// How many times `state` has been entered.
    pub fn entries(
        &self,
        state: EngineState,
    ) -> u64 {
        self.entered[state.ordinal()]
    }

    /// Moves to `next`. Returns `false` when already there.
    ///
    /// Panics on a transition the worker protocol never makes.
    pub fn transition(
        &mut self,
        next: EngineState,
    ) -> bool {
        if self.state == next {
            return false;
        }
        assert!(
            self.state.can_transition_to(next),
            "invalid indexer state transition from {} to {}",
            self.state,
            next
        );
        info!("indexer state changed from {} to {}", self.state, next);
        self.state = next;
        self.entered[next.ordinal()] += 1;
        true
    }

    pub fn mark(
        &self,
        mode: WaitMode,
        target: EngineState,
    ) -> WaitMark {
        WaitMark {
            mode,
            target,
            seen: self.progress(mode, target),
        }
    }

    pub fn is_satisfied(
        &self,
        mark: &WaitMark,
    ) -> bool {
        let now = match mark.mode {
            WaitMode::AtLeast => self.state >= mark.target,
            WaitMode::Exactly => self.state == mark.target,
        };
        now || self.progress(mark.mode, mark.target) != mark.seen
    }

    fn progress(
        &self,
        mode: WaitMode,
        target: EngineState,
    ) -> u64 {
        match mode {
            WaitMode::AtLeast => EngineState::ALL
                .iter()
                .filter(|state| **state >= target)
                .map(|state| self.entries(*state))
                .sum(),
            WaitMode::Exactly => self.entries(target),
        }
    }
}

/// Blocks on `condvar` until the machine `select` picks out of the guarded
/// value satisfies the wait. The lock is released while blocked.
pub(crate) fn wait_for_state<'a, T>(
    condvar: &Condvar,
    mut guard: MutexGuard<'a, T>,
    select: fn(&T) -> &StateMachine,
    mode: WaitMode,
    target: EngineState,
) -> MutexGuard<'a, T> {
    let mark = select(&guard).mark(mode, target);
    while !select(&guard).is_satisfied(&mark) {
        guard = condvar.wait(guard).unwrap_or_else(|poisoned| poisoned.into_inner());
    }
    guard
}

#[cfg(test)]
#[path = "../../tests/src/engine/state_tests.rs"]
mod tests;
