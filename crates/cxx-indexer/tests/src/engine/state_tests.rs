use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use super::*;

fn itself(machine: &StateMachine) -> &StateMachine {
    machine
}

fn machine_at(path: &[EngineState]) -> StateMachine {
    let mut machine = StateMachine::new();
    for state in path {
        machine.transition(*state);
    }
    machine
}

#[test]
fn starts_in_starting() {
    let machine = StateMachine::new();
    assert_eq!(machine.state(), EngineState::Starting);
    assert_eq!(machine.entries(EngineState::Starting), 1);
    assert_eq!(machine.entries(EngineState::Idle), 0);
}

#[test]
fn names_are_lowercase() {
    let names: Vec<String> = EngineState::ALL.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["starting", "indexing", "collectingnames", "idle"]);
}

#[test]
fn full_cycle_counts_entries() {
    let mut machine = machine_at(&[EngineState::Idle]);
    assert!(machine.transition(EngineState::Indexing));
    assert!(!machine.transition(EngineState::Indexing));
    assert!(machine.transition(EngineState::CollectingNames));
    assert!(machine.transition(EngineState::Indexing));
    assert!(machine.transition(EngineState::CollectingNames));
    assert!(machine.transition(EngineState::Idle));

    assert_eq!(machine.entries(EngineState::Indexing), 2);
    assert_eq!(machine.entries(EngineState::CollectingNames), 2);
    assert_eq!(machine.entries(EngineState::Idle), 2);
}

#[test]
#[should_panic(expected = "invalid indexer state transition from idle to collectingnames")]
fn skipping_a_phase_panics() {
    machine_at(&[EngineState::Idle, EngineState::CollectingNames]);
}

#[test]
fn allowed_transitions() {
    assert!(EngineState::Starting.can_transition_to(EngineState::Indexing));
    assert!(EngineState::CollectingNames.can_transition_to(EngineState::Indexing));
    assert!(!EngineState::Indexing.can_transition_to(EngineState::Idle));
    assert!(!EngineState::Idle.can_transition_to(EngineState::Starting));
}

#[test]
fn at_least_waits_for_a_later_phase() {
    let mut machine = machine_at(&[EngineState::Indexing]);
    let mark = machine.mark(WaitMode::AtLeast, EngineState::Idle);
    assert!(!machine.is_satisfied(&mark));
    machine.transition(EngineState::CollectingNames);
    assert!(!machine.is_satisfied(&mark));
    machine.transition(EngineState::Idle);
    assert!(machine.is_satisfied(&mark));

    let settled = machine.mark(WaitMode::AtLeast, EngineState::CollectingNames);
    assert!(machine.is_satisfied(&settled));
}

#[test]
fn a_phase_that_came_and_went_still_counts() {
    let mut machine = machine_at(&[EngineState::Idle]);
    let mark = machine.mark(WaitMode::Exactly, EngineState::CollectingNames);
    assert!(!machine.is_satisfied(&mark));

    machine.transition(EngineState::Indexing);
    machine.transition(EngineState::CollectingNames);
    machine.transition(EngineState::Idle);
    assert_eq!(machine.state(), EngineState::Idle);
    assert!(machine.is_satisfied(&mark));
}

#[test]
fn waiters_wake_on_transition() {
    let shared = Arc::new((Mutex::new(machine_at(&[EngineState::Indexing])), Condvar::new()));
    let worker = {
        let shared = shared.clone();
        thread::spawn(move || {
            let (lock, condvar) = &*shared;
            for next in [EngineState::CollectingNames, EngineState::Idle] {
                lock.lock().unwrap().transition(next);
                condvar.notify_all();
            }
        })
    };

    let (lock, condvar) = &*shared;
    let guard = wait_for_state(condvar, lock.lock().unwrap(), itself, WaitMode::AtLeast, EngineState::Idle);
    assert_eq!(guard.state(), EngineState::Idle);
    drop(guard);
    worker.join().unwrap();
}
