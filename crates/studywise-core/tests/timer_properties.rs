//! Property tests for the timer reducer.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use studywise_core::timer::{reduce, Command, Durations, Effect, Phase, TimerState};

fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

fn apply(state: TimerState, command: Command, durations: &Durations) -> TimerState {
    reduce(&state, command, durations).state
}

/// Start and tick until the current phase ends.
fn finish_phase(mut state: TimerState, durations: &Durations) -> (TimerState, Vec<Effect>) {
    state = apply(state, Command::Start, durations);
    loop {
        let t = reduce(&state, Command::Tick { at: at() }, durations);
        if !t.state.is_running() {
            return (t.state, t.effects);
        }
        state = t.state;
    }
}

/// Paused at the start of a work phase with `n` completed work sessions.
fn with_completed(n: u32, durations: &Durations) -> TimerState {
    let mut state = TimerState::new(durations);
    while state.completed_work_sessions() < n || state.phase() != Phase::Work {
        state = finish_phase(state, durations).0;
    }
    state
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        1 => Just(Command::Start),
        1 => Just(Command::Pause),
        1 => Just(Command::Reset),
        4 => Just(Command::Tick { at: at() }),
        1 => "[a-z ]{0,8}".prop_map(Command::SetSubject),
    ]
}

proptest! {
    #[test]
    fn running_tick_decrements_by_one(cmds in prop::collection::vec(arb_command(), 0..200)) {
        let durations = Durations::new(1, 1, 1).unwrap();
        let mut state = TimerState::new(&durations);
        for cmd in cmds {
            state = apply(state, cmd, &durations);
        }
        if state.is_running() {
            let before = state.seconds_remaining();
            let after = apply(state.clone(), Command::Tick { at: at() }, &durations);
            if after.phase() == state.phase() && after.is_running() {
                prop_assert_eq!(after.seconds_remaining(), before - 1);
            } else {
                // The tick that reaches zero completes the phase.
                prop_assert_eq!(before, 1);
            }
        } else {
            let after = apply(state.clone(), Command::Tick { at: at() }, &durations);
            prop_assert_eq!(after, state);
        }
    }

    #[test]
    fn long_break_every_fourth_work_session(n in 0u32..10) {
        let durations = Durations::new(1, 1, 1).unwrap();
        let state = with_completed(n, &durations);
        let (after, _) = finish_phase(state, &durations);

        prop_assert_eq!(after.completed_work_sessions(), n + 1);
        let expected = if (n + 1) % 4 == 0 { Phase::LongBreak } else { Phase::ShortBreak };
        prop_assert_eq!(after.phase(), expected);
    }

    #[test]
    fn reset_always_restores_initial_state(cmds in prop::collection::vec(arb_command(), 0..200)) {
        let durations = Durations::default();
        let mut state = TimerState::new(&durations);
        for cmd in cmds {
            state = apply(state, cmd, &durations);
        }
        let reset = apply(state, Command::Reset, &durations);

        prop_assert_eq!(reset.phase(), Phase::Work);
        prop_assert!(!reset.is_running());
        prop_assert_eq!(reset.seconds_remaining(), 1500);
        prop_assert_eq!(reset.completed_work_sessions(), 0);
        prop_assert_eq!(reset.subject(), "");
    }

    #[test]
    fn break_completion_returns_to_full_work(n in 1u32..9) {
        let durations = Durations::new(25, 1, 1).unwrap();
        let mut state = with_completed(n - 1, &durations);
        state = finish_phase(state, &durations).0;
        prop_assert!(state.phase().is_break());

        let (after, effects) = finish_phase(state, &durations);
        prop_assert_eq!(after.phase(), Phase::Work);
        prop_assert_eq!(after.seconds_remaining(), 1500);
        prop_assert_eq!(after.completed_work_sessions(), n);
        prop_assert!(!effects.iter().any(|e| matches!(e, Effect::Persist(_))));
    }
}

#[test]
fn work_completion_with_subject_persists_one_record() {
    let durations = Durations::default();
    let state = apply(
        TimerState::new(&durations),
        Command::SetSubject("Biology".into()),
        &durations,
    );
    let (_, effects) = finish_phase(state, &durations);

    let persisted: Vec<_> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Persist(s) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].phase, Phase::Work);
    assert_eq!(persisted[0].duration_minutes, 25);
    assert_eq!(persisted[0].subject, "Biology");
    assert_eq!(persisted[0].completed_at, at());
}

#[test]
fn work_completion_without_subject_persists_nothing() {
    let durations = Durations::default();
    let state = apply(
        TimerState::new(&durations),
        Command::SetSubject("   ".into()),
        &durations,
    );
    let (after, effects) = finish_phase(state, &durations);
    assert_eq!(after.completed_work_sessions(), 1);
    assert!(!effects.iter().any(|e| matches!(e, Effect::Persist(_))));
}
