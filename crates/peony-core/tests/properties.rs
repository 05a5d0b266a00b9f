//! Property tests for the lifecycle rules.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use peony_core::{
    eligible_to_surface, ErrorKind, ManualClock, SettleDuration, State, Store, StoreOptions,
    Thought, KIND_STATE_CHANGE,
};
use proptest::prelude::*;

fn arb_state() -> impl Strategy<Value = State> {
    prop::sample::select(State::ALL.to_vec())
}

fn arb_terminal() -> impl Strategy<Value = State> {
    prop::sample::select(vec![State::Evolved, State::Released, State::Archived])
}

#[derive(Debug, Clone)]
enum Action {
    Tend,
    Resolve(State),
    Edit,
    Advance(i64),
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Tend),
        prop::sample::select(State::ALL.to_vec()).prop_map(Action::Resolve),
        Just(Action::Edit),
        (0i64..48).prop_map(Action::Advance),
    ]
}

proptest! {
    #[test]
    fn terminal_thoughts_never_surface(state in arb_terminal(), offset_h in -100_000i64..100_000) {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut th = Thought::captured(1, "x", base, base);
        th.current_state = state;
        prop_assert!(!eligible_to_surface(&th, base + Duration::hours(offset_h)));
    }

    #[test]
    fn eligibility_is_monotonic(
        state in arb_state(),
        at_min in -10_000i64..10_000,
        probe_min in -10_000i64..10_000,
        later_min in 0i64..10_000,
    ) {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut th = Thought::captured(1, "x", base, base + Duration::minutes(at_min));
        th.current_state = state;
        let probe = base + Duration::minutes(probe_min);
        if eligible_to_surface(&th, probe) {
            prop_assert!(state.is_dormant());
            prop_assert!(eligible_to_surface(&th, probe + Duration::minutes(later_min)));
        }
    }

    #[test]
    fn settle_duration_display_parses_back(ms in 0i64..10_000_000_000) {
        let d = SettleDuration::new(Duration::milliseconds(ms)).unwrap();
        let parsed: SettleDuration = d.to_string().parse().unwrap();
        prop_assert_eq!(parsed, d);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_walks_keep_history_consistent(actions in prop::collection::vec(arb_action(), 1..24)) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let store = Store::in_memory(StoreOptions::default().with_clock(clock.clone())).unwrap();
        let id = store.capture("walker").unwrap();

        for action in actions {
            let before = store.get(id).unwrap();
            let result = match action {
                Action::Tend => store.mark_tended(id, None),
                Action::Resolve(next) => store.resolve_post_tend(id, next, None),
                Action::Edit => store.update_content(id, "edited"),
                Action::Advance(hours) => {
                    clock.advance(Duration::hours(hours));
                    Ok(())
                }
            };
            if let Err(err) = result {
                prop_assert_eq!(err.kind(), ErrorKind::InvalidTransition);
                prop_assert_eq!(store.get(id).unwrap(), before);
            }
        }

        let (th, events) = store.get(id).unwrap();
        let tends = events
            .iter()
            .filter(|e| e.kind == KIND_STATE_CHANGE && e.next_state == Some(State::Tended))
            .count();
        prop_assert_eq!(th.tend_counter as usize, tends);
        prop_assert_eq!(events.last().and_then(|e| e.next_state), Some(th.current_state));
        for pair in events.windows(2) {
            prop_assert_eq!(pair[0].next_state, pair[1].previous_state);
            prop_assert!(!pair[0].next_state.is_some_and(|s| s.is_terminal()));
        }
    }
}
