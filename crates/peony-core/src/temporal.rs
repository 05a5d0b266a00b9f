//! Time-gated eligibility rules. Pure functions, no I/O.

use chrono::{DateTime, Utc};

use crate::config::SettleDuration;
use crate::model::Thought;

/// Whether `thought` may be offered for tending at `now`.
///
/// Only captured or resting thoughts with a recorded `eligibility_at` can
/// surface, and only once `now` has reached it (inclusive).
pub fn eligible_to_surface(thought: &Thought, now: DateTime<Utc>) -> bool {
    if !thought.current_state.is_dormant() {
        return false;
    }
    match thought.eligibility_at {
        Some(at) => now >= at,
        None => false,
    }
}

/// The next instant a thought entering dormancy at `now` becomes eligible.
///
/// Saturates at the latest representable instant rather than overflowing.
pub fn next_rest_boundary(now: DateTime<Utc>, settle: SettleDuration) -> DateTime<Utc> {
    now.checked_add_signed(settle.as_duration())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::State;
    use chrono::Duration;

    fn thought(state: State, eligibility_at: Option<DateTime<Utc>>) -> Thought {
        let now = Utc::now();
        let mut th = Thought::captured(1, "x", now - Duration::days(10), now);
        th.current_state = state;
        th.eligibility_at = eligibility_at;
        th
    }

    #[test]
    fn test_closed_states_never_surface() {
        let now = Utc::now();
        for state in [State::Released, State::Archived, State::Evolved, State::Tended] {
            let th = thought(state, Some(now - Duration::hours(1)));
            assert!(!eligible_to_surface(&th, now), "{state} surfaced");
        }
    }

    #[test]
    fn test_captured_uses_eligibility_at() {
        let now = Utc::now();
        let mut th = thought(State::Captured, Some(now + Duration::hours(1)));
        assert!(!eligible_to_surface(&th, now));

        th.eligibility_at = Some(now - Duration::minutes(1));
        assert!(eligible_to_surface(&th, now));
    }

    #[test]
    fn test_resting_uses_eligibility_at() {
        let now = Utc::now();
        let th = thought(State::Resting, Some(now - Duration::minutes(1)));
        assert!(eligible_to_surface(&th, now));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let now = Utc::now();
        let th = thought(State::Resting, Some(now));
        assert!(eligible_to_surface(&th, now));
        assert!(!eligible_to_surface(&th, now - Duration::nanoseconds(1)));
    }

    #[test]
    fn test_unset_eligibility_never_surfaces() {
        let th = thought(State::Captured, None);
        assert!(!eligible_to_surface(&th, Utc::now() + Duration::weeks(520)));
    }

    #[test]
    fn test_next_rest_boundary() {
        let now = Utc::now();
        assert_eq!(
            next_rest_boundary(now, SettleDuration::default()),
            now + Duration::hours(18)
        );
        let zero = SettleDuration::new(Duration::zero()).unwrap();
        assert_eq!(next_rest_boundary(now, zero), now);
    }

    #[test]
    fn test_next_rest_boundary_saturates() {
        let edge = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        assert_eq!(
            next_rest_boundary(edge, SettleDuration::max()),
            DateTime::<Utc>::MAX_UTC
        );
    }
}
