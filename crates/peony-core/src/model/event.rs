use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::State;

/// Kind tag for the event appended when a thought is first captured.
pub const KIND_CAPTURED: &str = "captured";
/// Kind tag for every lifecycle transition.
pub const KIND_STATE_CHANGE: &str = "state_change";

/// One immutable row of a thought's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub thought_id: i64,
    pub kind: String,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_state: Option<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Event {
    pub fn is_transition(&self) -> bool {
        self.previous_state.is_some() || self.next_state.is_some()
    }

    /// `"captured → tended"`, `"captured"` or `""` depending on which ends are recorded.
    pub fn transition_label(&self) -> String {
        match (self.previous_state, self.next_state) {
            (Some(prev), Some(next)) => format!("{prev} \u{2192} {next}"),
            (None, Some(next)) => next.to_string(),
            (Some(prev), None) => prev.to_string(),
            (None, None) => String::new(),
        }
    }
}
