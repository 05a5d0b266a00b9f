use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::State;

/// Snapshot of one thought row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
    pub id: i64,
    pub content: String,
    pub current_state: State,
    pub tend_counter: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Earliest instant the thought may be offered for tending.
    /// Only meaningful while the thought is captured or resting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valence: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<i32>,
}

impl Thought {
    /// A freshly captured, never-tended thought. The id is assigned by storage.
    pub fn captured(
        id: i64,
        content: impl Into<String>,
        at: DateTime<Utc>,
        eligibility_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            current_state: State::Captured,
            tend_counter: 0,
            created_at: at,
            updated_at: at,
            eligibility_at: Some(eligibility_at),
            last_tended_at: None,
            valence: None,
            energy: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.current_state.is_terminal()
    }

    /// Single-line preview of the content, cut to `max` characters.
    pub fn overview(&self, max: usize) -> String {
        let flat = self.content.replace(['\n', '\r'], " ");
        let flat = flat.trim();
        if flat.chars().count() <= max {
            return flat.to_string();
        }
        let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        cut.push('\u{2026}');
        cut
    }
}
