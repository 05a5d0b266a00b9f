use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle position of a thought.
///
/// ```text
/// captured ─┐
///           ├─(mark tended)─► tended ─(resolve)─► resting | evolved | released | archived
/// resting ──┘
/// ```
///
/// `evolved`, `released` and `archived` are sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Captured,
    Resting,
    Tended,
    Evolved,
    Released,
    Archived,
}

impl State {
    pub const ALL: [State; 6] = [
        State::Captured,
        State::Resting,
        State::Tended,
        State::Evolved,
        State::Released,
        State::Archived,
    ];

    /// Targets accepted when resolving a tended thought.
    pub const POST_TEND: [State; 4] = [
        State::Resting,
        State::Evolved,
        State::Released,
        State::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Captured => "captured",
            State::Resting => "resting",
            State::Tended => "tended",
            State::Evolved => "evolved",
            State::Released => "released",
            State::Archived => "archived",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Evolved | State::Released | State::Archived)
    }

    /// States in which `eligibility_at` is meaningful and a thought may surface.
    pub fn is_dormant(&self) -> bool {
        matches!(self, State::Captured | State::Resting)
    }

    pub fn is_post_tend_target(&self) -> bool {
        Self::POST_TEND.contains(self)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        State::ALL
            .into_iter()
            .find(|state| state.as_str() == wanted)
            .ok_or_else(|| CoreError::validation("parse state", format!("unknown state '{s}'")))
    }
}
