//! Thought lifecycle engine: a small state machine over captured thoughts,
//! time-gated eligibility, and a SQLite store that logs every transition.

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod temporal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{PeonyConfig, SettleDuration};
pub use error::{CoreError, ErrorKind};
pub use model::{Event, State, Thought, KIND_CAPTURED, KIND_STATE_CHANGE};
pub use storage::{Store, StoreOptions};
pub use temporal::{eligible_to_surface, next_rest_boundary};
