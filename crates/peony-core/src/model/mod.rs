pub mod event;
pub mod state;
pub mod thought;

pub use event::{Event, KIND_CAPTURED, KIND_STATE_CHANGE};
pub use state::State;
pub use thought::Thought;
