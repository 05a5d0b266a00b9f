mod duration;
mod settings;

pub use duration::SettleDuration;
pub use settings::PeonyConfig;
