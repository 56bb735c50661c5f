pub mod controller;
pub mod state;

pub use controller::{PlaybackSession, SessionOptions};
pub use state::{PlayControl, PlayerSnapshot, PlayerState, PlayerStatus};
