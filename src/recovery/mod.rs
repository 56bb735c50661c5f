pub mod policy;
pub mod timer;

pub use policy::{RecoveryAction, RecoveryPolicy, DEFAULT_RESUME_DELAY};
pub use timer::RecoveryTimer;
