pub mod detector;
pub mod state;

pub use detector::{classify, AdBreakDetector, FragmentKind, AD_PATH_SEGMENT};
pub use state::{AdBreakState, Transition};
