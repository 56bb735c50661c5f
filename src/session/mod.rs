pub mod id;
pub mod url;

pub use id::{SessionId, SessionIdGenerator, SESSION_ID_PREFIX};
pub use url::{PlaybackRequest, PlaybackUrl, PlaybackUrlBuilder, ResolvedPlayback, DEMO_ORIGIN_PATH};
