use std::fmt;

use serde::{Deserialize, Serialize};

/// One media segment as reported by the engine on a fragment change.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub sn: u64,
    /// Seconds.
    pub duration: f64,
    pub url: Option<String>,
}

impl Fragment {
    /// Label shown next to the player, e.g. `#12 (6.0s)`.
    pub fn label(&self) -> String {
        format!("#{} ({:.1}s)", self.sn, self.duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    #[serde(rename = "networkError")]
    Network,
    #[serde(rename = "mediaError")]
    Media,
    #[serde(rename = "keySystemError")]
    KeySystem,
    #[serde(rename = "muxError")]
    Mux,
    #[serde(rename = "otherError")]
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "networkError",
            ErrorCategory::Media => "mediaError",
            ErrorCategory::KeySystem => "keySystemError",
            ErrorCategory::Mux => "muxError",
            ErrorCategory::Other => "otherError",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "networkError" => Some(ErrorCategory::Network),
            "mediaError" => Some(ErrorCategory::Media),
            "keySystemError" => Some(ErrorCategory::KeySystem),
            "muxError" => Some(ErrorCategory::Mux),
            "otherError" => Some(ErrorCategory::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub category: ErrorCategory,
    pub fatal: bool,
    pub details: Option<String>,
}

impl EngineError {
    pub fn new(category: ErrorCategory, fatal: bool) -> Self {
        Self {
            category,
            fatal,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = if self.fatal { "fatal" } else { "non-fatal" };
        match &self.details {
            Some(details) => write!(f, "{severity} {} ({details})", self.category),
            None => write!(f, "{severity} {}", self.category),
        }
    }
}

/// Notifications routed into a playback session.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    ManifestParsed,
    FragmentChanged(Fragment),
    Error(EngineError),
    /// Raised by the media element itself; only used on the native path.
    MetadataLoaded,
}

impl PlaybackEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackEvent::ManifestParsed => "manifestParsed",
            PlaybackEvent::FragmentChanged(_) => "fragmentChanged",
            PlaybackEvent::Error(_) => "error",
            PlaybackEvent::MetadataLoaded => "metadataLoaded",
        }
    }
}
