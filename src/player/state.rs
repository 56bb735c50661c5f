use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::ErrorCategory;
use crate::session::{PlaybackUrl, SessionId};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlayerStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    AdBreak,
    Error(ErrorCategory),
}

impl PlayerStatus {
    pub fn text(&self) -> String {
        match self {
            PlayerStatus::Idle => "Idle".to_string(),
            PlayerStatus::Loading => "Loading...".to_string(),
            PlayerStatus::Ready => "Ready".to_string(),
            PlayerStatus::Playing => "Playing".to_string(),
            PlayerStatus::Paused => "Paused".to_string(),
            PlayerStatus::AdBreak => "Ad Break".to_string(),
            PlayerStatus::Error(category) => format!("Error: {category}"),
        }
    }

    pub fn style_class(&self) -> &'static str {
        match self {
            PlayerStatus::Idle | PlayerStatus::Paused => "status-idle",
            PlayerStatus::Loading => "status-loading",
            PlayerStatus::Ready | PlayerStatus::Playing => "status-playing",
            PlayerStatus::AdBreak => "status-ad",
            PlayerStatus::Error(_) => "status-error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlayControl {
    #[default]
    Play,
    Pause,
}

impl PlayControl {
    pub fn label(&self) -> &'static str {
        match self {
            PlayControl::Play => "Play",
            PlayControl::Pause => "Pause",
        }
    }
}

/// Everything the presentation layer renders for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub status: PlayerStatus,
    pub session_id: Option<SessionId>,
    pub playback_url: Option<PlaybackUrl>,
    pub current_fragment: Option<String>,
    pub ad_break_count: u32,
    pub ad_overlay_visible: bool,
    pub play_control: PlayControl,
    pub controls_enabled: bool,
    pub volume: f32,
    /// Set when the runtime had no adaptive engine; ad detection is off.
    pub native_fallback: bool,
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            status: PlayerStatus::Idle,
            session_id: None,
            playback_url: None,
            current_fragment: None,
            ad_break_count: 0,
            ad_overlay_visible: false,
            play_control: PlayControl::Play,
            controls_enabled: false,
            volume: 0.5,
            native_fallback: false,
            started_at: None,
        }
    }
}

impl PlayerState {
    pub fn new(volume: f32) -> Self {
        Self {
            volume,
            ..Self::default()
        }
    }

    /// Wipes per-attempt fields; volume and control state carry over.
    pub fn begin_attempt(
        &mut self,
        session_id: SessionId,
        playback_url: PlaybackUrl,
        native_fallback: bool,
        started_at: DateTime<Utc>,
    ) {
        *self = Self {
            status: PlayerStatus::Loading,
            session_id: Some(session_id),
            playback_url: Some(playback_url),
            current_fragment: None,
            ad_break_count: 0,
            ad_overlay_visible: false,
            play_control: self.play_control,
            controls_enabled: self.controls_enabled,
            volume: self.volume,
            native_fallback,
            started_at: Some(started_at),
        };
    }

    pub fn enable_controls(&mut self, control: PlayControl) {
        self.play_control = control;
        self.controls_enabled = true;
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    pub status_text: String,
    pub status_class: &'static str,
}

impl From<PlayerState> for PlayerSnapshot {
    fn from(state: PlayerState) -> Self {
        Self {
            status_text: state.status.text(),
            status_class: state.status.style_class(),
            state,
        }
    }
}
