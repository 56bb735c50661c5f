//! Capabilities the playback session drives but does not implement: the
//! adaptive-streaming engine and the media element it renders into.

pub mod events;
pub mod payload;
pub mod scripted;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use events::{EngineError, ErrorCategory, Fragment, PlaybackEvent};
pub use payload::{adapt_event, PayloadError};
pub use scripted::{
    load_script, parse_script, EngineCall, EngineJournal, MemoryMediaElement, ScriptStep,
    ScriptedEngine, ScriptedEngineFactory,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub debug: bool,
    pub enable_worker: bool,
    pub low_latency_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            enable_worker: true,
            low_latency_mode: false,
        }
    }
}

/// Rendering element shared by the session and at most one live engine.
pub trait MediaElement: Send + Sync {
    fn set_src(&self, url: &str);
    fn src(&self) -> Option<String>;
    fn set_volume(&self, volume: f32);
    fn volume(&self) -> f32;
    fn play(&self);
    fn pause(&self);
    fn is_paused(&self) -> bool;
    /// Routes the element's own notifications (metadata loaded) to `events`,
    /// replacing any previous subscriber.
    fn subscribe(&self, events: EventSink);
    fn unsubscribe(&self);
}

pub trait StreamingEngine {
    fn load_source(&mut self, url: &str);
    fn attach_media(&mut self, media: Arc<dyn MediaElement>);
    fn start_load(&mut self);
    /// Releases resources and detaches from the media element. No events may
    /// be emitted afterwards.
    fn destroy(&mut self);
}

pub trait EngineFactory {
    type Engine: StreamingEngine;

    fn is_supported(&self) -> bool;

    /// Builds an engine already subscribed to `events`.
    fn create(&self, config: &EngineConfig, events: EventSink) -> Result<Self::Engine, EngineError>;
}

#[derive(Debug)]
pub(crate) struct Signal {
    pub(crate) generation: u64,
    pub(crate) event: PlaybackEvent,
}

/// Handle an engine or media element uses to report into one load attempt.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<Signal>,
}

impl EventSink {
    pub(crate) fn channel(generation: u64) -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { generation, tx }, rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the attempt this sink belongs to has been torn down.
    pub fn emit(&self, event: PlaybackEvent) -> bool {
        self.tx
            .send(Signal {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
