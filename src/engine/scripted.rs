//! Scripted engine and in-memory media element. They stand in for the
//! browser engine in the demo binary and in tests: the engine replays a
//! fixed list of timed events once a source is loaded and media attached.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::events::{EngineError, PlaybackEvent};
use super::payload::adapt_event;
use super::{EngineConfig, EngineFactory, EventSink, MediaElement, StreamingEngine};

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    /// Delay after the previous step.
    pub after: Duration,
    pub event: PlaybackEvent,
}

impl ScriptStep {
    pub fn new(after_ms: u64, event: PlaybackEvent) -> Self {
        Self {
            after: Duration::from_millis(after_ms),
            event,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    #[serde(default)]
    after_ms: u64,
    event: String,
    #[serde(default)]
    data: Value,
}

/// Parses a JSON array of `{afterMs, event, data}` steps.
pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>> {
    let raw: Vec<RawStep> = serde_json::from_str(json).context("script is not a JSON step list")?;
    raw.into_iter()
        .enumerate()
        .map(|(index, step)| {
            let event = adapt_event(&step.event, &step.data)
                .with_context(|| format!("step {index} ({})", step.event))?;
            Ok(ScriptStep::new(step.after_ms, event))
        })
        .collect()
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script from {}", path.display()))?;
    parse_script(&contents).with_context(|| format!("Invalid script {}", path.display()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Created { engine: u64, config: EngineConfig },
    LoadSource { engine: u64, url: String },
    AttachMedia { engine: u64 },
    StartLoad { engine: u64 },
    Destroyed { engine: u64 },
}

/// Shared record of every call made on engines built by one factory.
#[derive(Debug, Clone, Default)]
pub struct EngineJournal(Arc<Mutex<Vec<EngineCall>>>);

impl EngineJournal {
    fn record(&self, call: EngineCall) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub struct ScriptedEngineFactory {
    steps: Arc<[ScriptStep]>,
    supported: bool,
    creation_error: Option<EngineError>,
    next_id: AtomicU64,
    journal: EngineJournal,
}

impl ScriptedEngineFactory {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: steps.into(),
            supported: true,
            creation_error: None,
            next_id: AtomicU64::new(1),
            journal: EngineJournal::default(),
        }
    }

    /// Simulates a runtime without adaptive streaming support.
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn failing_with(mut self, error: EngineError) -> Self {
        self.creation_error = Some(error);
        self
    }

    pub fn journal(&self) -> EngineJournal {
        self.journal.clone()
    }
}

impl EngineFactory for ScriptedEngineFactory {
    type Engine = ScriptedEngine;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, config: &EngineConfig, events: EventSink) -> Result<ScriptedEngine, EngineError> {
        if let Some(error) = &self.creation_error {
            return Err(error.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.journal.record(EngineCall::Created {
            engine: id,
            config: config.clone(),
        });

        Ok(ScriptedEngine {
            id,
            steps: Arc::clone(&self.steps),
            cursor: Arc::new(AtomicUsize::new(0)),
            events,
            source: None,
            media: None,
            worker: None,
            destroyed: false,
            journal: self.journal.clone(),
        })
    }
}

pub struct ScriptedEngine {
    id: u64,
    steps: Arc<[ScriptStep]>,
    cursor: Arc<AtomicUsize>,
    events: EventSink,
    source: Option<String>,
    media: Option<Arc<dyn MediaElement>>,
    worker: Option<(CancellationToken, JoinHandle<()>)>,
    destroyed: bool,
    journal: EngineJournal,
}

impl ScriptedEngine {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Index of the next step to be emitted.
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    fn spawn_worker(&mut self) {
        if self.destroyed || self.source.is_none() || self.media.is_none() {
            return;
        }
        if let Some((_, handle)) = &self.worker {
            if !handle.is_finished() {
                return;
            }
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; scripted engine stays idle");
            return;
        };

        let token = CancellationToken::new();
        let handle = runtime.spawn(play_script(
            Arc::clone(&self.steps),
            Arc::clone(&self.cursor),
            self.events.clone(),
            token.clone(),
        ));
        self.worker = Some((token, handle));
    }

    fn stop_worker(&mut self) {
        if let Some((token, handle)) = self.worker.take() {
            token.cancel();
            handle.abort();
        }
    }
}

impl StreamingEngine for ScriptedEngine {
    fn load_source(&mut self, url: &str) {
        self.journal.record(EngineCall::LoadSource {
            engine: self.id,
            url: url.to_string(),
        });
        self.source = Some(url.to_string());
        self.spawn_worker();
    }

    fn attach_media(&mut self, media: Arc<dyn MediaElement>) {
        self.journal.record(EngineCall::AttachMedia { engine: self.id });
        if let Some(url) = &self.source {
            media.set_src(url);
        }
        self.media = Some(media);
        self.spawn_worker();
    }

    fn start_load(&mut self) {
        self.journal.record(EngineCall::StartLoad { engine: self.id });
        self.spawn_worker();
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop_worker();
        self.media = None;
        self.destroyed = true;
        self.journal.record(EngineCall::Destroyed { engine: self.id });
        debug!("scripted engine {} destroyed", self.id);
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

/// Emits steps from the shared cursor; a fatal error stalls until `start_load`.
async fn play_script(
    steps: Arc<[ScriptStep]>,
    cursor: Arc<AtomicUsize>,
    events: EventSink,
    token: CancellationToken,
) {
    loop {
        let index = cursor.load(Ordering::SeqCst);
        let Some(step) = steps.get(index) else {
            break;
        };

        tokio::select! {
            _ = token.cancelled() => break,
            _ = time::sleep(step.after) => {}
        }

        cursor.store(index + 1, Ordering::SeqCst);
        if !events.emit(step.event.clone()) {
            break;
        }
        if matches!(&step.event, PlaybackEvent::Error(error) if error.fatal) {
            break;
        }
    }
}

/// Media element that only records what it was told.
pub struct MemoryMediaElement {
    src: Mutex<Option<String>>,
    paused: AtomicBool,
    volume_bits: AtomicU32,
    subscriber: Mutex<Option<EventSink>>,
}

impl MemoryMediaElement {
    pub fn new() -> Self {
        Self {
            src: Mutex::new(None),
            paused: AtomicBool::new(true),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
            subscriber: Mutex::new(None),
        }
    }
}

impl Default for MemoryMediaElement {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement for MemoryMediaElement {
    fn set_src(&self, url: &str) {
        *self.src.lock().unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
        let subscriber = self
            .subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(events) = subscriber {
            events.emit(PlaybackEvent::MetadataLoaded);
        }
    }

    fn src(&self) -> Option<String> {
        self.src.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_volume(&self, volume: f32) {
        self.volume_bits
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::SeqCst);
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::SeqCst))
    }

    fn play(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn subscribe(&self, events: EventSink) {
        *self.subscriber.lock().unwrap_or_else(PoisonError::into_inner) = Some(events);
    }

    fn unsubscribe(&self) {
        self.subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
