use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};

use crate::adbreak::{AdBreakDetector, AdBreakState, Transition};
use crate::engine::{
    EngineConfig, EngineError, EngineFactory, EventSink, Fragment, MediaElement, PlaybackEvent,
    Signal, StreamingEngine,
};
use crate::recovery::{RecoveryAction, RecoveryPolicy, RecoveryTimer, DEFAULT_RESUME_DELAY};
use crate::session::{PlaybackRequest, PlaybackUrlBuilder, ResolvedPlayback};

use super::state::{PlayControl, PlayerSnapshot, PlayerState, PlayerStatus};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub engine: EngineConfig,
    pub resume_delay: Duration,
    pub volume: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            resume_delay: DEFAULT_RESUME_DELAY,
            volume: 0.5,
        }
    }
}

/// Per-attempt wiring. Dropping it closes the channel, so anything still
/// holding the attempt's sink can no longer deliver into the session.
struct Attempt<E> {
    generation: u64,
    engine: Option<E>,
    // Holds the channel open when nothing else does (engine creation failed).
    _events: EventSink,
    signals: mpsc::UnboundedReceiver<Signal>,
}

/// Owns one load-to-replace cycle at a time: at most one live engine, the
/// resumes owed to it, and the projection the presentation layer renders.
pub struct PlaybackSession<F: EngineFactory> {
    factory: F,
    media: Arc<dyn MediaElement>,
    engine_config: EngineConfig,
    urls: PlaybackUrlBuilder,
    detector: AdBreakDetector,
    policy: RecoveryPolicy,
    timer: RecoveryTimer,
    attempt: Option<Attempt<F::Engine>>,
    generation: u64,
    user_paused: bool,
    state: PlayerState,
    publisher: watch::Sender<PlayerSnapshot>,
}

impl<F: EngineFactory> PlaybackSession<F> {
    pub fn new(factory: F, media: Arc<dyn MediaElement>, options: SessionOptions) -> Self {
        let volume = options.volume.clamp(0.0, 1.0);
        media.set_volume(volume);
        let state = PlayerState::new(volume);
        let (publisher, _) = watch::channel(PlayerSnapshot::from(state.clone()));

        Self {
            factory,
            media,
            engine_config: options.engine,
            urls: PlaybackUrlBuilder::new(),
            detector: AdBreakDetector::new(),
            policy: RecoveryPolicy::new(options.resume_delay),
            timer: RecoveryTimer::new(),
            attempt: None,
            generation: 0,
            user_paused: false,
            state,
            publisher,
        }
    }

    pub fn with_url_builder(mut self, urls: PlaybackUrlBuilder) -> Self {
        self.urls = urls;
        self
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot::from(self.state.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.publisher.subscribe()
    }

    pub fn ad_break_state(&self) -> AdBreakState {
        self.detector.state()
    }

    pub fn ad_break_count(&self) -> u32 {
        self.detector.ad_break_count()
    }

    /// Incremented by every `load`; events stamped with an older value are dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_pending_resume(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn pending_resumes(&self) -> usize {
        self.timer.pending_count()
    }

    pub fn has_engine(&self) -> bool {
        self.attempt
            .as_ref()
            .is_some_and(|attempt| attempt.engine.is_some())
    }

    pub fn load(&mut self, request: &PlaybackRequest) -> ResolvedPlayback {
        self.teardown();

        self.detector.reset();
        self.user_paused = false;
        self.generation += 1;
        let generation = self.generation;

        let resolved = self.urls.build(request);
        let native = !self.factory.is_supported();
        self.state.begin_attempt(
            resolved.session_id.clone(),
            resolved.url.clone(),
            native,
            Utc::now(),
        );
        self.publish();

        log_info!(
            "loading session {} (attempt {}): {}",
            resolved.session_id,
            generation,
            resolved.url
        );

        let (events, signals) = EventSink::channel(generation);
        let mut attempt = Attempt {
            generation,
            engine: None,
            _events: events.clone(),
            signals,
        };

        if native {
            log_warn!("adaptive engine unsupported; native playback without ad detection");
            self.media.subscribe(events);
            self.media.set_src(resolved.url.as_str());
            self.media.play();
            self.attempt = Some(attempt);
            return resolved;
        }

        match self.factory.create(&self.engine_config, events) {
            Ok(mut engine) => {
                engine.load_source(resolved.url.as_str());
                engine.attach_media(Arc::clone(&self.media));
                attempt.engine = Some(engine);
                self.attempt = Some(attempt);
            }
            Err(error) => {
                log_error!("engine creation failed: {}", error);
                self.attempt = Some(attempt);
                self.handle_error(error);
            }
        }

        resolved
    }

    /// Play/pause from the user. Never touches the ad-break state.
    pub fn toggle_play(&mut self) -> bool {
        if !self.state.controls_enabled {
            return false;
        }

        if self.media.is_paused() {
            self.media.play();
            self.user_paused = false;
            self.state.play_control = PlayControl::Pause;
            self.state.status = self.status_for_playback();
        } else {
            self.media.pause();
            self.user_paused = true;
            self.state.play_control = PlayControl::Play;
            self.state.status = PlayerStatus::Paused;
        }
        self.publish();
        true
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.media.set_volume(volume);
        self.state.volume = volume;
        self.publish();
    }

    /// Tears the current attempt down and returns to idle.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.detector.reset();
        self.user_paused = false;
        self.state = PlayerState::new(self.state.volume);
        self.publish();
    }

    /// Waits for the next engine or media signal, or the next resume
    /// deadline, and applies it. Returns false when there is no attempt to
    /// wait on.
    pub async fn process_next(&mut self) -> bool {
        let due = self.timer.next_due();
        let wake = match self.attempt.as_mut() {
            Some(attempt) => tokio::select! {
                signal = attempt.signals.recv() => match signal {
                    Some(signal) => Wake::Signal(signal),
                    None => Wake::Closed,
                },
                _ = resume_wait(due) => Wake::ResumeDue,
            },
            None => return false,
        };

        match wake {
            Wake::Signal(signal) => {
                self.dispatch(signal);
                true
            }
            Wake::ResumeDue => {
                self.fire_due_resumes();
                true
            }
            Wake::Closed => false,
        }
    }

    /// Applies every signal already queued, and every resume already due,
    /// without waiting.
    pub fn drain(&mut self) -> usize {
        let mut applied = self.fire_due_resumes();
        loop {
            let signal = match self.attempt.as_mut() {
                Some(attempt) => match attempt.signals.try_recv() {
                    Ok(signal) => signal,
                    Err(_) => break,
                },
                None => break,
            };
            self.dispatch(signal);
            applied += 1;
        }
        applied
    }

    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            match time::timeout_at(deadline, self.process_next()).await {
                Ok(true) => continue,
                Ok(false) | Err(_) => break,
            }
        }
    }

    fn teardown(&mut self) {
        if self.timer.cancel() {
            log_debug!("cancelled pending resume");
        }
        if let Some(mut attempt) = self.attempt.take() {
            if let Some(mut engine) = attempt.engine.take() {
                engine.destroy();
                log_info!("destroyed engine for attempt {}", attempt.generation);
            }
            self.media.unsubscribe();
        }
    }

    fn dispatch(&mut self, signal: Signal) {
        if signal.generation != self.generation {
            log_debug!(
                "dropping {} from stale attempt {}",
                signal.event.name(),
                signal.generation
            );
            return;
        }
        self.handle_event(signal.event);
    }

    fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::ManifestParsed => {
                self.state.status = PlayerStatus::Ready;
                self.state.enable_controls(PlayControl::Play);
            }
            PlaybackEvent::MetadataLoaded => {
                if !self.state.native_fallback {
                    return;
                }
                self.state.status = PlayerStatus::Playing;
                self.state.enable_controls(PlayControl::Pause);
            }
            PlaybackEvent::FragmentChanged(fragment) => self.handle_fragment(&fragment),
            PlaybackEvent::Error(error) => {
                self.handle_error(error);
                return;
            }
        }
        self.publish();
    }

    fn handle_fragment(&mut self, fragment: &Fragment) {
        self.state.current_fragment = Some(fragment.label());

        match self.detector.on_fragment(fragment) {
            Transition::Entered => {
                self.state.ad_break_count = self.detector.ad_break_count();
                self.state.ad_overlay_visible = true;
                if !self.user_paused {
                    self.state.status = PlayerStatus::AdBreak;
                }
                log_info!(
                    "ad break {} started at fragment #{}",
                    self.state.ad_break_count,
                    fragment.sn
                );
            }
            Transition::Exited => {
                self.state.ad_overlay_visible = false;
                if !self.user_paused {
                    self.state.status = PlayerStatus::Playing;
                }
                log_info!("ad break ended at fragment #{}", fragment.sn);
            }
            Transition::None => {}
        }
    }

    fn handle_error(&mut self, error: EngineError) {
        if !error.fatal {
            log_debug!("ignoring {}", error);
            return;
        }

        log_error!("engine reported {}", error);
        self.state.status = PlayerStatus::Error(error.category);
        self.publish();

        if let RecoveryAction::ScheduleResume(delay) = self.policy.on_error(&error) {
            if self.attempt.is_some() {
                self.timer.schedule(delay, self.generation);
                log_info!(
                    "resume scheduled in {}ms ({} pending)",
                    delay.as_millis(),
                    self.timer.pending_count()
                );
            }
        }
    }

    fn fire_due_resumes(&mut self) -> usize {
        let now = Instant::now();
        let mut fired = 0;
        while let Some(generation) = self.timer.claim_due(now) {
            self.handle_resume_due(generation);
            fired += 1;
        }
        fired
    }

    fn handle_resume_due(&mut self, generation: u64) {
        if generation != self.generation {
            log_debug!("ignoring stale resume for attempt {}", generation);
            return;
        }

        match self.attempt.as_mut().and_then(|attempt| attempt.engine.as_mut()) {
            Some(engine) => {
                log_info!("resuming load for attempt {}", generation);
                engine.start_load();
            }
            None => log_warn!("resume due but attempt {} has no engine", generation),
        }
    }

    fn status_for_playback(&self) -> PlayerStatus {
        if self.detector.state().is_ad_break() {
            PlayerStatus::AdBreak
        } else {
            PlayerStatus::Playing
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }
}

enum Wake {
    Signal(Signal),
    ResumeDue,
    Closed,
}

async fn resume_wait(due: Option<Instant>) {
    match due {
        Some(due) => time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}

impl<F: EngineFactory> Drop for PlaybackSession<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
