//! Ad playback and reward verification.
//!
//! Each launched offer gets one [`AdPlayer`] instance running in one
//! of two modes: live-asset playback (progress follows the reported
//! stream position) or simulated verification (a timer walks progress
//! from 0 to 100). The simulated timeline itself is a pure state
//! machine ([`VerificationTimeline`]) so any scheduler - the tokio
//! interval task here, or a test harness - can drive it.

use crate::types::AdOffer;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Total simulated verification run, in milliseconds.
pub const SIM_DURATION_MS: u64 = 6000;
/// Sampling cadence of the simulated timeline, in milliseconds.
pub const SIM_TICK_MS: u64 = 60;

/// Status-label phase of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Simulated, progress [0, 25)
    Syncing,
    /// Simulated, progress [25, 50)
    Analyzing,
    /// Simulated, progress [50, 85)
    Verifying,
    /// Simulated, progress [85, 100]
    Settling,
    /// Live, progress [0, 20)
    Buffering,
    /// Live, progress [20, 80)
    Streaming,
    /// Live, progress [80, 100]
    Auditing,
}

impl PlaybackPhase {
    /// Status text shown while the phase is active.
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackPhase::Syncing => "Syncing Link...",
            PlaybackPhase::Analyzing => "Analyzing Feed...",
            PlaybackPhase::Verifying => "Verifying ROI...",
            PlaybackPhase::Settling => "Settling Vault...",
            PlaybackPhase::Buffering => "Buffer Handshake...",
            PlaybackPhase::Streaming => "Streaming Asset...",
            PlaybackPhase::Auditing => "Audit Active...",
        }
    }
}

/// Result of advancing the simulated timeline.
#[derive(Debug, Clone)]
pub struct TickUpdate {
    /// Progress in [0, 100]
    pub progress: u8,
    pub phase: PlaybackPhase,
    /// Log lines whose thresholds were crossed by this advance
    pub log_lines: Vec<String>,
    /// True once the run has reached 100
    pub done: bool,
}

/// Simulated verification timeline.
///
/// Pure transition function over elapsed time; holds no timer of its
/// own. Log thresholds fire exactly once each, on the tick that
/// crosses them, regardless of tick granularity.
#[derive(Debug, Default)]
pub struct VerificationTimeline {
    elapsed_ms: u64,
    progress: u8,
}

impl VerificationTimeline {
    const LOG_MARKS: [(u8, &'static str); 4] = [
        (10, "[Core] Session authenticated (0x8F2)."),
        (35, "[Neural] Syncing engagement telemetry..."),
        (65, "[AI] Validating clickstream ROI..."),
        (85, "[Reward] Confirming ledger settlement."),
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the timeline by `delta_ms` of elapsed time.
    pub fn tick(&mut self, delta_ms: u64) -> TickUpdate {
        let prev = self.progress;
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        let progress = ((self.elapsed_ms * 100) / SIM_DURATION_MS).min(100) as u8;
        self.progress = progress;

        let log_lines = Self::LOG_MARKS
            .iter()
            .filter(|(mark, _)| prev < *mark && progress >= *mark)
            .map(|(_, line)| line.to_string())
            .collect();

        TickUpdate {
            progress,
            phase: Self::phase_for(progress),
            log_lines,
            done: progress >= 100,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 100
    }

    fn phase_for(progress: u8) -> PlaybackPhase {
        match progress {
            0..=24 => PlaybackPhase::Syncing,
            25..=49 => PlaybackPhase::Analyzing,
            50..=84 => PlaybackPhase::Verifying,
            _ => PlaybackPhase::Settling,
        }
    }
}

/// Progress snapshot derived from a live asset's playback position.
#[derive(Debug, Clone, Copy)]
pub struct LiveProgress {
    pub progress: u8,
    pub phase: PlaybackPhase,
}

impl LiveProgress {
    /// Map a playback position to progress and phase.
    pub fn at(position_seconds: f64, duration_seconds: f64) -> Self {
        let fraction = if duration_seconds > 0.0 {
            (position_seconds / duration_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let progress = (fraction * 100.0).floor() as u8;
        let phase = match progress {
            0..=19 => PlaybackPhase::Buffering,
            20..=79 => PlaybackPhase::Streaming,
            _ => PlaybackPhase::Auditing,
        };
        Self { progress, phase }
    }
}

/// Mode an [`AdPlayer`] is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMode {
    Simulated,
    Live,
}

/// Events emitted by an [`AdPlayer`] over its event channel.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Progress { progress: u8, phase: PlaybackPhase },
    Log(String),
    /// The run finished; the carried offer is ready for settlement.
    /// Emitted at most once per player instance.
    Completed(AdOffer),
}

/// Per-offer playback instance.
///
/// Live mode is selected at construction iff the offer carries a
/// playable asset; it may fail over to simulated mode at most once.
/// Simulated mode never transitions back.
pub struct AdPlayer {
    offer: AdOffer,
    mode: PlayerMode,
    failed_over: bool,
    completed: bool,
    events: mpsc::UnboundedSender<PlayerEvent>,
    sim_handle: Option<JoinHandle<()>>,
}

impl AdPlayer {
    /// Create a player for one offer, returning the event stream the
    /// UI (or a test) consumes.
    pub fn new(offer: AdOffer) -> (Self, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let mode = if offer.has_playable_asset() {
            PlayerMode::Live
        } else {
            PlayerMode::Simulated
        };
        let player = Self {
            offer,
            mode,
            failed_over: false,
            completed: false,
            events,
            sim_handle: None,
        };
        (player, receiver)
    }

    pub fn mode(&self) -> PlayerMode {
        self.mode
    }

    pub fn offer(&self) -> &AdOffer {
        &self.offer
    }

    /// Begin the run. Simulated mode starts its timer here; live mode
    /// only announces the stream handshake and then waits for
    /// [`AdPlayer::report_position`] callbacks.
    pub fn start(&mut self) {
        self.emit(PlayerEvent::Log(format!(
            "[System] Initializing session for {}...",
            self.offer.provider_id
        )));
        match self.mode {
            PlayerMode::Simulated => self.start_simulation(),
            PlayerMode::Live => self.emit(PlayerEvent::Log(
                "[Stream] Handshaking with edge nodes...".to_string(),
            )),
        }
    }

    /// Live-asset position callback. Ignored in simulated mode.
    pub fn report_position(&mut self, position_seconds: f64, duration_seconds: f64) {
        if self.mode != PlayerMode::Live || self.completed {
            return;
        }
        let live = LiveProgress::at(position_seconds, duration_seconds);
        self.emit(PlayerEvent::Progress {
            progress: live.progress,
            phase: live.phase,
        });
    }

    /// Natural end-of-playback signal from the live asset. An
    /// interrupted stream never reaches this, so no partial reward is
    /// ever granted.
    pub fn asset_ended(&mut self) {
        if self.mode != PlayerMode::Live || self.completed {
            return;
        }
        self.completed = true;
        debug!("Live asset ended for offer {}", self.offer.id);
        self.emit(PlayerEvent::Completed(self.offer.clone()));
    }

    /// Fail over from live to simulated verification, e.g. when the
    /// asset cannot begin playing. Allowed at most once; restarts
    /// progress from zero.
    pub fn fail_over(&mut self) {
        if self.mode != PlayerMode::Live || self.failed_over || self.completed {
            return;
        }
        self.failed_over = true;
        self.mode = PlayerMode::Simulated;
        warn!("Asset failover for offer {}; switching to simulated verification", self.offer.id);
        self.emit(PlayerEvent::Log(
            "[Failover] Proxy tunnel active. Verification sequence...".to_string(),
        ));
        self.emit(PlayerEvent::Progress {
            progress: 0,
            phase: PlaybackPhase::Syncing,
        });
        self.start_simulation();
    }

    /// Cancel any pending timer. A torn-down player emits no further
    /// events and never completes.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.sim_handle.take() {
            handle.abort();
        }
    }

    fn start_simulation(&mut self) {
        // A restart must never leave two timers racing to complete.
        if let Some(handle) = self.sim_handle.take() {
            handle.abort();
        }

        let events = self.events.clone();
        let offer = self.offer.clone();
        self.sim_handle = Some(tokio::spawn(async move {
            let mut timeline = VerificationTimeline::new();
            let mut ticker = tokio::time::interval(Duration::from_millis(SIM_TICK_MS));
            // The first interval tick resolves immediately; consume it
            // so the timeline advances in real steps.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let update = timeline.tick(SIM_TICK_MS);
                for line in update.log_lines {
                    let _ = events.send(PlayerEvent::Log(line));
                }
                let _ = events.send(PlayerEvent::Progress {
                    progress: update.progress,
                    phase: update.phase,
                });
                if update.done {
                    let _ = events.send(PlayerEvent::Completed(offer));
                    break;
                }
            }
        }));
    }

    fn emit(&self, event: PlayerEvent) {
        // The receiver may be gone during shutdown; events are best-effort.
        let _ = self.events.send(event);
    }
}

impl Drop for AdPlayer {
    fn drop(&mut self) {
        self.teardown();
    }
}
