// SYNOID Playback Sequencer
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Walks a montage plan with a chain of single-shot timers while the
// narration plays on its own. The transition table is a pure function;
// `Sequencer` owns the timer, audio handle and video surface and applies
// the effects the table asks for.

use crate::montage::planner::{Plan, PlanEntry};
use crate::montage::timer::{Timer, TimerId, VirtualTimer};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Playing { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerInput {
    Start,
    /// The current entry's timer fired.
    EntryElapsed,
    /// The narration reached its natural end.
    AudioEnded,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StartAudio,
    StopAudio,
    ShowEntry(usize),
    ScheduleEntryTimer(usize),
    CancelTimer,
    ClearSurface,
}

const TEARDOWN: [Effect; 3] = [Effect::CancelTimer, Effect::ClearSurface, Effect::StopAudio];

/// (state, input) -> (state, effects). Inputs that make no sense in a state
/// leave it unchanged with no effects.
pub fn transition(
    state: SequencerState,
    input: SequencerInput,
    entry_count: usize,
) -> (SequencerState, Vec<Effect>) {
    use SequencerInput::*;
    use SequencerState::*;

    match (state, input) {
        (Idle, Start) if entry_count > 0 => (
            Playing { index: 0 },
            vec![Effect::StartAudio, Effect::ShowEntry(0), Effect::ScheduleEntryTimer(0)],
        ),
        (Idle, _) => (Idle, Vec::new()),
        (Playing { index }, Start) => (Playing { index }, Vec::new()),
        (Playing { index }, EntryElapsed) if index + 1 < entry_count => (
            Playing { index: index + 1 },
            vec![Effect::ShowEntry(index + 1), Effect::ScheduleEntryTimer(index + 1)],
        ),
        (Playing { .. }, EntryElapsed | AudioEnded | Stop) => (Idle, TEARDOWN.to_vec()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub current_entry_index: usize,
    pub is_playing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(pub u64);

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("A playback session is already running")]
    AlreadyPlaying,

    #[error("The montage plan has no entries")]
    EmptyPlan,

    #[error("No narration audio is available")]
    NoAudio,

    #[error("Narration playback failed: {0}")]
    Audio(String),
}

/// The narration output. One active handle at a time.
pub trait AudioOutput {
    fn is_ready(&self) -> bool;

    /// Begin playback from time 0.
    fn play(&mut self) -> Result<AudioHandle, SequencerError>;

    /// Stop and release a playing handle.
    fn stop(&mut self, handle: AudioHandle);
}

/// Where clips are shown.
pub trait VideoSurface {
    /// Show `entry.clip` from `entry.start_offset` for at most `entry.play_duration`.
    fn show(&mut self, entry: &PlanEntry) -> std::io::Result<()>;

    /// Pause and unbind whatever is showing.
    fn clear(&mut self);
}

pub struct Sequencer<T: Timer, A: AudioOutput, V: VideoSurface> {
    plan: Plan,
    state: SequencerState,
    timer: T,
    audio: A,
    surface: V,
    pending_timer: Option<TimerId>,
    audio_handle: Option<AudioHandle>,
}

impl<T: Timer, A: AudioOutput, V: VideoSurface> Sequencer<T, A, V> {
    pub fn new(timer: T, audio: A, surface: V) -> Self {
        Self {
            plan: Plan::default(),
            state: SequencerState::Idle,
            timer,
            audio,
            surface,
            pending_timer: None,
            audio_handle: None,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn playback_state(&self) -> PlaybackState {
        match self.state {
            SequencerState::Idle => PlaybackState::default(),
            SequencerState::Playing { index } => PlaybackState {
                current_entry_index: index,
                is_playing: true,
            },
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, SequencerState::Playing { .. })
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn current_entry(&self) -> Option<&PlanEntry> {
        match self.state {
            SequencerState::Playing { index } => self.plan.entries.get(index),
            SequencerState::Idle => None,
        }
    }

    pub fn has_pending_timer(&self) -> bool {
        self.pending_timer.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_handle.is_some()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    /// Replace the plan. A running session is torn down first.
    pub fn set_plan(&mut self, plan: Plan) {
        if self.is_playing() {
            info!("[SEQUENCER] New plan supplied during playback; stopping current session.");
            self.stop();
        }
        self.plan = plan;
    }

    pub fn start(&mut self) -> Result<(), SequencerError> {
        if self.is_playing() {
            return Err(SequencerError::AlreadyPlaying);
        }
        if self.plan.is_empty() {
            return Err(SequencerError::EmptyPlan);
        }
        if !self.audio.is_ready() {
            return Err(SequencerError::NoAudio);
        }

        info!(
            "[SEQUENCER] Starting session: {} entries, {:.2}s",
            self.plan.len(),
            self.plan.covered_duration
        );
        if let Err(e) = self.feed(SequencerInput::Start) {
            // Leave nothing half-started behind
            self.release();
            self.state = SequencerState::Idle;
            return Err(e);
        }
        Ok(())
    }

    /// Always succeeds; stopping an idle sequencer is a no-op.
    pub fn stop(&mut self) {
        if self.is_playing() {
            info!("[SEQUENCER] Stop requested.");
        }
        let _ = self.feed(SequencerInput::Stop);
    }

    /// Deliver a timer fire. Ids other than the armed one are stale and ignored.
    pub fn timer_fired(&mut self, id: TimerId) {
        if self.pending_timer != Some(id) {
            debug!("[SEQUENCER] Ignoring stale timer {:?}", id);
            return;
        }
        self.pending_timer = None;
        self.timer.cancel(id);
        let _ = self.feed(SequencerInput::EntryElapsed);
    }

    /// Deliver the narration's natural end. Handles from earlier sessions are ignored.
    pub fn audio_finished(&mut self, handle: AudioHandle) {
        if self.audio_handle != Some(handle) {
            debug!("[SEQUENCER] Ignoring end of stale audio {:?}", handle);
            return;
        }
        info!("[SEQUENCER] Narration finished; ending session.");
        let _ = self.feed(SequencerInput::AudioEnded);
    }

    fn feed(&mut self, input: SequencerInput) -> Result<(), SequencerError> {
        let (next, effects) = transition(self.state, input, self.plan.len());
        self.state = next;
        for effect in effects {
            self.apply(effect)?;
        }
        Ok(())
    }

    fn apply(&mut self, effect: Effect) -> Result<(), SequencerError> {
        match effect {
            Effect::StartAudio => {
                if let Some(old) = self.audio_handle.take() {
                    self.audio.stop(old);
                }
                self.audio_handle = Some(self.audio.play()?);
            }
            Effect::StopAudio => {
                if let Some(handle) = self.audio_handle.take() {
                    self.audio.stop(handle);
                }
            }
            Effect::ShowEntry(index) => {
                if let Some(entry) = self.plan.entries.get(index) {
                    info!(
                        "[SEQUENCER] Entry {}/{}: {} @ {:.2}s for {:.2}s",
                        index + 1,
                        self.plan.len(),
                        entry.clip.name,
                        entry.start_offset,
                        entry.play_duration
                    );
                    if let Err(e) = self.surface.show(entry) {
                        // Keep the timeline moving so visuals stay aligned with the narration
                        warn!("[SEQUENCER] Could not show {}: {}", entry.clip.name, e);
                    }
                }
            }
            Effect::ScheduleEntryTimer(index) => {
                if let Some(old) = self.pending_timer.take() {
                    self.timer.cancel(old);
                }
                if let Some(entry) = self.plan.entries.get(index) {
                    let after = Duration::from_secs_f64(entry.play_duration.max(0.0));
                    self.pending_timer = Some(self.timer.schedule(after));
                }
            }
            Effect::CancelTimer => {
                if let Some(id) = self.pending_timer.take() {
                    self.timer.cancel(id);
                }
            }
            Effect::ClearSurface => self.surface.clear(),
        }
        Ok(())
    }

    fn release(&mut self) {
        for effect in TEARDOWN {
            let _ = self.apply(effect);
        }
    }
}

impl<A: AudioOutput, V: VideoSurface> Sequencer<VirtualTimer, A, V> {
    /// Move the virtual clock forward, delivering every timer that comes due
    /// on the way in order.
    pub fn advance(&mut self, by: Duration) {
        let target = self.timer.now() + by;
        while let Some(id) = self.timer.pop_due(target) {
            self.timer_fired(id);
        }
        self.timer.settle(target);
    }

    pub fn elapsed(&self) -> Duration {
        self.timer.now()
    }
}

impl<T: Timer, A: AudioOutput, V: VideoSurface> Drop for Sequencer<T, A, V> {
    fn drop(&mut self) {
        self.stop();
    }
}
