// SYNOID Montage Studio State
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// The generate -> register clips -> build montage workflow. Any change to
// the narration or the clip inventory invalidates the current plan.

use crate::generation::{NarrationAudio, NarrationFailure};
use crate::inventory::ClipInventory;
use crate::montage::{MontagePlanner, Plan, PlanAdvisory};
use rand::Rng;
use tracing::{info, warn};

pub const MISSING_INPUTS_MESSAGE: &str = "Generate narration audio and register video clips first.";

#[derive(Debug, Default)]
pub struct StudioState {
    pub story: Option<String>,
    pub narration: Option<NarrationAudio>,
    pub inventory: ClipInventory,
    pub plan: Option<Plan>,
    /// Last error or warning to show the user.
    pub message: Option<String>,
    pub is_generating: bool,
}

impl StudioState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn narration_duration(&self) -> f64 {
        self.narration.as_ref().map(|a| a.duration_secs()).unwrap_or(0.0)
    }

    pub fn can_build_montage(&self) -> bool {
        self.narration_duration() > 0.0 && !self.inventory.is_empty()
    }

    /// Reset everything a fresh generation replaces.
    pub fn begin_generation(&mut self) {
        self.is_generating = true;
        self.story = None;
        self.narration = None;
        self.plan = None;
        self.message = None;
    }

    pub fn narration_ready(&mut self, story: String, audio: NarrationAudio) {
        info!("[STUDIO] Narration ready: {:.2}s", audio.duration_secs());
        self.story = Some(story);
        self.narration = Some(audio);
        self.is_generating = false;
    }

    /// Record a failed generation. The story is kept if it was produced.
    pub fn generation_failed(&mut self, story: Option<String>, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("[STUDIO] Generation failed: {}", reason);
        self.story = story;
        self.narration = None;
        self.message = Some(reason);
        self.is_generating = false;
    }

    /// Record the outcome of a story-then-speech run. Returns whether narration is ready.
    pub fn finish_generation(&mut self, outcome: Result<(String, NarrationAudio), NarrationFailure>) -> bool {
        match outcome {
            Ok((story, audio)) => {
                self.narration_ready(story, audio);
                true
            }
            Err(failure) => {
                self.generation_failed(failure.story, failure.source.to_string());
                false
            }
        }
    }

    pub fn replace_clips(&mut self, inventory: ClipInventory) {
        info!("[STUDIO] {} clips registered; montage plan cleared.", inventory.len());
        self.inventory = inventory;
        self.plan = None;
    }

    /// Plan a montage over the current clips. Returns the new plan, or `None`
    /// with `message` set when inputs are missing.
    pub fn build_montage<R: Rng>(&mut self, planner: &mut MontagePlanner<R>) -> Option<&Plan> {
        if !self.can_build_montage() {
            warn!("[STUDIO] {}", MISSING_INPUTS_MESSAGE);
            self.message = Some(MISSING_INPUTS_MESSAGE.to_string());
            return None;
        }

        let plan = planner.plan(self.inventory.clips(), self.narration_duration());
        self.message = match &plan.advisory {
            Some(advisory @ PlanAdvisory::Shortfall { .. }) => Some(advisory.to_string()),
            _ => None,
        };
        self.plan = Some(plan);
        self.plan.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use crate::inventory::Clip;

    fn narration(secs: u32) -> NarrationAudio {
        NarrationAudio {
            samples: vec![0; (secs * 24_000) as usize],
            sample_rate: 24_000,
            channels: 1,
        }
    }

    fn inventory(durations: &[f64]) -> ClipInventory {
        ClipInventory::new(
            durations
                .iter()
                .map(|d| Clip::new("clip.mp4", *d).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_missing_inputs_block_montage() {
        let mut state = StudioState::new();
        let mut planner = MontagePlanner::seeded(3);
        assert!(state.build_montage(&mut planner).is_none());
        assert_eq!(state.message.as_deref(), Some(MISSING_INPUTS_MESSAGE));

        state.narration_ready("story".into(), narration(4));
        assert!(state.build_montage(&mut planner).is_none());
    }

    #[test]
    fn test_new_clips_drop_plan() {
        let mut state = StudioState::new();
        state.narration_ready("story".into(), narration(4));
        state.replace_clips(inventory(&[3.0, 3.0]));

        let mut planner = MontagePlanner::seeded(3);
        assert!(state.build_montage(&mut planner).is_some());
        assert!(state.message.is_none());

        state.replace_clips(inventory(&[1.0]));
        assert!(state.plan.is_none());
    }

    #[test]
    fn test_shortfall_becomes_warning() {
        let mut state = StudioState::new();
        state.narration_ready("story".into(), narration(10));
        state.replace_clips(inventory(&[3.0, 3.0]));

        let covered = state
            .build_montage(&mut MontagePlanner::seeded(5))
            .map(|p| p.covered_duration);
        assert_eq!(covered, Some(6.0));
        assert_eq!(
            state.message.as_deref(),
            Some("Warning: narration (10.0s) is longer than the total clip footage (6.0s).")
        );
    }

    #[test]
    fn test_begin_generation_resets() {
        let mut state = StudioState::new();
        state.narration_ready("story".into(), narration(2));
        state.replace_clips(inventory(&[5.0]));
        state.build_montage(&mut MontagePlanner::seeded(1));
        state.message = Some("old".into());

        state.begin_generation();
        assert!(state.is_generating);
        assert!(state.story.is_none());
        assert!(state.narration.is_none());
        assert!(state.plan.is_none());
        assert!(state.message.is_none());
        assert_eq!(state.inventory.len(), 1);
    }

    #[test]
    fn test_speech_failure_keeps_story() {
        let mut state = StudioState::new();
        state.begin_generation();
        let ready = state.finish_generation(Err(NarrationFailure {
            story: Some("A robot finds its way home.".into()),
            source: GenerationError::Blocked("Finish reason: SAFETY.".into()),
        }));

        assert!(!ready);
        assert!(!state.is_generating);
        assert_eq!(state.story.as_deref(), Some("A robot finds its way home."));
        assert!(state.narration.is_none());
        assert_eq!(state.message.as_deref(), Some("Finish reason: SAFETY."));
    }

    #[test]
    fn test_story_failure_leaves_no_story() {
        let mut state = StudioState::new();
        state.begin_generation();
        let ready = state.finish_generation(Err(GenerationError::MissingApiKey.into()));

        assert!(!ready);
        assert!(state.story.is_none());
        assert!(state.message.is_some());
    }

    #[test]
    fn test_successful_generation_is_ready() {
        let mut state = StudioState::new();
        state.begin_generation();
        assert!(state.finish_generation(Ok(("story".into(), narration(3)))));
        assert_eq!(state.narration_duration(), 3.0);
        assert!(!state.is_generating);
    }
}
