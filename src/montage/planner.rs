// SYNOID Montage Planner
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Shuffles the clip inventory and greedily fills the narration duration.
// Every clip is used at most once, from its start, never split.

use crate::inventory::Clip;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Leftover narration below this is float noise, not a gap.
const REMAINING_EPSILON: f64 = 1e-9;

/// One scheduled segment of a montage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub clip: Clip,
    pub start_offset: f64,
    pub play_duration: f64,
}

/// Non-fatal conditions the caller should show to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanAdvisory {
    NoClips,
    NoNarration,
    Shortfall { available: f64, target: f64, missing: f64 },
}

impl fmt::Display for PlanAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAdvisory::NoClips => write!(f, "No video clips available to build a montage."),
            PlanAdvisory::NoNarration => {
                write!(f, "Narration audio has no duration; nothing to cover.")
            }
            PlanAdvisory::Shortfall { available, target, .. } => write!(
                f,
                "Warning: narration ({:.1}s) is longer than the total clip footage ({:.1}s).",
                target, available
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
    pub target_duration: f64,
    pub covered_duration: f64,
    #[serde(skip)]
    pub advisory: Option<PlanAdvisory>,
}

impl Plan {
    pub fn empty(target_duration: f64, advisory: PlanAdvisory) -> Self {
        Self {
            entries: Vec::new(),
            target_duration,
            covered_duration: 0.0,
            advisory: Some(advisory),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Seconds of narration left uncovered.
    pub fn shortfall(&self) -> f64 {
        (self.target_duration - self.covered_duration).max(0.0)
    }
}

/// Greedy fill over an already-ordered clip list.
///
/// Deterministic: the same order and target always give the same entries.
pub fn fit_to_duration(ordered: &[Clip], target_duration: f64) -> Plan {
    if !target_duration.is_finite() || target_duration <= 0.0 {
        return Plan::empty(target_duration.max(0.0), PlanAdvisory::NoNarration);
    }
    if ordered.is_empty() {
        return Plan::empty(target_duration, PlanAdvisory::NoClips);
    }

    let mut entries = Vec::new();
    let mut remaining = target_duration;

    for clip in ordered {
        if remaining <= REMAINING_EPSILON {
            break;
        }
        let play_duration = clip.duration.min(remaining);
        entries.push(PlanEntry {
            clip: clip.clone(),
            start_offset: 0.0,
            play_duration,
        });
        remaining -= play_duration;
    }

    let covered_duration: f64 = entries.iter().map(|e| e.play_duration).sum();
    let available: f64 = ordered.iter().map(|c| c.duration).sum();

    let advisory = if available < target_duration {
        Some(PlanAdvisory::Shortfall {
            available,
            target: target_duration,
            missing: target_duration - available,
        })
    } else {
        None
    };

    Plan {
        entries,
        target_duration,
        covered_duration,
        advisory,
    }
}

/// Montage planner with an injectable random source.
pub struct MontagePlanner<R: Rng> {
    rng: R,
}

impl MontagePlanner<StdRng> {
    /// Reproducible planner for tests and `--seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> MontagePlanner<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform Fisher-Yates permutation of the clips.
    pub fn shuffle(&mut self, clips: &[Clip]) -> Vec<Clip> {
        let mut order = clips.to_vec();
        order.shuffle(&mut self.rng);
        order
    }

    pub fn plan(&mut self, clips: &[Clip], target_duration: f64) -> Plan {
        let order = self.shuffle(clips);
        let plan = fit_to_duration(&order, target_duration);

        info!(
            "[PLANNER] {} of {} clips cover {:.2}s / {:.2}s",
            plan.len(),
            clips.len(),
            plan.covered_duration,
            plan.target_duration
        );
        if let Some(advisory) = &plan.advisory {
            warn!("[PLANNER] {}", advisory);
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn clips(durations: &[f64]) -> Vec<Clip> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| Clip::new(format!("clip_{}.mp4", i), *d).unwrap())
            .collect()
    }

    #[test]
    fn test_three_fives_cover_twelve() {
        let inventory = clips(&[5.0, 5.0, 5.0]);
        let plan = MontagePlanner::seeded(7).plan(&inventory, 12.0);

        assert_eq!(plan.covered_duration, 12.0);
        let sum: f64 = plan.entries.iter().map(|e| e.play_duration).sum();
        assert_eq!(sum, 12.0);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.entries[2].play_duration, 2.0);
        assert!(plan.advisory.is_none());
    }

    #[test]
    fn test_shortfall_is_reported() {
        let inventory = clips(&[3.0, 3.0]);
        let plan = MontagePlanner::seeded(1).plan(&inventory, 10.0);

        assert_eq!(plan.covered_duration, 6.0);
        assert_eq!(plan.shortfall(), 4.0);
        match plan.advisory {
            Some(PlanAdvisory::Shortfall { missing, .. }) => assert_eq!(missing, 4.0),
            other => panic!("expected shortfall, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_inventory_yields_empty_plan() {
        let plan = MontagePlanner::seeded(0).plan(&[], 8.0);
        assert!(plan.is_empty());
        assert_eq!(plan.covered_duration, 0.0);
        assert_eq!(plan.advisory, Some(PlanAdvisory::NoClips));
    }

    #[test]
    fn test_zero_target_yields_no_narration() {
        let plan = fit_to_duration(&clips(&[2.0]), 0.0);
        assert!(plan.is_empty());
        assert_eq!(plan.advisory, Some(PlanAdvisory::NoNarration));
    }

    #[test]
    fn test_exact_fit_ends_plan() {
        let ordered = clips(&[4.0, 6.0, 9.0]);
        let plan = fit_to_duration(&ordered, 10.0);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.entries[1].play_duration, 6.0);
        assert_eq!(plan.entries[1].clip.id, ordered[1].id);
    }

    #[test]
    fn test_fixed_order_is_deterministic() {
        let ordered = clips(&[2.5, 7.0, 1.0, 4.0]);
        let a = fit_to_duration(&ordered, 9.0);
        let b = fit_to_duration(&ordered, 9.0);
        assert_eq!(a, b);
        assert_eq!(a.entries[1].play_duration, 6.5);
    }

    #[test]
    fn test_same_seed_same_plan() {
        let inventory = clips(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let a = MontagePlanner::seeded(42).plan(&inventory, 11.0);
        let b = MontagePlanner::seeded(42).plan(&inventory, 11.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_coverage_and_uniqueness_properties() {
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let count = rng.gen_range(1..8);
            let durations: Vec<f64> = (0..count).map(|_| rng.gen_range(0.5..10.0)).collect();
            let target = rng.gen_range(0.5..40.0);
            let inventory = clips(&durations);

            let plan = MontagePlanner::seeded(seed).plan(&inventory, target);
            let total: f64 = durations.iter().sum();

            assert!(plan.covered_duration <= target + 1e-9);
            if total >= target {
                assert!((plan.covered_duration - target).abs() < 1e-6);
            }
            assert!(plan.len() <= inventory.len());

            let ids: HashSet<_> = plan.entries.iter().map(|e| e.clip.id).collect();
            assert_eq!(ids.len(), plan.len());
            for entry in &plan.entries {
                assert_eq!(entry.start_offset, 0.0);
                assert!(entry.play_duration > 0.0);
                assert!(entry.play_duration <= entry.clip.duration);
            }
        }
    }

    #[test]
    fn test_shuffle_reaches_every_permutation() {
        let inventory = clips(&[1.0, 1.0, 1.0]);
        let mut planner = MontagePlanner::seeded(99);
        let mut seen = HashSet::new();
        for _ in 0..300 {
            let order: Vec<_> = planner.shuffle(&inventory).iter().map(|c| c.id).collect();
            seen.insert(order);
        }
        assert_eq!(seen.len(), 6);
    }
}
