// SYNOID Clip Inventory
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Holds the probed metadata for every registered video clip. The planner
// only ever reads from here; entries are never mutated after probing.

pub mod probe;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub use probe::{probe_duration, scan_directory_for_videos, ProbeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One registered video with a known playable duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    /// Playable duration in seconds, always > 0.
    pub duration: f64,
    pub source: PathBuf,
}

impl Clip {
    /// Returns `None` for durations that cannot be played (zero, negative, NaN).
    pub fn new(source: impl Into<PathBuf>, duration: f64) -> Option<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return None;
        }
        let source = source.into();
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string_lossy().into_owned());
        Some(Self {
            id: ClipId::new(),
            name,
            duration,
            source,
        })
    }
}

/// A file that could not be turned into a clip.
#[derive(Debug, Clone)]
pub struct ProbeFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClipInventory {
    clips: Vec<Clip>,
}

impl ClipInventory {
    pub fn new(clips: Vec<Clip>) -> Self {
        Self { clips }
    }

    /// Build an inventory from per-file probe outcomes. Failures are kept
    /// aside so one bad file never sinks the batch.
    pub fn from_probe_results<I>(results: I) -> (Self, Vec<ProbeFailure>)
    where
        I: IntoIterator<Item = (PathBuf, Result<f64, ProbeError>)>,
    {
        let mut clips = Vec::new();
        let mut failures = Vec::new();

        for (path, outcome) in results {
            match outcome {
                Ok(duration) => match Clip::new(path.clone(), duration) {
                    Some(clip) => clips.push(clip),
                    None => failures.push(ProbeFailure {
                        reason: format!("unplayable duration {}", duration),
                        path,
                    }),
                },
                Err(e) => failures.push(ProbeFailure {
                    path,
                    reason: e.to_string(),
                }),
            }
        }

        (Self { clips }, failures)
    }

    /// Probe every file concurrently with ffprobe.
    pub async fn probe_files(paths: Vec<PathBuf>) -> (Self, Vec<ProbeFailure>) {
        let mut set = tokio::task::JoinSet::new();
        for (idx, path) in paths.into_iter().enumerate() {
            set.spawn(async move {
                let outcome = probe_duration(&path).await;
                (idx, path, outcome)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(r) => results.push(r),
                Err(e) => warn!("[PROBE] Probe task aborted: {}", e),
            }
        }
        // Keep the caller's file order regardless of completion order
        results.sort_by_key(|(idx, _, _)| *idx);

        let (inventory, failures) =
            Self::from_probe_results(results.into_iter().map(|(_, p, o)| (p, o)));

        for failure in &failures {
            warn!("[PROBE] Skipping {:?}: {}", failure.path, failure.reason);
        }
        info!(
            "[PROBE] Inventory ready: {} clips ({:.2}s of footage)",
            inventory.len(),
            inventory.total_duration()
        );

        (inventory, failures)
    }

    /// Scan a directory and probe every video found in it.
    pub async fn probe_directory(dir: &Path) -> (Self, Vec<ProbeFailure>) {
        let paths = scan_directory_for_videos(dir);
        Self::probe_files(paths).await
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.duration).sum()
    }

    pub fn contains(&self, id: ClipId) -> bool {
        self.clips.iter().any(|c| c.id == id)
    }
}
