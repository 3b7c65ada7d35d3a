// SYNOID Montage Export
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Flattens a plan into the JSON record list an out-of-process renderer
// consumes. This is the only artifact the montage pipeline writes.

use crate::inventory::ClipId;
use crate::montage::planner::Plan;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: the plan has no entries")]
    EmptyPlan,

    #[error("Failed to serialize plan: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write plan: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub clip_id: ClipId,
    pub source: PathBuf,
    pub start_offset: f64,
    pub play_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExport {
    pub clips: Vec<ExportedEntry>,
    pub total_duration: f64,
}

impl From<&Plan> for PlanExport {
    fn from(plan: &Plan) -> Self {
        Self {
            clips: plan
                .entries
                .iter()
                .map(|e| ExportedEntry {
                    clip_id: e.clip.id,
                    source: e.clip.source.clone(),
                    start_offset: e.start_offset,
                    play_duration: e.play_duration,
                })
                .collect(),
            total_duration: plan.covered_duration,
        }
    }
}

impl PlanExport {
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serialize `plan` to `path`.
pub fn write_plan(plan: &Plan, path: &Path) -> Result<PlanExport, ExportError> {
    if plan.is_empty() {
        return Err(ExportError::EmptyPlan);
    }
    let export = PlanExport::from(plan);
    fs::write(path, export.to_json()?)?;
    info!(
        "[EXPORT] Plan written ({} entries, {:.2}s): {:?}",
        export.clips.len(),
        export.total_duration,
        path
    );
    Ok(export)
}
