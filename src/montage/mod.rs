// SYNOID Montage Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod export;
pub mod planner;
pub mod preview;
pub mod sequencer;
pub mod timer;

pub use export::{write_plan, PlanExport};
pub use planner::{fit_to_duration, MontagePlanner, Plan, PlanAdvisory, PlanEntry};
pub use sequencer::{Sequencer, SequencerError, SequencerState};
