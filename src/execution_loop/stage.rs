//! Pipeline stages and the transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Repair attempts allowed before the pipeline gives up.
pub const MAX_REPAIR_ATTEMPTS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Generate,
    Validate,
    Execute,
    Repair,
    Summarize,
    Terminal(Outcome),
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Terminal(_))
    }

    /// Progress label for front ends.
    pub fn status_label(self) -> &'static str {
        match self {
            Stage::Generate => "Generating SQL...",
            Stage::Validate => "Validating Security...",
            Stage::Execute => "Executing Query...",
            Stage::Repair => "Fixing Error...",
            Stage::Summarize => "Summarizing Results...",
            Stage::Terminal(Outcome::Success) => "Done.",
            Stage::Terminal(Outcome::Failure) => "Gave up.",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Generate => write!(f, "generate"),
            Stage::Validate => write!(f, "validate"),
            Stage::Execute => write!(f, "execute"),
            Stage::Repair => write!(f, "repair"),
            Stage::Summarize => write!(f, "summarize"),
            Stage::Terminal(Outcome::Success) => write!(f, "end_success"),
            Stage::Terminal(Outcome::Failure) => write!(f, "end_fail"),
        }
    }
}

/// What a stage reports when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageReport {
    Generated,
    Valid,
    Invalid,
    Executed,
    ExecutionFailed,
    Repaired,
    Exhausted,
    Summarized,
}

/// The whole control flow. Each report names exactly one successor.
pub fn transition(report: StageReport) -> Stage {
    match report {
        StageReport::Generated => Stage::Validate,
        StageReport::Valid => Stage::Execute,
        StageReport::Invalid => Stage::Repair,
        StageReport::Executed => Stage::Summarize,
        StageReport::ExecutionFailed => Stage::Repair,
        StageReport::Repaired => Stage::Validate,
        StageReport::Exhausted => Stage::Terminal(Outcome::Failure),
        StageReport::Summarized => Stage::Terminal(Outcome::Success),
    }
}

/// Whether a repair pass is still allowed at `retry_count`.
pub fn can_repair(retry_count: u8) -> bool {
    retry_count < MAX_REPAIR_ATTEMPTS
}
