//! Per-group ordering discipline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordering discipline applied when choosing among a group's ready uploads.
///
/// This is a closed, two-variant enum rather than a plugin point (see
/// DESIGN.md) — a new strategy is a language change, not a runtime one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Release in enqueue order.
    FirstInFirstOut,
    /// Release in ready order, giving each user's oldest ready upload an
    /// equal turn (see `Estimator::estimate_position` for the fairness
    /// accounting this implies).
    RoundRobin,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::FirstInFirstOut => write!(f, "FirstInFirstOut"),
            Strategy::RoundRobin => write!(f, "RoundRobin"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    /// Parses a strategy name case-insensitively, accepting both the
    /// `CamelCase` and lowercase/underscore/hyphen spellings of each
    /// variant.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "firstinfirstout" | "fifo" => Ok(Strategy::FirstInFirstOut),
            "roundrobin" | "round_robin" | "round-robin" => Ok(Strategy::RoundRobin),
            other => Err(other.to_string()),
        }
    }
}
