//! Error types for scheduler operations.

use thiserror::Error;

/// Errors returned by the rendezvous operations (`AwaitStart`, `Complete`,
/// the two-argument `EstimatePosition`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// No pending upload exists for this (username, filename) pair.
    ///
    /// Returned when the caller's view of pending uploads is out of sync
    /// with the scheduler; the caller should abort the transfer and
    /// resynchronize rather than retry blindly.
    #[error("no pending upload for {username}/{filename}")]
    NotEnqueued { username: String, filename: String },
}

/// Errors returned by the Configurator's validation step.
///
/// A `ConfigError` never reaches a transfer operation: on failure the
/// scheduler logs the reason and keeps its last-good group table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The global slot count was negative.
    #[error("global slot count must be non-negative")]
    NegativeGlobalSlots,

    /// A group's slot count was negative.
    #[error("group {name:?} has a negative slot count")]
    NegativeGroupSlots {
        /// Name of the offending group.
        name: String,
    },

    /// A group's strategy string did not parse as `FirstInFirstOut` or `RoundRobin`.
    #[error("unrecognized strategy {raw:?} for group {name:?}")]
    UnknownStrategy {
        /// Name of the offending group.
        name: String,
        /// The raw, unparsed strategy string.
        raw: String,
    },
    /// A non-privileged group claimed priority 0.
    #[error("group {name:?} may not use priority 0, which is reserved for the privileged group")]
    PriorityZeroCollision {
        /// Name of the offending group.
        name: String,
    },

    /// A `user_defined` entry reused a reserved group name.
    #[error("group name {name:?} is reserved and may not appear in user_defined")]
    ReservedGroupName {
        /// The reserved name a `user_defined` entry tried to claim.
        name: String,
    },
}
