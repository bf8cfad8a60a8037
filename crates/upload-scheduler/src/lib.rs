//! Priority- and fairness-aware admission scheduler for peer upload dispatch
//!
//! Tracks pending uploads per user, admits at most one upload per call into
//! a group's slots using that group's configured ordering strategy, and
//! notifies the waiting caller once its slot is granted.
//!
//! # Features
//!
//! - **Priority groups**: a hard-coded, always-present `privileged` group at
//!   priority 0, plus any number of operator-defined groups below it
//! - **Per-group strategy**: `FirstInFirstOut` or `RoundRobin`, chosen
//!   independently for each group
//! - **Hot reconfiguration**: group definitions can be replaced at runtime;
//!   in-flight uploads keep their slot across a reconfiguration that leaves
//!   their group intact
//! - **Rendezvous completion**: callers await a future that resolves only
//!   when the Admission Loop actually releases their upload, never on a
//!   timer or poll
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use upload_scheduler::{SchedulerConfig, UploadScheduler};
//! use upload_scheduler::testing::MapUserService;
//!
//! #[tokio::main]
//! async fn main() {
//!     let users = Arc::new(MapUserService::new([
//!         ("alice".to_string(), "default".to_string()),
//!     ]));
//!     let scheduler = UploadScheduler::new(SchedulerConfig::single_slot_default(), users).unwrap();
//!
//!     scheduler.enqueue("alice", "report.bin").await;
//!     let awaiting = scheduler.await_start("alice", "report.bin").await.unwrap();
//!     awaiting.await;
//!     scheduler.complete("alice", "report.bin").await.unwrap();
//! }
//! ```

mod collaborators;
mod completion;
mod config;
mod configurator;
mod error;
mod group;
mod invariants;
mod metrics;
mod registry;
mod scheduler;
mod strategy;

pub use collaborators::{testing, ConfigSource, UserService};
pub use completion::Awaiting;
pub use config::{GroupConfig, SchedulerConfig};
pub use error::{ConfigError, SchedulerError};
pub use group::{Group, PRIVILEGED_GROUP};
pub use metrics::{MetricsSnapshot, SchedulerMetrics};
pub use scheduler::UploadScheduler;
pub use strategy::Strategy;
