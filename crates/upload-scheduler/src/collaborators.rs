//! External collaborator interfaces.
//!
//! Group membership and configuration are owned by systems outside this
//! crate; these traits are the boundary the scheduler calls across. Both
//! are object-safe and held as `Arc<dyn Trait>`, matching this codebase's
//! `Arc<dyn SpanExporterBoxed>` convention for a swappable external
//! collaborator.

/// Maps a peer username to its current group name.
///
/// The scheduler calls this once per user per Admission Loop invocation and
/// treats the answer as authoritative for that invocation only — the answer
/// may differ on the next call.
pub trait UserService: Send + Sync {
    /// Returns the name of the group `username` currently belongs to, or
    /// `None` if the user is unknown to the service (their ready uploads are
    /// then silently skipped by the Admission Loop until they are known).
    fn group_of(&self, username: &str) -> Option<String>;
}

/// Supplies configuration snapshots to the Configurator.
///
/// The scheduler does not poll this itself — `ConfigSource` is consumed by
/// whatever task owns the change notification, edge-triggered or polled;
/// that task calls [`crate::UploadScheduler::reconfigure`] with the
/// snapshot.
pub trait ConfigSource: Send + Sync {
    /// Returns the current configuration snapshot.
    fn snapshot(&self) -> crate::config::SchedulerConfig;
}

/// Simple in-memory test doubles for [`UserService`] and [`ConfigSource`].
///
/// Mirrors this codebase's `TestExporter`/`StdoutExporter` convention of
/// keeping lightweight stand-ins for external collaborators alongside the
/// trait definitions, for use in tests and the demo binary.
pub mod testing {
    use super::{ConfigSource, UserService};
    use crate::config::SchedulerConfig;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// A `UserService` backed by an in-memory, mutable map.
    ///
    /// Mutability after construction exists so tests can simulate a user
    /// being reassigned to a different group between `Enqueue` and release.
    #[derive(Default)]
    pub struct MapUserService {
        groups: RwLock<HashMap<String, String>>,
    }

    impl MapUserService {
        /// Creates a service from an initial username -> group-name map.
        pub fn new(initial: impl IntoIterator<Item = (String, String)>) -> Self {
            Self {
                groups: RwLock::new(initial.into_iter().collect()),
            }
        }

        /// Reassigns `username` to `group`, taking effect for the next
        /// Admission Loop invocation that looks them up.
        pub fn set_group(&self, username: &str, group: &str) {
            self.groups
                .write()
                .unwrap()
                .insert(username.to_string(), group.to_string());
        }

        /// Removes `username` from the service, simulating a peer the
        /// configuration no longer recognizes.
        pub fn remove(&self, username: &str) {
            self.groups.write().unwrap().remove(username);
        }
    }

    impl UserService for MapUserService {
        fn group_of(&self, username: &str) -> Option<String> {
            self.groups.read().unwrap().get(username).cloned()
        }
    }

    /// A `ConfigSource` that always returns the same fixed snapshot, plus
    /// the ability to swap it for the next `snapshot()` call, simulating a
    /// configuration reload.
    pub struct StaticConfigSource {
        current: RwLock<SchedulerConfig>,
    }

    impl StaticConfigSource {
        pub fn new(config: SchedulerConfig) -> Self {
            Self {
                current: RwLock::new(config),
            }
        }

        /// Replaces the snapshot returned by subsequent calls.
        pub fn replace(&self, config: SchedulerConfig) {
            *self.current.write().unwrap() = config;
        }
    }

    impl ConfigSource for StaticConfigSource {
        fn snapshot(&self) -> SchedulerConfig {
            self.current.read().unwrap().clone()
        }
    }
}
