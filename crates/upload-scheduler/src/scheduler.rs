//! The `UploadScheduler` public API and the Admission Loop.

use crate::collaborators::UserService;
use crate::completion::{Awaiting, Completion};
use crate::config::SchedulerConfig;
use crate::configurator;
use crate::error::{ConfigError, SchedulerError};
use crate::group::{GroupTable, PRIVILEGED_GROUP};
use crate::invariants::{
    debug_assert_pin_matches_existing_group, debug_assert_within_global_cap,
    debug_assert_within_group_cap,
};
use crate::metrics::SchedulerMetrics;
use crate::registry::{Registry, Upload};
use crate::strategy::Strategy;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// A priority- and fairness-aware admission scheduler for peer upload
/// dispatch.
///
/// All mutating operations — `enqueue`, `await_start`, `complete`,
/// `reconfigure` — and all read-only Estimator queries acquire a single
/// internal lock, mutate or inspect state, and release it before returning
/// or awaiting anything else. The Admission Loop itself never holds the
/// lock across an `.await`.
pub struct UploadScheduler {
    user_service: Arc<dyn UserService>,
    state: Mutex<SchedulerState>,
    metrics: SchedulerMetrics,
}

struct SchedulerState {
    registry: Registry,
    groups: GroupTable,
    last_options_hash: Option<u64>,
    last_global_slots: Option<i64>,
}

/// An upload the Admission Loop decided to release, plus the bookkeeping
/// needed to log and signal it after the lock is dropped.
struct Released {
    username: String,
    filename: String,
    group: String,
    completion: Completion,
}

struct Candidate {
    username: String,
    filename: String,
    enqueued_at: Instant,
    ready_at: Instant,
}

impl UploadScheduler {
    /// Builds a scheduler from an initial configuration and a `UserService`.
    ///
    /// Fails if `config` itself is invalid (negative slot counts, an
    /// unparseable strategy, or a non-privileged group claiming priority 0).
    pub fn new(
        config: SchedulerConfig,
        user_service: Arc<dyn UserService>,
    ) -> Result<Self, ConfigError> {
        let groups = GroupTable::rebuild(&config, None)?;
        let last_options_hash = Some(configurator::group_options_hash(&config));
        Ok(Self {
            user_service,
            state: Mutex::new(SchedulerState {
                registry: Registry::new(),
                groups,
                last_options_hash,
                last_global_slots: Some(config.global_slots),
            }),
            metrics: SchedulerMetrics::default(),
        })
    }

    /// Cumulative activity counters.
    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    /// Registers a new pending upload for `username`/`filename`.
    ///
    /// Never fails: duplicate `(username, filename)` pairs are distinct
    /// queue entries, each tracked and released independently. Has no
    /// return value — the completion future is obtained later, from
    /// `await_start`.
    pub async fn enqueue(&self, username: &str, filename: &str) {
        let released = {
            let mut state = self.state.lock().await;
            state.registry.add(username, filename, Instant::now());
            self.metrics.record_enqueued();
            self.run_admission_loop(&mut state)
        };
        self.finish_admission(released);
    }

    /// Marks a previously enqueued upload ready for dispatch and returns a
    /// future that resolves when the Admission Loop releases it.
    ///
    /// Fails with [`SchedulerError::NotEnqueued`] if no pending upload
    /// matches `(username, filename)`.
    ///
    /// # Panics
    ///
    /// Panics if called twice for the same upload.
    pub async fn await_start(
        &self,
        username: &str,
        filename: &str,
    ) -> Result<Awaiting, SchedulerError> {
        let (awaiting, released) = {
            let mut state = self.state.lock().await;
            let upload = state
                .registry
                .find_mut(username, filename)
                .ok_or_else(|| not_enqueued(username, filename))?;
            upload.ready_at = Some(Instant::now());
            let awaiting = upload.claim_awaiting();
            let released = self.run_admission_loop(&mut state);
            (awaiting, released)
        };
        self.finish_admission(released);
        Ok(awaiting)
    }

    /// Reports that a transfer has finished, freeing its group's slot (if
    /// the upload had been released) and removing it from tracking.
    ///
    /// Fails with [`SchedulerError::NotEnqueued`] if no pending or active
    /// upload matches `(username, filename)`.
    pub async fn complete(&self, username: &str, filename: &str) -> Result<(), SchedulerError> {
        let released = {
            let mut state = self.state.lock().await;
            let upload = state
                .registry
                .remove(username, filename)
                .ok_or_else(|| not_enqueued(username, filename))?;

            if let Some(group_name) = upload.pinned_group.as_deref() {
                match state.groups.get_mut(group_name) {
                    Some(group) => group.used_slots -= 1,
                    None => {
                        self.metrics.record_orphaned_slot();
                        warn!(
                            group = group_name,
                            "completed upload's pinned group no longer exists; slot discarded"
                        );
                    }
                }
            }
            self.metrics.record_completed();
            self.run_admission_loop(&mut state)
        };
        self.finish_admission(released);
        Ok(())
    }

    /// Applies a new configuration snapshot.
    ///
    /// A no-op, recorded as a skipped reconfiguration, if the group
    /// definitions and global slot count are unchanged from the last
    /// applied configuration. Rejects (and keeps the previous table) if the
    /// new configuration is invalid.
    pub async fn reconfigure(&self, config: SchedulerConfig) -> Result<(), ConfigError> {
        let released = {
            let mut state = self.state.lock().await;
            let hash = configurator::group_options_hash(&config);
            let unchanged = state.last_options_hash == Some(hash)
                && state.last_global_slots == Some(config.global_slots);
            if unchanged {
                self.metrics.record_reconfigure_skipped();
                trace!("reconfigure: configuration unchanged, skipping");
                return Ok(());
            }

            match GroupTable::rebuild(&config, Some(&state.groups)) {
                Ok(table) => {
                    state.groups = table;
                    state.last_options_hash = Some(hash);
                    state.last_global_slots = Some(config.global_slots);
                    self.metrics.record_reconfigure_applied();
                    debug!("reconfigure: applied new group table");
                    self.run_admission_loop(&mut state)
                }
                Err(err) => {
                    self.metrics.record_reconfigure_rejected();
                    warn!(error = %err, "reconfigure: rejected, keeping previous group table");
                    return Err(err);
                }
            }
        };
        self.finish_admission(released);
        Ok(())
    }

    /// Reports whether `username`'s current group has a free slot right now.
    ///
    /// A user the `UserService` does not recognize never has a free slot.
    pub async fn is_slot_available(&self, username: &str) -> bool {
        let state = self.state.lock().await;
        self.slot_available_locked(&state, username)
    }

    /// A cheap proxy for `username`'s queue position: `0` if a slot is
    /// immediately available to them, otherwise the number of uploads
    /// currently tracked for `username` (their own queue depth stands in
    /// for the group-wide count — see DESIGN.md).
    pub async fn estimate_position(&self, username: &str) -> i64 {
        let state = self.state.lock().await;
        if self.slot_available_locked(&state, username) {
            return 0;
        }
        state.registry.user_queue_len(username) as i64
    }

    /// The precise 0-based release-order position of a specific pending
    /// upload among its group's ready uploads.
    ///
    /// Fails with [`SchedulerError::NotEnqueued`] if no pending upload
    /// matches `(username, filename)`.
    pub async fn estimate_position_for(
        &self,
        username: &str,
        filename: &str,
    ) -> Result<i64, SchedulerError> {
        let state = self.state.lock().await;
        if state.registry.find(username, filename).is_none() {
            return Err(not_enqueued(username, filename));
        }

        let group = self
            .user_service
            .group_of(username)
            .and_then(|name| state.groups.get(&name).map(|g| (name, g.strategy)));

        let Some((group_name, strategy)) = group else {
            // Unknown user, or their group no longer exists: degrade to a
            // position within the user's own queue, the best information
            // available.
            return Ok(own_queue_index(&state.registry, username, filename));
        };

        let mut in_group: Vec<(&str, &Upload)> = state
            .registry
            .all_uploads()
            .filter(|(uname, _)| {
                self.user_service.group_of(uname).as_deref() == Some(group_name.as_str())
            })
            .collect();

        match strategy {
            Strategy::FirstInFirstOut => {
                in_group.sort_by_key(|(_, u)| u.enqueued_at);
                let index = in_group
                    .iter()
                    .position(|(uname, u)| *uname == username && u.filename == filename)
                    .expect("upload confirmed present above");
                Ok(index as i64)
            }
            Strategy::RoundRobin => {
                let local = own_queue_index(&state.registry, username, filename);
                let mut position = local;
                let mut counted = std::collections::HashSet::new();
                counted.insert(username);
                for (uname, _) in &in_group {
                    if !counted.insert(*uname) {
                        continue;
                    }
                    let other_len = state.registry.user_queue_len(uname) as i64;
                    position += local.min(other_len);
                }
                Ok(position)
            }
        }
    }

    fn slot_available_locked(&self, state: &SchedulerState, username: &str) -> bool {
        self.user_service
            .group_of(username)
            .and_then(|name| state.groups.get(&name).map(|g| g.has_capacity()))
            .unwrap_or(false)
    }

    /// Releases at most one ready upload: the highest-priority group with a
    /// free slot and at least one ready candidate, using that group's own
    /// strategy to break the tie among its ready uploads. Runs entirely
    /// synchronously under the caller's lock guard; the returned
    /// `Completion`, if any, is signaled by the caller only after the guard
    /// is dropped.
    fn run_admission_loop(&self, state: &mut SchedulerState) -> Option<Released> {
        let global_cap = state
            .groups
            .get(PRIVILEGED_GROUP)
            .map(|g| g.slots)
            .unwrap_or(0);
        if state.groups.total_used_slots() >= global_cap {
            trace!(global_cap, "admission loop: at global capacity");
            return None;
        }

        let mut by_group: std::collections::HashMap<String, Vec<Candidate>> =
            std::collections::HashMap::new();
        for (username, upload) in state.registry.ready_uploads() {
            let Some(group_name) = self.user_service.group_of(username) else {
                continue;
            };
            if state.groups.get(&group_name).is_none() {
                continue;
            }
            by_group
                .entry(group_name)
                .or_default()
                .push(Candidate {
                    username: username.to_string(),
                    filename: upload.filename.clone(),
                    enqueued_at: upload.enqueued_at,
                    ready_at: upload.ready_at.expect("ready_uploads filters on ready_at"),
                });
        }

        let mut selected: Option<(String, String, String)> = None;
        {
            let ordered = state.groups.by_priority();
            for group in ordered {
                if !group.has_capacity() {
                    continue;
                }
                let Some(candidates) = by_group.get(&group.name) else {
                    continue;
                };
                let winner = match group.strategy {
                    Strategy::FirstInFirstOut => {
                        candidates.iter().min_by_key(|c| c.enqueued_at)
                    }
                    Strategy::RoundRobin => candidates.iter().min_by_key(|c| c.ready_at),
                };
                if let Some(winner) = winner {
                    selected = Some((
                        group.name.clone(),
                        winner.username.clone(),
                        winner.filename.clone(),
                    ));
                    break;
                }
            }
        }

        let (group_name, username, filename) = selected?;

        let group = state
            .groups
            .get_mut(&group_name)
            .expect("selected group still present: no await between selection and here");
        group.used_slots += 1;
        debug_assert_within_group_cap!(group.name, group.used_slots, group.slots);

        let upload = state
            .registry
            .find_mut(&username, &filename)
            .expect("selected upload still present: no await between selection and here");
        let completion = upload.start(&group_name, Instant::now());

        debug_assert_pin_matches_existing_group!(
            Some(&group_name),
            state.groups.get(&group_name).is_some()
        );
        debug_assert_within_global_cap!(state.groups.total_used_slots(), global_cap);
        self.metrics.record_admitted();

        Some(Released {
            username,
            filename,
            group: group_name,
            completion,
        })
    }

    fn finish_admission(&self, released: Option<Released>) {
        if let Some(released) = released {
            debug!(
                username = released.username,
                filename = released.filename,
                group = released.group,
                "admission loop released upload"
            );
            released.completion.signal();
        }
    }
}

fn not_enqueued(username: &str, filename: &str) -> SchedulerError {
    SchedulerError::NotEnqueued {
        username: username.to_string(),
        filename: filename.to_string(),
    }
}

fn own_queue_index(registry: &Registry, username: &str, filename: &str) -> i64 {
    registry
        .uploads_for_user(username)
        .position(|u| u.filename == filename)
        .expect("upload confirmed present by caller") as i64
}
