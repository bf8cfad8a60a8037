//! Scheduling groups and the live group table.

use crate::config::{GroupConfig, SchedulerConfig};
use crate::error::ConfigError;
use crate::strategy::Strategy;
use std::collections::HashMap;
use std::str::FromStr;

/// Name reserved for the hard-coded, always-present priority-0 group.
///
/// No entry in a `SchedulerConfig`'s `default`, `leechers`, or `user_defined`
/// maps may use this name or claim priority 0 — both are reserved for this
/// group.
pub const PRIVILEGED_GROUP: &str = "privileged";

/// A scheduling class: priority, slot capacity, ordering strategy, and the
/// live count of slots currently donated to active uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Unique name.
    pub name: String,
    /// Lower value schedules earlier. Only the privileged group may use 0.
    pub priority: i64,
    /// Maximum concurrently active uploads belonging to this group.
    pub slots: i64,
    /// Ordering discipline applied among this group's ready uploads.
    pub strategy: Strategy,
    /// Current count of active uploads pinned to this group.
    pub used_slots: i64,
}

impl Group {
    /// Returns `true` if this group has room for one more active upload.
    pub fn has_capacity(&self) -> bool {
        self.used_slots < self.slots
    }
}

/// The live set of groups, rebuilt wholesale on reconfiguration.
///
/// Lives inside the same `Mutex<SchedulerState>` as the upload registry, not
/// behind its own lock — every read and every rebuild already happens with
/// that mutex held, so there is no second synchronization primitive to
/// reason about and no window where a reader could observe a table mid-swap.
#[derive(Debug, Clone)]
pub struct GroupTable {
    groups: HashMap<String, Group>,
}

impl GroupTable {
    /// Validates a configuration snapshot and builds a fresh `GroupTable`,
    /// carrying over `used_slots` from `previous` for any group name that
    /// survives unchanged; a group name that disappears takes its donated
    /// slots with it.
    pub fn rebuild(
        config: &SchedulerConfig,
        previous: Option<&GroupTable>,
    ) -> Result<Self, ConfigError> {
        if config.global_slots < 0 {
            return Err(ConfigError::NegativeGlobalSlots);
        }

        let mut named: Vec<(&str, &GroupConfig)> = vec![
            ("default", &config.default),
            ("leechers", &config.leechers),
        ];
        for (name, cfg) in &config.user_defined {
            if name == PRIVILEGED_GROUP || name == "default" || name == "leechers" {
                return Err(ConfigError::ReservedGroupName {
                    name: name.to_string(),
                });
            }
            named.push((name.as_str(), cfg));
        }

        let mut groups = HashMap::with_capacity(named.len() + 1);
        let carried = |name: &str| -> i64 {
            previous
                .and_then(|t| t.groups.get(name))
                .map(|g| g.used_slots)
                .unwrap_or(0)
        };

        groups.insert(
            PRIVILEGED_GROUP.to_string(),
            Group {
                name: PRIVILEGED_GROUP.to_string(),
                priority: 0,
                slots: config.global_slots,
                strategy: Strategy::FirstInFirstOut,
                used_slots: carried(PRIVILEGED_GROUP),
            },
        );

        for (name, cfg) in named {
            if cfg.slots < 0 {
                return Err(ConfigError::NegativeGroupSlots {
                    name: name.to_string(),
                });
            }
            if cfg.priority == 0 {
                return Err(ConfigError::PriorityZeroCollision {
                    name: name.to_string(),
                });
            }
            let strategy = Strategy::from_str(&cfg.strategy).map_err(|raw| {
                ConfigError::UnknownStrategy {
                    name: name.to_string(),
                    raw,
                }
            })?;

            groups.insert(
                name.to_string(),
                Group {
                    name: name.to_string(),
                    priority: cfg.priority,
                    slots: cfg.slots,
                    strategy,
                    used_slots: carried(name),
                },
            );
        }

        Ok(Self { groups })
    }

    /// Looks up a group by name.
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Looks up a group by name, mutably. Used to update `used_slots` in
    /// place; the table itself is immutable once swapped in, but a mutable
    /// working copy is cloned and rebuilt under the admission lock (see
    /// `crate::scheduler`).
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.get_mut(name)
    }

    /// Sum of `used_slots` across all groups.
    pub fn total_used_slots(&self) -> i64 {
        self.groups.values().map(|g| g.used_slots).sum()
    }

    /// Groups in ascending `(priority, name)` order — the order the
    /// Admission Loop iterates when looking for a group to release from.
    pub fn by_priority(&self) -> Vec<&Group> {
        let mut all: Vec<&Group> = self.groups.values().collect();
        all.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        all
    }
}
