//! Stable hashing of a configuration snapshot, used by the Configurator's
//! idempotence guard to recognize a no-op reconfiguration before paying for
//! a `GroupTable` rebuild.

use crate::config::{GroupConfig, SchedulerConfig};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Computes a stable hash over the group portion of `config`
/// (`default`, `leechers`, and `user_defined` — not `global_slots`, which
/// the Configurator compares separately alongside this hash).
///
/// `user_defined` is a `BTreeMap`, so iteration order is already
/// deterministic; this is hashed explicitly anyway so the guard's behavior
/// does not depend on that detail of `SchedulerConfig`'s representation.
pub(crate) fn group_options_hash(config: &SchedulerConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_group(&mut hasher, "default", &config.default);
    hash_group(&mut hasher, "leechers", &config.leechers);
    for (name, group) in &config.user_defined {
        hash_group(&mut hasher, name, group);
    }
    hasher.finish()
}

fn hash_group(hasher: &mut DefaultHasher, name: &str, group: &GroupConfig) {
    name.hash(hasher);
    group.priority.hash(hasher);
    group.slots.hash(hasher);
    group.strategy.to_ascii_lowercase().hash(hasher);
}
