//! Configuration snapshot consumed by the Configurator.
//!
//! A `SchedulerConfig` is what a `ConfigSource` hands the scheduler on
//! `reconfigure`. It is plain, `serde`-deserializable data — parsing and
//! validating it into a live `GroupTable` is the Configurator's job
//! (see `crate::group::GroupTable::rebuild`).

use serde::{Deserialize, Serialize};

/// One group's configuration, as it arrives from the `ConfigSource`.
///
/// `strategy` is kept as a raw string here (rather than `crate::Strategy`)
/// so that an unparseable value surfaces as a `ConfigError::UnknownStrategy`
/// during validation instead of failing deserialization opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Lower value schedules earlier. Priority 0 is reserved.
    pub priority: i64,
    /// Maximum concurrently active uploads for this group.
    pub slots: i64,
    /// `"FirstInFirstOut"` or `"RoundRobin"`, case-insensitive.
    pub strategy: String,
}

/// A full configuration snapshot, as delivered by a `ConfigSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Global concurrency cap across all groups.
    pub global_slots: i64,
    /// The always-present "default" group.
    pub default: GroupConfig,
    /// The always-present "leechers" group.
    pub leechers: GroupConfig,
    /// Operator-defined groups beyond default/leechers, keyed by name.
    ///
    /// `"privileged"`, `"default"`, and `"leechers"` are reserved and rejected
    /// here during validation.
    #[serde(default)]
    pub user_defined: std::collections::BTreeMap<String, GroupConfig>,
}

impl SchedulerConfig {
    /// A minimal configuration useful for tests and as a starting point:
    /// one slot globally, one `default` FIFO group holding it.
    pub fn single_slot_default() -> Self {
        Self {
            global_slots: 1,
            default: GroupConfig {
                priority: 1,
                slots: 1,
                strategy: "FirstInFirstOut".to_string(),
            },
            leechers: GroupConfig {
                priority: 2,
                slots: 1,
                strategy: "FirstInFirstOut".to_string(),
            },
            user_defined: std::collections::BTreeMap::new(),
        }
    }

    /// Loads a configuration from a TOML document.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let mut config = SchedulerConfig::single_slot_default();
        config.user_defined.insert(
            "vip".to_string(),
            GroupConfig {
                priority: 1,
                slots: 3,
                strategy: "RoundRobin".to_string(),
            },
        );

        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: SchedulerConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(config, decoded);
    }

    #[test]
    fn user_defined_defaults_to_empty_when_absent() {
        let json = r#"{
            "global_slots": 1,
            "default": {"priority": 1, "slots": 1, "strategy": "FirstInFirstOut"},
            "leechers": {"priority": 2, "slots": 1, "strategy": "FirstInFirstOut"}
        }"#;
        let config: SchedulerConfig = serde_json::from_str(json).unwrap();
        assert!(config.user_defined.is_empty());
    }
}
