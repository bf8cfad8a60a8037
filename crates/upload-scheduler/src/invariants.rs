//! Debug-only invariant checks for the admission path.
//!
//! Active only under `#[cfg(debug_assertions)]`, so there is no release
//! overhead. A failure here indicates a programming defect in the scheduler
//! itself, never a caller or configuration error — those are reported
//! through `SchedulerError`/`ConfigError` instead.

/// Asserts that the global slot count is never exceeded after an admission
/// decision.
macro_rules! debug_assert_within_global_cap {
    ($used:expr, $cap:expr) => {
        debug_assert!(
            $used <= $cap,
            "ADM-01 violated: total used_slots {} exceeds max_slots {}",
            $used,
            $cap
        )
    };
}

/// Asserts that a group's `used_slots` never exceeds its own `slots`.
macro_rules! debug_assert_within_group_cap {
    ($group_name:expr, $used:expr, $slots:expr) => {
        debug_assert!(
            $used <= $slots,
            "ADM-02 violated: group {:?} used_slots {} exceeds slots {}",
            $group_name,
            $used,
            $slots
        )
    };
}

/// Asserts that a released upload carries a pinned group referring to a
/// group that existed at release time.
macro_rules! debug_assert_pin_matches_existing_group {
    ($pinned:expr, $found:expr) => {
        debug_assert!(
            $found,
            "ADM-03 violated: upload started with pinned_group {:?} that does not exist in the table used to release it",
            $pinned
        )
    };
}

pub(crate) use debug_assert_pin_matches_existing_group;
pub(crate) use debug_assert_within_global_cap;
pub(crate) use debug_assert_within_group_cap;
