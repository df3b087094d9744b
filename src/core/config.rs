//! # Global runtime configuration.
//!
//! Provides [`SupervisorConfig`] centralized settings for the supervisor runtime.
//!
//! Config is used in two ways:
//! 1. **Supervisor creation**: `Supervisor::builder(config)`
//! 2. **Watcher defaults**: throttle window and invocation timeout for descriptors
//!    that do not declare their own.
//!
//! ## Sentinel values
//! - `invocation_timeout = 0s` → no timeout
//! - `bus_capacity = 0` / `action_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `grace`: Maximum wait for root tasks to stop after shutdown (`0s` = no wait)
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `action_capacity`: Action stream ring buffer size (min 1); watchers that fall
///   further behind skip actions and report `WatcherLagged`
/// - `throttle_window`: Window applied when a throttle declaration has no valid parameter
/// - `invocation_timeout`: Default per-invocation timeout (`0s` = none)
/// - `allow_empty`: Build a zero-watcher task for owners without handlers instead of failing
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time to wait for graceful shutdown before giving up.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Capacity of the action stream broadcast channel ring buffer.
    pub action_capacity: usize,

    /// Default throttle window.
    pub throttle_window: Duration,

    /// Default invocation timeout (`Duration::ZERO` = none).
    pub invocation_timeout: Duration,

    /// Whether an owner with zero handlers is accepted.
    ///
    /// - `false` → `create_supervisor` fails with `SupervisorError::MissingDeclaration`
    /// - `true`  → it yields a task with no watchers
    pub allow_empty: bool,
}

impl SupervisorConfig {
    /// Returns the default invocation timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.invocation_timeout == Duration::ZERO {
            None
        } else {
            Some(self.invocation_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns an action stream capacity clamped to a minimum of 1.
    #[inline]
    pub fn action_capacity_clamped(&self) -> usize {
        self.action_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `grace = 60s`
    /// - `bus_capacity = 1024`
    /// - `action_capacity = 1024`
    /// - `throttle_window = 350ms`
    /// - `invocation_timeout = 0s` (no timeout)
    /// - `allow_empty = false`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            bus_capacity: 1024,
            action_capacity: 1024,
            throttle_window: Duration::from_millis(350),
            invocation_timeout: Duration::ZERO,
            allow_empty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_means_none() {
        let mut cfg = SupervisorConfig::default();
        assert_eq!(cfg.default_timeout(), None);
        cfg.invocation_timeout = Duration::from_millis(5);
        assert_eq!(cfg.default_timeout(), Some(Duration::from_millis(5)));
    }

    #[test]
    fn capacities_are_clamped() {
        let cfg = SupervisorConfig {
            bus_capacity: 0,
            action_capacity: 0,
            ..SupervisorConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.action_capacity_clamped(), 1);
    }
}
