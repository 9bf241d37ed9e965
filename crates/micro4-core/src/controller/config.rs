use std::time::Duration;

use crate::CpuConfig;

/// Default delay between run ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);
/// Default upper bound on instructions executed per tick.
pub const DEFAULT_MAX_BATCH: u32 = 1_000;
/// Default bounded channel capacity in each direction.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
/// Default breakpoint capacity.
pub const DEFAULT_MAX_BREAKPOINTS: usize = 16;

/// Configuration for a controller session and its worker.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ControllerConfig {
    /// Core configuration.
    pub cpu: CpuConfig,
    /// Delay between run ticks on the worker thread.
    pub tick_interval: Duration,
    /// Largest instruction batch per tick; also the batch for speed 0.
    pub max_batch: u32,
    /// Maximum number of breakpoints.
    pub max_breakpoints: usize,
    /// Command channel capacity.
    pub command_capacity: usize,
    /// Event channel capacity.
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cpu: CpuConfig::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_batch: DEFAULT_MAX_BATCH,
            max_breakpoints: DEFAULT_MAX_BREAKPOINTS,
            command_capacity: DEFAULT_CHANNEL_CAPACITY,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ControllerConfig {
    /// Instructions per tick for a requested speed.
    #[must_use]
    pub fn batch_for_speed(&self, speed: u32) -> u32 {
        let max = self.max_batch.max(1);
        if speed == 0 {
            max
        } else {
            speed.min(max)
        }
    }
}
