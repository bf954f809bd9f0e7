//! Balance constants shared by the world and systems.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable game balance values.
///
/// Every field falls back to its default when missing from a configuration
/// file, so partial files only override what they name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Number of slot columns on the grid.
    pub grid_columns: u32,
    /// Number of slot rows on the grid.
    pub grid_rows: u32,
    /// Number of rungs on the item ladder.
    pub tier_count: u8,
    /// Coins awarded for reaching tier zero; doubles per tier.
    pub base_reward: u64,
    /// Milliseconds between periodic spawns.
    pub spawn_interval_ms: u64,
    /// Milliseconds between a merge and its replacement spawn.
    pub respawn_delay_ms: u64,
    /// Milliseconds between automatic merges while a pair is available.
    pub auto_merge_step_ms: u64,
    /// Milliseconds between automatic scans when no pair was found.
    pub auto_merge_scan_ms: u64,
    /// Seed for spawn slot selection.
    pub rng_seed: u64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            grid_columns: 5,
            grid_rows: 5,
            tier_count: 5,
            base_reward: 10,
            spawn_interval_ms: 5_000,
            respawn_delay_ms: 500,
            auto_merge_step_ms: 1_000,
            auto_merge_scan_ms: 2_000,
            rng_seed: 0x6d65_7267_655f_6661,
        }
    }
}

impl BalanceConfig {
    /// Interval between periodic spawns.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    /// Delay between a merge and its replacement spawn.
    #[must_use]
    pub const fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_delay_ms)
    }

    /// Delay between consecutive automatic merges.
    #[must_use]
    pub const fn auto_merge_step(&self) -> Duration {
        Duration::from_millis(self.auto_merge_step_ms)
    }

    /// Delay between automatic scans that found nothing to merge.
    #[must_use]
    pub const fn auto_merge_scan(&self) -> Duration {
        Duration::from_millis(self.auto_merge_scan_ms)
    }
}
