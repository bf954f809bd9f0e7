#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Automation driver that merges item pairs while the auto-merge modifier is
//! active.

use std::time::Duration;

use merge_farm_core::{BalanceConfig, Command, Event, ItemId, ItemView};

/// Configuration parameters required to construct the auto-merge system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    step: Duration,
    scan: Duration,
    tier_count: u8,
}

impl Config {
    /// Creates a configuration from the merge cadence, scan cadence and ladder length.
    #[must_use]
    pub const fn new(step: Duration, scan: Duration, tier_count: u8) -> Self {
        Self {
            step,
            scan,
            tier_count,
        }
    }

    /// Derives the auto-merge configuration from the balance values.
    #[must_use]
    pub const fn from_balance(balance: &BalanceConfig) -> Self {
        Self::new(
            balance.auto_merge_step(),
            balance.auto_merge_scan(),
            balance.tier_count,
        )
    }
}

/// Pure system emitting at most one merge command per deadline.
#[derive(Debug)]
pub struct AutoMerge {
    step: Duration,
    scan: Duration,
    tier_count: u8,
    now: Duration,
    next_attempt: Option<Duration>,
}

impl AutoMerge {
    /// Creates a new auto-merge system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            step: config.step,
            scan: config.scan,
            tier_count: config.tier_count,
            now: Duration::ZERO,
            next_attempt: None,
        }
    }

    /// Starts the system's view of the logical clock at `now`.
    #[must_use]
    pub fn with_clock(mut self, now: Duration) -> Self {
        self.now = now;
        self
    }

    /// Consumes events and the current items to emit merge commands.
    ///
    /// The first attempt happens as soon as the modifier is seen active. A
    /// successful scan waits one step before the next attempt, an empty scan
    /// waits the longer scan interval. Losing the modifier clears the deadline.
    pub fn handle(&mut self, events: &[Event], active: bool, items: &ItemView, out: &mut Vec<Command>) {
        for event in events {
            if let Event::TimeAdvanced { now, .. } = event {
                self.now = *now;
            }
        }

        if !active {
            self.next_attempt = None;
            return;
        }

        let deadline = *self.next_attempt.get_or_insert(self.now);
        if self.now < deadline {
            return;
        }

        match find_mergeable_pair(items, self.tier_count) {
            Some((source, target)) => {
                log::debug!("auto-merging {source:?} into {target:?}");
                out.push(Command::Merge { source, target });
                self.next_attempt = Some(self.now.saturating_add(self.step));
            }
            None => {
                self.next_attempt = Some(self.now.saturating_add(self.scan));
            }
        }
    }

    /// Deadline of the next scan, if the driver is running.
    #[must_use]
    pub fn next_attempt(&self) -> Option<Duration> {
        self.next_attempt
    }
}

/// Finds the first pair of distinct items sharing a tier below the top rung.
///
/// Items are scanned in identifier order, so the oldest eligible item is the
/// merge source.
#[must_use]
pub fn find_mergeable_pair(items: &ItemView, tier_count: u8) -> Option<(ItemId, ItemId)> {
    let snapshots: Vec<_> = items.iter().collect();
    snapshots.iter().enumerate().find_map(|(index, source)| {
        if source.tier.is_top(tier_count) {
            return None;
        }
        snapshots[index + 1..]
            .iter()
            .find(|candidate| candidate.tier == source.tier)
            .map(|target| (source.id, target.id))
    })
}
