#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting seed spawn commands.

use std::time::Duration;

use merge_farm_core::{BalanceConfig, Command, Event, ItemTier, SlotCoord};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    respawn_delay: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided cadence, delay and seed.
    #[must_use]
    pub const fn new(spawn_interval: Duration, respawn_delay: Duration, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            respawn_delay,
            rng_seed,
        }
    }

    /// Derives the spawning configuration from the balance values.
    #[must_use]
    pub const fn from_balance(balance: &BalanceConfig) -> Self {
        Self::new(
            balance.spawn_interval(),
            balance.respawn_delay(),
            balance.rng_seed,
        )
    }
}

/// Pure system that emits seed spawns at startup, on a fixed cadence and
/// shortly after every merge.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    respawn_delay: Duration,
    accumulator: Duration,
    now: Duration,
    deferred: Vec<Duration>,
    started: bool,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            respawn_delay: config.respawn_delay,
            accumulator: Duration::ZERO,
            now: Duration::ZERO,
            deferred: Vec::new(),
            started: false,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Starts the system's view of the logical clock at `now`.
    ///
    /// Restored sessions resume from the saved clock, so deferred deadlines
    /// scheduled before the first tick must be measured from it.
    #[must_use]
    pub fn with_clock(mut self, now: Duration) -> Self {
        self.now = now;
        self
    }

    /// Consumes events and the current empty slots to emit spawn commands.
    ///
    /// The first call always owes the startup spawn. Spawns owed while the
    /// grid is full are dropped rather than carried over.
    pub fn handle(&mut self, events: &[Event], empty_slots: &[SlotCoord], out: &mut Vec<Command>) {
        let mut due = 0usize;
        if !self.started {
            self.started = true;
            due += 1;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt, now } => {
                    accumulated = accumulated.saturating_add(*dt);
                    self.now = *now;
                }
                Event::MergeCompleted { .. } => {
                    self.deferred
                        .push(self.now.saturating_add(self.respawn_delay));
                }
                _ => {}
            }
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        due += self.resolve_periodic_spawns();
        due += self.resolve_deferred_spawns();

        if due == 0 {
            return;
        }

        let mut candidates = empty_slots.to_vec();
        for _ in 0..due {
            let Some(slot) = self.select_slot(&mut candidates) else {
                log::debug!("grid full, skipping spawn");
                break;
            };
            out.push(Command::SpawnItem {
                slot,
                tier: ItemTier::SEED,
            });
        }
    }

    /// Number of deferred spawns still waiting for their deadline.
    #[must_use]
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    fn resolve_periodic_spawns(&mut self) -> usize {
        if self.spawn_interval.is_zero() {
            self.accumulator = Duration::ZERO;
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            attempts += 1;
        }
        attempts
    }

    fn resolve_deferred_spawns(&mut self) -> usize {
        let now = self.now;
        let before = self.deferred.len();
        self.deferred.retain(|deadline| *deadline > now);
        before - self.deferred.len()
    }

    fn select_slot(&mut self, candidates: &mut Vec<SlotCoord>) -> Option<SlotCoord> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..candidates.len());
        Some(candidates.swap_remove(index))
    }
}
