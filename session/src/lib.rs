#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Composition root wiring the world, the pure systems, storage and event sinks.
//!
//! A session applies commands to the world, hands the resulting events to
//! every system and applies whatever commands the systems emit, repeating
//! until the cascade settles. Sinks observe each batch after it completes.

use std::{collections::VecDeque, fmt, time::Duration};

use merge_farm_core::{
    BalanceConfig, Command, Event, EventSink, KeyValueStore, ModifierKind, StoreError,
};
use merge_farm_system_auto_merge::{self as auto_merge, AutoMerge};
use merge_farm_system_persistence::{self as persistence, Persistence};
use merge_farm_system_spawning::{self as spawning, Spawning};
use merge_farm_world::{self as world, query, World};

/// Running game session owning all simulation state.
pub struct Session {
    world: World,
    spawning: Spawning,
    auto_merge: AutoMerge,
    persistence: Persistence,
    store: Box<dyn KeyValueStore>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("world", &self.world)
            .field("spawning", &self.spawning)
            .field("auto_merge", &self.auto_merge)
            .field("persistence", &self.persistence)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Restores progress from `store` and runs the startup cascade.
    ///
    /// Sinks registered later do not observe the startup events.
    pub fn new(config: BalanceConfig, store: Box<dyn KeyValueStore>) -> Result<Self, StoreError> {
        Self::with_sinks(config, store, Vec::new())
    }

    /// Restores progress from `store`, registers `sinks` and runs the startup
    /// cascade.
    pub fn with_sinks(
        config: BalanceConfig,
        store: Box<dyn KeyValueStore>,
        sinks: Vec<Box<dyn EventSink>>,
    ) -> Result<Self, StoreError> {
        let progress = persistence::load(&*store)?;
        log::info!(
            "restored progress: level {} with {} coins",
            progress.ledger.level,
            progress.ledger.coins
        );

        let spawning_config = spawning::Config::from_balance(&config);
        let auto_merge_config = auto_merge::Config::from_balance(&config);
        let world = World::restore(config, &progress);
        let now = query::clock(&world);

        let mut session = Self {
            spawning: Spawning::new(spawning_config).with_clock(now),
            auto_merge: AutoMerge::new(auto_merge_config).with_clock(now),
            world,
            persistence: Persistence::new(),
            store,
            sinks,
        };
        session.run(Vec::new());
        Ok(session)
    }

    /// Registers a sink that observes every subsequent event.
    pub fn register_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Advances logical time by `dt` and settles the resulting cascade.
    pub fn step(&mut self, dt: Duration) {
        self.submit(Command::Tick { dt });
    }

    /// Applies an external command and settles the resulting cascade.
    pub fn submit(&mut self, command: Command) {
        self.run(vec![command]);
    }

    /// Provides read-only access to the world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Provides read-only access to the backing store.
    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        &*self.store
    }

    /// Consumes the session and returns its backing store.
    #[must_use]
    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.store
    }

    fn run(&mut self, initial: Vec<Command>) {
        let mut commands: VecDeque<Command> = initial.into();
        let mut first = true;

        loop {
            let mut batch = Vec::new();
            while let Some(command) = commands.pop_front() {
                world::apply(&mut self.world, command, &mut batch);
            }

            if batch.is_empty() && !first {
                break;
            }
            first = false;

            let mut failures = Vec::new();
            self.persistence.handle(&batch, &mut *self.store, &mut failures);
            batch.extend(failures);

            let mut emitted = Vec::new();
            let empty_slots = query::empty_slots(&self.world);
            self.spawning.handle(&batch, &empty_slots, &mut emitted);
            self.auto_merge.handle(
                &batch,
                query::modifier_active(&self.world, ModifierKind::AutoMerge),
                &query::item_view(&self.world),
                &mut emitted,
            );

            self.publish(&batch);

            if emitted.is_empty() {
                break;
            }
            commands.extend(emitted);
        }
    }

    fn publish(&mut self, batch: &[Event]) {
        for sink in &mut self.sinks {
            for event in batch {
                sink.notify(event);
            }
        }
    }
}
