use std::time::Duration;

use merge_farm_core::{
    store::keys, BalanceConfig, Command, Event, ItemTier, KeyValueStore, ModifierExpiry,
    ModifierKind, SlotCoord, StoreError,
};
use merge_farm_system_persistence::{load, MemoryStore, Persistence};
use merge_farm_world::{self as world, query, World};

/// Store that rejects every operation while `offline` is set.
#[derive(Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    offline: bool,
}

impl FlakyStore {
    fn check(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Unavailable("disk detached".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for FlakyStore {
    fn get_int(&self, key: &str, default: i64) -> Result<i64, StoreError> {
        self.inner.get_int(key, default)
    }

    fn get_float(&self, key: &str, default: f64) -> Result<f64, StoreError> {
        self.inner.get_float(key, default)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set_int(key, value)
    }

    fn set_float(&mut self, key: &str, value: f64) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set_float(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.remove(key)
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.flush()
    }
}

fn drive<S: KeyValueStore + ?Sized>(
    world: &mut World,
    persistence: &mut Persistence,
    store: &mut S,
    commands: Vec<Command>,
) -> Vec<Event> {
    let mut failures = Vec::new();
    for command in commands {
        let mut events = Vec::new();
        world::apply(world, command, &mut events);
        persistence.handle(&events, store, &mut failures);
    }
    failures
}

fn merge_script() -> Vec<Command> {
    vec![
        Command::SpawnItem {
            slot: SlotCoord::new(0, 0),
            tier: ItemTier::SEED,
        },
        Command::SpawnItem {
            slot: SlotCoord::new(1, 0),
            tier: ItemTier::SEED,
        },
        Command::Merge {
            source: merge_farm_core::ItemId::new(0),
            target: merge_farm_core::ItemId::new(1),
        },
        Command::Tick {
            dt: Duration::from_secs(30),
        },
        Command::GrantModifier {
            kind: ModifierKind::DoubleCoins,
            duration: Duration::from_secs(90),
        },
        Command::GrantModifier {
            kind: ModifierKind::NoAds,
            duration: Duration::ZERO,
        },
        Command::CompleteTutorial,
    ]
}

#[test]
fn written_progress_restores_an_equivalent_world() {
    let mut world = World::new(BalanceConfig::default());
    let mut persistence = Persistence::new();
    let mut store = MemoryStore::new();

    let failures = drive(&mut world, &mut persistence, &mut store, merge_script());
    assert!(failures.is_empty());
    assert_eq!(persistence.pending_writes(), 0);

    assert_eq!(store.get_int(keys::COINS, 0), Ok(120));
    assert_eq!(store.get_int("Achievement_first_merge_completed", 0), Ok(1));
    assert_eq!(store.get_float(keys::PLAY_CLOCK, 0.0), Ok(30.0));
    assert_eq!(store.get_float("DoubleCoinsEndTime", 0.0), Ok(120.0));
    assert_eq!(store.get_int("NoAds", 0), Ok(1));

    let saved = load(&store).expect("store is readable");
    assert_eq!(saved, query::progress(&world));

    let restored = World::restore(BalanceConfig::default(), &saved);
    assert_eq!(query::ledger(&restored), query::ledger(&world));
    assert!(query::modifier_active(&restored, ModifierKind::DoubleCoins));
    assert_eq!(
        query::modifier_expiry(&restored, ModifierKind::DoubleCoins),
        Some(ModifierExpiry::At(Duration::from_secs(120)))
    );
    assert!(query::tutorial_completed(&restored));
}

#[test]
fn failed_writes_are_reported_and_retried() {
    let mut world = World::new(BalanceConfig::default());
    let mut persistence = Persistence::new();
    let mut store = FlakyStore {
        offline: true,
        ..FlakyStore::default()
    };

    let failures = drive(
        &mut world,
        &mut persistence,
        &mut store,
        vec![Command::GrantCoins { amount: 250 }],
    );
    assert!(matches!(
        failures.as_slice(),
        [Event::PersistenceFailed { message }] if message.contains("disk detached")
    ));
    assert!(persistence.pending_writes() > 0);
    assert!(store.inner.is_empty());

    store.offline = false;
    let failures = drive(
        &mut world,
        &mut persistence,
        &mut store,
        vec![Command::Tick {
            dt: Duration::from_secs(1),
        }],
    );
    assert!(failures.is_empty());
    assert_eq!(persistence.pending_writes(), 0);
    assert_eq!(store.get_int(keys::COINS, 0), Ok(250));
    assert_eq!(store.inner.flushes(), 1);
}

#[test]
fn reset_removes_progress_keys() {
    let mut world = World::new(BalanceConfig::default());
    let mut persistence = Persistence::new();
    let mut store = MemoryStore::new();
    let _ = drive(&mut world, &mut persistence, &mut store, merge_script());

    let failures = drive(
        &mut world,
        &mut persistence,
        &mut store,
        vec![Command::ResetProgress],
    );
    assert!(failures.is_empty());

    assert!(!store.contains("Achievement_first_merge"));
    assert!(!store.contains("DoubleCoinsEndTime"));
    assert!(!store.contains("NoAds"));
    assert!(!store.contains(keys::TUTORIAL_COMPLETED));
    assert_eq!(store.get_int(keys::COINS, -1), Ok(0));
    assert_eq!(store.get_int(keys::LEVEL, -1), Ok(1));
    assert!(store.contains(keys::PLAY_CLOCK));

    let saved = load(&store).expect("store is readable");
    assert_eq!(saved, query::progress(&world));
}
