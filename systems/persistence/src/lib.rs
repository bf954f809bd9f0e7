#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Write-through persistence of progression into a key-value store.
//!
//! The system observes world events, collects the keys they touch and writes
//! them once per handled batch. Writes that fail stay pending and are retried
//! with the next batch. Progress is read back once at startup through [`load`].

use std::{collections::BTreeMap, time::Duration};

use merge_farm_core::{
    store::keys, AchievementProgress, Event, KeyValueStore, LedgerSnapshot, ModifierExpiry,
    ModifierKind, SavedProgress, StoreError, ACHIEVEMENTS,
};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Clone, Copy, Debug, PartialEq)]
enum PendingWrite {
    Int(i64),
    Float(f64),
    Remove,
}

/// Pure persistence system that mirrors progression events into storage.
#[derive(Debug, Default)]
pub struct Persistence {
    pending: BTreeMap<String, PendingWrite>,
}

impl Persistence {
    /// Creates a persistence system with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys waiting to be written.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Consumes world events, writes the affected keys and flushes the store.
    ///
    /// A failed write or flush leaves every pending key queued and publishes
    /// [`Event::PersistenceFailed`].
    pub fn handle<S>(&mut self, events: &[Event], store: &mut S, out: &mut Vec<Event>)
    where
        S: KeyValueStore + ?Sized,
    {
        for event in events {
            self.record(event);
        }

        if self.pending.is_empty() {
            return;
        }

        match self.write_pending(store) {
            Ok(()) => self.pending.clear(),
            Err(error) => {
                log::warn!(
                    "persisting {} keys failed: {error}",
                    self.pending.len()
                );
                out.push(Event::PersistenceFailed {
                    message: error.to_string(),
                });
            }
        }
    }

    fn record(&mut self, event: &Event) {
        match event {
            Event::TimeAdvanced { now, .. } => {
                self.set(keys::PLAY_CLOCK, PendingWrite::Float(now.as_secs_f64()));
            }
            Event::LedgerChanged { ledger } => self.record_ledger(*ledger),
            Event::AchievementProgressed {
                id,
                current,
                completed,
            } => {
                self.set(
                    &keys::achievement_progress(*id),
                    PendingWrite::Int(to_int(*current)),
                );
                self.set(
                    &keys::achievement_completed(*id),
                    PendingWrite::Int(i64::from(*completed)),
                );
            }
            Event::ModifierGranted { kind, expiry } => {
                let write = match expiry {
                    ModifierExpiry::At(at) => PendingWrite::Float(at.as_secs_f64()),
                    ModifierExpiry::Permanent => PendingWrite::Int(1),
                };
                self.set(keys::modifier(*kind), write);
            }
            Event::TutorialCompleted => self.set(keys::TUTORIAL_COMPLETED, PendingWrite::Int(1)),
            Event::ProgressReset => {
                for def in ACHIEVEMENTS {
                    self.set(&keys::achievement_progress(def.id), PendingWrite::Remove);
                    self.set(&keys::achievement_completed(def.id), PendingWrite::Remove);
                }
                for kind in ModifierKind::ALL {
                    self.set(keys::modifier(kind), PendingWrite::Remove);
                }
                self.set(keys::TUTORIAL_COMPLETED, PendingWrite::Remove);
            }
            _ => {}
        }
    }

    fn record_ledger(&mut self, ledger: LedgerSnapshot) {
        self.set(keys::COINS, PendingWrite::Int(to_int(ledger.coins)));
        self.set(keys::LEVEL, PendingWrite::Int(i64::from(ledger.level)));
        self.set(keys::EXPERIENCE, PendingWrite::Int(to_int(ledger.experience)));
        self.set(
            keys::EXPERIENCE_TO_NEXT,
            PendingWrite::Int(to_int(ledger.experience_to_next)),
        );
    }

    fn set(&mut self, key: &str, write: PendingWrite) {
        let _ = self.pending.insert(key.to_owned(), write);
    }

    fn write_pending<S>(&self, store: &mut S) -> Result<(), StoreError>
    where
        S: KeyValueStore + ?Sized,
    {
        for (key, write) in &self.pending {
            match write {
                PendingWrite::Int(value) => store.set_int(key, *value)?,
                PendingWrite::Float(value) => store.set_float(key, *value)?,
                PendingWrite::Remove => store.remove(key)?,
            }
        }
        store.flush()
    }
}

/// Reads persisted progress, falling back to defaults for absent keys.
///
/// Achievements with no recorded progress are omitted. Modifier timestamps
/// that cannot be represented as a duration are treated as absent.
pub fn load<S>(store: &S) -> Result<SavedProgress, StoreError>
where
    S: KeyValueStore + ?Sized,
{
    let defaults = LedgerSnapshot::default();
    let ledger = LedgerSnapshot {
        coins: read_u64(store, keys::COINS, defaults.coins)?,
        level: u32::try_from(read_u64(store, keys::LEVEL, u64::from(defaults.level))?)
            .map_err(|_| malformed(keys::LEVEL))?,
        experience: read_u64(store, keys::EXPERIENCE, defaults.experience)?,
        experience_to_next: read_u64(
            store,
            keys::EXPERIENCE_TO_NEXT,
            defaults.experience_to_next,
        )?,
    };

    let mut achievements = Vec::new();
    for def in ACHIEVEMENTS {
        let current = read_u64(store, &keys::achievement_progress(def.id), 0)?;
        let completed = store.get_int(&keys::achievement_completed(def.id), 0)? != 0;
        if current > 0 || completed {
            achievements.push(AchievementProgress {
                id: def.id,
                current,
                completed,
            });
        }
    }

    let mut modifiers = Vec::new();
    for kind in ModifierKind::ALL {
        let key = keys::modifier(kind);
        if kind.is_permanent() {
            if store.get_int(key, 0)? != 0 {
                modifiers.push((kind, ModifierExpiry::Permanent));
            }
        } else if let Ok(at) = Duration::try_from_secs_f64(store.get_float(key, -1.0)?) {
            modifiers.push((kind, ModifierExpiry::At(at)));
        }
    }

    let clock = Duration::try_from_secs_f64(store.get_float(keys::PLAY_CLOCK, 0.0)?)
        .map_err(|_| malformed(keys::PLAY_CLOCK))?;
    let tutorial_completed = store.get_int(keys::TUTORIAL_COMPLETED, 0)? != 0;

    Ok(SavedProgress {
        ledger,
        achievements,
        modifiers,
        clock,
        tutorial_completed,
    })
}

fn read_u64<S>(store: &S, key: &str, default: u64) -> Result<u64, StoreError>
where
    S: KeyValueStore + ?Sized,
{
    let value = store.get_int(key, to_int(default))?;
    u64::try_from(value).map_err(|_| malformed(key))
}

fn malformed(key: &str) -> StoreError {
    StoreError::Malformed {
        key: key.to_owned(),
    }
}

fn to_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use merge_farm_core::AchievementId;

    #[test]
    fn later_events_overwrite_pending_keys() {
        let mut persistence = Persistence::new();
        persistence.record(&Event::ProgressReset);
        persistence.record(&Event::AchievementProgressed {
            id: AchievementId::new("first_merge"),
            current: 1,
            completed: true,
        });

        assert_eq!(
            persistence.pending.get("Achievement_first_merge"),
            Some(&PendingWrite::Int(1))
        );
        assert_eq!(
            persistence.pending.get("Achievement_merge_master_1"),
            Some(&PendingWrite::Remove)
        );
    }

    #[test]
    fn irrelevant_events_queue_nothing() {
        let mut persistence = Persistence::new();
        persistence.record(&Event::TutorialCompleted);
        persistence.pending.clear();
        persistence.record(&Event::LevelUp { level: 3 });
        assert_eq!(persistence.pending_writes(), 0);
    }

    #[test]
    fn empty_store_loads_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load(&store), Ok(SavedProgress::default()));
    }

    #[test]
    fn negative_counters_are_malformed() {
        let mut store = MemoryStore::new();
        store.set_int(keys::COINS, -5).expect("memory writes succeed");
        assert_eq!(load(&store), Err(malformed(keys::COINS)));
    }
}
