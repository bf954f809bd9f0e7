//! Persistence collaborator contract and the progress restored at startup.

use std::time::Duration;

use thiserror::Error;

use crate::{AchievementId, LedgerSnapshot, ModifierExpiry, ModifierKind};

/// Flat key-value storage with overwrite semantics.
///
/// Reads happen once at startup; writes are issued after every mutation and
/// must be idempotent.
pub trait KeyValueStore {
    /// Reads an integer, yielding `default` when the key is absent.
    fn get_int(&self, key: &str, default: i64) -> Result<i64, StoreError>;

    /// Reads a float, yielding `default` when the key is absent.
    fn get_float(&self, key: &str, default: f64) -> Result<f64, StoreError>;

    /// Writes an integer.
    fn set_int(&mut self, key: &str, value: i64) -> Result<(), StoreError>;

    /// Writes a float.
    fn set_float(&mut self, key: &str, value: f64) -> Result<(), StoreError>;

    /// Deletes a key. Deleting an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Makes every preceding write durable.
    fn flush(&mut self) -> Result<(), StoreError>;
}

/// Failures reported by a [`KeyValueStore`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or written.
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
    /// A stored value could not be interpreted.
    #[error("stored value for `{key}` is malformed")]
    Malformed {
        /// Key holding the malformed value.
        key: String,
    },
}

/// Storage keys used for persisted progress.
pub mod keys {
    use crate::{AchievementId, ModifierKind};

    /// Coin balance.
    pub const COINS: &str = "Coins";
    /// Current level.
    pub const LEVEL: &str = "Level";
    /// Experience toward the next level.
    pub const EXPERIENCE: &str = "Experience";
    /// Experience threshold of the next level.
    pub const EXPERIENCE_TO_NEXT: &str = "ExperienceToNext";
    /// Tutorial completion flag.
    pub const TUTORIAL_COMPLETED: &str = "TutorialCompleted";
    /// Logical clock in seconds.
    pub const PLAY_CLOCK: &str = "PlayClock";

    /// Key holding the counter of an achievement.
    #[must_use]
    pub fn achievement_progress(id: AchievementId) -> String {
        format!("Achievement_{id}")
    }

    /// Key holding the completion flag of an achievement.
    #[must_use]
    pub fn achievement_completed(id: AchievementId) -> String {
        format!("Achievement_{id}_completed")
    }

    /// Key holding the expiry or flag of a modifier.
    #[must_use]
    pub const fn modifier(kind: ModifierKind) -> &'static str {
        match kind {
            ModifierKind::DoubleCoins => "DoubleCoinsEndTime",
            ModifierKind::AutoMerge => "AutoMergeEndTime",
            ModifierKind::NoAds => "NoAds",
        }
    }
}

/// Persisted counter of a single achievement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementProgress {
    /// Catalog entry the progress belongs to.
    pub id: AchievementId,
    /// Counter value.
    pub current: u64,
    /// Completion flag.
    pub completed: bool,
}

/// Mutable progress restored from storage at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedProgress {
    /// Ledger values.
    pub ledger: LedgerSnapshot,
    /// Progress for catalog entries that have any.
    pub achievements: Vec<AchievementProgress>,
    /// Modifier activations that were recorded.
    pub modifiers: Vec<(ModifierKind, ModifierExpiry)>,
    /// Logical clock when the progress was last written.
    pub clock: Duration,
    /// Whether the tutorial was finished.
    pub tutorial_completed: bool,
}

impl Default for SavedProgress {
    fn default() -> Self {
        Self {
            ledger: LedgerSnapshot::default(),
            achievements: Vec::new(),
            modifiers: Vec::new(),
            clock: Duration::ZERO,
            tutorial_completed: false,
        }
    }
}
