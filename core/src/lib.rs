#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Merge Farm engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! sinks to react to deterministically. Systems consume event streams, query
//! immutable snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod config;
pub mod store;

pub use catalog::{AchievementDef, AchievementId, ACHIEVEMENTS};
pub use config::BalanceConfig;
pub use store::{AchievementProgress, KeyValueStore, SavedProgress, StoreError};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Merge Farm.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the logical clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new item of the given tier appear in an empty slot.
    SpawnItem {
        /// Slot that should receive the item.
        slot: SlotCoord,
        /// Tier assigned to the spawned item.
        tier: ItemTier,
    },
    /// Requests that an item be dragged into an empty slot.
    MoveItem {
        /// Item being moved.
        item: ItemId,
        /// Destination slot.
        to: SlotCoord,
    },
    /// Requests that an item be taken off the grid without a reward.
    ///
    /// Removing an item that is no longer on the grid is a no-op.
    RemoveItem {
        /// Item being removed.
        item: ItemId,
    },
    /// Requests that two items be merged into one item of the next tier.
    ///
    /// The merged item replaces `source` in its slot.
    Merge {
        /// Item whose slot receives the merged result.
        source: ItemId,
        /// Item consumed alongside the source.
        target: ItemId,
    },
    /// Credits coins from an external reward collaborator.
    GrantCoins {
        /// Number of coins to credit.
        amount: u64,
    },
    /// Activates a modifier for the provided duration.
    ///
    /// Permanent modifiers ignore the duration.
    GrantModifier {
        /// Modifier to activate.
        kind: ModifierKind,
        /// Length of the activation window.
        duration: Duration,
    },
    /// Spends coins on a shop offer and applies its effect.
    Purchase {
        /// Offer being purchased.
        offer: ShopOffer,
    },
    /// Credits the reward for a fully watched rewarded advertisement.
    GrantAdReward,
    /// Reports progress for counters driven outside the core.
    RecordProgress {
        /// Achievement category receiving the progress.
        kind: AchievementKind,
        /// Amount of progress to record.
        value: u64,
    },
    /// Marks the onboarding tutorial as finished.
    CompleteTutorial,
    /// Restores the ledger, achievements, modifiers and tutorial flag to defaults.
    ResetProgress,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the logical clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Clock value after the tick.
        now: Duration,
    },
    /// Confirms that an item appeared on the grid.
    ItemSpawned {
        /// Identifier allocated to the item.
        item: ItemId,
        /// Tier of the item.
        tier: ItemTier,
        /// Slot occupied by the item.
        slot: SlotCoord,
    },
    /// Confirms that an item moved into an empty slot.
    ItemMoved {
        /// Item that moved.
        item: ItemId,
        /// Slot the item left.
        from: SlotCoord,
        /// Slot the item occupies now.
        to: SlotCoord,
    },
    /// Confirms that an item was taken off the grid.
    ItemRemoved {
        /// Item that was removed.
        item: ItemId,
        /// Slot the item vacated.
        slot: SlotCoord,
    },
    /// Reports that a move request was rejected.
    MoveRejected {
        /// Item named by the request.
        item: ItemId,
        /// Requested destination.
        to: SlotCoord,
        /// Specific reason the move failed.
        reason: MoveRejection,
    },
    /// Confirms that two items merged into one item of the next tier.
    MergeCompleted {
        /// Identifier allocated to the merged item.
        item: ItemId,
        /// Items removed by the merge, source first.
        consumed: [ItemId; 2],
        /// Slot holding the merged item.
        slot: SlotCoord,
        /// Tier of the merged item.
        tier: ItemTier,
        /// Coins credited for the merge after modifiers were applied.
        reward: u64,
    },
    /// Reports that a merge request left the grid untouched.
    MergeRejected {
        /// Source item named by the request.
        source: ItemId,
        /// Target item named by the request.
        target: ItemId,
        /// Specific reason the merge was refused.
        reason: MergeRejection,
    },
    /// Publishes the ledger after any change to it.
    LedgerChanged {
        /// Ledger values after the change.
        ledger: LedgerSnapshot,
    },
    /// Announces that a level threshold was crossed.
    ///
    /// One event is emitted per threshold, in order.
    LevelUp {
        /// Level reached.
        level: u32,
    },
    /// Publishes the progress of an achievement after it changed.
    AchievementProgressed {
        /// Achievement that changed.
        id: AchievementId,
        /// Current counter value.
        current: u64,
        /// Whether the achievement is completed.
        completed: bool,
    },
    /// Announces that an achievement completed and paid out its reward.
    AchievementUnlocked {
        /// Achievement that completed.
        id: AchievementId,
        /// Coins credited for the completion.
        reward: u64,
    },
    /// Confirms that a modifier was activated.
    ModifierGranted {
        /// Modifier that was activated.
        kind: ModifierKind,
        /// When the activation ends.
        expiry: ModifierExpiry,
    },
    /// Announces that a modifier window elapsed during a tick.
    ModifierExpired {
        /// Modifier whose window ended.
        kind: ModifierKind,
    },
    /// Confirms that a shop offer was paid for and applied.
    PurchaseCompleted {
        /// Offer that was purchased.
        offer: ShopOffer,
    },
    /// Reports that a shop offer could not be paid for.
    PurchaseRejected {
        /// Offer named by the request.
        offer: ShopOffer,
        /// Reason the payment failed.
        reason: LedgerError,
    },
    /// Confirms that a rewarded advertisement paid out.
    AdRewardGranted {
        /// Coins credited.
        amount: u64,
    },
    /// Confirms that the tutorial flag was set.
    TutorialCompleted,
    /// Confirms that progression state returned to defaults.
    ProgressReset,
    /// Reports that persisted state could not be written.
    ///
    /// The in-memory state stays authoritative and the write is retried.
    PersistenceFailed {
        /// Human readable failure description.
        message: String,
    },
}

/// Receives events after the batch that produced them completes.
pub trait EventSink {
    /// Observes a single event. Delivery never blocks the simulation.
    fn notify(&mut self, event: &Event);
}

/// Unique identifier assigned to an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid slot expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotCoord {
    column: u32,
    row: u32,
}

impl SlotCoord {
    /// Creates a new slot coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the slot.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the slot.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Position of an item within the merge ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemTier(u8);

impl ItemTier {
    /// Tier assigned to freshly spawned items.
    pub const SEED: Self = Self(0);

    /// Creates a tier wrapper.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the underlying tier index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Tier produced by merging two items of this tier.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Reports whether this tier is the top of a ladder with `tier_count` tiers.
    ///
    /// Tiers at or beyond the top cannot merge further.
    #[must_use]
    pub const fn is_top(self, tier_count: u8) -> bool {
        self.0 >= tier_count.saturating_sub(1)
    }

    /// Coins awarded for reaching this tier through a merge.
    ///
    /// The ladder is exponential: `2^tier * base_reward`.
    #[must_use]
    pub fn merge_reward(self, base_reward: u64) -> u64 {
        1_u64
            .checked_shl(u32::from(self.0))
            .map_or(u64::MAX, |scale| scale.saturating_mul(base_reward))
    }
}

/// Immutable representation of a single item used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemSnapshot {
    /// Identifier allocated to the item.
    pub id: ItemId,
    /// Tier of the item.
    pub tier: ItemTier,
    /// Slot occupied by the item.
    pub slot: SlotCoord,
}

/// Read-only snapshot describing all items on the grid.
#[derive(Clone, Debug, Default)]
pub struct ItemView {
    snapshots: Vec<ItemSnapshot>,
}

impl ItemView {
    /// Creates a new item view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ItemSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured item snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemSnapshot> {
        self.snapshots.iter()
    }

    /// Number of items captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ItemSnapshot> {
        self.snapshots
    }
}

/// Currency, level and experience values of the progression ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Spendable coin balance.
    pub coins: u64,
    /// Current level, starting at one.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub experience: u64,
    /// Experience required to reach the next level.
    pub experience_to_next: u64,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self {
            coins: 0,
            level: 1,
            experience: 0,
            experience_to_next: 100,
        }
    }
}

/// Time-bounded or permanent gameplay modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Doubles coins credited for merges.
    DoubleCoins,
    /// Drives automatic merging of matching items.
    AutoMerge,
    /// Suppresses interstitial advertisements forever.
    NoAds,
}

impl ModifierKind {
    /// Every modifier kind in declaration order.
    pub const ALL: [Self; 3] = [Self::DoubleCoins, Self::AutoMerge, Self::NoAds];

    /// Reports whether activation never expires.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::NoAds)
    }
}

/// Describes when a modifier activation ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierExpiry {
    /// Active while the logical clock is strictly before the timestamp.
    At(Duration),
    /// Active forever.
    Permanent,
}

impl ModifierExpiry {
    /// Reports whether the activation is in effect at `now`.
    #[must_use]
    pub fn is_active(self, now: Duration) -> bool {
        match self {
            Self::At(expiry) => now < expiry,
            Self::Permanent => true,
        }
    }
}

/// Categories of achievement counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementKind {
    /// Number of completed merges.
    TotalMerges,
    /// Coins credited by merges.
    CoinsEarned,
    /// Highest level reached.
    LevelReached,
    /// Top-tier items created.
    ItemsCreated,
    /// Rewarded advertisements watched.
    AdsWatched,
    /// Consecutive daily logins.
    ConsecutiveLogins,
    /// Time spent playing.
    TimeSpent,
}

/// Offers that can be bought with coins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopOffer {
    /// Thirty minutes of automatic merging.
    AutoMerge,
    /// One hour of double coins.
    DoubleCoins,
}

impl ShopOffer {
    /// Every offer available in the shop.
    pub const ALL: [Self; 2] = [Self::AutoMerge, Self::DoubleCoins];

    /// Coin price of the offer.
    #[must_use]
    pub const fn price(self) -> u64 {
        match self {
            Self::AutoMerge => 2_000,
            Self::DoubleCoins => 1_500,
        }
    }

    /// Modifier activated by the offer.
    #[must_use]
    pub const fn modifier(self) -> ModifierKind {
        match self {
            Self::AutoMerge => ModifierKind::AutoMerge,
            Self::DoubleCoins => ModifierKind::DoubleCoins,
        }
    }

    /// Length of the modifier window granted by the offer.
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::AutoMerge => Duration::from_secs(30 * 60),
            Self::DoubleCoins => Duration::from_secs(60 * 60),
        }
    }
}

/// Reasons a merge request may leave the grid untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeRejection {
    /// The two items have different tiers.
    TierMismatch,
    /// The items already sit at the top of the ladder.
    TopTier,
    /// Both sides of the request name the same item.
    SameItem,
    /// At least one item is no longer on the grid.
    MissingItem,
}

/// Reasons a move request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveRejection {
    /// The item is no longer on the grid.
    MissingItem,
    /// The destination slot cannot receive the item.
    Placement(GridError),
}

/// Errors produced by grid slot operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum GridError {
    /// The slot already holds an item.
    #[error("slot ({}, {}) is already occupied", .slot.column(), .slot.row())]
    SlotOccupied {
        /// Slot named by the operation.
        slot: SlotCoord,
    },
    /// The slot lies outside the grid.
    #[error("slot ({}, {}) is outside the grid", .slot.column(), .slot.row())]
    OutOfBounds {
        /// Slot named by the operation.
        slot: SlotCoord,
    },
}

/// Errors produced by ledger operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum LedgerError {
    /// The balance does not cover the requested amount.
    #[error("insufficient funds: {required} coins required, {available} available")]
    InsufficientFunds {
        /// Amount requested.
        required: u64,
        /// Balance at the time of the request.
        available: u64,
    },
}

/// Errors produced by achievement lookups.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// No catalog entry carries the identifier.
    #[error("unknown achievement `{0}`")]
    UnknownAchievement(String),
}
