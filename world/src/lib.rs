#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Merge Farm.
//!
//! The world owns the grid, the items placed on it, the progression ledger,
//! the achievement tracker and the modifier registry. Every mutation enters
//! through [`apply`], runs to completion within that call, and reports its
//! effects as [`Event`] values. No caller ever observes a half-applied merge.

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use merge_farm_core::{
    AchievementKind, BalanceConfig, Command, Event, ItemId, ItemTier, MergeRejection,
    ModifierKind, MoveRejection, SavedProgress, ShopOffer, SlotCoord, WELCOME_BANNER,
};

pub mod achievements;
pub mod grid;
pub mod ledger;
pub mod modifiers;

use achievements::{AchievementTracker, AchievementUpdate};
use grid::Grid;
use ledger::Ledger;
use modifiers::ModifierRegistry;

/// Flat bonus paid by a rewarded advertisement on top of a tenth of the balance.
const AD_REWARD_BASE: u64 = 100;

/// Represents the authoritative Merge Farm world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: BalanceConfig,
    grid: Grid,
    items: BTreeMap<ItemId, Item>,
    next_item_id: ItemId,
    ledger: Ledger,
    achievements: AchievementTracker,
    modifiers: ModifierRegistry,
    clock: Duration,
    tutorial_completed: bool,
}

#[derive(Clone, Copy, Debug)]
struct Item {
    tier: ItemTier,
    slot: SlotCoord,
}

impl World {
    /// Creates a fresh world with an empty grid and default progression.
    #[must_use]
    pub fn new(config: BalanceConfig) -> Self {
        Self::restore(config, &SavedProgress::default())
    }

    /// Creates a world whose progression resumes from persisted values.
    ///
    /// The grid always starts empty.
    #[must_use]
    pub fn restore(config: BalanceConfig, progress: &SavedProgress) -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: Grid::new(config.grid_columns, config.grid_rows),
            items: BTreeMap::new(),
            next_item_id: ItemId::new(0),
            ledger: Ledger::from_snapshot(progress.ledger),
            achievements: AchievementTracker::restore(&progress.achievements),
            modifiers: ModifierRegistry::restore(&progress.modifiers),
            clock: progress.clock,
            tutorial_completed: progress.tutorial_completed,
            config,
        }
    }

    fn allocate_item_id(&mut self) -> ItemId {
        let id = self.next_item_id;
        self.next_item_id = ItemId::new(id.get().wrapping_add(1));
        id
    }

    fn spawn(&mut self, slot: SlotCoord, tier: ItemTier, out_events: &mut Vec<Event>) {
        let item = self.next_item_id;
        match self.grid.place(item, slot) {
            Ok(()) => {
                let _ = self.allocate_item_id();
                let _ = self.items.insert(item, Item { tier, slot });
                out_events.push(Event::ItemSpawned { item, tier, slot });
            }
            Err(error) => {
                debug_assert!(false, "spawn into unavailable slot: {error}");
                log::warn!("ignoring spawn: {error}");
            }
        }
    }

    fn move_item(&mut self, item: ItemId, to: SlotCoord, out_events: &mut Vec<Event>) {
        let Some(entry) = self.items.get_mut(&item) else {
            out_events.push(Event::MoveRejected {
                item,
                to,
                reason: MoveRejection::MissingItem,
            });
            return;
        };

        let from = entry.slot;
        if let Err(error) = self.grid.place(item, to) {
            out_events.push(Event::MoveRejected {
                item,
                to,
                reason: MoveRejection::Placement(error),
            });
            return;
        }

        self.grid.vacate(from);
        entry.slot = to;
        out_events.push(Event::ItemMoved { item, from, to });
    }

    fn remove_item(&mut self, item: ItemId, out_events: &mut Vec<Event>) {
        let Some(entry) = self.items.remove(&item) else {
            return;
        };
        match self.grid.remove(entry.slot) {
            Ok(Some(occupant)) if occupant == item => {
                out_events.push(Event::ItemRemoved {
                    item,
                    slot: entry.slot,
                });
            }
            other => log::warn!("item {item:?} was not at {:?}: {other:?}", entry.slot),
        }
    }

    fn merge(
        &mut self,
        source: ItemId,
        target: ItemId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), MergeRejection> {
        if source == target {
            return Err(MergeRejection::SameItem);
        }

        let source_item = self.placed_item(source)?;
        let target_item = self.placed_item(target)?;

        if source_item.tier != target_item.tier {
            return Err(MergeRejection::TierMismatch);
        }
        if source_item.tier.is_top(self.config.tier_count) {
            return Err(MergeRejection::TopTier);
        }

        let _ = self.items.remove(&source);
        let _ = self.items.remove(&target);
        self.grid.vacate(source_item.slot);
        self.grid.vacate(target_item.slot);

        let tier = source_item.tier.next();
        let slot = source_item.slot;
        let item = self.allocate_item_id();
        self.grid.occupy(item, slot);
        let _ = self.items.insert(item, Item { tier, slot });

        let mut reward = tier.merge_reward(self.config.base_reward);
        if self.modifiers.is_active(ModifierKind::DoubleCoins, self.clock) {
            reward = reward.saturating_mul(2);
        }

        out_events.push(Event::MergeCompleted {
            item,
            consumed: [source, target],
            slot,
            tier,
            reward,
        });

        self.credit(reward, out_events);
        self.record_progress(AchievementKind::TotalMerges, 1, out_events);
        self.record_progress(AchievementKind::CoinsEarned, reward, out_events);
        if tier.is_top(self.config.tier_count) {
            self.record_progress(AchievementKind::ItemsCreated, 1, out_events);
        }
        Ok(())
    }

    fn placed_item(&self, id: ItemId) -> Result<Item, MergeRejection> {
        let item = self.items.get(&id).copied().ok_or(MergeRejection::MissingItem)?;
        match self.grid.occupant(item.slot) {
            Ok(Some(occupant)) if occupant == id => Ok(item),
            _ => Err(MergeRejection::MissingItem),
        }
    }

    fn credit(&mut self, amount: u64, out_events: &mut Vec<Event>) {
        let mut pending = VecDeque::from([amount]);
        while let Some(amount) = pending.pop_front() {
            let levels = self.ledger.add_coins(amount);
            out_events.push(Event::LedgerChanged {
                ledger: self.ledger.snapshot(),
            });

            for level in levels {
                log::info!("level up: {level}");
                out_events.push(Event::LevelUp { level });
                let updates = self.achievements.on_level_reached(level);
                pending.extend(publish_achievements(updates, out_events));
            }
        }
    }

    fn record_progress(&mut self, kind: AchievementKind, value: u64, out_events: &mut Vec<Event>) {
        let updates = self.achievements.on_event(kind, value);
        for reward in publish_achievements(updates, out_events) {
            self.credit(reward, out_events);
        }
    }

    fn purchase(&mut self, offer: ShopOffer, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.ledger.spend_coins(offer.price()) {
            log::debug!("purchase of {offer:?} rejected: {reason}");
            out_events.push(Event::PurchaseRejected { offer, reason });
            return;
        }

        out_events.push(Event::LedgerChanged {
            ledger: self.ledger.snapshot(),
        });
        self.grant_modifier(offer.modifier(), offer.duration(), out_events);
        out_events.push(Event::PurchaseCompleted { offer });
    }

    fn grant_modifier(&mut self, kind: ModifierKind, duration: Duration, out_events: &mut Vec<Event>) {
        let expiry = self.modifiers.grant(kind, duration, self.clock);
        out_events.push(Event::ModifierGranted { kind, expiry });
    }

    fn grant_ad_reward(&mut self, out_events: &mut Vec<Event>) {
        let amount = tenth_rounded_half_even(self.ledger.coins()).saturating_add(AD_REWARD_BASE);
        self.credit(amount, out_events);
        out_events.push(Event::AdRewardGranted { amount });
        self.record_progress(AchievementKind::AdsWatched, 1, out_events);
    }

    fn reset_progress(&mut self, out_events: &mut Vec<Event>) {
        self.ledger = Ledger::new();
        self.achievements.reset();
        self.modifiers.clear();
        self.tutorial_completed = false;
        out_events.push(Event::ProgressReset);
        out_events.push(Event::LedgerChanged {
            ledger: self.ledger.snapshot(),
        });
    }
}

/// A tenth of `coins`, with exact halves rounded to the even neighbour.
fn tenth_rounded_half_even(coins: u64) -> u64 {
    let (quotient, remainder) = (coins / 10, coins % 10);
    if remainder > 5 || (remainder == 5 && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

/// Translates tracker updates into events and returns the rewards owed.
fn publish_achievements(updates: Vec<AchievementUpdate>, out_events: &mut Vec<Event>) -> Vec<u64> {
    let mut rewards = Vec::new();
    for update in updates {
        out_events.push(Event::AchievementProgressed {
            id: update.id,
            current: update.current,
            completed: update.completed,
        });
        if let Some(reward) = update.unlocked_reward {
            log::info!("achievement unlocked: {} (+{reward})", update.id);
            out_events.push(Event::AchievementUnlocked {
                id: update.id,
                reward,
            });
            rewards.push(reward);
        }
    }
    rewards
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    log::debug!("applying {command:?}");
    match command {
        Command::Tick { dt } => {
            let previous = world.clock;
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced {
                dt,
                now: world.clock,
            });
            for kind in world.modifiers.expired_between(previous, world.clock) {
                out_events.push(Event::ModifierExpired { kind });
            }
        }
        Command::SpawnItem { slot, tier } => world.spawn(slot, tier, out_events),
        Command::MoveItem { item, to } => world.move_item(item, to, out_events),
        Command::RemoveItem { item } => world.remove_item(item, out_events),
        Command::Merge { source, target } => {
            if let Err(reason) = world.merge(source, target, out_events) {
                out_events.push(Event::MergeRejected {
                    source,
                    target,
                    reason,
                });
            }
        }
        Command::GrantCoins { amount } => world.credit(amount, out_events),
        Command::GrantModifier { kind, duration } => {
            world.grant_modifier(kind, duration, out_events);
        }
        Command::Purchase { offer } => world.purchase(offer, out_events),
        Command::GrantAdReward => world.grant_ad_reward(out_events),
        Command::RecordProgress { kind, value } => {
            world.record_progress(kind, value, out_events);
        }
        Command::CompleteTutorial => {
            if !world.tutorial_completed {
                world.tutorial_completed = true;
                out_events.push(Event::TutorialCompleted);
            }
        }
        Command::ResetProgress => world.reset_progress(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use merge_farm_core::{
        AchievementProgress, BalanceConfig, ItemId, ItemSnapshot, ItemView, LedgerSnapshot,
        ModifierExpiry, ModifierKind, SavedProgress, SlotCoord, TrackerError,
    };

    use super::{achievements::AchievementSnapshot, grid::Grid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides the balance configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &BalanceConfig {
        &world.config
    }

    /// Current value of the logical clock.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Provides read-only access to the slot grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Enumerates empty slots in row-major order.
    #[must_use]
    pub fn empty_slots(world: &World) -> Vec<SlotCoord> {
        world.grid.empty_slots()
    }

    /// Captures a read-only view of the items on the grid.
    #[must_use]
    pub fn item_view(world: &World) -> ItemView {
        ItemView::from_snapshots(
            world
                .items
                .iter()
                .map(|(id, item)| ItemSnapshot {
                    id: *id,
                    tier: item.tier,
                    slot: item.slot,
                })
                .collect(),
        )
    }

    /// Looks up a single item.
    #[must_use]
    pub fn item(world: &World, id: ItemId) -> Option<ItemSnapshot> {
        world.items.get(&id).map(|item| ItemSnapshot {
            id,
            tier: item.tier,
            slot: item.slot,
        })
    }

    /// Captures the ledger values.
    #[must_use]
    pub fn ledger(world: &World) -> LedgerSnapshot {
        world.ledger.snapshot()
    }

    /// Looks up an achievement by identifier.
    pub fn achievement(world: &World, id: &str) -> Result<AchievementSnapshot, TrackerError> {
        world.achievements.get(id)
    }

    /// Captures every achievement in catalog order.
    #[must_use]
    pub fn achievements(world: &World) -> Vec<AchievementSnapshot> {
        world.achievements.snapshots()
    }

    /// Number of completed achievements.
    #[must_use]
    pub fn completed_achievements(world: &World) -> usize {
        world.achievements.completed_count()
    }

    /// Number of achievements in the catalog.
    #[must_use]
    pub fn total_achievements(world: &World) -> usize {
        world.achievements.total_count()
    }

    /// Reports whether a modifier is in effect at the current clock.
    #[must_use]
    pub fn modifier_active(world: &World, kind: ModifierKind) -> bool {
        world.modifiers.is_active(kind, world.clock)
    }

    /// Returns the recorded activation of a modifier, if any.
    #[must_use]
    pub fn modifier_expiry(world: &World, kind: ModifierKind) -> Option<ModifierExpiry> {
        world.modifiers.expiry(kind)
    }

    /// Reports whether the tutorial was finished.
    #[must_use]
    pub fn tutorial_completed(world: &World) -> bool {
        world.tutorial_completed
    }

    /// Captures every persistable value.
    ///
    /// Achievements without progress are omitted.
    #[must_use]
    pub fn progress(world: &World) -> SavedProgress {
        SavedProgress {
            ledger: world.ledger.snapshot(),
            achievements: world
                .achievements
                .snapshots()
                .into_iter()
                .filter(|snapshot| snapshot.current > 0 || snapshot.completed)
                .map(|snapshot| AchievementProgress {
                    id: snapshot.id,
                    current: snapshot.current,
                    completed: snapshot.completed,
                })
                .collect(),
            modifiers: world.modifiers.iter().collect(),
            clock: world.clock,
            tutorial_completed: world.tutorial_completed,
        }
    }
}
