//! Static achievement catalog.
//!
//! The catalog is immutable; only progress values are loaded from storage and
//! merged onto these entries at startup.

use std::fmt;

use crate::AchievementKind;

/// Unique key of a catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AchievementId(&'static str);

impl AchievementId {
    /// Wraps a static identifier.
    #[must_use]
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    /// Retrieves the textual identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Static description of a single achievement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementDef {
    /// Unique key.
    pub id: AchievementId,
    /// Counter category that drives progress.
    pub kind: AchievementKind,
    /// Value at which the achievement completes.
    pub target: u64,
    /// Coins credited once on completion.
    pub reward: u64,
}

const fn def(id: &'static str, kind: AchievementKind, target: u64, reward: u64) -> AchievementDef {
    AchievementDef {
        id: AchievementId::new(id),
        kind,
        target,
        reward,
    }
}

/// Every achievement available in the game.
pub const ACHIEVEMENTS: &[AchievementDef] = &[
    def("first_merge", AchievementKind::TotalMerges, 1, 100),
    def("merge_master_1", AchievementKind::TotalMerges, 50, 500),
    def("merge_master_2", AchievementKind::TotalMerges, 200, 1_000),
    def("merge_master_3", AchievementKind::TotalMerges, 500, 2_500),
    def("coin_collector_1", AchievementKind::CoinsEarned, 1_000, 200),
    def("coin_collector_2", AchievementKind::CoinsEarned, 10_000, 1_000),
    def("coin_collector_3", AchievementKind::CoinsEarned, 50_000, 5_000),
    def("level_5", AchievementKind::LevelReached, 5, 300),
    def("level_10", AchievementKind::LevelReached, 10, 800),
    def("level_25", AchievementKind::LevelReached, 25, 2_000),
    def("fruit_tree", AchievementKind::ItemsCreated, 1, 1_000),
    def("fruit_master", AchievementKind::ItemsCreated, 10, 5_000),
    def("ad_supporter", AchievementKind::AdsWatched, 5, 500),
    def("ad_fan", AchievementKind::AdsWatched, 25, 2_000),
    def("daily_1", AchievementKind::ConsecutiveLogins, 1, 100),
    def("daily_7", AchievementKind::ConsecutiveLogins, 7, 1_000),
    def("daily_30", AchievementKind::ConsecutiveLogins, 30, 10_000),
];

/// Looks up a catalog entry by its textual identifier.
#[must_use]
pub fn find(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|def| def.id.as_str() == id)
}
