//! Goal counters with one-time completion rewards.

use merge_farm_core::{
    AchievementDef, AchievementId, AchievementKind, AchievementProgress, TrackerError,
    ACHIEVEMENTS,
};

/// Read-only view of a single achievement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementSnapshot {
    /// Catalog identifier.
    pub id: AchievementId,
    /// Counter category.
    pub kind: AchievementKind,
    /// Completion threshold.
    pub target: u64,
    /// Coins paid on completion.
    pub reward: u64,
    /// Counter value.
    pub current: u64,
    /// Whether the achievement completed.
    pub completed: bool,
}

/// Change applied to one achievement by a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementUpdate {
    /// Catalog identifier.
    pub id: AchievementId,
    /// Counter value after the change.
    pub current: u64,
    /// Whether the achievement is completed after the change.
    pub completed: bool,
    /// Reward owed when this change completed the achievement.
    pub unlocked_reward: Option<u64>,
}

#[derive(Clone, Debug)]
struct AchievementState {
    def: &'static AchievementDef,
    current: u64,
    completed: bool,
}

impl AchievementState {
    fn fresh(def: &'static AchievementDef) -> Self {
        Self {
            def,
            current: 0,
            completed: false,
        }
    }

    fn snapshot(&self) -> AchievementSnapshot {
        AchievementSnapshot {
            id: self.def.id,
            kind: self.def.kind,
            target: self.def.target,
            reward: self.def.reward,
            current: self.current,
            completed: self.completed,
        }
    }

    fn complete(&mut self) -> AchievementUpdate {
        self.completed = true;
        AchievementUpdate {
            id: self.def.id,
            current: self.current,
            completed: true,
            unlocked_reward: Some(self.def.reward),
        }
    }
}

/// Tracks progress of every catalog achievement.
#[derive(Clone, Debug)]
pub struct AchievementTracker {
    entries: Vec<AchievementState>,
}

impl Default for AchievementTracker {
    fn default() -> Self {
        Self {
            entries: ACHIEVEMENTS.iter().map(AchievementState::fresh).collect(),
        }
    }
}

impl AchievementTracker {
    /// Creates a tracker with no progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker and merges persisted progress onto the catalog.
    #[must_use]
    pub fn restore(progress: &[AchievementProgress]) -> Self {
        let mut tracker = Self::new();
        for saved in progress {
            if let Some(entry) = tracker
                .entries
                .iter_mut()
                .find(|entry| entry.def.id == saved.id)
            {
                entry.current = saved.current;
                entry.completed = saved.completed;
            }
        }
        tracker
    }

    /// Applies a counter notification to every open achievement of `kind`.
    ///
    /// Completed achievements are frozen, so redelivered notifications never
    /// pay a reward twice. Level notifications use the level rule instead.
    pub fn on_event(&mut self, kind: AchievementKind, value: u64) -> Vec<AchievementUpdate> {
        if kind == AchievementKind::LevelReached {
            let level = u32::try_from(value).unwrap_or(u32::MAX);
            return self.on_level_reached(level);
        }
        if value == 0 {
            return Vec::new();
        }

        let mut updates = Vec::new();
        for entry in self
            .entries
            .iter_mut()
            .filter(|entry| entry.def.kind == kind && !entry.completed)
        {
            entry.current = entry.current.saturating_add(value);
            if entry.current >= entry.def.target {
                updates.push(entry.complete());
            } else {
                updates.push(AchievementUpdate {
                    id: entry.def.id,
                    current: entry.current,
                    completed: false,
                    unlocked_reward: None,
                });
            }
        }
        updates
    }

    /// Completes every open level achievement whose target is at most `level`.
    pub fn on_level_reached(&mut self, level: u32) -> Vec<AchievementUpdate> {
        let level = u64::from(level);
        self.entries
            .iter_mut()
            .filter(|entry| {
                entry.def.kind == AchievementKind::LevelReached
                    && !entry.completed
                    && entry.def.target <= level
            })
            .map(|entry| {
                entry.current = level;
                entry.complete()
            })
            .collect()
    }

    /// Looks up an achievement by identifier.
    pub fn get(&self, id: &str) -> Result<AchievementSnapshot, TrackerError> {
        self.entries
            .iter()
            .find(|entry| entry.def.id.as_str() == id)
            .map(AchievementState::snapshot)
            .ok_or_else(|| TrackerError::UnknownAchievement(id.to_owned()))
    }

    /// Captures every achievement in catalog order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<AchievementSnapshot> {
        self.entries.iter().map(AchievementState::snapshot).collect()
    }

    /// Number of completed achievements.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.completed).count()
    }

    /// Number of achievements in the catalog.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    /// Drops all progress.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
