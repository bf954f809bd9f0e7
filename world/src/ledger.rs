//! Currency, experience and level bookkeeping.

use merge_farm_core::{LedgerError, LedgerSnapshot};

/// Coins that yield one point of experience.
const COINS_PER_EXPERIENCE: u64 = 10;
/// Coins credited per level reached, multiplied by the new level.
const LEVEL_BONUS_PER_LEVEL: u64 = 50;
/// Threshold growth per level expressed as a ratio (x1.2).
const THRESHOLD_GROWTH: (u64, u64) = (6, 5);

/// Progression ledger owning the coin balance and level curve.
///
/// The ledger is multiplier-agnostic: callers scale rewards before crediting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    coins: u64,
    level: u32,
    experience: u64,
    experience_to_next: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::from_snapshot(LedgerSnapshot::default())
    }
}

impl Ledger {
    /// Creates a fresh ledger at level one with no coins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from persisted values.
    ///
    /// Values that could not have been produced by the ledger are clamped:
    /// level and threshold are at least one, and stored experience is kept
    /// below the threshold.
    #[must_use]
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let experience_to_next = snapshot.experience_to_next.max(1);
        Self {
            coins: snapshot.coins,
            level: snapshot.level.max(1),
            experience: snapshot.experience.min(experience_to_next - 1),
            experience_to_next,
        }
    }

    /// Captures the current ledger values.
    #[must_use]
    pub const fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            coins: self.coins,
            level: self.level,
            experience: self.experience,
            experience_to_next: self.experience_to_next,
        }
    }

    /// Current coin balance.
    #[must_use]
    pub const fn coins(&self) -> u64 {
        self.coins
    }

    /// Credits coins and the experience they carry.
    ///
    /// Returns every level reached, in order. A single large credit may cross
    /// several thresholds; each one pays its own bonus and grows the next
    /// threshold.
    pub fn add_coins(&mut self, amount: u64) -> Vec<u32> {
        self.coins = self.coins.saturating_add(amount);
        self.experience = self
            .experience
            .saturating_add(amount / COINS_PER_EXPERIENCE);

        let mut reached = Vec::new();
        while self.experience >= self.experience_to_next {
            self.experience -= self.experience_to_next;
            self.level = self.level.saturating_add(1);
            self.experience_to_next = grow_threshold(self.experience_to_next);
            self.coins = self
                .coins
                .saturating_add(u64::from(self.level) * LEVEL_BONUS_PER_LEVEL);
            reached.push(self.level);
        }
        reached
    }

    /// Debits coins when the balance covers the amount.
    ///
    /// On failure the balance is left unchanged.
    pub fn spend_coins(&mut self, amount: u64) -> Result<(), LedgerError> {
        if self.coins < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: self.coins,
            });
        }
        self.coins -= amount;
        Ok(())
    }
}

/// Multiplies the threshold by 1.2 and rounds to the nearest integer.
fn grow_threshold(threshold: u64) -> u64 {
    let (numerator, denominator) = THRESHOLD_GROWTH;
    let scaled = threshold
        .saturating_mul(numerator)
        .saturating_add(denominator / 2)
        / denominator;
    scaled.max(1)
}
