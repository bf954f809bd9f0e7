//! Deadline-based registry of gameplay modifiers.

use std::{collections::BTreeMap, time::Duration};

use merge_farm_core::{ModifierExpiry, ModifierKind};

/// Registry mapping each granted modifier to the end of its window.
#[derive(Clone, Debug, Default)]
pub struct ModifierRegistry {
    entries: BTreeMap<ModifierKind, ModifierExpiry>,
}

impl ModifierRegistry {
    /// Creates a registry with no active modifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from persisted activations.
    #[must_use]
    pub fn restore(entries: &[(ModifierKind, ModifierExpiry)]) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
        }
    }

    /// Activates `kind` until `now + duration`, replacing any earlier window.
    ///
    /// Permanent modifiers ignore the duration.
    pub fn grant(&mut self, kind: ModifierKind, duration: Duration, now: Duration) -> ModifierExpiry {
        let expiry = if kind.is_permanent() {
            ModifierExpiry::Permanent
        } else {
            ModifierExpiry::At(now.saturating_add(duration))
        };
        let _ = self.entries.insert(kind, expiry);
        expiry
    }

    /// Reports whether `kind` is in effect at `now`.
    #[must_use]
    pub fn is_active(&self, kind: ModifierKind, now: Duration) -> bool {
        self.entries
            .get(&kind)
            .is_some_and(|expiry| expiry.is_active(now))
    }

    /// Returns the recorded activation of `kind`, if any.
    #[must_use]
    pub fn expiry(&self, kind: ModifierKind) -> Option<ModifierExpiry> {
        self.entries.get(&kind).copied()
    }

    /// Lists modifiers whose window ended in `(previous, now]`.
    #[must_use]
    pub fn expired_between(&self, previous: Duration, now: Duration) -> Vec<ModifierKind> {
        self.entries
            .iter()
            .filter_map(|(kind, expiry)| match expiry {
                ModifierExpiry::At(at) if previous < *at && *at <= now => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Iterates recorded activations in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ModifierKind, ModifierExpiry)> + '_ {
        self.entries.iter().map(|(kind, expiry)| (*kind, *expiry))
    }

    /// Forgets every activation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
