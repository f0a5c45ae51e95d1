//! Store writes that still owe a cache refresh.

use super::identifier::Identifier;
use super::kind::{SlotName, SlotSet};

/// Result of a store write, carrying the cache slots the write made stale.
///
/// The value is only reachable through
/// [`CacheRegistry::sync`](super::CacheRegistry::sync), which refreshes
/// every dirty slot first. Dropping a `Written` leaves the cache stale.
#[must_use = "the cache is stale until this is passed to CacheRegistry::sync"]
#[derive(Debug)]
pub struct Written<T> {
    pub(super) value: T,
    pub(super) touched: Vec<(Identifier, SlotSet)>,
}

impl Written<()> {
    /// Nothing written yet. Steps are added with [`Written::mark`] and
    /// [`Written::record`] as they land.
    pub fn pending() -> Self {
        Self {
            value: (),
            touched: Vec::new(),
        }
    }

    /// Attach the operation's outcome, for
    /// [`CacheRegistry::settle`](super::CacheRegistry::settle).
    pub fn finish<T>(self, outcome: T) -> Written<T> {
        self.map(|()| outcome)
    }
}

impl<T> Written<T> {
    /// A write that dirtied `slots` for `id`.
    pub fn new(value: T, id: &Identifier, slots: &[SlotName]) -> Self {
        Self {
            value,
            touched: vec![(id.clone(), SlotSet::of(slots))],
        }
    }

    /// Record more slots made stale by the same operation.
    pub fn and(mut self, id: &Identifier, slots: &[SlotName]) -> Self {
        self.mark(id, slots);
        self
    }

    /// In-place [`Written::and`], for operations that write in steps.
    pub fn mark(&mut self, id: &Identifier, slots: &[SlotName]) {
        self.touch(id, SlotSet::of(slots));
    }

    /// Fold another pending write into this one, keeping `self`'s value.
    pub fn absorb<U>(mut self, other: Written<U>) -> Self {
        self.record(other);
        self
    }

    /// Fold a write that just landed into this dirty set and hand back its
    /// value.
    pub fn record<U>(&mut self, other: Written<U>) -> U {
        for (id, slots) in other.touched {
            self.touch(&id, slots);
        }
        other.value
    }

    fn touch(&mut self, id: &Identifier, slots: SlotSet) {
        match self.touched.iter_mut().find(|(touched, _)| touched == id) {
            Some((_, existing)) => *existing = existing.union(slots),
            None => self.touched.push((id.clone(), slots)),
        }
    }

    /// Transform the carried value without touching the dirty set.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Written<U> {
        Written {
            value: f(self.value),
            touched: self.touched,
        }
    }

    /// Every slot this write dirtied, across identifiers.
    pub fn dirty(&self) -> SlotSet {
        self.touched
            .iter()
            .fold(SlotSet::EMPTY, |all, (_, slots)| all.union(*slots))
    }

    /// Identifiers whose slots this write dirtied.
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.touched.iter().map(|(id, _)| id)
    }
}
