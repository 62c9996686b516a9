//! Tick-indexed history.
//!
//! Fixed-capacity ring buffers addressed by `tick % capacity`. Every slot
//! is stamped with the tick it holds, so an entry evicted by wraparound is
//! reported as missing instead of handed back stale.

#[derive(Debug, Clone)]
struct Slot<T> {
    tick: u32,
    value: T,
}

/// Fixed-capacity, tick-stamped ring buffer.
#[derive(Debug, Clone)]
pub struct TickHistory<T> {
    slots: Vec<Option<Slot<T>>>,
    latest: Option<u32>,
}

impl<T> TickHistory<T> {
    /// Creates a buffer covering `capacity` consecutive ticks.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be positive");
        let mut slots = Vec::new();
        slots.resize_with(capacity, || None);
        Self {
            slots,
            latest: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn index(&self, tick: u32) -> usize {
        tick as usize % self.slots.len()
    }

    /// Stores `value` for `tick`, evicting whatever occupied the slot.
    /// A write older than the resident entry is ignored.
    pub fn insert(&mut self, tick: u32, value: T) {
        let idx = self.index(tick);
        if let Some(slot) = &self.slots[idx] {
            if slot.tick > tick {
                return;
            }
        }
        self.slots[idx] = Some(Slot { tick, value });
        if self.latest.map_or(true, |t| tick > t) {
            self.latest = Some(tick);
        }
    }

    /// Returns the entry for `tick`, or `None` if it was never written or
    /// has been overwritten by a newer tick.
    pub fn get(&self, tick: u32) -> Option<&T> {
        self.slots[self.index(tick)]
            .as_ref()
            .filter(|slot| slot.tick == tick)
            .map(|slot| &slot.value)
    }

    /// Newest tick ever written.
    pub fn latest_tick(&self) -> Option<u32> {
        self.latest
    }

    /// Oldest tick still guaranteed resident, given the newest write.
    pub fn oldest_covered_tick(&self) -> Option<u32> {
        self.latest
            .map(|t| t.saturating_sub(self.slots.len() as u32 - 1))
    }
}
