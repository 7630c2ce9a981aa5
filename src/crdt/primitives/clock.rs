// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Clock primitives for ordering writes across replicas.
//!
//! # Lamport Clock
//!
//! A simple monotonic counter that provides a partial ordering of events.
//! When two events have different Lamport times, the one with lower time
//! happened before. When times are equal, events are concurrent.
//!
//! # Stamp
//!
//! A Lamport time paired with the replica that produced it. Stamps are
//! totally ordered (time first, replica second), which is what a
//! last-writer-wins register needs to pick a single winner among
//! concurrent writes.
//!
//! Complexity: every operation is O(1).

use std::cmp::Ordering;

use crate::key::KeyPub;

/// A Lamport clock for partial ordering of events.
///
/// The clock is a simple counter that:
/// - Increments on local events (tick)
/// - Updates to max(local, remote) + 1 on receiving messages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LamportClock {
    time: u64,
}

impl LamportClock {
    /// Create a new clock starting at 0.
    pub fn new() -> LamportClock {
        return LamportClock { time: 0 };
    }

    /// Get the current time.
    #[inline]
    pub fn time(&self) -> u64 {
        return self.time;
    }

    /// Increment the clock for a local event.
    /// Returns the new time.
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.time += 1;
        return self.time;
    }

    /// Update the clock upon receiving a message with the given timestamp.
    /// Sets local time to max(local, remote) + 1.
    /// Returns the new time.
    #[inline]
    pub fn update(&mut self, remote_time: u64) -> u64 {
        self.time = self.time.max(remote_time) + 1;
        return self.time;
    }

    /// Merge with another clock (for sync).
    /// Sets local time to max(local, other).
    #[inline]
    pub fn merge(&mut self, other: &LamportClock) {
        self.time = self.time.max(other.time);
    }
}

impl PartialOrd for LamportClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for LamportClock {
    fn cmp(&self, other: &Self) -> Ordering {
        return self.time.cmp(&other.time);
    }
}

/// A totally ordered write timestamp.
///
/// Field order matters: the derived `Ord` compares `time` first and only
/// falls back to `replica` for concurrent writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stamp {
    pub time: u64,
    pub replica: KeyPub,
}

impl Stamp {
    pub fn new(time: u64, replica: KeyPub) -> Stamp {
        return Stamp { time, replica };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lamport_tick() {
        let mut clock = LamportClock::new();
        assert_eq!(clock.time(), 0);

        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.time(), 2);
    }

    #[test]
    fn lamport_update() {
        let mut clock = LamportClock::new();
        clock.tick(); // time = 1

        // Receive message with time 5
        assert_eq!(clock.update(5), 6);
        assert_eq!(clock.time(), 6);

        // Receive message with time 3 (less than current)
        assert_eq!(clock.update(3), 7);
        assert_eq!(clock.time(), 7);
    }

    #[test]
    fn lamport_merge() {
        let mut a = LamportClock::new();
        a.update(4);
        let mut b = LamportClock::new();
        b.update(9);

        a.merge(&b);
        assert_eq!(a.time(), 10);

        // Merging never moves a clock backwards.
        b.merge(&LamportClock::new());
        assert_eq!(b.time(), 10);
    }

    #[test]
    fn stamp_orders_by_time_first() {
        let low = KeyPub([0u8; 32]);
        let high = KeyPub([9u8; 32]);

        assert!(Stamp::new(1, high) < Stamp::new(2, low));
        assert!(Stamp::new(2, low) < Stamp::new(2, high));
        assert_eq!(Stamp::new(3, low), Stamp::new(3, low));
    }
}
