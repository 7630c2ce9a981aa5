// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Last-writer-wins registers and maps.
//!
//! Each key holds one register: the value (or a tombstone) and the stamp
//! of the write that produced it. A write only lands if its stamp is
//! greater than the register's current stamp, so replicas that see the
//! same writes in any order end up with the same state.
//!
//! Deletes are tombstones rather than removals. Without them a late,
//! older write could resurrect a deleted key after merge.
//!
//! Complexity:
//! - apply / get: O(1) average (hash map)
//! - merge: O(n) in the size of the other map
//! - snapshot: O(n log n) (sorted by key)

use std::collections::BTreeMap;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::Crdt;
use super::primitives::Stamp;

/// A single register: the winning write for one key.
#[derive(Clone, Debug, PartialEq)]
pub struct Register<V> {
    pub stamp: Stamp,
    /// `None` is a tombstone.
    pub value: Option<V>,
}

/// A standalone last-writer-wins cell.
#[derive(Clone, Debug, PartialEq)]
pub struct LwwRegister<V> {
    register: Option<Register<V>>,
}

impl<V: Clone> Default for LwwRegister<V> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<V: Clone> LwwRegister<V> {
    pub fn new() -> LwwRegister<V> {
        return LwwRegister { register: None };
    }

    /// The current value, if any.
    pub fn get(&self) -> Option<&V> {
        return self.register.as_ref().and_then(|r| r.value.as_ref());
    }

    /// The stamp of the winning write, if any.
    pub fn stamp(&self) -> Option<Stamp> {
        return self.register.as_ref().map(|r| r.stamp);
    }

    /// Apply a write. Returns true if it won.
    pub fn apply(&mut self, value: Option<V>, stamp: Stamp) -> bool {
        if let Some(current) = &self.register {
            if stamp <= current.stamp {
                return false;
            }
        }
        self.register = Some(Register { stamp, value });
        return true;
    }
}

impl<V: Clone> LwwRegister<V> {
    /// Merge another register in. Returns true if theirs won.
    pub fn merge_from(&mut self, other: &Self) -> bool {
        let Some(theirs) = &other.register else {
            return false;
        };
        return self.apply(theirs.value.clone(), theirs.stamp);
    }
}

impl<V: Clone> Crdt for LwwRegister<V> {
    fn merge(&mut self, other: &Self) {
        self.merge_from(other);
    }
}

/// A map of last-writer-wins registers.
#[derive(Clone, Debug)]
pub struct LwwMap<K: Clone + Eq + Hash, V: Clone> {
    entries: FxHashMap<K, Register<V>>,
    /// Number of registers holding a value (not a tombstone).
    live: usize,
}

impl<K: Clone + Eq + Hash, V: Clone> Default for LwwMap<K, V> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<K: Clone + Eq + Hash, V: Clone> LwwMap<K, V> {
    /// Create an empty map.
    pub fn new() -> LwwMap<K, V> {
        return LwwMap {
            entries: FxHashMap::default(),
            live: 0,
        };
    }

    /// Get the live value for a key.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        return self.entries.get(key).and_then(|r| r.value.as_ref());
    }

    /// Get the raw register for a key, tombstones included.
    #[inline]
    pub fn entry(&self, key: &K) -> Option<&Register<V>> {
        return self.entries.get(key);
    }

    /// Check whether a key holds a live value.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        return self.get(key).is_some();
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        return self.live;
    }

    /// True when no key holds a live value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.live == 0;
    }

    /// Iterate over live `(key, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        return self.entries
            .iter()
            .filter_map(|(k, r)| r.value.as_ref().map(|v| (k, v)));
    }

    /// Apply a write (`None` deletes). Returns true if it won.
    pub fn apply(&mut self, key: K, value: Option<V>, stamp: Stamp) -> bool {
        let was_live = match self.entries.get(&key) {
            Some(current) if stamp <= current.stamp => return false,
            Some(current) => current.value.is_some(),
            None => false,
        };
        let is_live = value.is_some();
        self.entries.insert(key, Register { stamp, value });

        match (was_live, is_live) {
            (false, true) => self.live += 1,
            (true, false) => self.live -= 1,
            _ => {}
        }
        return true;
    }

    /// Iterate over deleted keys with the stamp of their delete.
    pub fn tombstones(&self) -> impl Iterator<Item = (&K, Stamp)> {
        return self.entries
            .iter()
            .filter(|(_, r)| r.value.is_none())
            .map(|(k, r)| (k, r.stamp));
    }

    /// Merge another map in. Returns true if any of its writes won.
    pub fn merge_from(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (key, register) in &other.entries {
            changed |= self.apply(key.clone(), register.value.clone(), register.stamp);
        }
        return changed;
    }

    /// Copy of the live contents, sorted by key.
    pub fn snapshot(&self) -> BTreeMap<K, V>
    where
        K: Ord,
    {
        return self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    }
}

impl<K: Clone + Eq + Hash, V: Clone> Crdt for LwwMap<K, V> {
    fn merge(&mut self, other: &Self) {
        self.merge_from(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPair;
    use crate::key::KeyPub;

    fn stamp(time: u64, replica: &KeyPub) -> Stamp {
        return Stamp::new(time, *replica);
    }

    #[test]
    fn later_write_wins() {
        let alice = KeyPair::generate().key_pub;
        let mut map: LwwMap<String, u32> = LwwMap::new();

        assert!(map.apply("a".into(), Some(1), stamp(1, &alice)));
        assert!(map.apply("a".into(), Some(2), stamp(2, &alice)));
        assert!(!map.apply("a".into(), Some(3), stamp(1, &alice)));

        assert_eq!(map.get(&"a".to_string()), Some(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn tombstone_blocks_older_write() {
        let alice = KeyPair::generate().key_pub;
        let mut map: LwwMap<String, u32> = LwwMap::new();

        map.apply("a".into(), None, stamp(5, &alice));
        assert!(!map.apply("a".into(), Some(1), stamp(4, &alice)));
        assert!(map.is_empty());
        assert!(map.entry(&"a".to_string()).is_some());
    }

    #[test]
    fn live_count_tracks_deletes() {
        let alice = KeyPair::generate().key_pub;
        let mut map: LwwMap<u32, u32> = LwwMap::new();

        map.apply(0, Some(0), stamp(1, &alice));
        map.apply(1, Some(1), stamp(2, &alice));
        assert_eq!(map.len(), 2);

        map.apply(0, None, stamp(3, &alice));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&0));

        map.apply(0, Some(7), stamp(4, &alice));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn concurrent_writes_break_ties_by_replica() {
        let low = KeyPub([1u8; 32]);
        let high = KeyPub([2u8; 32]);

        let mut a: LwwMap<u32, &str> = LwwMap::new();
        let mut b: LwwMap<u32, &str> = LwwMap::new();
        a.apply(0, Some("low"), stamp(1, &low));
        b.apply(0, Some("high"), stamp(1, &high));

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab.get(&0), Some(&"high"));
        assert_eq!(ab.snapshot(), ba.snapshot());
    }

    #[test]
    fn merge_is_idempotent() {
        let alice = KeyPair::generate().key_pub;
        let mut a: LwwMap<u32, u32> = LwwMap::new();
        a.apply(3, Some(3), stamp(1, &alice));
        a.apply(1, Some(1), stamp(2, &alice));

        let before = a.snapshot();
        let copy = a.clone();
        a.merge(&copy);
        assert_eq!(a.snapshot(), before);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn merge_from_reports_change() {
        let alice = KeyPair::generate().key_pub;
        let mut a: LwwMap<u32, u32> = LwwMap::new();
        let mut b: LwwMap<u32, u32> = LwwMap::new();
        b.apply(1, Some(1), stamp(1, &alice));
        b.apply(2, None, stamp(2, &alice));

        assert!(a.merge_from(&b));
        assert!(!a.merge_from(&b));
        assert_eq!(a.len(), 1);
        let tombstones: Vec<(&u32, Stamp)> = a.tombstones().collect();
        assert_eq!(tombstones, vec![(&2, stamp(2, &alice))]);
    }

    #[test]
    fn snapshot_is_sorted() {
        let alice = KeyPair::generate().key_pub;
        let mut map: LwwMap<u32, u32> = LwwMap::new();
        for (i, key) in [5u32, 0, 3].iter().enumerate() {
            map.apply(*key, Some(*key), stamp(i as u64 + 1, &alice));
        }
        let keys: Vec<u32> = map.snapshot().keys().copied().collect();
        assert_eq!(keys, vec![0, 3, 5]);
    }

    #[test]
    fn register_merge() {
        let alice = KeyPair::generate().key_pub;
        let mut a: LwwRegister<&str> = LwwRegister::new();
        let mut b: LwwRegister<&str> = LwwRegister::new();
        a.apply(Some("first"), stamp(1, &alice));
        b.apply(Some("second"), stamp(2, &alice));

        a.merge(&b);
        assert_eq!(a.get(), Some(&"second"));
        assert_eq!(a.stamp(), Some(stamp(2, &alice)));
    }
}
