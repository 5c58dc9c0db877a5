//! A fixed-size, open-addressed cache of negamax bounds, keyed by position.

/// Checks whether `n` has a divisor in `[min, max)`, by bisecting the range. Used only to
/// compute [`TranspositionTable::SIZE`] at compile time.
const fn has_factor(n: u64, min: u64, max: u64) -> bool {
    if min * min > n {
        false
    } else if min + 1 >= max {
        n % min == 0
    } else {
        let mid = (min + max) / 2;
        has_factor(n, min, mid) || has_factor(n, mid, max)
    }
}

/// The smallest prime `>= n`. `n` must be `>= 2`.
const fn next_prime(n: u64) -> u64 {
    if has_factor(n, 2, n) {
        next_prime(n + 1)
    } else {
        n
    }
}

/// A flat, fixed-size, always-replace cache from a 56-bit position key to a signed 8-bit bound.
///
/// Each slot packs a 64-bit word: the low 56 bits hold the key, the high 8 bits hold the value
/// as two's complement. A slot value of 0 means empty (in practice a non-zero key is never
/// paired with value 0, since the solver offsets every stored score away from zero before
/// calling [`TranspositionTable::put`]). Collisions are resolved by unconditional overwrite:
/// there is no chaining and no probing. A newer entry is typically from a deeper, more relevant
/// subtree than whatever it replaces, and re-deriving a wrongly-evicted bound costs nothing more
/// than a slower search, never a wrong answer.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    slots: Vec<u64>,
}

impl TranspositionTable {
    /// Table size: the first prime at or above 2^23, chosen so that `key % SIZE` spreads
    /// independent key bits uniformly across the table (~64 MB of slots).
    pub const SIZE: u64 = next_prime(1 << 23);

    const KEY_BITS: u32 = 56;
    const KEY_MASK: u64 = (1 << Self::KEY_BITS) - 1;

    /// Creates a new, empty table, allocating all `SIZE` slots up front.
    pub fn new() -> TranspositionTable {
        Self::default()
    }

    #[inline(always)]
    fn index(key: u64) -> usize {
        (key % Self::SIZE) as usize
    }

    /// Stores `value` for `key`, unconditionally overwriting whatever was at that slot.
    ///
    /// # Panics (debug builds only)
    ///
    /// Panics if `value` is zero, the table's sentinel for "empty".
    #[inline(always)]
    pub fn put(&mut self, key: u64, value: i8) {
        debug_assert!(value != 0, "0 is the empty-slot sentinel and must never be stored");
        let index = Self::index(key);
        self.slots[index] = (key & Self::KEY_MASK) | ((value as u8 as u64) << Self::KEY_BITS);
    }

    /// Returns the stored value for `key`, or 0 if the slot is empty or holds a different key.
    /// A return of 0 is indistinguishable from "no entry"; callers must never store 0.
    #[inline(always)]
    pub fn get(&self, key: u64) -> i8 {
        let slot = self.slots[Self::index(key)];
        if slot == 0 || (slot & Self::KEY_MASK) != (key & Self::KEY_MASK) {
            0
        } else {
            (slot >> Self::KEY_BITS) as u8 as i8
        }
    }

    /// Zeroes the whole table.
    pub fn reset(&mut self) {
        self.slots.fill(0);
    }
}

impl Default for TranspositionTable {
    fn default() -> TranspositionTable {
        TranspositionTable {
            slots: vec![0; Self::SIZE as usize],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_matches_known_prime() {
        assert_eq!(TranspositionTable::SIZE, (1 << 23) + 9);
    }

    #[test]
    fn has_factor_boundary_cases() {
        assert!(has_factor(17 * 97, 2, 20));
        assert!(!has_factor(17 * 97, 20, 80));
    }

    #[test]
    fn get_on_untouched_key_returns_zero() {
        let table = TranspositionTable::new();
        assert_eq!(table.get(12345), 0);
    }

    #[test]
    fn round_trips_a_put_value() {
        let mut table = TranspositionTable::new();
        let key: u64 = (1 << 40) + 7;
        table.put(key, -42);
        assert_eq!(table.get(key), -42);
    }

    #[test]
    fn collision_keeps_only_the_latest_value() {
        let mut table = TranspositionTable::new();
        let k1 = 5u64;
        let k2 = k1 + TranspositionTable::SIZE;
        assert_eq!(TranspositionTable::index(k1), TranspositionTable::index(k2));

        table.put(k1, 11);
        table.put(k2, -11);

        assert_eq!(table.get(k1), 0);
        assert_eq!(table.get(k2), -11);
    }

    #[test]
    fn reset_clears_all_entries() {
        let mut table = TranspositionTable::new();
        table.put(99, 5);
        table.reset();
        assert_eq!(table.get(99), 0);
    }
}
