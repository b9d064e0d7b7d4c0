//! Circular identifier space.
//!
//! Identifiers live in `[0, 2^m)` and every comparison between them is made
//! through the clockwise [`IdSpace::distance`], never through raw integer
//! ordering.

use crate::error::{Error, Result};

/// Largest supported ring order. Keeps `2^m` and `id + 2^i` inside a `u64`.
pub const MAX_ORDER: u32 = 63;

/// Identifier space of order `m` (size `2^m`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct IdSpace {
    order: u32,
    size: u64,
}

impl IdSpace {
    /// Creates the space for ring order `order`.
    pub fn new(order: u32) -> Result<Self> {
        if order == 0 || order > MAX_ORDER {
            return Err(Error::InvalidOrder(order));
        }
        Ok(Self {
            order,
            size: 1u64 << order,
        })
    }

    /// Ring order `m`; also the finger table length.
    #[inline]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Number of identifiers, `2^m`.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Canonical identifier of `key` (`key mod 2^m`).
    #[inline]
    pub fn canonical(&self, key: u64) -> u64 {
        key & (self.size - 1)
    }

    /// True if `id` is a valid identifier in this space.
    #[inline]
    pub fn contains(&self, id: u64) -> bool {
        id < self.size
    }

    /// Clockwise distance from `a` to `b`.
    ///
    /// Both arguments are canonicalised first, so keys may be passed directly.
    #[inline]
    pub fn distance(&self, a: u64, b: u64) -> u64 {
        let (a, b) = (self.canonical(a), self.canonical(b));
        if a == b {
            0
        } else if a < b {
            b - a
        } else {
            self.size - a + b
        }
    }

    /// Start of finger `i` for node `id`: `(id + 2^i) mod 2^m`.
    #[inline]
    pub fn finger_start(&self, id: u64, i: u32) -> u64 {
        debug_assert!(i < self.order);
        self.canonical(self.canonical(id) + (1u64 << i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_invalid_orders() {
        assert_eq!(IdSpace::new(0), Err(Error::InvalidOrder(0)));
        assert_eq!(IdSpace::new(64), Err(Error::InvalidOrder(64)));
        assert_eq!(IdSpace::new(63).unwrap().size(), 1u64 << 63);
    }

    #[test]
    fn test_distance_wraps() {
        let space = IdSpace::new(5).unwrap();
        assert_eq!(space.distance(3, 3), 0);
        assert_eq!(space.distance(3, 10), 7);
        assert_eq!(space.distance(30, 2), 4); // 32 - 30 + 2
        assert_eq!(space.distance(2, 30), 28);
    }

    #[test]
    fn test_canonical_and_finger_start() {
        let space = IdSpace::new(5).unwrap();
        assert_eq!(space.canonical(41), 9);
        assert_eq!(space.finger_start(20, 0), 21);
        assert_eq!(space.finger_start(20, 4), 4); // 20 + 16 = 36 mod 32
    }

    proptest! {
        #[test]
        fn prop_distance_complement(order in 1u32..=MAX_ORDER, a: u64, b: u64) {
            let space = IdSpace::new(order).unwrap();
            let (a, b) = (space.canonical(a), space.canonical(b));
            let forward = space.distance(a, b);
            let backward = space.distance(b, a);
            if a == b {
                prop_assert_eq!(forward, 0);
                prop_assert_eq!(backward, 0);
            } else {
                prop_assert_eq!(forward + backward, space.size());
            }
        }
    }
}
