//! Strided wrap-around view over a shared pool.
//!
//! A [`Cycle`] exposes every `stride`-th element of a flat pool, starting at
//! `offset` and wrapping modulo the pool length. Giving each screen a cycle
//! with `stride = screen count` and `offset = screen index` interleaves the
//! shared wallpaper pool across screens without copying it: the index sets
//! are pairwise disjoint and together cover the whole pool.

use std::rc::Rc;

use crate::error::MuralError;

/// A read-only cyclic view over a shared pool.
///
/// `get(i)` resolves to `pool[(i * stride + offset) mod len]` for any signed
/// `i`; it never panics as long as the pool is non-empty.
#[derive(Debug, Clone)]
pub struct Cycle<T> {
    pool: Rc<Vec<T>>,
    stride: usize,
    offset: usize,
}

impl<T> Cycle<T> {
    /// Creates a view over `pool` exposing every `stride`-th element
    /// starting at `offset`.
    #[must_use]
    pub const fn new(pool: Rc<Vec<T>>, stride: usize, offset: usize) -> Self {
        Self { pool, stride, offset }
    }

    /// Resolves a (possibly negative) cursor position to a pool element.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::EmptyPool`] when the underlying pool is empty.
    pub fn get(&self, index: i64) -> Result<&T, MuralError> {
        let len = self.pool.len();
        if len == 0 {
            return Err(MuralError::EmptyPool);
        }
        let raw = index * self.stride as i64 + self.offset as i64;
        let resolved = raw.rem_euclid(len as i64) as usize;
        Ok(&self.pool[resolved])
    }

    /// Length of the underlying pool (not of the strided slice).
    #[must_use]
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Whether the underlying pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn pool(n: usize) -> Rc<Vec<usize>> {
        Rc::new((0..n).collect())
    }

    #[test]
    fn test_get_applies_stride_and_offset() {
        let cycle = Cycle::new(pool(4), 2, 1);
        assert_eq!(*cycle.get(0).unwrap(), 1);
        assert_eq!(*cycle.get(1).unwrap(), 3);
    }

    #[test]
    fn test_get_wraps_modulo_pool_length() {
        let cycle = Cycle::new(pool(4), 2, 0);
        // 2*2 mod 4 = 0, back at the start after two steps
        assert_eq!(*cycle.get(2).unwrap(), 0);
        assert_eq!(*cycle.get(3).unwrap(), 2);
        assert_eq!(*cycle.get(100).unwrap(), 0);
    }

    #[test]
    fn test_get_accepts_negative_indices() {
        let cycle = Cycle::new(pool(5), 1, 0);
        assert_eq!(*cycle.get(-1).unwrap(), 4);
        assert_eq!(*cycle.get(-5).unwrap(), 0);
        assert_eq!(*cycle.get(-6).unwrap(), 4);
    }

    #[test]
    fn test_empty_pool_is_an_error_not_a_panic() {
        let cycle: Cycle<usize> = Cycle::new(Rc::new(Vec::new()), 1, 0);
        assert!(matches!(cycle.get(0), Err(MuralError::EmptyPool)));
        assert!(matches!(cycle.get(-7), Err(MuralError::EmptyPool)));
        assert!(cycle.is_empty());
    }

    #[test]
    fn test_partitions_are_disjoint_and_cover_the_pool() {
        // For any pool and stride = screen count, the index sets produced by
        // each screen's cycle are pairwise disjoint and union to the pool.
        let shared = pool(12);
        let screens = 3;
        let mut seen = BTreeSet::new();
        for screen in 0..screens {
            let cycle = Cycle::new(Rc::clone(&shared), screens, screen);
            let slice: BTreeSet<usize> = (0..4).map(|i| *cycle.get(i).unwrap()).collect();
            assert_eq!(slice.len(), 4);
            assert!(seen.is_disjoint(&slice));
            seen.extend(slice);
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn test_uneven_pool_still_covers_every_element() {
        // Pool length not divisible by the stride: a single screen's cycle
        // eventually visits every element once per pool_len advances.
        let cycle = Cycle::new(pool(5), 2, 0);
        let visited: BTreeSet<usize> = (0..5).map(|i| *cycle.get(i).unwrap()).collect();
        assert_eq!(visited.len(), 5);
    }

    #[test]
    fn test_shared_pool_is_not_copied() {
        let shared = pool(1000);
        let a = Cycle::new(Rc::clone(&shared), 2, 0);
        let b = Cycle::new(Rc::clone(&shared), 2, 1);
        assert_eq!(a.pool_len(), b.pool_len());
        assert_eq!(Rc::strong_count(&shared), 3);
    }
}
