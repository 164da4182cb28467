//! Active-Set tracker.
//!
//! The Active-Set is the subset of screens eligible for automatic rotation
//! (not paused), viewed cyclically with its own cursor. It is rebuilt from
//! scratch on every pause change rather than patched incrementally; the
//! rebuild runs in the same critical section as the pause mutation (the
//! whole engine is single-threaded), so observers never see a stale set.

use std::rc::Rc;

use crate::screen::Screen;

/// Cyclic view over the indices of unpaused screens.
#[derive(Debug, Default)]
pub struct ActiveSet {
    /// Physical screen indices of the unpaused screens, in index order.
    active: Vec<usize>,
    cursor: i64,
}

impl ActiveSet {
    /// Builds the tracker for a fresh set of screens.
    #[must_use]
    pub fn new(screens: &[Rc<Screen>]) -> Self {
        let mut set = Self::default();
        set.recompute(screens);
        set
    }

    /// Rebuilds the filtered view from the current pause flags.
    ///
    /// Cursor preservation: if the previously current screen is still
    /// active, the cursor follows it to its new position; otherwise the old
    /// cursor value is kept and wraps modulo the new length on access. A
    /// silent skip or repeat after a length change is accepted behavior.
    pub fn recompute(&mut self, screens: &[Rc<Screen>]) {
        let previous = self.current();
        self.active =
            screens.iter().filter(|s| !s.is_paused()).map(|s| s.index()).collect();
        if let Some(prev_index) = previous {
            if let Some(position) = self.active.iter().position(|&i| i == prev_index) {
                self.cursor = position as i64;
            }
        }
    }

    /// Physical index of the screen under the cursor, or `None` when every
    /// screen is paused. Callers treat `None` as a no-op condition.
    #[must_use]
    pub fn current(&self) -> Option<usize> {
        if self.active.is_empty() {
            return None;
        }
        let len = self.active.len() as i64;
        Some(self.active[self.cursor.rem_euclid(len) as usize])
    }

    /// Moves the cursor by `step` (wrapping).
    pub fn advance(&mut self, step: i64) {
        self.cursor += step;
    }

    /// Number of screens currently eligible for rotation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
