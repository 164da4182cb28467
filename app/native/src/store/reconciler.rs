//! Merge-on-save reconciliation.
//!
//! Saving never serializes the in-memory pool wholesale. The document is
//! re-read immediately before writing, only records for dirty wallpapers
//! are replaced, and everything else on disk is carried through untouched.
//! That keeps concurrent writers (another instance, a manual edit) safe as
//! long as they do not touch the same wallpaper.

use std::rc::Rc;

use chrono::Utc;

use crate::error::MuralError;
use crate::store::{Store, StoreRecord};
use crate::wallpaper::Wallpaper;

/// What a save attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was dirty; no disk activity at all.
    Clean,
    /// This many records were merged and the document rewritten.
    Saved(usize),
}

/// Applies dirty wallpapers to the store.
#[derive(Debug)]
pub struct Reconciler {
    store: Store,
}

impl Reconciler {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Persists every dirty wallpaper in `pool`.
    ///
    /// Records are replaced at wallpaper granularity; dirty flags clear
    /// only after the rename succeeds, so a failed save retries the same
    /// set next time.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Store`] when reading, backing up, or writing
    /// the document fails. Dirty flags are left set.
    pub fn save(&self, pool: &[Rc<Wallpaper>]) -> Result<SaveOutcome, MuralError> {
        let dirty: Vec<&Rc<Wallpaper>> =
            pool.iter().filter(|wallpaper| wallpaper.is_dirty()).collect();
        if dirty.is_empty() {
            return Ok(SaveOutcome::Clean);
        }

        self.store.backup_daily()?;

        let mut data = self.store.read_all()?;
        for wallpaper in &dirty {
            data.wallpapers
                .insert(wallpaper.hash().to_string(), StoreRecord::from_wallpaper(wallpaper));
        }
        data.modified = Some(Utc::now());
        self.store.write_all(&data)?;

        for wallpaper in &dirty {
            wallpaper.clear_dirty();
        }
        tracing::debug!(count = dirty.len(), "saved dirty wallpapers");
        Ok(SaveOutcome::Saved(dirty.len()))
    }
}
