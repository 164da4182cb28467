//! Wallpaper model.
//!
//! A [`Wallpaper`] couples the immutable identity of an image (content hash,
//! dimensions, format) with the user attributes that rotate through the
//! store (rating, purity, tags). Attribute mutation marks the record dirty
//! for the next save and notifies subscribed listeners synchronously and
//! in subscription order.

use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};

/// Receives change notifications after a wallpaper mutation completes.
pub trait WallpaperListener {
    fn on_wallpaper_changed(&self, wallpaper: &Wallpaper);
}

/// One known file location of a wallpaper.
///
/// A wallpaper may have several duplicate files; paths that stop resolving
/// are flagged invalid at runtime but stay in the store in case they
/// reappear.
#[derive(Debug, Clone)]
pub struct SourcePath {
    pub path: PathBuf,
    pub valid: bool,
}

/// Mutable user attributes of a wallpaper.
#[derive(Debug, Clone)]
struct Attributes {
    paths: Vec<SourcePath>,
    rating: i32,
    purity: i32,
    tags: BTreeSet<String>,
    modified: DateTime<Utc>,
}

/// Observable record for one image.
pub struct Wallpaper {
    hash: String,
    width: u32,
    height: u32,
    format: String,
    added: DateTime<Utc>,
    attrs: RefCell<Attributes>,
    dirty: Cell<bool>,
    listeners: RefCell<Vec<Rc<dyn WallpaperListener>>>,
}

impl std::fmt::Debug for Wallpaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallpaper")
            .field("hash", &self.hash)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("dirty", &self.dirty.get())
            .finish_non_exhaustive()
    }
}

impl Wallpaper {
    /// Creates a record for a newly discovered image.
    #[must_use]
    pub fn new(
        hash: String,
        width: u32,
        height: u32,
        format: String,
        paths: Vec<PathBuf>,
    ) -> Self {
        let now = Utc::now();
        Self {
            hash,
            width,
            height,
            format,
            added: now,
            attrs: RefCell::new(Attributes {
                paths: paths.into_iter().map(|path| SourcePath { path, valid: true }).collect(),
                rating: 0,
                purity: 0,
                tags: BTreeSet::new(),
                modified: now,
            }),
            dirty: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Restores a record from persisted state. Paths are reported with the
    /// validity the caller determined; the record starts clean.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        hash: String,
        width: u32,
        height: u32,
        format: String,
        paths: Vec<SourcePath>,
        rating: i32,
        purity: i32,
        tags: BTreeSet<String>,
        added: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            hash,
            width,
            height,
            format,
            added,
            attrs: RefCell::new(Attributes { paths, rating, purity, tags, modified }),
            dirty: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Identity and metadata
    // ------------------------------------------------------------------

    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    #[must_use]
    pub const fn added(&self) -> DateTime<Utc> {
        self.added
    }

    #[must_use]
    pub fn modified(&self) -> DateTime<Utc> {
        self.attrs.borrow().modified
    }

    // ------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------

    /// The first path still considered valid, if any.
    #[must_use]
    pub fn preferred_path(&self) -> Option<PathBuf> {
        self.attrs
            .borrow()
            .paths
            .iter()
            .find(|entry| entry.valid)
            .map(|entry| entry.path.clone())
    }

    /// All known paths, valid or not.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.attrs.borrow().paths.iter().map(|entry| entry.path.clone()).collect()
    }

    /// Whether at least one path still resolves.
    #[must_use]
    pub fn has_valid_path(&self) -> bool {
        self.attrs.borrow().paths.iter().any(|entry| entry.valid)
    }

    /// Flags a path as no longer resolving. The path stays in the store;
    /// rotation just skips it. Returns true when the flag changed.
    pub fn invalidate_path(&self, path: &Path) -> bool {
        let mut attrs = self.attrs.borrow_mut();
        match attrs.paths.iter_mut().find(|entry| entry.path == path && entry.valid) {
            Some(entry) => {
                entry.valid = false;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // User attributes
    // ------------------------------------------------------------------

    #[must_use]
    pub fn rating(&self) -> i32 {
        self.attrs.borrow().rating
    }

    #[must_use]
    pub fn purity(&self) -> i32 {
        self.attrs.borrow().purity
    }

    /// Borrow of the tag set, for display and persistence.
    #[must_use]
    pub fn tags(&self) -> Ref<'_, BTreeSet<String>> {
        Ref::map(self.attrs.borrow(), |attrs| &attrs.tags)
    }

    /// Adjusts the rating by `delta` and notifies listeners.
    pub fn adjust_rating(&self, delta: i32) {
        self.attrs.borrow_mut().rating += delta;
        self.mark_modified();
        self.notify();
    }

    /// Adjusts the purity score by `delta` and notifies listeners.
    pub fn adjust_purity(&self, delta: i32) {
        self.attrs.borrow_mut().purity += delta;
        self.mark_modified();
        self.notify();
    }

    /// Adds the tag when absent, removes it when present. Returns true when
    /// the tag is now set.
    pub fn toggle_tag(&self, tag: &str) -> bool {
        let now_set = {
            let mut attrs = self.attrs.borrow_mut();
            if attrs.tags.remove(tag) {
                false
            } else {
                attrs.tags.insert(tag.to_string());
                true
            }
        };
        self.mark_modified();
        self.notify();
        now_set
    }

    // ------------------------------------------------------------------
    // Dirtiness and observers
    // ------------------------------------------------------------------

    /// Whether this record has unsaved attribute changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Clears the dirty flag after a successful save.
    pub fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    /// Subscribes a listener; it is invoked after every completed mutation,
    /// in subscription order.
    pub fn subscribe(&self, listener: Rc<dyn WallpaperListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    fn mark_modified(&self) {
        self.attrs.borrow_mut().modified = Utc::now();
        self.dirty.set(true);
    }

    fn notify(&self) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener.on_wallpaper_changed(self);
        }
    }
}
