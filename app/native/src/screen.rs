//! Screen model.
//!
//! A [`Screen`] is the rotation state for one physical monitor: an
//! interleaved slice of the shared wallpaper pool with a cursor into it,
//! plus the `current`/`selected`/`paused` flags the engine drives. Flags
//! belong to the physical monitor index; the slice-plus-cursor pair is a
//! [`RotationSlot`] that "cycle screens" moves between monitors as a unit.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::MuralError;
use crate::rotation::Cycle;
use crate::wallpaper::Wallpaper;

/// Receives change notifications after a screen mutation completes.
pub trait ScreenListener {
    fn on_screen_changed(&self, screen: &Screen);
}

/// A screen's partition of the pool together with its cursor position.
#[derive(Debug, Clone)]
pub struct RotationSlot {
    pub wallpapers: Cycle<Rc<Wallpaper>>,
    pub cursor: i64,
}

/// Observable rotation state for one monitor.
pub struct Screen {
    index: usize,
    width: u32,
    height: u32,
    slot: RefCell<RotationSlot>,
    current: Cell<bool>,
    selected: Cell<bool>,
    paused: Cell<bool>,
    listeners: RefCell<Vec<Rc<dyn ScreenListener>>>,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("index", &self.index)
            .field("current", &self.current.get())
            .field("selected", &self.selected.get())
            .field("paused", &self.paused.get())
            .finish_non_exhaustive()
    }
}

impl Screen {
    #[must_use]
    pub fn new(index: usize, width: u32, height: u32, wallpapers: Cycle<Rc<Wallpaper>>) -> Self {
        Self {
            index,
            width,
            height,
            slot: RefCell::new(RotationSlot { wallpapers, cursor: 0 }),
            current: Cell::new(false),
            selected: Cell::new(false),
            paused: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Size of the shared pool behind this screen's partition.
    #[must_use]
    pub fn wallpaper_count(&self) -> usize {
        self.slot.borrow().wallpapers.pool_len()
    }

    /// The wallpaper the slot cursor points at.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::EmptyPool`] when the shared pool is empty.
    pub fn current_wallpaper(&self) -> Result<Rc<Wallpaper>, MuralError> {
        let slot = self.slot.borrow();
        slot.wallpapers.get(slot.cursor).map(Rc::clone)
    }

    /// Moves the slot cursor by `step` (wrapping) and notifies listeners.
    pub fn advance_wallpaper(&self, step: i64) {
        self.slot.borrow_mut().cursor += step;
        self.notify();
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current.get()
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    /// Sets the `current` flag, notifying only on an actual change.
    pub fn set_current(&self, current: bool) {
        if self.current.replace(current) != current {
            self.notify();
        }
    }

    /// Sets the `selected` flag, notifying only on an actual change.
    pub fn set_selected(&self, selected: bool) {
        if self.selected.replace(selected) != selected {
            self.notify();
        }
    }

    /// Flips the `paused` flag and returns the new value.
    pub fn toggle_paused(&self) -> bool {
        let paused = !self.paused.get();
        self.paused.set(paused);
        self.notify();
        paused
    }

    // ------------------------------------------------------------------
    // Slot reassignment ("cycle screens")
    // ------------------------------------------------------------------

    /// Swaps rotation slots with another screen. Cursor travels with the
    /// slot; flags stay on their physical screens. Both screens notify.
    pub fn swap_slot(&self, other: &Self) {
        self.slot.swap(&other.slot);
        self.notify();
        other.notify();
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Subscribes a listener; it is invoked after every completed mutation,
    /// in subscription order.
    pub fn subscribe(&self, listener: Rc<dyn ScreenListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    fn notify(&self) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener.on_screen_changed(self);
        }
    }
}
