//! Rotation engine.
//!
//! Orchestrates the per-monitor rotation state: advancing the active
//! screen's wallpaper on tick, moving the selection cursor, pausing,
//! reassigning screen-to-partition mapping, and the per-selection mutation
//! commands. All mutation happens on the control-loop thread; observer
//! notifications fire synchronously before the next event is considered.

use std::rc::Rc;

use crate::error::MuralError;
use crate::platform::{BackgroundRenderer, Monitor};
use crate::rotation::{ActiveSet, Cycle};
use crate::screen::Screen;
use crate::wallpaper::Wallpaper;

/// Drives rotation across all detected screens.
pub struct RotationEngine {
    screens: Vec<Rc<Screen>>,
    active: ActiveSet,
    /// Index of the screen holding the selection flag. Exactly one screen
    /// is selected at all times.
    selection: usize,
    renderer: Rc<dyn BackgroundRenderer>,
}

impl RotationEngine {
    /// Builds screens from the monitor list, interleaving the shared pool
    /// across them, and marks the first active screen current.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::NoMonitors`] for an empty monitor list and
    /// [`MuralError::NoWallpapers`] for an empty pool.
    pub fn new(
        monitors: &[Monitor],
        pool: Rc<Vec<Rc<Wallpaper>>>,
        renderer: Rc<dyn BackgroundRenderer>,
    ) -> Result<Self, MuralError> {
        if monitors.is_empty() {
            return Err(MuralError::NoMonitors("monitor list is empty".to_string()));
        }
        if pool.is_empty() {
            return Err(MuralError::NoWallpapers);
        }

        let stride = monitors.len();
        let screens: Vec<Rc<Screen>> = monitors
            .iter()
            .map(|monitor| {
                Rc::new(Screen::new(
                    monitor.index,
                    monitor.width,
                    monitor.height,
                    Cycle::new(Rc::clone(&pool), stride, monitor.index),
                ))
            })
            .collect();

        let active = ActiveSet::new(&screens);
        let engine = Self { screens, active, selection: 0, renderer };
        engine.screens[0].set_selected(true);
        engine.refresh_current();
        Ok(engine)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    #[must_use]
    pub fn screens(&self) -> &[Rc<Screen>] {
        &self.screens
    }

    #[must_use]
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    /// The screen currently holding the selection flag.
    #[must_use]
    pub fn selected_screen(&self) -> &Rc<Screen> {
        &self.screens[self.selection]
    }

    /// The selected screen's current wallpaper.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::EmptyPool`] when the pool is empty.
    pub fn selected_wallpaper(&self) -> Result<Rc<Wallpaper>, MuralError> {
        self.selected_screen().current_wallpaper()
    }

    // ------------------------------------------------------------------
    // Rotation
    // ------------------------------------------------------------------

    /// Advances the global rotation by one step (the Tick event).
    ///
    /// No-op while every screen is paused; that is backpressure, not a
    /// fault.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures so the caller can log them; engine
    /// state has already advanced when that happens.
    pub fn tick(&mut self) -> Result<(), MuralError> {
        self.step(1)
    }

    /// Manual forward rotation.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures; state has already advanced.
    pub fn next(&mut self) -> Result<(), MuralError> {
        self.step(1)
    }

    /// Manual backward rotation: a Tick with both cursors stepping by -1.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures; state has already moved.
    pub fn prev(&mut self) -> Result<(), MuralError> {
        self.step(-1)
    }

    /// Advances only the selected screen's wallpaper. The global rotation
    /// cursor and the current flag stay where they are.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures; the cursor has already moved.
    pub fn next_on_selected(&self) -> Result<(), MuralError> {
        self.step_selected(1)
    }

    /// Steps the selected screen's wallpaper backwards, leaving the global
    /// rotation cursor alone.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures; the cursor has already moved.
    pub fn prev_on_selected(&self) -> Result<(), MuralError> {
        self.step_selected(-1)
    }

    fn step_selected(&self, direction: i64) -> Result<(), MuralError> {
        self.screens[self.selection].advance_wallpaper(direction);
        self.render_all()
    }

    fn step(&mut self, direction: i64) -> Result<(), MuralError> {
        let Some(old) = self.active.current() else {
            return Ok(());
        };
        self.screens[old].set_current(false);
        self.active.advance(direction);
        // Non-empty set: advance always lands on an active screen.
        if let Some(current) = self.active.current() {
            self.screens[current].set_current(true);
            self.screens[current].advance_wallpaper(direction);
        }
        self.render_all()
    }

    /// Pushes the composite assignment (one path per monitor, physical
    /// order) to the background renderer. A preferred path that has gone
    /// missing since discovery is invalidated and the wallpaper's next
    /// valid path is tried; a wallpaper with no valid path left is
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns the renderer's error; never rolls back engine state.
    pub fn render_all(&self) -> Result<(), MuralError> {
        let mut paths = Vec::with_capacity(self.screens.len());
        for screen in &self.screens {
            let wallpaper = screen.current_wallpaper()?;
            loop {
                match wallpaper.preferred_path() {
                    Some(path) if path.exists() => {
                        paths.push(path);
                        break;
                    }
                    Some(path) => {
                        tracing::warn!(
                            path = %path.display(),
                            hash = wallpaper.hash(),
                            "source file went missing, invalidating path"
                        );
                        wallpaper.invalidate_path(&path);
                    }
                    None => {
                        tracing::debug!(
                            screen = screen.index(),
                            hash = wallpaper.hash(),
                            "skipping wallpaper with no valid path"
                        );
                        break;
                    }
                }
            }
        }
        self.renderer.apply(&paths)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Moves the selection flag to the next screen (wrapping).
    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    /// Moves the selection flag to the previous screen (wrapping).
    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }

    fn move_selection(&mut self, step: i64) {
        let count = self.screens.len() as i64;
        self.screens[self.selection].set_selected(false);
        self.selection = (self.selection as i64 + step).rem_euclid(count) as usize;
        self.screens[self.selection].set_selected(true);
    }

    // ------------------------------------------------------------------
    // Pausing
    // ------------------------------------------------------------------

    /// Flips the selected screen's pause flag and rebuilds the Active-Set.
    pub fn toggle_pause_selected(&mut self) {
        let screen = &self.screens[self.selection];
        let paused = screen.toggle_paused();
        if paused && screen.is_current() {
            screen.set_current(false);
        }
        self.active.recompute(&self.screens);
        self.refresh_current();
    }

    /// Re-asserts the "exactly one current screen while the Active-Set is
    /// non-empty" invariant after a membership change.
    fn refresh_current(&self) {
        let current = self.active.current();
        for (index, screen) in self.screens.iter().enumerate() {
            screen.set_current(current == Some(index));
        }
    }

    // ------------------------------------------------------------------
    // Cycling screens
    // ------------------------------------------------------------------

    /// Rotates the screen-to-partition assignment by one position: screen
    /// *i* receives the slot (partition plus cursor) screen *i+1* had.
    /// Flags stay attached to their physical monitors. No new wallpaper
    /// instances are created; only the shared-slot handles move.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures from the mandatory re-render.
    pub fn cycle_screens(&mut self) -> Result<(), MuralError> {
        // Adjacent swaps left-rotate the slot assignment.
        for i in 0..self.screens.len().saturating_sub(1) {
            self.screens[i].swap_slot(&self.screens[i + 1]);
        }
        self.active.recompute(&self.screens);
        self.refresh_current();
        self.render_all()
    }

    // ------------------------------------------------------------------
    // Mutations on the selection
    // ------------------------------------------------------------------

    /// Adjusts the selected wallpaper's rating.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::EmptyPool`] when the pool is empty.
    pub fn rate_selected(&self, delta: i32) -> Result<(), MuralError> {
        self.selected_wallpaper()?.adjust_rating(delta);
        Ok(())
    }

    /// Adjusts the selected wallpaper's purity score.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::EmptyPool`] when the pool is empty.
    pub fn purity_selected(&self, delta: i32) -> Result<(), MuralError> {
        self.selected_wallpaper()?.adjust_purity(delta);
        Ok(())
    }

    /// Toggles a tag on the selected wallpaper. Returns whether the tag is
    /// now set.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::EmptyPool`] when the pool is empty.
    pub fn toggle_tag_selected(&self, tag: &str) -> Result<bool, MuralError> {
        Ok(self.selected_wallpaper()?.toggle_tag(tag))
    }
}
