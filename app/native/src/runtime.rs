//! The interactive control loop.
//!
//! Single-threaded: one loop waits on terminal input with a timeout
//! derived from the nearest deadline (next rotation, pending save), then
//! handles whichever came first. Recoverable failures are logged and shown
//! on the status line; only startup errors abort.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::constants::{EDIT_GRACE, INTERVAL_STEP_SECS, MIN_INTERVAL_SECS, SAVE_DELAY};
use crate::error::MuralError;
use crate::library::Library;
use crate::platform::{detect_monitors, FehRenderer};
use crate::rotation::RotationEngine;
use crate::store::{Reconciler, SaveOutcome, Store};
use crate::ui::{Command, TerminalUi};

/// Timer state for the loop. Kept separate from the loop itself so the
/// scheduling rules are testable.
#[derive(Debug)]
struct Deadlines {
    next_rotation: Instant,
    pending_save: Option<Instant>,
}

impl Deadlines {
    fn new(now: Instant, interval: Duration) -> Self {
        Self { next_rotation: now + interval, pending_save: None }
    }

    /// The nearest deadline the loop must wake for.
    fn nearest(&self) -> Instant {
        match self.pending_save {
            Some(save) => self.next_rotation.min(save),
            None => self.next_rotation,
        }
    }

    fn timeout(&self, now: Instant) -> Duration {
        self.nearest().saturating_duration_since(now)
    }

    fn rotation_due(&self, now: Instant) -> bool {
        now >= self.next_rotation
    }

    fn save_due(&self, now: Instant) -> bool {
        self.pending_save.is_some_and(|save| now >= save)
    }

    fn schedule_rotation(&mut self, now: Instant, interval: Duration) {
        self.next_rotation = now + interval;
    }

    /// An attribute edit schedules a delayed save and holds the edited
    /// wallpaper on screen for the grace period.
    fn note_edit(&mut self, now: Instant) {
        self.pending_save = Some(now + SAVE_DELAY);
        let grace_end = now + EDIT_GRACE;
        if self.next_rotation < grace_end {
            self.next_rotation = grace_end;
        }
    }

    /// A failed save stays pending and retries after the normal delay.
    fn defer_save(&mut self, now: Instant) {
        self.pending_save = Some(now + SAVE_DELAY);
    }

    fn clear_save(&mut self) {
        self.pending_save = None;
    }
}

/// Runs the interactive session to completion.
///
/// # Errors
///
/// Returns fatal startup errors ([`MuralError::NoMonitors`],
/// [`MuralError::NoWallpapers`], [`MuralError::Query`]) and terminal
/// failures; everything else is handled inside the loop.
pub fn run(settings: &Settings) -> Result<(), MuralError> {
    let store = Store::new(settings.store_path.clone());
    let library =
        Library::assemble(&settings.sources, &store, settings.query.as_ref(), settings.order)?;
    let reconciler = Reconciler::new(store);

    let monitors = detect_monitors()?;
    let engine =
        RotationEngine::new(&monitors, library.pool(), Rc::new(FehRenderer))?;

    let ui = TerminalUi::new()?;
    for screen in engine.screens() {
        screen.subscribe(Rc::clone(&ui) as Rc<dyn crate::screen::ScreenListener>);
    }
    for wallpaper in library.wallpapers() {
        wallpaper.subscribe(Rc::clone(&ui) as Rc<dyn crate::wallpaper::WallpaperListener>);
    }

    let mut session = Session {
        engine,
        library,
        reconciler,
        ui,
        interval_secs: settings.interval_secs,
        deadlines: Deadlines::new(Instant::now(), secs(settings.interval_secs)),
        quit: false,
    };
    session.run_loop()
}

struct Session {
    engine: RotationEngine,
    library: Library,
    reconciler: Reconciler,
    ui: Rc<TerminalUi>,
    interval_secs: f64,
    deadlines: Deadlines,
    quit: bool,
}

impl Session {
    fn run_loop(&mut self) -> Result<(), MuralError> {
        let result = self.pump();
        // Last chance for unsaved edits before the terminal is restored,
        // on the error exit too.
        self.save();
        result
    }

    fn pump(&mut self) -> Result<(), MuralError> {
        if let Err(err) = self.engine.render_all() {
            self.report(&err);
        }

        while !self.quit {
            if self.ui.needs_redraw() {
                self.ui.draw(&self.engine, self.interval_secs)?;
            }

            let now = Instant::now();
            if let Some(command) = self.ui.poll_command(self.deadlines.timeout(now))? {
                self.handle(command)?;
            }

            let now = Instant::now();
            if self.deadlines.rotation_due(now) {
                if let Err(err) = self.engine.tick() {
                    self.report(&err);
                }
                self.deadlines.schedule_rotation(now, secs(self.interval_secs));
            }
            if self.deadlines.save_due(now) {
                self.save();
            }
        }
        Ok(())
    }

    fn handle(&mut self, command: Command) -> Result<(), MuralError> {
        let now = Instant::now();
        match command {
            Command::Quit => self.quit = true,
            Command::Next => {
                if let Err(err) = self.engine.next() {
                    self.report(&err);
                }
                self.deadlines.schedule_rotation(now, secs(self.interval_secs));
            }
            Command::Prev => {
                if let Err(err) = self.engine.prev() {
                    self.report(&err);
                }
                self.deadlines.schedule_rotation(now, secs(self.interval_secs));
            }
            Command::NextOnSelected => {
                if let Err(err) = self.engine.next_on_selected() {
                    self.report(&err);
                }
                self.deadlines.schedule_rotation(now, secs(self.interval_secs));
            }
            Command::PrevOnSelected => {
                if let Err(err) = self.engine.prev_on_selected() {
                    self.report(&err);
                }
                self.deadlines.schedule_rotation(now, secs(self.interval_secs));
            }
            Command::SelectNext => self.engine.select_next(),
            Command::SelectPrev => self.engine.select_prev(),
            Command::TogglePause => self.engine.toggle_pause_selected(),
            Command::CycleScreens => {
                if let Err(err) = self.engine.cycle_screens() {
                    self.report(&err);
                }
            }
            Command::RateUp => self.edit(now, |engine| engine.rate_selected(1))?,
            Command::RateDown => self.edit(now, |engine| engine.rate_selected(-1))?,
            Command::PurityUp => self.edit(now, |engine| engine.purity_selected(1))?,
            Command::PurityDown => self.edit(now, |engine| engine.purity_selected(-1))?,
            Command::TagPrompt => {
                if let Some(tag) = self.ui.prompt_tag(&self.engine, self.interval_secs)? {
                    match self.engine.toggle_tag_selected(&tag) {
                        Ok(true) => self.ui.set_status(format!("tagged `{tag}`")),
                        Ok(false) => self.ui.set_status(format!("untagged `{tag}`")),
                        Err(err) => self.report(&err),
                    }
                    self.deadlines.note_edit(now);
                }
            }
            Command::IntervalUp => self.adjust_interval(INTERVAL_STEP_SECS),
            Command::IntervalDown => self.adjust_interval(-INTERVAL_STEP_SECS),
            Command::SaveNow => self.save(),
            Command::Redraw => self.ui.request_redraw(),
        }
        Ok(())
    }

    fn edit(
        &mut self,
        now: Instant,
        apply: impl FnOnce(&RotationEngine) -> Result<(), MuralError>,
    ) -> Result<(), MuralError> {
        if let Err(err) = apply(&self.engine) {
            self.report(&err);
        } else {
            self.deadlines.note_edit(now);
        }
        Ok(())
    }

    fn adjust_interval(&mut self, delta: f64) {
        self.interval_secs = (self.interval_secs + delta).max(MIN_INTERVAL_SECS);
        self.ui.set_status(format!("interval {:.2}s", self.interval_secs));
    }

    fn save(&mut self) {
        match self.reconciler.save(self.library.wallpapers()) {
            Ok(SaveOutcome::Clean) => self.deadlines.clear_save(),
            Ok(SaveOutcome::Saved(count)) => {
                self.ui.set_status(format!("saved {count} wallpaper(s)"));
                self.deadlines.clear_save();
            }
            Err(err) => {
                // Dirty flags stay set; the rescheduled save retries them.
                self.report(&err);
                self.deadlines.defer_save(Instant::now());
            }
        }
    }

    fn report(&self, err: &MuralError) {
        tracing::warn!(error = %err, "recoverable failure");
        self.ui.set_status(err.to_string());
    }
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}
