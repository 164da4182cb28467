//! Terminal front end.
//!
//! A fixed status display in the alternate screen: one header line, one
//! line per screen, and a status line. Input is read in raw mode and
//! translated into [`Command`] values for the control loop; the tag prompt
//! is the only modal interaction.

pub mod format;

use std::cell::{Cell, RefCell};
use std::io::{self, Stdout, Write};
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, queue};

use crate::error::MuralError;
use crate::rotation::RotationEngine;
use crate::screen::{Screen, ScreenListener};
use crate::ui::format::{fit_left, interval_label, purity_gauge, rating_gauge};
use crate::wallpaper::{Wallpaper, WallpaperListener};

/// One decoded keypress, ready for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Next,
    Prev,
    NextOnSelected,
    PrevOnSelected,
    SelectNext,
    SelectPrev,
    TogglePause,
    CycleScreens,
    RateUp,
    RateDown,
    PurityUp,
    PurityDown,
    TagPrompt,
    IntervalUp,
    IntervalDown,
    SaveNow,
    Redraw,
}

/// Maps a raw key event to a command. Pure so the bindings are testable
/// without a terminal.
#[must_use]
pub fn map_key(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('n') | KeyCode::Right => Some(Command::Next),
        KeyCode::Char('p') | KeyCode::Left => Some(Command::Prev),
        KeyCode::Char('N') => Some(Command::NextOnSelected),
        KeyCode::Char('P') => Some(Command::PrevOnSelected),
        KeyCode::Tab | KeyCode::Down => Some(Command::SelectNext),
        KeyCode::BackTab | KeyCode::Up => Some(Command::SelectPrev),
        KeyCode::Char(' ') => Some(Command::TogglePause),
        KeyCode::Char('x') => Some(Command::CycleScreens),
        KeyCode::Char('w') => Some(Command::RateUp),
        KeyCode::Char('s') => Some(Command::RateDown),
        KeyCode::Char('e') => Some(Command::PurityUp),
        KeyCode::Char('d') => Some(Command::PurityDown),
        KeyCode::Char('t') => Some(Command::TagPrompt),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::IntervalUp),
        KeyCode::Char('-') => Some(Command::IntervalDown),
        KeyCode::Char('S') => Some(Command::SaveNow),
        _ => None,
    }
}

/// The raw-mode terminal display. Restores the terminal on drop.
pub struct TerminalUi {
    out: RefCell<Stdout>,
    needs_redraw: Cell<bool>,
    status: RefCell<String>,
}

impl TerminalUi {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Terminal`] when the terminal refuses raw mode.
    pub fn new() -> Result<Rc<Self>, MuralError> {
        terminal::enable_raw_mode().map_err(term_err)?;
        let mut out = io::stdout();
        queue!(out, EnterAlternateScreen, cursor::Hide).map_err(term_err)?;
        out.flush().map_err(term_err)?;
        Ok(Rc::new(Self {
            out: RefCell::new(out),
            needs_redraw: Cell::new(true),
            status: RefCell::new(String::new()),
        }))
    }

    /// A display that never touched the terminal, for control-loop tests.
    #[cfg(test)]
    pub(crate) fn headless() -> Rc<Self> {
        Rc::new(Self {
            out: RefCell::new(io::stdout()),
            needs_redraw: Cell::new(false),
            status: RefCell::new(String::new()),
        })
    }

    /// Whether a model change was observed since the last draw.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw.get()
    }

    pub fn request_redraw(&self) {
        self.needs_redraw.set(true);
    }

    /// Replaces the status line; shown on the next draw.
    pub fn set_status(&self, text: impl Into<String>) {
        *self.status.borrow_mut() = text.into();
        self.needs_redraw.set(true);
    }

    /// Redraws the whole display from the engine's current state.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Terminal`] on write failures.
    pub fn draw(&self, engine: &RotationEngine, interval_secs: f64) -> Result<(), MuralError> {
        let mut borrow = self.out.borrow_mut();
        let out = &mut *borrow;
        let (columns, _rows) = terminal::size().map_err(term_err)?;
        let width = columns as usize;

        queue!(out, Clear(ClearType::All), cursor::MoveTo(0, 0)).map_err(term_err)?;

        let pool_len = engine.screens().first().map_or(0, |s| s.wallpaper_count());
        // Full cycle: every wallpaper shown once across all screens.
        let cycle_secs = interval_secs * pool_len as f64;
        let header = format!(
            "mural  |  {pool_len} wallpapers  |  every {}  |  full cycle {}",
            interval_label(interval_secs),
            interval_label(cycle_secs)
        );
        queue!(
            out,
            SetAttribute(Attribute::Bold),
            Print(fit_left(&header, width)),
            SetAttribute(Attribute::Reset)
        )
        .map_err(term_err)?;

        for (row, screen) in engine.screens().iter().enumerate() {
            queue!(out, cursor::MoveTo(0, (row + 2) as u16)).map_err(term_err)?;
            self.draw_screen_line(out, screen, width)?;
        }

        let status_row = (engine.screen_count() + 3) as u16;
        queue!(
            out,
            cursor::MoveTo(0, status_row),
            Print(fit_left(&self.status.borrow(), width))
        )
        .map_err(term_err)?;

        out.flush().map_err(term_err)?;
        self.needs_redraw.set(false);
        Ok(())
    }

    fn draw_screen_line(
        &self,
        out: &mut Stdout,
        screen: &Rc<Screen>,
        width: usize,
    ) -> Result<(), MuralError> {
        let marker = if screen.is_current() { '▶' } else { ' ' };
        let pause = if screen.is_paused() { "paused" } else { "      " };

        let detail = match screen.current_wallpaper() {
            Ok(wallpaper) => {
                let path = wallpaper
                    .preferred_path()
                    .map_or_else(|| "(no valid path)".to_string(), |p| p.display().to_string());
                format!(
                    "{} {}  {}",
                    rating_gauge(wallpaper.rating()),
                    purity_gauge(wallpaper.purity()),
                    path
                )
            }
            Err(_) => "(empty)".to_string(),
        };

        let line = format!(
            "{marker} [{}] {}x{}  {pause}  {detail}",
            screen.index(),
            screen.width(),
            screen.height()
        );

        if screen.is_selected() {
            queue!(
                out,
                SetAttribute(Attribute::Reverse),
                Print(fit_left(&line, width)),
                SetAttribute(Attribute::Reset)
            )
            .map_err(term_err)?;
        } else {
            queue!(out, Print(fit_left(&line, width))).map_err(term_err)?;
        }
        Ok(())
    }

    /// Waits up to `timeout` for input. `Ok(None)` means the timeout
    /// elapsed, which is how the control loop reaches its deadlines.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Terminal`] when the event stream fails.
    pub fn poll_command(&self, timeout: Duration) -> Result<Option<Command>, MuralError> {
        if !event::poll(timeout).map_err(term_err)? {
            return Ok(None);
        }
        match event::read().map_err(term_err)? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(map_key(&key)),
            Event::Resize(..) => Ok(Some(Command::Redraw)),
            _ => Ok(None),
        }
    }

    /// Modal tag entry on the status line. Enter submits, Esc cancels, an
    /// empty submission cancels too.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Terminal`] when the event stream fails.
    pub fn prompt_tag(&self, engine: &RotationEngine, interval_secs: f64) -> Result<Option<String>, MuralError> {
        let mut buffer = String::new();
        loop {
            self.set_status(format!("tag: {buffer}_"));
            self.draw(engine, interval_secs)?;

            match event::read().map_err(term_err)? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Enter => {
                        self.set_status("");
                        return Ok((!buffer.is_empty()).then_some(buffer));
                    }
                    KeyCode::Esc => {
                        self.set_status("");
                        return Ok(None);
                    }
                    KeyCode::Backspace => {
                        buffer.pop();
                    }
                    KeyCode::Char(ch) if !ch.is_control() => buffer.push(ch),
                    _ => {}
                },
                Event::Resize(..) => self.request_redraw(),
                _ => {}
            }
        }
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        let mut borrow = self.out.borrow_mut();
        let out = &mut *borrow;
        let _ = queue!(out, LeaveAlternateScreen, cursor::Show);
        let _ = out.flush();
        let _ = terminal::disable_raw_mode();
    }
}

impl ScreenListener for TerminalUi {
    fn on_screen_changed(&self, _screen: &Screen) {
        self.needs_redraw.set(true);
    }
}

impl WallpaperListener for TerminalUi {
    fn on_wallpaper_changed(&self, _wallpaper: &Wallpaper) {
        self.needs_redraw.set(true);
    }
}

fn term_err(err: io::Error) -> MuralError {
    MuralError::Terminal(err.to_string())
}
