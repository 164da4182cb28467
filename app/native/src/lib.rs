//! Mural - multi-screen wallpaper rotation with interactive rating and
//! tagging.
//!
//! The interactive session assembles a wallpaper pool from the given
//! sources, interleaves it across the detected monitors, and rotates one
//! screen at a time while the terminal display accepts rating, purity,
//! tagging, pausing, and screen-cycling commands. Attribute edits are
//! merged back into a JSON store at wallpaper granularity.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod library;
pub mod logging;
pub mod platform;
pub mod query;
pub mod rotation;
pub mod runtime;
pub mod screen;
pub mod store;
pub mod ui;
pub mod wallpaper;

pub use error::MuralError;
