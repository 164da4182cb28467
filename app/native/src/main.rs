#![allow(clippy::multiple_crate_versions)]

//! Mural - multi-screen wallpaper rotation for X11 desktops.
//!
//! This binary serves both personalities:
//! - With sources and no subcommand: runs the interactive rotator.
//! - With a subcommand (e.g., `mural db list`): runs that command and exits.

fn main() {
    if let Err(err) = mural_lib::cli::run() {
        eprintln!("mural: {err}");
        std::process::exit(1);
    }
}
