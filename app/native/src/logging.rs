//! Tracing setup.
//!
//! The interactive session owns the terminal, so log lines go to a file
//! next to the store. The filter comes from `MURAL_LOG` and defaults to
//! `info`. Logging is best effort; a log file that cannot be opened never
//! blocks startup.

use std::fs::{self, File};
use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config;
use crate::constants::LOG_ENV_VAR;

/// Plain stderr logging for the non-interactive subcommands.
pub fn init_stderr() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

/// Installs the global subscriber, writing to `mural.log` next to the
/// store file.
pub fn init(store_path: &Path) {
    let path = config::log_path(store_path);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = File::options().create(true).append(true).open(&path) else {
        return;
    };

    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file),
        )
        .with(filter)
        .try_init();
}
