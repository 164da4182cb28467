//! Runtime settings.
//!
//! Everything is resolved once at startup from CLI flags and environment,
//! then passed around immutably (the interval is the one value the UI can
//! change afterwards, and the control loop owns that copy).

use std::path::PathBuf;

use crate::constants::{APP_NAME, DEFAULT_INTERVAL_SECS, MIN_INTERVAL_SECS, STORE_ENV_VAR};
use crate::error::MuralError;
use crate::library::PoolOrder;
use crate::query::Query;

/// Fully resolved settings for an interactive run.
#[derive(Debug)]
pub struct Settings {
    pub sources: Vec<String>,
    pub interval_secs: f64,
    pub store_path: PathBuf,
    pub query: Option<Query>,
    pub order: PoolOrder,
}

impl Settings {
    /// Resolves settings from parsed CLI values.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Query`] for an unparsable filter expression.
    pub fn resolve(
        sources: Vec<String>,
        interval_secs: f64,
        store_flag: Option<PathBuf>,
        query: Option<&str>,
        order: PoolOrder,
    ) -> Result<Self, MuralError> {
        let query = query.map(Query::parse).transpose()?;
        Ok(Self {
            sources,
            interval_secs: interval_secs.max(MIN_INTERVAL_SECS),
            store_path: resolve_store_path(store_flag),
            query,
            order,
        })
    }
}

/// Applies the store location precedence with the current environment.
#[must_use]
pub fn resolve_store_path(flag: Option<PathBuf>) -> PathBuf {
    store_path(flag, std::env::var(STORE_ENV_VAR).ok())
}

/// Store location precedence: explicit flag, then environment, then the
/// platform data directory.
fn store_path(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    if let Some(path) = flag {
        return expand(&path);
    }
    if let Some(path) = env {
        return expand(&PathBuf::from(path));
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("store.json")
}

/// Log file location, next to the store.
#[must_use]
pub fn log_path(store_path: &std::path::Path) -> PathBuf {
    store_path
        .parent()
        .map_or_else(|| PathBuf::from("."), std::path::Path::to_path_buf)
        .join(format!("{APP_NAME}.log"))
}

fn expand(path: &std::path::Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Default seconds between rotations, exposed for the CLI default value.
#[must_use]
pub const fn default_interval() -> f64 {
    DEFAULT_INTERVAL_SECS
}
