//! Application-wide constants.

use std::time::Duration;

/// Application name, used for state/log directories.
pub const APP_NAME: &str = "mural";

/// Environment variable overriding the store file location.
pub const STORE_ENV_VAR: &str = "MURAL_STORE";

/// Environment variable controlling the tracing filter.
pub const LOG_ENV_VAR: &str = "MURAL_LOG";

/// Default seconds between automatic rotations.
pub const DEFAULT_INTERVAL_SECS: f64 = 5.0;

/// Smallest rotation interval the `+`/`-` keys can reach.
pub const MIN_INTERVAL_SECS: f64 = 0.25;

/// Step applied by the interval adjustment keys.
pub const INTERVAL_STEP_SECS: f64 = 0.25;

/// How long an attribute edit keeps the current wallpaper on screen before
/// the next automatic rotation may replace it.
pub const EDIT_GRACE: Duration = Duration::from_secs(3);

/// Delay between an attribute edit and the store save it schedules.
pub const SAVE_DELAY: Duration = Duration::from_secs(10);
