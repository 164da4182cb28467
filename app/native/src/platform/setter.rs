//! Background renderer.
//!
//! The renderer receives one image path per monitor and is expected to
//! paint them. Failures are logged by the caller and never roll engine
//! state back, so the display and engine stay logically consistent even
//! when a monitor did not visibly update.

use std::path::PathBuf;
use std::process::Command;

use crate::error::MuralError;

/// Applies a composite wallpaper assignment, one path per monitor.
pub trait BackgroundRenderer {
    /// # Errors
    ///
    /// Returns [`MuralError::Renderer`] when the assignment could not be
    /// applied.
    fn apply(&self, paths: &[PathBuf]) -> Result<(), MuralError>;
}

/// Production renderer shelling out to `feh`.
#[derive(Debug, Default)]
pub struct FehRenderer;

impl BackgroundRenderer for FehRenderer {
    fn apply(&self, paths: &[PathBuf]) -> Result<(), MuralError> {
        if paths.is_empty() {
            return Ok(());
        }
        let status = Command::new("feh")
            .arg("--bg-fill")
            .arg("--no-fehbg")
            .args(paths)
            .status()
            .map_err(|err| MuralError::Renderer(format!("failed to run feh: {err}")))?;
        if !status.success() {
            return Err(MuralError::Renderer(format!("feh exited with {status}")));
        }
        tracing::debug!(count = paths.len(), "applied wallpapers");
        Ok(())
    }
}
