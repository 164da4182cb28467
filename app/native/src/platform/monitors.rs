//! Monitor enumeration.
//!
//! Monitors are detected once at startup by parsing `xrandr -q` output;
//! the count is fixed for the process lifetime. An empty result is fatal:
//! without monitors there is no meaningful rotation state to build.

use std::process::Command;

use crate::error::MuralError;

/// One physical monitor as reported at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    /// Zero-based index, assigned in detection order.
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

/// Detects connected monitors.
///
/// # Errors
///
/// Returns [`MuralError::NoMonitors`] when `xrandr` cannot be spawned or
/// reports no connected outputs.
pub fn detect_monitors() -> Result<Vec<Monitor>, MuralError> {
    let output = Command::new("xrandr")
        .arg("-q")
        .output()
        .map_err(|err| MuralError::NoMonitors(format!("failed to run xrandr: {err}")))?;

    if !output.status.success() {
        return Err(MuralError::NoMonitors(format!(
            "xrandr exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let monitors = parse_xrandr(&stdout);
    if monitors.is_empty() {
        return Err(MuralError::NoMonitors(
            "xrandr reported no connected outputs".to_string(),
        ));
    }

    tracing::info!(count = monitors.len(), "detected monitors");
    Ok(monitors)
}

/// Parses `xrandr -q` output into ordered monitor descriptors.
///
/// Connected output lines look like
/// `HDMI-1 connected 1920x1080+1920+0 (normal ...) 527mm x 296mm` or, for
/// the primary output, `eDP-1 connected primary 1920x1080+0+0 ...`.
/// Outputs without a parseable mode (connected but off) are skipped.
fn parse_xrandr(output: &str) -> Vec<Monitor> {
    let mut monitors = Vec::new();
    for line in output.lines() {
        let mut words = line.split_whitespace();
        let Some(_name) = words.next() else { continue };
        if words.clone().next() != Some("connected") {
            continue;
        }
        words.next(); // consume "connected"
        let Some(dims) = words.find(|w| looks_like_mode(w)) else {
            continue;
        };
        if let Some((width, height)) = parse_mode(dims) {
            monitors.push(Monitor { index: monitors.len(), width, height });
        }
    }
    monitors
}

/// Whether a token has the `WxH+X+Y` shape.
fn looks_like_mode(token: &str) -> bool {
    token.contains('x') && token.contains('+')
}

/// Extracts `(width, height)` from a `WxH+X+Y` geometry token.
fn parse_mode(token: &str) -> Option<(u32, u32)> {
    let geometry = token.split('+').next()?;
    let (w, h) = geometry.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const XRANDR_TWO_SCREENS: &str = "\
Screen 0: minimum 320 x 200, current 3840 x 1080, maximum 16384 x 16384
eDP-1 connected primary 1920x1080+0+0 (normal left inverted right x axis y axis) 309mm x 173mm
   1920x1080     60.01*+  59.97    59.96
HDMI-1 connected 1920x1080+1920+0 (normal left inverted right x axis y axis) 527mm x 296mm
   1920x1080     60.00*+
DP-1 disconnected (normal left inverted right x axis y axis)
";

    #[test]
    fn test_parse_two_connected_outputs() {
        let monitors = parse_xrandr(XRANDR_TWO_SCREENS);
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[0], Monitor { index: 0, width: 1920, height: 1080 });
        assert_eq!(monitors[1], Monitor { index: 1, width: 1920, height: 1080 });
    }

    #[test]
    fn test_disconnected_outputs_are_skipped() {
        let monitors = parse_xrandr("DP-1 disconnected (normal)\n");
        assert!(monitors.is_empty());
    }

    #[test]
    fn test_connected_output_without_mode_is_skipped() {
        // Connected but switched off: no geometry token on the line.
        let monitors = parse_xrandr("HDMI-2 connected (normal left inverted)\n");
        assert!(monitors.is_empty());
    }

    #[test]
    fn test_primary_keyword_does_not_confuse_parser() {
        let monitors = parse_xrandr("eDP-1 connected primary 2560x1440+0+0 (normal) 309mm x 173mm\n");
        assert_eq!(monitors, vec![Monitor { index: 0, width: 2560, height: 1440 }]);
    }

    #[test]
    fn test_parse_mode_rejects_garbage() {
        assert_eq!(parse_mode("1920x1080+0+0"), Some((1920, 1080)));
        assert_eq!(parse_mode("garbage"), None);
        assert_eq!(parse_mode("axb+0+0"), None);
    }
}
