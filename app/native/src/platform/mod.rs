//! Thin wrappers over the host system: monitor enumeration and the external
//! program that paints images onto monitors.

pub mod monitors;
pub mod setter;

pub use monitors::{detect_monitors, Monitor};
pub use setter::{BackgroundRenderer, FehRenderer};
