//! Per-kind widget behaviour.

/// Offscreen child virtualization.
pub mod clipping;
/// Image load tracking.
pub mod image;
/// Pull-to-refresh.
pub mod refresh;
/// Scroll engine.
pub mod scroll;
/// Snap target resolution.
pub mod snap;
/// Text fragment touch targets.
pub mod text;
/// Text field event counting.
pub mod text_input;
