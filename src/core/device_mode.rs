use serde::{Deserialize, Serialize};

/// Viewport widths strictly below this select the compact strategy.
pub const COMPACT_BREAKPOINT_PX: f64 = 768.0;

/// Animation strategy chosen once per view setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceMode {
    /// Fade-only reveals, no pinning or scrubbing.
    Compact,
    /// Pinned, scrubbed sequences and full reveal choreography.
    Full,
}

impl DeviceMode {
    #[must_use]
    pub fn is_compact(self) -> bool {
        self == Self::Compact
    }
}

/// Classifies a measured viewport width with the default breakpoint.
#[must_use]
pub fn select_mode(viewport_width: f64) -> DeviceMode {
    select_mode_with_breakpoint(viewport_width, COMPACT_BREAKPOINT_PX)
}

/// Non-finite widths are treated as unmeasured and fall back to `Full`.
#[must_use]
pub fn select_mode_with_breakpoint(viewport_width: f64, breakpoint_px: f64) -> DeviceMode {
    if viewport_width.is_finite() && viewport_width < breakpoint_px {
        DeviceMode::Compact
    } else {
        DeviceMode::Full
    }
}
