use serde::{Deserialize, Serialize};

/// Easing curves used by reveals, scrubbed steps and scroll motion.
///
/// Exponents follow the usual animation-library naming where `power1` is
/// quadratic, so `power2` is cubic and `power4` is quintic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ease {
    Linear,
    Power2Out,
    Power3Out,
    Power4InOut,
    BackOut { overshoot: f64 },
}

impl Default for Ease {
    fn default() -> Self {
        Self::Power3Out
    }
}

impl Ease {
    pub const DEFAULT_BACK_OVERSHOOT: f64 = 1.70158;

    #[must_use]
    pub fn back_out(overshoot: f64) -> Self {
        Self::BackOut { overshoot }
    }

    /// Maps normalized time to normalized progress.
    ///
    /// Input is clamped to `[0, 1]`; `apply(0) == 0` and `apply(1) == 1` for
    /// every curve. `BackOut` overshoots past 1 in between.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::Power2Out => 1.0 - (1.0 - t).powi(3),
            Self::Power3Out => 1.0 - (1.0 - t).powi(4),
            Self::Power4InOut => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Self::BackOut { overshoot } => {
                let u = t - 1.0;
                1.0 + (overshoot + 1.0) * u.powi(3) + overshoot * u.powi(2)
            }
        }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        match self {
            Self::BackOut { overshoot } => overshoot.is_finite() && overshoot >= 0.0,
            _ => true,
        }
    }
}
