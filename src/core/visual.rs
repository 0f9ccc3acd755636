use serde::{Deserialize, Serialize};

use crate::error::{RevealError, RevealResult};

/// Animatable presentation of one element.
///
/// Every reveal, exit and emphasis effect in the engine is an interpolation
/// between two of these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub opacity: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    pub rotation_deg: f64,
    pub blur_px: f64,
}

impl Default for VisualState {
    fn default() -> Self {
        Self::NATURAL
    }
}

impl VisualState {
    /// Layout-defined resting state.
    pub const NATURAL: Self = Self {
        opacity: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotation_deg: 0.0,
        blur_px: 0.0,
    };

    /// Transparent, otherwise untouched.
    pub const TRANSPARENT: Self = Self {
        opacity: 0.0,
        ..Self::NATURAL
    };

    #[must_use]
    pub fn faded_offset_y(offset_px: f64) -> Self {
        Self {
            translate_y: offset_px,
            ..Self::TRANSPARENT
        }
    }

    #[must_use]
    pub fn faded_offset_x(offset_px: f64) -> Self {
        Self {
            translate_x: offset_px,
            ..Self::TRANSPARENT
        }
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation_deg: f64) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    #[must_use]
    pub fn with_blur(mut self, blur_px: f64) -> Self {
        self.blur_px = blur_px;
        self
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, to: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self {
            opacity: mix(self.opacity, to.opacity),
            translate_x: mix(self.translate_x, to.translate_x),
            translate_y: mix(self.translate_y, to.translate_y),
            scale: mix(self.scale, to.scale),
            rotation_deg: mix(self.rotation_deg, to.rotation_deg),
            blur_px: mix(self.blur_px, to.blur_px),
        }
    }

    pub fn validate(self, name: &str) -> RevealResult<Self> {
        for (value, field) in [
            (self.opacity, "opacity"),
            (self.translate_x, "translate_x"),
            (self.translate_y, "translate_y"),
            (self.scale, "scale"),
            (self.rotation_deg, "rotation_deg"),
            (self.blur_px, "blur_px"),
        ] {
            if !value.is_finite() {
                return Err(RevealError::InvalidData(format!(
                    "{name}.{field} must be finite"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(RevealError::InvalidData(format!(
                "{name}.opacity must be within [0, 1]"
            )));
        }
        if self.scale < 0.0 || self.blur_px < 0.0 {
            return Err(RevealError::InvalidData(format!(
                "{name}.scale and {name}.blur_px must be >= 0"
            )));
        }
        Ok(self)
    }
}
