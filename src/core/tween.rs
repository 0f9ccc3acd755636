use serde::{Deserialize, Serialize};

use crate::core::{Ease, VisualState};
use crate::error::{RevealError, RevealResult};

/// Delayed, eased interpolation between two visual states.
///
/// Tweens carry no clock of their own: the owning view advances them with
/// host-provided frame deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    from: VisualState,
    to: VisualState,
    delay_secs: f64,
    duration_secs: f64,
    ease: Ease,
    elapsed_secs: f64,
}

impl Tween {
    pub fn new(
        from: VisualState,
        to: VisualState,
        duration_secs: f64,
        ease: Ease,
    ) -> RevealResult<Self> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(RevealError::InvalidData(
                "tween duration must be finite and >= 0".to_owned(),
            ));
        }
        if !ease.is_valid() {
            return Err(RevealError::InvalidData(
                "tween easing parameters must be finite and >= 0".to_owned(),
            ));
        }
        Ok(Self {
            from,
            to,
            delay_secs: 0.0,
            duration_secs,
            ease,
            elapsed_secs: 0.0,
        })
    }

    #[must_use]
    pub fn with_delay(mut self, delay_secs: f64) -> Self {
        self.delay_secs = if delay_secs.is_finite() {
            delay_secs.max(0.0)
        } else {
            0.0
        };
        self
    }

    #[must_use]
    pub fn from_state(&self) -> VisualState {
        self.from
    }

    #[must_use]
    pub fn to_state(&self) -> VisualState {
        self.to
    }

    #[must_use]
    pub fn delay_secs(&self) -> f64 {
        self.delay_secs
    }

    #[must_use]
    pub fn total_secs(&self) -> f64 {
        self.delay_secs + self.duration_secs
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed_secs >= self.total_secs()
    }

    /// Samples the state at an absolute elapsed time, including the delay.
    #[must_use]
    pub fn sample(&self, elapsed_secs: f64) -> VisualState {
        let local = elapsed_secs - self.delay_secs;
        if local <= 0.0 {
            return self.from;
        }
        if self.duration_secs <= 0.0 || local >= self.duration_secs {
            return self.to;
        }
        let eased = self.ease.apply(local / self.duration_secs);
        // `lerp` clamps, so overshooting curves are applied by hand.
        let mix = |a: f64, b: f64| a + (b - a) * eased;
        VisualState {
            opacity: mix(self.from.opacity, self.to.opacity).clamp(0.0, 1.0),
            translate_x: mix(self.from.translate_x, self.to.translate_x),
            translate_y: mix(self.from.translate_y, self.to.translate_y),
            scale: mix(self.from.scale, self.to.scale).max(0.0),
            rotation_deg: mix(self.from.rotation_deg, self.to.rotation_deg),
            blur_px: mix(self.from.blur_px, self.to.blur_px).max(0.0),
        }
    }

    #[must_use]
    pub fn current(&self) -> VisualState {
        self.sample(self.elapsed_secs)
    }

    /// Advances the tween and returns the state to apply.
    ///
    /// Returns `None` while the tween is still waiting out its delay, so hosts
    /// are not asked to re-apply an unchanged starting state every frame.
    pub fn advance(&mut self, delta_secs: f64) -> Option<VisualState> {
        if !delta_secs.is_finite() || delta_secs < 0.0 {
            return None;
        }
        let before = self.elapsed_secs;
        self.elapsed_secs = (self.elapsed_secs + delta_secs).min(self.total_secs());
        if self.elapsed_secs <= self.delay_secs && before <= self.delay_secs {
            if self.duration_secs <= 0.0 && self.elapsed_secs >= self.delay_secs {
                return Some(self.to);
            }
            return None;
        }
        Some(self.current())
    }

    /// Jumps to the end state.
    pub fn finish(&mut self) -> VisualState {
        self.elapsed_secs = self.total_secs();
        self.to
    }
}
