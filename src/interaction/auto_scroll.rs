use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{ElementId, Ease};
use crate::error::{RevealError, RevealResult};

use super::ScrollHost;

/// How an auto-scroll operation moves toward its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollMotion {
    /// Fixed pixel step per fixed tick interval.
    ConstantRate { px_per_tick: f64, tick_secs: f64 },
    /// Fixed duration with an easing curve.
    Eased { duration_secs: f64, ease: Ease },
}

impl Default for ScrollMotion {
    fn default() -> Self {
        Self::ConstantRate {
            px_per_tick: 1.0,
            tick_secs: 0.03,
        }
    }
}

impl ScrollMotion {
    /// Motion used when jumping to a page section.
    #[must_use]
    pub fn section_navigation() -> Self {
        Self::Eased {
            duration_secs: 1.2,
            ease: Ease::Power4InOut,
        }
    }

    fn validate(self) -> RevealResult<Self> {
        match self {
            Self::ConstantRate {
                px_per_tick,
                tick_secs,
            } => {
                if !px_per_tick.is_finite() || px_per_tick <= 0.0 {
                    return Err(RevealError::InvalidConfig(
                        "auto-scroll px_per_tick must be finite and > 0".to_owned(),
                    ));
                }
                if !tick_secs.is_finite() || tick_secs <= 0.0 {
                    return Err(RevealError::InvalidConfig(
                        "auto-scroll tick_secs must be finite and > 0".to_owned(),
                    ));
                }
            }
            Self::Eased {
                duration_secs,
                ease,
            } => {
                if !duration_secs.is_finite() || duration_secs <= 0.0 {
                    return Err(RevealError::InvalidConfig(
                        "auto-scroll duration must be finite and > 0".to_owned(),
                    ));
                }
                if !ease.is_valid() {
                    return Err(RevealError::InvalidConfig(
                        "auto-scroll easing parameters must be finite and >= 0".to_owned(),
                    ));
                }
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoScrollConfig {
    #[serde(default)]
    pub motion: ScrollMotion,
    /// Operation completes once this close to the target.
    #[serde(default = "default_arrival_tolerance_px")]
    pub arrival_tolerance_px: f64,
    /// Gap kept above an element target, e.g. for a fixed header.
    #[serde(default = "default_element_offset_px")]
    pub element_offset_px: f64,
    /// Scroll drift beyond this between ticks means someone else scrolled.
    #[serde(default = "default_external_scroll_tolerance_px")]
    pub external_scroll_tolerance_px: f64,
}

fn default_arrival_tolerance_px() -> f64 {
    10.0
}

fn default_element_offset_px() -> f64 {
    80.0
}

fn default_external_scroll_tolerance_px() -> f64 {
    1.0
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            motion: ScrollMotion::default(),
            arrival_tolerance_px: default_arrival_tolerance_px(),
            element_offset_px: default_element_offset_px(),
            external_scroll_tolerance_px: default_external_scroll_tolerance_px(),
        }
    }
}

impl AutoScrollConfig {
    #[must_use]
    pub fn with_motion(mut self, motion: ScrollMotion) -> Self {
        self.motion = motion;
        self
    }

    #[must_use]
    pub fn with_arrival_tolerance_px(mut self, tolerance_px: f64) -> Self {
        self.arrival_tolerance_px = tolerance_px;
        self
    }

    pub fn validate(self) -> RevealResult<Self> {
        self.motion.validate()?;
        for (value, name) in [
            (self.arrival_tolerance_px, "arrival_tolerance_px"),
            (self.external_scroll_tolerance_px, "external_scroll_tolerance_px"),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RevealError::InvalidConfig(format!(
                    "auto-scroll `{name}` must be finite and >= 0"
                )));
            }
        }
        if !self.element_offset_px.is_finite() {
            return Err(RevealError::InvalidConfig(
                "auto-scroll `element_offset_px` must be finite".to_owned(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScrollTarget {
    Position(f64),
    /// Top of an element minus the configured offset.
    Element(ElementId),
    /// Bottom of the scrollable content.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveScrollOperation {
    pub requested: ScrollTarget,
    pub origin: f64,
    /// Resolved target; `ScrollTarget::End` is re-resolved on every tick.
    pub target: f64,
    pub estimated_duration_secs: f64,
    pub elapsed_secs: f64,
    pub cancelled: bool,
    last_written: f64,
    tick_remainder_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoScrollOutcome {
    Arrived,
    Cancelled,
    /// The host position moved under the coordinator, e.g. a user wheel.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AutoScrollStatus {
    Idle,
    Advancing { position: f64 },
    Finished(AutoScrollOutcome),
}

/// Drives programmatic scrolling with at most one operation in flight.
#[derive(Debug, Clone, Default)]
pub struct AutoScrollCoordinator {
    config: AutoScrollConfig,
    active: Option<ActiveScrollOperation>,
}

impl AutoScrollCoordinator {
    pub fn new(config: AutoScrollConfig) -> RevealResult<Self> {
        Ok(Self {
            config: config.validate()?,
            active: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> AutoScrollConfig {
        self.config
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn active_operation(&self) -> Option<&ActiveScrollOperation> {
        self.active.as_ref()
    }

    /// Begins scrolling toward `target`.
    ///
    /// Returns `false` without side effects when an operation is already
    /// active, the target cannot be resolved, or the host is already there.
    pub fn start<H: ScrollHost + ?Sized>(&mut self, host: &H, target: ScrollTarget) -> bool {
        if self.active.is_some() {
            debug!(?target, "auto-scroll already active, ignoring start");
            return false;
        }

        let Some(resolved) = self.resolve(host, target) else {
            debug!(?target, "auto-scroll target unresolved");
            return false;
        };

        let origin = host.scroll_position();
        let distance = (resolved - origin).abs();
        if distance <= self.config.arrival_tolerance_px {
            trace!(origin, target = resolved, "auto-scroll target already reached");
            return false;
        }

        let estimated_duration_secs = match self.config.motion {
            ScrollMotion::ConstantRate {
                px_per_tick,
                tick_secs,
            } => distance / px_per_tick * tick_secs,
            ScrollMotion::Eased { duration_secs, .. } => duration_secs,
        };

        debug!(
            origin,
            target = resolved,
            estimated_duration_secs,
            "auto-scroll started"
        );
        self.active = Some(ActiveScrollOperation {
            requested: target,
            origin,
            target: resolved,
            estimated_duration_secs,
            elapsed_secs: 0.0,
            cancelled: false,
            last_written: origin,
            tick_remainder_secs: 0.0,
        });
        true
    }

    /// Stops the active operation. Safe to call when idle.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(mut operation) => {
                operation.cancelled = true;
                debug!(
                    position = operation.last_written,
                    target = operation.target,
                    cancelled = operation.cancelled,
                    "auto-scroll cancelled"
                );
                true
            }
            None => false,
        }
    }

    /// Advances the active operation by `delta_secs` of host time.
    pub fn tick<H: ScrollHost + ?Sized>(
        &mut self,
        host: &mut H,
        delta_secs: f64,
    ) -> AutoScrollStatus {
        let max_scroll = host.max_scroll_position().max(0.0);
        let Some(operation) = self.active.as_mut() else {
            return AutoScrollStatus::Idle;
        };
        if operation.requested == ScrollTarget::End && operation.target != max_scroll {
            trace!(
                from = operation.target,
                to = max_scroll,
                "auto-scroll end moved"
            );
            operation.target = max_scroll;
        }

        let current = host.scroll_position();
        if (current - operation.last_written).abs() > self.config.external_scroll_tolerance_px {
            debug!(
                expected = operation.last_written,
                actual = current,
                "auto-scroll interrupted by external scroll"
            );
            self.active = None;
            return AutoScrollStatus::Finished(AutoScrollOutcome::Interrupted);
        }

        if !delta_secs.is_finite() || delta_secs <= 0.0 {
            return AutoScrollStatus::Advancing { position: current };
        }
        operation.elapsed_secs += delta_secs;

        let direction = (operation.target - current).signum();
        let (next, eased_done) = match self.config.motion {
            ScrollMotion::ConstantRate {
                px_per_tick,
                tick_secs,
            } => {
                let budget = operation.tick_remainder_secs + delta_secs;
                let ticks = (budget / tick_secs).floor();
                operation.tick_remainder_secs = budget - ticks * tick_secs;
                let remaining = (operation.target - current).abs();
                let step = (ticks * px_per_tick).min(remaining);
                (current + direction * step, false)
            }
            ScrollMotion::Eased {
                duration_secs,
                ease,
            } => {
                let t = (operation.elapsed_secs / duration_secs).min(1.0);
                let position =
                    operation.origin + (operation.target - operation.origin) * ease.apply(t);
                (position, t >= 1.0)
            }
        };

        let wanted_move = next != current;
        let next = next.clamp(0.0, max_scroll);
        if next != current {
            host.set_scroll_position(next);
        }
        operation.last_written = host.scroll_position();
        // The content ended before the target: nowhere left to go.
        let blocked = wanted_move && operation.last_written == current;

        let remaining = (operation.target - operation.last_written).abs();
        if eased_done || blocked || remaining <= self.config.arrival_tolerance_px {
            debug!(position = operation.last_written, "auto-scroll arrived");
            self.active = None;
            return AutoScrollStatus::Finished(AutoScrollOutcome::Arrived);
        }

        AutoScrollStatus::Advancing {
            position: operation.last_written,
        }
    }

    fn resolve<H: ScrollHost + ?Sized>(&self, host: &H, target: ScrollTarget) -> Option<f64> {
        let raw = match target {
            ScrollTarget::Position(position) => Some(position),
            ScrollTarget::Element(element) => host
                .element_bounds(element)
                .map(|bounds| bounds.top - self.config.element_offset_px),
            ScrollTarget::End => Some(host.max_scroll_position()),
        }?;
        raw.is_finite()
            .then(|| raw.clamp(0.0, host.max_scroll_position().max(0.0)))
    }
}
