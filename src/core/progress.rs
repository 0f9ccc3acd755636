use serde::{Deserialize, Serialize};

use crate::core::{Bounds, TriggerStart, Viewport};
use crate::error::{RevealError, RevealResult};

/// Half-open progress slot `[start, end)` owned by one sequential step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    #[must_use]
    pub fn width(self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn contains(self, progress: f64) -> bool {
        progress >= self.start && progress < self.end
    }

    /// Progress at which the entrance completes.
    #[must_use]
    pub fn enter_end(self, enter_fraction: f64) -> f64 {
        self.start + enter_fraction * self.width()
    }

    /// Progress at which the exit begins, `lead_fraction` of a slot before `end`.
    #[must_use]
    pub fn exit_start(self, lead_fraction: f64) -> f64 {
        self.end - lead_fraction * self.width()
    }
}

/// Splits `[0, 1)` into `count` equal windows.
///
/// Window `i` is `[i/count, (i+1)/count)`; both bounds are computed from the
/// index directly so adjacent windows share bit-identical edges.
#[must_use]
pub fn step_windows(count: usize) -> Vec<TimeWindow> {
    if count == 0 {
        return Vec::new();
    }
    let n = count as f64;
    (0..count)
        .map(|index| TimeWindow {
            start: index as f64 / n,
            end: (index + 1) as f64 / n,
        })
        .collect()
}

/// Index of the window containing `progress`, if any.
#[must_use]
pub fn window_index_at(count: usize, progress: f64) -> Option<usize> {
    if count == 0 || !(0.0..1.0).contains(&progress) {
        return None;
    }
    let n = count as f64;
    let mut index = ((progress * n).floor() as usize).min(count - 1);
    // `floor` can land one slot off on a shared edge; the edges themselves
    // are the source of truth.
    if index > 0 && progress < index as f64 / n {
        index -= 1;
    } else if index + 1 < count && progress >= (index + 1) as f64 / n {
        index += 1;
    }
    Some(index)
}

/// Scroll span during which a section is held in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinRange {
    pub start: f64,
    pub end: f64,
}

impl PinRange {
    pub fn new(start: f64, distance: f64) -> RevealResult<Self> {
        if !start.is_finite() || !distance.is_finite() || distance <= 0.0 {
            return Err(RevealError::InvalidData(
                "pin range needs a finite start and a finite distance > 0".to_owned(),
            ));
        }
        Ok(Self {
            start,
            end: start + distance,
        })
    }

    /// Pins `section` once `trigger` is crossed, for `distance` pixels.
    pub fn for_section(
        section: Bounds,
        viewport: Viewport,
        trigger: TriggerStart,
        distance: f64,
    ) -> RevealResult<Self> {
        Self::new(trigger.trigger_scroll(section, viewport), distance)
    }

    #[must_use]
    pub fn distance(self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_pinned(self, scroll: f64) -> bool {
        scroll >= self.start && scroll < self.end
    }

    /// Linear scroll-to-progress mapping, clamped to `[0, 1]`.
    #[must_use]
    pub fn progress_at(self, scroll: f64) -> f64 {
        if !scroll.is_finite() {
            return 0.0;
        }
        ((scroll - self.start) / self.distance()).clamp(0.0, 1.0)
    }
}
