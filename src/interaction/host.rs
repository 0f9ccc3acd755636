use serde::{Deserialize, Serialize};

use crate::core::{Bounds, ElementId, RootMargin, TriggerStart, Viewport};
use crate::error::{RevealError, RevealResult};

/// Registration handle returned by the observer registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservationHandle(pub u64);

/// Options for one observed target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserveOptions {
    #[serde(default)]
    pub root_margin: RootMargin,
    #[serde(default)]
    pub threshold: f64,
    /// Release the observation right after the first entry.
    #[serde(default = "default_once")]
    pub once: bool,
}

fn default_once() -> bool {
    true
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::ZERO,
            threshold: 0.0,
            once: true,
        }
    }
}

impl ObserveOptions {
    #[must_use]
    pub fn once() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn repeating() -> Self {
        Self {
            once: false,
            ..Self::default()
        }
    }

    /// Options equivalent to a top-edge trigger line such as `"top 90%"`.
    pub fn from_trigger(trigger: TriggerStart) -> RevealResult<Self> {
        Ok(Self {
            root_margin: trigger.to_root_margin()?,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn validate(self) -> RevealResult<Self> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(RevealError::InvalidData(
                "observation threshold must be within [0, 1]".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Intersection change reported by the host for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionEntry {
    pub handle: ObservationHandle,
    pub element: ElementId,
    pub is_intersecting: bool,
    pub ratio: f64,
}

/// Host intersection-detection primitive.
///
/// Hosts report changes through `take_entries`; the first report after
/// `observe` carries the initial state, as browsers do.
pub trait IntersectionHost {
    /// `false` while the observation root is not attached to a layout.
    fn root_attached(&self) -> bool;
    fn observe(&mut self, handle: ObservationHandle, element: ElementId, options: &ObserveOptions);
    fn unobserve(&mut self, handle: ObservationHandle);
    fn take_entries(&mut self) -> Vec<IntersectionEntry>;
}

/// Host scroll position read/write primitive.
pub trait ScrollHost {
    fn scroll_position(&self) -> f64;
    fn set_scroll_position(&mut self, position: f64);
    fn max_scroll_position(&self) -> f64;
    fn element_bounds(&self, element: ElementId) -> Option<Bounds>;
}

/// Everything a view needs from its environment.
pub trait ViewportHost: IntersectionHost + ScrollHost {
    fn viewport(&self) -> Viewport;
}

const COLLAPSED_ROOT_EPSILON: f64 = 1e-6;

/// Fraction of `bounds` inside the margin-adjusted viewport at `scroll`.
///
/// Returns `None` when the element does not intersect at all. Zero-height
/// elements report `Some(1.0)` while their offset lies inside the root, and
/// so does any element crossing a root collapsed to a line (`-50%` top and
/// bottom margins).
#[must_use]
pub fn intersection_ratio(
    bounds: Bounds,
    viewport: Viewport,
    scroll: f64,
    root_margin: RootMargin,
) -> Option<f64> {
    let (margin_top, margin_bottom) = root_margin.vertical_px(viewport);
    let root_top = scroll - margin_top;
    let root_bottom = scroll + viewport.height + margin_bottom;
    let span = root_bottom - root_top;
    if span < -COLLAPSED_ROOT_EPSILON {
        return None;
    }
    if span <= COLLAPSED_ROOT_EPSILON {
        // Root collapsed to a line: elements crossing it count as fully inside.
        let line = (root_top + root_bottom) / 2.0;
        return (bounds.top <= line && line <= bounds.bottom()).then_some(1.0);
    }

    if bounds.height <= 0.0 {
        return (bounds.top >= root_top && bounds.top <= root_bottom).then_some(1.0);
    }

    let overlap = bounds.bottom().min(root_bottom) - bounds.top.max(root_top);
    (overlap > 0.0).then(|| (overlap / bounds.height).min(1.0))
}

/// Applies the threshold rule on top of `intersection_ratio`.
#[must_use]
pub fn is_intersecting(
    bounds: Bounds,
    viewport: Viewport,
    scroll: f64,
    options: &ObserveOptions,
) -> (bool, f64) {
    match intersection_ratio(bounds, viewport, scroll, options.root_margin) {
        Some(ratio) => (ratio >= options.threshold, ratio),
        None => (false, 0.0),
    }
}
