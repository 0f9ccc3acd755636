use indexmap::IndexMap;

use crate::core::{Bounds, ElementId, Viewport};

use super::{
    IntersectionEntry, IntersectionHost, ObservationHandle, ObserveOptions, ScrollHost,
    ViewportHost, is_intersecting,
};

#[derive(Debug, Clone, Copy)]
struct SimulatedObservation {
    element: ElementId,
    options: ObserveOptions,
    last_reported: Option<bool>,
}

/// Deterministic headless host driven purely by element geometry.
///
/// Intersection entries are computed from the current scroll offset whenever
/// `take_entries` is called, so tests and offline tools can script a scroll
/// session without a browser.
#[derive(Debug, Clone)]
pub struct SimulatedViewport {
    viewport: Viewport,
    content_height: f64,
    scroll: f64,
    attached: bool,
    elements: IndexMap<ElementId, Bounds>,
    observations: IndexMap<ObservationHandle, SimulatedObservation>,
    writes: usize,
}

impl SimulatedViewport {
    #[must_use]
    pub fn new(viewport: Viewport, content_height: f64) -> Self {
        Self {
            viewport,
            content_height,
            scroll: 0.0,
            attached: true,
            elements: IndexMap::new(),
            observations: IndexMap::new(),
            writes: 0,
        }
    }

    #[must_use]
    pub fn with_element(mut self, element: ElementId, bounds: Bounds) -> Self {
        self.insert_element(element, bounds);
        self
    }

    pub fn insert_element(&mut self, element: ElementId, bounds: Bounds) {
        self.elements.insert(element, bounds);
    }

    pub fn remove_element(&mut self, element: ElementId) {
        self.elements.shift_remove(&element);
    }

    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Changes the document height, e.g. after lazy content loads.
    pub fn set_content_height(&mut self, content_height: f64) {
        self.content_height = content_height;
    }

    /// Scrolls as a user would; does not count as a programmatic write.
    pub fn scroll_to(&mut self, position: f64) {
        self.scroll = self.clamp(position);
    }

    #[must_use]
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_observing_element(&self, element: ElementId) -> bool {
        self.observations
            .values()
            .any(|observation| observation.element == element)
    }

    /// Number of programmatic `set_scroll_position` calls.
    #[must_use]
    pub fn scroll_writes(&self) -> usize {
        self.writes
    }

    fn clamp(&self, position: f64) -> f64 {
        if !position.is_finite() {
            return self.scroll;
        }
        position.clamp(0.0, self.max_scroll_position())
    }
}

impl IntersectionHost for SimulatedViewport {
    fn root_attached(&self) -> bool {
        self.attached
    }

    fn observe(&mut self, handle: ObservationHandle, element: ElementId, options: &ObserveOptions) {
        self.observations.insert(
            handle,
            SimulatedObservation {
                element,
                options: *options,
                last_reported: None,
            },
        );
    }

    fn unobserve(&mut self, handle: ObservationHandle) {
        self.observations.shift_remove(&handle);
    }

    fn take_entries(&mut self) -> Vec<IntersectionEntry> {
        let mut entries = Vec::new();
        for (handle, observation) in &mut self.observations {
            let Some(bounds) = self.elements.get(&observation.element).copied() else {
                continue;
            };
            let (intersecting, ratio) =
                is_intersecting(bounds, self.viewport, self.scroll, &observation.options);
            if observation.last_reported == Some(intersecting) {
                continue;
            }
            observation.last_reported = Some(intersecting);
            entries.push(IntersectionEntry {
                handle: *handle,
                element: observation.element,
                is_intersecting: intersecting,
                ratio,
            });
        }
        entries
    }
}

impl ScrollHost for SimulatedViewport {
    fn scroll_position(&self) -> f64 {
        self.scroll
    }

    fn set_scroll_position(&mut self, position: f64) {
        self.writes += 1;
        self.scroll = self.clamp(position);
    }

    fn max_scroll_position(&self) -> f64 {
        (self.content_height - self.viewport.height).max(0.0)
    }

    fn element_bounds(&self, element: ElementId) -> Option<Bounds> {
        self.elements.get(&element).copied()
    }
}

impl ViewportHost for SimulatedViewport {
    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
