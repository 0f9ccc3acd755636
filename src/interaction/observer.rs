use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::ElementId;

use super::{IntersectionEntry, IntersectionHost, ObservationHandle, ObserveOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Line,
    YearMarker,
    Item,
    Section,
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverEvent {
    pub handle: ObservationHandle,
    pub element: ElementId,
    pub kind: TargetKind,
    pub transition: Transition,
    pub ratio: f64,
}

pub type EnterCallback = Box<dyn FnMut(&ObserverEvent)>;

/// Element watched by exactly one controller.
pub struct ObservedTarget {
    pub element: ElementId,
    pub kind: TargetKind,
    on_enter: Option<EnterCallback>,
}

impl ObservedTarget {
    #[must_use]
    pub fn new(element: ElementId, kind: TargetKind) -> Self {
        Self {
            element,
            kind,
            on_enter: None,
        }
    }

    #[must_use]
    pub fn with_on_enter(mut self, callback: impl FnMut(&ObserverEvent) + 'static) -> Self {
        self.on_enter = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for ObservedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedTarget")
            .field("element", &self.element)
            .field("kind", &self.kind)
            .field("on_enter", &self.on_enter.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct Observation {
    target: ObservedTarget,
    options: ObserveOptions,
    inside: bool,
}

/// Owns every intersection observation created by one view.
///
/// Dropping the registry does not reach the host; owners must call
/// `unobserve_all` on teardown (the view scope does this on detach and drop).
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    observations: IndexMap<ObservationHandle, Observation>,
    next_handle: u64,
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts observing `target`.
    ///
    /// Returns `None` without touching the host while its root is detached;
    /// callers register speculatively and retry on the next setup pass.
    pub fn observe<H: IntersectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        target: ObservedTarget,
        options: ObserveOptions,
    ) -> Option<ObservationHandle> {
        if !host.root_attached() {
            debug!(element = %target.element, "observation root not attached, skipping");
            return None;
        }
        let options = match options.validate() {
            Ok(options) => options,
            Err(err) => {
                warn!(error = %err, element = %target.element, "clamping observation threshold");
                let threshold = if options.threshold.is_finite() {
                    options.threshold.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                options.with_threshold(threshold)
            }
        };

        self.next_handle += 1;
        let handle = ObservationHandle(self.next_handle);
        host.observe(handle, target.element, &options);
        trace!(
            handle = handle.0,
            element = %target.element,
            kind = ?target.kind,
            once = options.once,
            "observe"
        );
        self.observations.insert(
            handle,
            Observation {
                target,
                options,
                inside: false,
            },
        );
        Some(handle)
    }

    /// Releases one observation. Returns `false` for unknown handles.
    pub fn unobserve<H: IntersectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        handle: ObservationHandle,
    ) -> bool {
        if self.observations.shift_remove(&handle).is_none() {
            return false;
        }
        host.unobserve(handle);
        trace!(handle = handle.0, "unobserve");
        true
    }

    /// Releases every observation and returns how many were live.
    ///
    /// A second call finds nothing to release and returns `0`.
    pub fn unobserve_all<H: IntersectionHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let released = self.observations.len();
        for (handle, _) in self.observations.drain(..) {
            host.unobserve(handle);
        }
        if released > 0 {
            debug!(released, "released all observations");
        }
        released
    }

    /// Turns raw host entries into enter/leave transitions.
    ///
    /// Entries for released handles are dropped. `once` observations are
    /// released as soon as they report their first entry.
    pub fn dispatch<H: IntersectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        entries: &[IntersectionEntry],
    ) -> Vec<ObserverEvent> {
        let mut events = Vec::new();
        let mut finished = Vec::new();

        for entry in entries {
            let Some(observation) = self.observations.get_mut(&entry.handle) else {
                trace!(handle = entry.handle.0, "dropping entry for released handle");
                continue;
            };

            let transition = match (entry.is_intersecting, observation.inside) {
                (true, false) => Transition::Enter,
                (false, true) => Transition::Leave,
                _ => continue,
            };
            observation.inside = entry.is_intersecting;

            let event = ObserverEvent {
                handle: entry.handle,
                element: observation.target.element,
                kind: observation.target.kind,
                transition,
                ratio: entry.ratio,
            };
            if transition == Transition::Enter {
                if let Some(callback) = observation.target.on_enter.as_mut() {
                    callback(&event);
                }
                if observation.options.once {
                    finished.push(entry.handle);
                }
            }
            events.push(event);
        }

        for handle in finished {
            self.unobserve(host, handle);
        }
        events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    #[must_use]
    pub fn is_observing(&self, handle: ObservationHandle) -> bool {
        self.observations.contains_key(&handle)
    }

    #[must_use]
    pub fn kind_of(&self, handle: ObservationHandle) -> Option<TargetKind> {
        self.observations
            .get(&handle)
            .map(|observation| observation.target.kind)
    }
}
