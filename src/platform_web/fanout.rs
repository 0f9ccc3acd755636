use indexmap::IndexMap;

use crate::core::ElementId;
use crate::interaction::{IntersectionEntry, ObservationHandle};

/// Handles sharing one native observer, plus the last state seen per element.
///
/// A native observer reports an element once, however many handles watch it.
/// A handle that joins after the initial report gets that state replayed.
#[derive(Debug, Clone, Default)]
pub(super) struct ObservedTargets {
    targets: IndexMap<ObservationHandle, ElementId>,
    last_state: IndexMap<ElementId, (bool, f64)>,
}

impl ObservedTargets {
    pub(super) fn is_watching(&self, element: ElementId) -> bool {
        self.targets.values().any(|other| *other == element)
    }

    pub(super) fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Adds `handle`; returns the replayed entry when `element` was already
    /// reported to an earlier handle.
    pub(super) fn add(
        &mut self,
        handle: ObservationHandle,
        element: ElementId,
    ) -> Option<IntersectionEntry> {
        let replay = if self.is_watching(element) {
            self.last_state
                .get(&element)
                .map(|&(is_intersecting, ratio)| IntersectionEntry {
                    handle,
                    element,
                    is_intersecting,
                    ratio,
                })
        } else {
            None
        };
        self.targets.insert(handle, element);
        replay
    }

    /// Removes `handle`; returns its element once no handle watches it.
    pub(super) fn remove(&mut self, handle: ObservationHandle) -> Option<ElementId> {
        let element = self.targets.shift_remove(&handle)?;
        if self.is_watching(element) {
            return None;
        }
        self.last_state.shift_remove(&element);
        Some(element)
    }

    /// Records one native report and fans it out to every watching handle.
    pub(super) fn report(
        &mut self,
        element: ElementId,
        is_intersecting: bool,
        ratio: f64,
        out: &mut Vec<IntersectionEntry>,
    ) {
        if !self.is_watching(element) {
            return;
        }
        self.last_state.insert(element, (is_intersecting, ratio));
        out.extend(
            self.targets
                .iter()
                .filter(|(_, target)| **target == element)
                .map(|(handle, _)| IntersectionEntry {
                    handle: *handle,
                    element,
                    is_intersecting,
                    ratio,
                }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::ObservedTargets;
    use crate::core::ElementId;
    use crate::interaction::ObservationHandle;

    const CARD: ElementId = ElementId(7);

    #[test]
    fn late_handle_gets_the_last_reported_state() {
        let mut targets = ObservedTargets::default();
        assert_eq!(targets.add(ObservationHandle(1), CARD), None);

        let mut entries = Vec::new();
        targets.report(CARD, true, 0.8, &mut entries);
        assert_eq!(entries.len(), 1);

        let replay = targets
            .add(ObservationHandle(2), CARD)
            .expect("replayed entry");
        assert_eq!(replay.handle, ObservationHandle(2));
        assert!(replay.is_intersecting);
        assert_eq!(replay.ratio, 0.8);

        entries.clear();
        targets.report(CARD, false, 0.0, &mut entries);
        let handles: Vec<ObservationHandle> = entries.iter().map(|entry| entry.handle).collect();
        assert_eq!(handles, [ObservationHandle(1), ObservationHandle(2)]);
    }

    #[test]
    fn handle_joining_before_the_first_report_waits_for_it() {
        let mut targets = ObservedTargets::default();
        targets.add(ObservationHandle(1), CARD);
        assert_eq!(targets.add(ObservationHandle(2), CARD), None);

        let mut entries = Vec::new();
        targets.report(CARD, true, 1.0, &mut entries);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn element_is_released_with_its_last_handle() {
        let mut targets = ObservedTargets::default();
        targets.add(ObservationHandle(1), CARD);
        targets.add(ObservationHandle(2), CARD);
        targets.report(CARD, true, 1.0, &mut Vec::new());

        assert_eq!(targets.remove(ObservationHandle(1)), None);
        assert_eq!(targets.remove(ObservationHandle(2)), Some(CARD));
        assert!(targets.is_empty());
        assert_eq!(targets.remove(ObservationHandle(2)), None);

        // A fresh handle starts from the next native report, not stale state.
        assert_eq!(targets.add(ObservationHandle(3), CARD), None);
    }
}
