use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{DeviceMode, ElementId, PinRange};
use crate::error::{RevealError, RevealResult};
use crate::extensions::ViewEvent;
use crate::interaction::{AutoScrollStatus, IntersectionEntry, TargetKind, ViewportHost};
use crate::render::{StyleFrame, StyleSink};

use super::{
    DetachReport, ProcessStep, RevealGroupId, RevealParams, SequentialTimeline,
    SequentialTimelineConfig, TimelineFrame, ViewScope,
};

pub const ACTIVE_MARKER_FLAG: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLayout {
    pub content: ElementId,
    pub marker: ElementId,
}

/// Element ids of a rendered process section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLayout {
    pub section: ElementId,
    #[serde(default)]
    pub progress_bar: Option<ElementId>,
    pub steps: Vec<StepLayout>,
}

#[derive(Debug)]
pub enum ProcessStrategy {
    /// Full mode: one pinned, scroll-scrubbed timeline.
    Pinned(SequentialTimeline),
    /// Compact mode: each step reveals on its own entry.
    Staggered(RevealGroupId),
}

/// Process section whose presentation is chosen once, at setup.
pub struct ProcessView<H: ViewportHost, S: StyleSink> {
    scope: ViewScope<H, S>,
    layout: ProcessLayout,
    strategy: ProcessStrategy,
    active_step: Option<usize>,
    last_frame: Option<TimelineFrame>,
}

impl<H: ViewportHost, S: StyleSink> ProcessView<H, S> {
    /// Builds the strategy matching the scope's device mode.
    ///
    /// Full mode with a section the host cannot measure yet stays inert until
    /// `relayout` succeeds.
    pub fn setup(
        mut scope: ViewScope<H, S>,
        steps: Vec<ProcessStep>,
        layout: ProcessLayout,
        config: SequentialTimelineConfig,
    ) -> RevealResult<Self> {
        if layout.steps.len() != steps.len() {
            return Err(RevealError::InvalidData(format!(
                "process layout has {} steps, expected {}",
                layout.steps.len(),
                steps.len()
            )));
        }

        let strategy = match scope.mode() {
            DeviceMode::Compact => {
                let contents: Vec<ElementId> =
                    layout.steps.iter().map(|step| step.content).collect();
                let (id, _) = scope.register_reveal_group(
                    &contents,
                    TargetKind::Step,
                    RevealParams::process_step_compact(),
                )?;
                ProcessStrategy::Staggered(id)
            }
            DeviceMode::Full => ProcessStrategy::Pinned(SequentialTimeline::new(steps, config)?),
        };
        debug!(
            mode = ?scope.mode(),
            steps = layout.steps.len(),
            "process view set up"
        );

        let mut view = Self {
            scope,
            layout,
            strategy,
            active_step: None,
            last_frame: None,
        };
        if view.relayout().is_some() {
            view.handle_scroll();
        }
        Ok(view)
    }

    #[must_use]
    pub fn strategy(&self) -> &ProcessStrategy {
        &self.strategy
    }

    #[must_use]
    pub fn timeline(&self) -> Option<&SequentialTimeline> {
        match &self.strategy {
            ProcessStrategy::Pinned(timeline) => Some(timeline),
            ProcessStrategy::Staggered(_) => None,
        }
    }

    #[must_use]
    pub fn active_step(&self) -> Option<usize> {
        self.active_step
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&TimelineFrame> {
        self.last_frame.as_ref()
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope<H, S> {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut ViewScope<H, S> {
        &mut self.scope
    }

    /// Re-reads section geometry after a host reflow.
    ///
    /// The device mode is not re-evaluated. Returns the new pin range, or
    /// `None` in compact mode or when the section cannot be measured.
    pub fn relayout(&mut self) -> Option<PinRange> {
        let ProcessStrategy::Pinned(timeline) = &mut self.strategy else {
            return None;
        };
        let host = self.scope.host();
        let Some(bounds) = host.element_bounds(self.layout.section) else {
            debug!(section = %self.layout.section, "process section not measurable yet");
            return None;
        };
        timeline.layout(bounds, host.viewport()).ok()
    }

    /// Recomputes the pinned frame for the host's current scroll offset.
    ///
    /// Returns `None` in compact mode, where scrolling is handled through
    /// intersections.
    pub fn handle_scroll(&mut self) -> Option<TimelineFrame> {
        if !self.scope.is_attached() {
            return None;
        }
        let ProcessStrategy::Pinned(timeline) = &self.strategy else {
            return None;
        };
        if timeline.pin().is_none() {
            return None;
        }
        let frame = timeline.frame_at_scroll(self.scope.host().scroll_position());
        let style = self.style_for(&frame);
        self.scope.apply(&style);

        if frame.active_step != self.active_step {
            trace!(from = ?self.active_step, to = ?frame.active_step, "active step changed");
            self.active_step = frame.active_step;
            if let Some(index) = frame.active_step {
                self.scope.emit(ViewEvent::StepActivated { index });
            }
        }
        self.last_frame = Some(frame.clone());
        Some(frame)
    }

    fn style_for(&self, frame: &TimelineFrame) -> StyleFrame {
        let mut style = StyleFrame::new();
        for (step, layout) in frame.steps.iter().zip(&self.layout.steps) {
            style.set_state(layout.content, step.visual);
            style.set_flag(layout.marker, ACTIVE_MARKER_FLAG, step.marker_active);
        }
        if let Some(bar) = self.layout.progress_bar {
            style.set_fill(bar, frame.progress_bar_fill);
        }
        style
    }

    pub fn poll(&mut self) -> Vec<ElementId> {
        self.scope.poll().revealed
    }

    /// Dispatches entries; returns the step contents revealed by them.
    pub fn handle_intersections(&mut self, entries: &[IntersectionEntry]) -> Vec<ElementId> {
        self.scope.handle_intersections(entries).revealed
    }

    pub fn tick(&mut self, delta_secs: f64) -> AutoScrollStatus {
        self.scope.tick(delta_secs)
    }

    pub fn detach(&mut self) -> DetachReport {
        self.scope.detach()
    }
}
