use serde::{Deserialize, Serialize};

use crate::core::{DeviceMode, ElementId, Viewport};
use crate::interaction::AutoScrollOutcome;

/// Read-only state snapshot passed to listener hooks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewContext {
    pub mode: DeviceMode,
    pub viewport: Viewport,
    pub scroll_position: f64,
    pub observation_count: usize,
    /// Running scope-owned timers.
    pub active_timers: usize,
    /// Timers plus running tweens and the auto-scroll operation.
    pub active_tasks: usize,
}

/// Event stream exposed to listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewEvent {
    TargetRevealed { element: ElementId },
    LineRevealed,
    YearChanged { year: i32 },
    YearDisplayVisibility { visible: bool },
    StepActivated { index: usize },
    AutoScrollStarted { target: f64 },
    AutoScrollFinished { outcome: AutoScrollOutcome },
    CounterUpdated { values: Vec<u64> },
    CarouselAdvanced { index: usize },
    Detached {
        released_observers: usize,
        released_timers: usize,
    },
}

/// Extension hook interface for code that reacts to view activity.
///
/// Listeners observe events and read view context without mutating the view.
pub trait ViewListener {
    fn id(&self) -> &str;
    fn on_event(&mut self, event: &ViewEvent, context: ViewContext);
}
