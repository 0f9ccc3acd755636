use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::core::{
    Bounds, Ease, PinRange, TimeWindow, TriggerStart, Viewport, VisualState, step_windows,
    window_index_at,
};
use crate::error::{RevealError, RevealResult};

/// One step of a process section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub duration_label: String,
}

impl ProcessStep {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            icon: String::new(),
            duration_label: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequentialTimelineConfig {
    /// Scroll pixels over which progress runs from 0 to 1.
    #[serde(default = "default_scroll_distance")]
    pub scroll_distance: f64,
    #[serde(default = "default_pin_start")]
    pub pin_start: TriggerStart,
    /// Share of a window spent entering.
    #[serde(default = "default_enter_fraction")]
    pub enter_fraction: f64,
    /// Share of a window, counted back from its end, spent exiting.
    #[serde(default = "default_exit_lead_fraction")]
    pub exit_lead_fraction: f64,
    #[serde(default = "default_hidden_state")]
    pub hidden: VisualState,
    #[serde(default = "default_cleared_state")]
    pub cleared: VisualState,
    #[serde(default = "default_enter_ease")]
    pub enter_ease: Ease,
    #[serde(default = "default_exit_ease")]
    pub exit_ease: Ease,
}

fn default_scroll_distance() -> f64 {
    4000.0
}

fn default_pin_start() -> TriggerStart {
    TriggerStart::center_center()
}

fn default_enter_fraction() -> f64 {
    0.5
}

fn default_exit_lead_fraction() -> f64 {
    0.4
}

fn default_hidden_state() -> VisualState {
    VisualState::faded_offset_y(50.0).with_scale(0.8)
}

fn default_cleared_state() -> VisualState {
    VisualState::faded_offset_y(-40.0)
        .with_scale(0.9)
        .with_blur(10.0)
}

fn default_enter_ease() -> Ease {
    Ease::Power3Out
}

fn default_exit_ease() -> Ease {
    Ease::Linear
}

impl Default for SequentialTimelineConfig {
    fn default() -> Self {
        Self {
            scroll_distance: default_scroll_distance(),
            pin_start: default_pin_start(),
            enter_fraction: default_enter_fraction(),
            exit_lead_fraction: default_exit_lead_fraction(),
            hidden: default_hidden_state(),
            cleared: default_cleared_state(),
            enter_ease: default_enter_ease(),
            exit_ease: default_exit_ease(),
        }
    }
}

impl SequentialTimelineConfig {
    #[must_use]
    pub fn with_scroll_distance(mut self, scroll_distance: f64) -> Self {
        self.scroll_distance = scroll_distance;
        self
    }

    #[must_use]
    pub fn with_fractions(mut self, enter_fraction: f64, exit_lead_fraction: f64) -> Self {
        self.enter_fraction = enter_fraction;
        self.exit_lead_fraction = exit_lead_fraction;
        self
    }

    pub fn validate(self) -> RevealResult<Self> {
        if !self.scroll_distance.is_finite() || self.scroll_distance <= 0.0 {
            return Err(RevealError::InvalidConfig(
                "timeline scroll_distance must be finite and > 0".to_owned(),
            ));
        }
        self.pin_start
            .validate()
            .map_err(|err| RevealError::InvalidConfig(format!("timeline pin_start: {err}")))?;
        if !self.enter_fraction.is_finite()
            || self.enter_fraction <= 0.0
            || self.enter_fraction > 1.0
        {
            return Err(RevealError::InvalidConfig(
                "timeline enter_fraction must be within (0, 1]".to_owned(),
            ));
        }
        if !self.exit_lead_fraction.is_finite() || !(0.0..=1.0).contains(&self.exit_lead_fraction)
        {
            return Err(RevealError::InvalidConfig(
                "timeline exit_lead_fraction must be within [0, 1]".to_owned(),
            ));
        }
        if self.enter_fraction + self.exit_lead_fraction > 1.0 {
            return Err(RevealError::InvalidConfig(
                "timeline entrance and exit must not overlap within a window".to_owned(),
            ));
        }
        self.hidden
            .validate("timeline.hidden")
            .and_then(|_| self.cleared.validate("timeline.cleared"))
            .map_err(|err| RevealError::InvalidConfig(err.to_string()))?;
        if !self.enter_ease.is_valid() || !self.exit_ease.is_valid() {
            return Err(RevealError::InvalidConfig(
                "timeline easing parameters must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepPhase {
    Pending,
    Entering,
    Shown,
    Exiting,
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepFrame {
    pub index: usize,
    pub phase: StepPhase,
    pub marker_active: bool,
    pub visual: VisualState,
}

/// Everything the pinned section shows at one progress value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineFrame {
    pub progress: f64,
    pub progress_bar_fill: f64,
    /// Step whose window contains `progress`; `None` once progress reaches 1.
    pub active_step: Option<usize>,
    pub steps: SmallVec<[StepFrame; 8]>,
}

/// Scroll-scrubbed sequence of steps sharing one pinned section.
///
/// Progress `[0, 1]` is split into one equal window per step. A step enters
/// during the first part of its window, holds, and exits during the last part,
/// so exactly one step is on stage at any progress below 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialTimeline {
    config: SequentialTimelineConfig,
    steps: Vec<ProcessStep>,
    windows: Vec<TimeWindow>,
    pin: Option<PinRange>,
}

impl SequentialTimeline {
    pub fn new(steps: Vec<ProcessStep>, config: SequentialTimelineConfig) -> RevealResult<Self> {
        if steps.is_empty() {
            return Err(RevealError::InvalidData(
                "sequential timeline needs at least one step".to_owned(),
            ));
        }
        let config = config.validate()?;
        let windows = step_windows(steps.len());
        debug!(steps = steps.len(), "sequential timeline created");
        Ok(Self {
            config,
            steps,
            windows,
            pin: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> SequentialTimelineConfig {
        self.config
    }

    #[must_use]
    pub fn steps(&self) -> &[ProcessStep] {
        &self.steps
    }

    #[must_use]
    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }

    #[must_use]
    pub fn pin(&self) -> Option<PinRange> {
        self.pin
    }

    /// Progress span `[exit_start, end)` of one step's exit.
    #[must_use]
    pub fn exit_span(&self, index: usize) -> Option<(f64, f64)> {
        self.windows
            .get(index)
            .map(|window| (window.exit_start(self.config.exit_lead_fraction), window.end))
    }

    /// Resolves the pin range from the section's document geometry.
    ///
    /// Reads geometry only; call again after the host reflows.
    pub fn layout(&mut self, section: Bounds, viewport: Viewport) -> RevealResult<PinRange> {
        if !viewport.is_valid() {
            return Err(RevealError::InvalidData(
                "timeline layout needs a valid viewport".to_owned(),
            ));
        }
        let pin = PinRange::for_section(
            section,
            viewport,
            self.config.pin_start,
            self.config.scroll_distance,
        )?;
        debug!(start = pin.start, end = pin.end, "timeline pin laid out");
        self.pin = Some(pin);
        Ok(pin)
    }

    /// Progress for a scroll offset; `0.0` until the timeline is laid out.
    #[must_use]
    pub fn progress_at(&self, scroll: f64) -> f64 {
        self.pin.map_or(0.0, |pin| pin.progress_at(scroll))
    }

    #[must_use]
    pub fn frame_at_scroll(&self, scroll: f64) -> TimelineFrame {
        self.frame_at(self.progress_at(scroll))
    }

    /// Pure function of progress; scrubbing back and forth is reversible.
    #[must_use]
    pub fn frame_at(&self, progress: f64) -> TimelineFrame {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let steps = (0..self.windows.len())
            .map(|index| self.step_frame(index, progress))
            .collect();
        let active_step = window_index_at(self.windows.len(), progress);
        trace!(progress, ?active_step, "timeline frame");
        TimelineFrame {
            progress,
            progress_bar_fill: progress,
            active_step,
            steps,
        }
    }

    fn step_frame(&self, index: usize, progress: f64) -> StepFrame {
        let window = self.windows[index];
        let enter_end = window.enter_end(self.config.enter_fraction);
        let exit_start = window.exit_start(self.config.exit_lead_fraction);

        let (phase, visual) = if progress < window.start {
            (StepPhase::Pending, self.config.hidden)
        } else if progress < enter_end {
            let t = (progress - window.start) / (enter_end - window.start);
            let eased = self.config.enter_ease.apply(t);
            (
                StepPhase::Entering,
                self.config.hidden.lerp(VisualState::NATURAL, eased),
            )
        } else if progress < exit_start {
            (StepPhase::Shown, VisualState::NATURAL)
        } else if progress < window.end {
            let t = (progress - exit_start) / (window.end - exit_start);
            let eased = self.config.exit_ease.apply(t);
            (
                StepPhase::Exiting,
                VisualState::NATURAL.lerp(self.config.cleared, eased),
            )
        } else {
            (StepPhase::Cleared, self.config.cleared)
        };

        StepFrame {
            index,
            phase,
            marker_active: progress >= window.start,
            visual,
        }
    }
}
