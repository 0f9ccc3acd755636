use std::any::Any;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::Ease;
use crate::error::{RevealError, RevealResult};

use super::{ViewEvent, ViewTimer};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountUpConfig {
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f64,
    #[serde(default = "default_ease")]
    pub ease: Ease,
}

fn default_duration_secs() -> f64 {
    2.0
}

fn default_ease() -> Ease {
    Ease::Power2Out
}

impl Default for CountUpConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            ease: default_ease(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum CountUpPhase {
    Idle,
    Running,
    Done,
}

/// Animates a set of statistics from zero to their final values, once.
///
/// Displayed values are floored, so every value reads `0` at the start and
/// exactly its target at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct CountUp {
    id: String,
    targets: Vec<u64>,
    config: CountUpConfig,
    elapsed_secs: f64,
    phase: CountUpPhase,
}

impl CountUp {
    pub fn new(
        id: impl Into<String>,
        targets: Vec<u64>,
        config: CountUpConfig,
    ) -> RevealResult<Self> {
        if !config.duration_secs.is_finite() || config.duration_secs <= 0.0 {
            return Err(RevealError::InvalidConfig(
                "count-up duration must be finite and > 0".to_owned(),
            ));
        }
        if !config.ease.is_valid() {
            return Err(RevealError::InvalidConfig(
                "count-up easing parameters must be finite and >= 0".to_owned(),
            ));
        }
        Ok(Self {
            id: id.into(),
            targets,
            config,
            elapsed_secs: 0.0,
            phase: CountUpPhase::Idle,
        })
    }

    #[must_use]
    pub fn targets(&self) -> &[u64] {
        &self.targets
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == CountUpPhase::Done
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        match self.phase {
            CountUpPhase::Idle => 0.0,
            CountUpPhase::Done => 1.0,
            CountUpPhase::Running => self
                .config
                .ease
                .apply((self.elapsed_secs / self.config.duration_secs).min(1.0))
                .clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn display_values(&self) -> Vec<u64> {
        let progress = self.progress();
        self.targets
            .iter()
            .map(|&target| {
                if progress >= 1.0 {
                    target
                } else {
                    (target as f64 * progress).floor() as u64
                }
            })
            .collect()
    }
}

impl ViewTimer for CountUp {
    fn id(&self) -> &str {
        &self.id
    }

    /// Only the first start has an effect.
    fn start(&mut self) {
        if self.phase == CountUpPhase::Idle {
            debug!(id = %self.id, "count-up started");
            self.phase = CountUpPhase::Running;
        }
    }

    fn stop(&mut self) {
        if self.phase == CountUpPhase::Running {
            self.phase = CountUpPhase::Done;
            self.elapsed_secs = self.config.duration_secs;
        }
    }

    fn is_running(&self) -> bool {
        self.phase == CountUpPhase::Running
    }

    fn tick(&mut self, delta_secs: f64) -> Option<ViewEvent> {
        if self.phase != CountUpPhase::Running || !delta_secs.is_finite() || delta_secs <= 0.0 {
            return None;
        }
        self.elapsed_secs += delta_secs;
        if self.elapsed_secs >= self.config.duration_secs {
            self.phase = CountUpPhase::Done;
        }
        Some(ViewEvent::CounterUpdated {
            values: self.display_values(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
