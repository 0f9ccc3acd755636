use serde::{Deserialize, Serialize};

use crate::core::COMPACT_BREAKPOINT_PX;
use crate::error::{RevealError, RevealResult};
use crate::interaction::AutoScrollConfig;

use super::{ChronologyConfig, SequentialTimelineConfig};

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist and load view
/// setup without inventing their own format. Every field has a default, so
/// `{}` is a valid config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Viewports narrower than this run in compact mode.
    #[serde(default = "default_compact_breakpoint_px")]
    pub compact_breakpoint_px: f64,
    #[serde(default)]
    pub sequential: SequentialTimelineConfig,
    #[serde(default)]
    pub auto_scroll: AutoScrollConfig,
    #[serde(default)]
    pub chronology: ChronologyConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compact_breakpoint_px: default_compact_breakpoint_px(),
            sequential: SequentialTimelineConfig::default(),
            auto_scroll: AutoScrollConfig::default(),
            chronology: ChronologyConfig::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_compact_breakpoint_px(mut self, breakpoint_px: f64) -> Self {
        self.compact_breakpoint_px = breakpoint_px;
        self
    }

    #[must_use]
    pub fn with_sequential(mut self, config: SequentialTimelineConfig) -> Self {
        self.sequential = config;
        self
    }

    #[must_use]
    pub fn with_auto_scroll(mut self, config: AutoScrollConfig) -> Self {
        self.auto_scroll = config;
        self
    }

    #[must_use]
    pub fn with_chronology(mut self, config: ChronologyConfig) -> Self {
        self.chronology = config;
        self
    }

    pub fn validate(self) -> RevealResult<Self> {
        if !self.compact_breakpoint_px.is_finite() || self.compact_breakpoint_px < 0.0 {
            return Err(RevealError::InvalidConfig(
                "compact_breakpoint_px must be finite and >= 0".to_owned(),
            ));
        }
        self.sequential.validate()?;
        self.auto_scroll.validate()?;
        self.chronology.validate()?;
        Ok(self)
    }

    /// Serializes config to pretty JSON for debug/config files.
    pub fn to_json_pretty(self) -> RevealResult<String> {
        serde_json::to_string_pretty(&self)
            .map_err(|e| RevealError::InvalidConfig(format!("failed to serialize config: {e}")))
    }

    /// Deserializes and validates config from JSON.
    pub fn from_json_str(input: &str) -> RevealResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| RevealError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.validate()
    }
}

fn default_compact_breakpoint_px() -> f64 {
    COMPACT_BREAKPOINT_PX
}
