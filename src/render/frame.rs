use serde::{Deserialize, Serialize};

use crate::core::{ElementId, VisualState};
use crate::error::{RevealError, RevealResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StylePatch {
    pub element: ElementId,
    pub state: VisualState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPatch {
    pub element: ElementId,
    pub text: String,
}

/// Horizontal fill of a bar-like element, `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillPatch {
    pub element: ElementId,
    pub fraction: f64,
}

/// Named on/off marker such as an `active` class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagPatch {
    pub element: ElementId,
    pub flag: String,
    pub enabled: bool,
}

/// Backend-agnostic set of style writes produced by one engine step.
///
/// At most one patch per element is kept; a later write replaces the earlier
/// one in place so application order stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleFrame {
    pub patches: Vec<StylePatch>,
    pub texts: Vec<TextPatch>,
    #[serde(default)]
    pub fills: Vec<FillPatch>,
    #[serde(default)]
    pub flags: Vec<FlagPatch>,
}

impl StyleFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
            && self.texts.is_empty()
            && self.fills.is_empty()
            && self.flags.is_empty()
    }

    pub fn set_state(&mut self, element: ElementId, state: VisualState) {
        match self.patches.iter_mut().find(|patch| patch.element == element) {
            Some(patch) => patch.state = state,
            None => self.patches.push(StylePatch { element, state }),
        }
    }

    pub fn set_text(&mut self, element: ElementId, text: impl Into<String>) {
        let text = text.into();
        match self.texts.iter_mut().find(|patch| patch.element == element) {
            Some(patch) => patch.text = text,
            None => self.texts.push(TextPatch { element, text }),
        }
    }

    pub fn set_fill(&mut self, element: ElementId, fraction: f64) {
        match self.fills.iter_mut().find(|patch| patch.element == element) {
            Some(patch) => patch.fraction = fraction,
            None => self.fills.push(FillPatch { element, fraction }),
        }
    }

    pub fn set_flag(&mut self, element: ElementId, flag: &str, enabled: bool) {
        match self
            .flags
            .iter_mut()
            .find(|patch| patch.element == element && patch.flag == flag)
        {
            Some(patch) => patch.enabled = enabled,
            None => self.flags.push(FlagPatch {
                element,
                flag: flag.to_owned(),
                enabled,
            }),
        }
    }

    #[must_use]
    pub fn with_state(mut self, element: ElementId, state: VisualState) -> Self {
        self.set_state(element, state);
        self
    }

    /// Appends `other`, letting its writes win.
    pub fn merge(&mut self, other: StyleFrame) {
        for patch in other.patches {
            self.set_state(patch.element, patch.state);
        }
        for patch in other.texts {
            self.set_text(patch.element, patch.text);
        }
        for patch in other.fills {
            self.set_fill(patch.element, patch.fraction);
        }
        for patch in other.flags {
            self.set_flag(patch.element, &patch.flag, patch.enabled);
        }
    }

    #[must_use]
    pub fn state_of(&self, element: ElementId) -> Option<VisualState> {
        self.patches
            .iter()
            .find(|patch| patch.element == element)
            .map(|patch| patch.state)
    }

    #[must_use]
    pub fn text_of(&self, element: ElementId) -> Option<&str> {
        self.texts
            .iter()
            .find(|patch| patch.element == element)
            .map(|patch| patch.text.as_str())
    }

    #[must_use]
    pub fn fill_of(&self, element: ElementId) -> Option<f64> {
        self.fills
            .iter()
            .find(|patch| patch.element == element)
            .map(|patch| patch.fraction)
    }

    #[must_use]
    pub fn flag_of(&self, element: ElementId, flag: &str) -> Option<bool> {
        self.flags
            .iter()
            .find(|patch| patch.element == element && patch.flag == flag)
            .map(|patch| patch.enabled)
    }

    pub fn validate(&self) -> RevealResult<()> {
        for patch in &self.patches {
            patch.state.validate("style patch")?;
        }
        for patch in &self.fills {
            if !patch.fraction.is_finite() || !(0.0..=1.0).contains(&patch.fraction) {
                return Err(RevealError::InvalidData(format!(
                    "fill for {} must be within [0, 1]",
                    patch.element
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StyleFrame;
    use crate::core::{ElementId, VisualState};

    #[test]
    fn later_writes_replace_earlier_ones_in_place() {
        let a = ElementId(1);
        let b = ElementId(2);
        let mut frame = StyleFrame::new()
            .with_state(a, VisualState::TRANSPARENT)
            .with_state(b, VisualState::TRANSPARENT);
        frame.set_state(a, VisualState::NATURAL);
        frame.set_flag(b, "active", true);
        frame.set_flag(b, "active", false);

        assert_eq!(frame.patches.len(), 2);
        assert_eq!(frame.patches[0].element, a);
        assert_eq!(frame.state_of(a), Some(VisualState::NATURAL));
        assert_eq!(frame.flags.len(), 1);
        assert_eq!(frame.flag_of(b, "active"), Some(false));
    }

    #[test]
    fn out_of_range_fill_is_rejected() {
        let mut frame = StyleFrame::new();
        frame.set_fill(ElementId(3), 1.5);
        assert!(frame.validate().is_err());
    }
}
