use indexmap::IndexMap;

use crate::core::{ElementId, VisualState};
use crate::error::RevealResult;
use crate::render::{StyleFrame, StyleSink};

/// No-op sink used by tests and headless engine usage.
///
/// It still validates frame content so tests catch non-finite or out-of-range
/// states before a real backend sees them.
#[derive(Debug, Default)]
pub struct NullStyleSink {
    pub frames_applied: usize,
    pub last_patch_count: usize,
    pub last_text_count: usize,
    pub last_fill_count: usize,
    pub last_flag_count: usize,
}

impl StyleSink for NullStyleSink {
    fn apply(&mut self, frame: &StyleFrame) -> RevealResult<()> {
        frame.validate()?;
        self.frames_applied += 1;
        self.last_patch_count = frame.patches.len();
        self.last_text_count = frame.texts.len();
        self.last_fill_count = frame.fills.len();
        self.last_flag_count = frame.flags.len();
        Ok(())
    }
}

/// Sink that keeps the latest applied state and text of every element.
#[derive(Debug, Default)]
pub struct MemoryStyleSink {
    states: IndexMap<ElementId, VisualState>,
    texts: IndexMap<ElementId, String>,
    fills: IndexMap<ElementId, f64>,
    flags: IndexMap<(ElementId, String), bool>,
    frames_applied: usize,
}

impl MemoryStyleSink {
    #[must_use]
    pub fn state_of(&self, element: ElementId) -> Option<VisualState> {
        self.states.get(&element).copied()
    }

    #[must_use]
    pub fn text_of(&self, element: ElementId) -> Option<&str> {
        self.texts.get(&element).map(String::as_str)
    }

    #[must_use]
    pub fn fill_of(&self, element: ElementId) -> Option<f64> {
        self.fills.get(&element).copied()
    }

    /// Unset flags read as `false`.
    #[must_use]
    pub fn flag_of(&self, element: ElementId, flag: &str) -> bool {
        self.flags
            .get(&(element, flag.to_owned()))
            .copied()
            .unwrap_or(false)
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn frames_applied(&self) -> usize {
        self.frames_applied
    }
}

impl StyleSink for MemoryStyleSink {
    fn apply(&mut self, frame: &StyleFrame) -> RevealResult<()> {
        frame.validate()?;
        for patch in &frame.patches {
            self.states.insert(patch.element, patch.state);
        }
        for patch in &frame.texts {
            self.texts.insert(patch.element, patch.text.clone());
        }
        for patch in &frame.fills {
            self.fills.insert(patch.element, patch.fraction);
        }
        for patch in &frame.flags {
            self.flags
                .insert((patch.element, patch.flag.clone()), patch.enabled);
        }
        self.frames_applied += 1;
        Ok(())
    }
}
