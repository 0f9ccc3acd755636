use std::any::Any;

use tracing::trace;

use crate::error::{RevealError, RevealResult};

use super::{ViewEvent, ViewTimer};

pub const DEFAULT_AUTO_PLAY_INTERVAL_SECS: f64 = 5.0;

/// Cyclic slide index that advances on a fixed interval.
///
/// Manual navigation with `go_to` restarts the interval so the chosen slide
/// gets a full period on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoPlayCarousel {
    id: String,
    len: usize,
    current: usize,
    interval_secs: f64,
    elapsed_secs: f64,
    running: bool,
}

impl AutoPlayCarousel {
    pub fn new(id: impl Into<String>, len: usize, interval_secs: f64) -> RevealResult<Self> {
        if !interval_secs.is_finite() || interval_secs <= 0.0 {
            return Err(RevealError::InvalidConfig(
                "carousel interval must be finite and > 0".to_owned(),
            ));
        }
        Ok(Self {
            id: id.into(),
            len,
            current: 0,
            interval_secs,
            elapsed_secs: 0.0,
            running: false,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Replaces the slide count, keeping the index in range.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.current >= len {
            self.current = 0;
        }
    }

    pub fn next(&mut self) -> usize {
        if self.len > 0 {
            self.current = (self.current + 1) % self.len;
        }
        self.current
    }

    pub fn prev(&mut self) -> usize {
        if self.len > 0 {
            self.current = if self.current == 0 {
                self.len - 1
            } else {
                self.current - 1
            };
        }
        self.current
    }

    /// Jumps to `index` and restarts the interval. Out-of-range indexes are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.current = index;
        self.stop();
        self.start();
        true
    }
}

impl ViewTimer for AutoPlayCarousel {
    fn id(&self) -> &str {
        &self.id
    }

    fn start(&mut self) {
        self.running = true;
        self.elapsed_secs = 0.0;
    }

    fn stop(&mut self) {
        self.running = false;
        self.elapsed_secs = 0.0;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn tick(&mut self, delta_secs: f64) -> Option<ViewEvent> {
        if !self.running || self.len == 0 || !delta_secs.is_finite() || delta_secs <= 0.0 {
            return None;
        }
        self.elapsed_secs += delta_secs;
        let mut advanced = false;
        while self.elapsed_secs >= self.interval_secs {
            self.elapsed_secs -= self.interval_secs;
            self.next();
            advanced = true;
        }
        advanced.then(|| {
            trace!(id = %self.id, index = self.current, "carousel advanced");
            ViewEvent::CarouselAdvanced {
                index: self.current,
            }
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
