mod frame;
mod null_sink;

pub use frame::{FillPatch, FlagPatch, StyleFrame, StylePatch, TextPatch};
pub use null_sink::{MemoryStyleSink, NullStyleSink};

use crate::error::RevealResult;

/// Contract implemented by any style backend.
///
/// Backends receive fully materialized `StyleFrame`s so DOM or toolkit code
/// stays isolated from scroll, observation and timing logic.
pub trait StyleSink {
    fn apply(&mut self, frame: &StyleFrame) -> RevealResult<()>;
}
