pub mod aggregate;
pub mod device_mode;
pub mod easing;
pub mod progress;
pub mod trigger;
pub mod tween;
pub mod types;
pub mod visual;

pub use aggregate::{
    ChronicleRecord, FALLBACK_YEAR, RecordOrigin, Side, TimelineEntry, TimelineRecord, YearGroup,
    aggregate, aggregate_with_fallback,
};
pub use device_mode::{
    COMPACT_BREAKPOINT_PX, DeviceMode, select_mode, select_mode_with_breakpoint,
};
pub use easing::Ease;
pub use progress::{PinRange, TimeWindow, step_windows, window_index_at};
pub use trigger::{Length, RootMargin, TriggerStart};
pub use tween::Tween;
pub use types::{Bounds, ElementId, Viewport};
pub use visual::VisualState;
