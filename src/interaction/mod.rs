//! Host-facing side of the engine: capability traits, viewport observation
//! and programmatic scrolling.

mod auto_scroll;
mod host;
mod observer;
mod simulated;

pub use auto_scroll::{
    ActiveScrollOperation, AutoScrollConfig, AutoScrollCoordinator, AutoScrollOutcome,
    AutoScrollStatus, ScrollMotion, ScrollTarget,
};
pub use host::{
    IntersectionEntry, IntersectionHost, ObservationHandle, ObserveOptions, ScrollHost,
    ViewportHost, intersection_ratio, is_intersecting,
};
pub use observer::{
    EnterCallback, ObservedTarget, ObserverEvent, ObserverRegistry, TargetKind, Transition,
};
pub use simulated::SimulatedViewport;
