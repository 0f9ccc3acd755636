//! scrollstage: headless scroll-synchronized reveal and pinned timeline engine.
//!
//! The crate keeps scroll math, viewport observation and timing logic apart
//! from any rendering toolkit. Hosts implement the traits in [`interaction`]
//! and consume [`render::StyleFrame`]s; the browser adapter behind the
//! `web-adapter` feature is one such host.

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod interaction;
pub mod render;
pub mod telemetry;

#[cfg(feature = "web-adapter")]
pub mod platform_web;

pub use api::{
    ChronologyConfig, ChronologyView, EngineConfig, ProcessView, RevealController,
    SequentialTimeline, ViewScope,
};
pub use error::{RevealError, RevealResult};
