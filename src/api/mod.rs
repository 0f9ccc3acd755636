//! Controllers and views built on the core math and host traits.

mod chronology_view;
mod engine_config;
mod json_contract;
mod process_view;
mod record_source;
mod reveal_controller;
mod sequential_timeline;
mod view_scope;

pub use chronology_view::{
    ChronologyConfig, ChronologyLayout, ChronologyUpdate, ChronologyView, YearGroupLayout,
};
pub use engine_config::EngineConfig;
pub use json_contract::{ENGINE_CONFIG_JSON_SCHEMA_V1, EngineConfigJsonContractV1};
pub use process_view::{
    ACTIVE_MARKER_FLAG, ProcessLayout, ProcessStrategy, ProcessView, StepLayout,
};
pub use record_source::{RecordSource, StaticRecordSource, load_chronology};
pub use reveal_controller::{
    CompactBehavior, GroupTrigger, ReplayPolicy, RevealController, RevealGroupId, RevealOutcome,
    RevealParams,
};
pub use sequential_timeline::{
    ProcessStep, SequentialTimeline, SequentialTimelineConfig, StepFrame, StepPhase,
    TimelineFrame,
};
pub use view_scope::{DetachReport, DispatchOutcome, TimerId, TimerTrigger, ViewScope};
