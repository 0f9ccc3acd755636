use scrollstage::api::{EngineConfig, ViewScope};
use scrollstage::core::{
    COMPACT_BREAKPOINT_PX, DeviceMode, Viewport, select_mode, select_mode_with_breakpoint,
};
use scrollstage::interaction::SimulatedViewport;
use scrollstage::render::NullStyleSink;

#[test]
fn narrow_viewport_selects_compact() {
    assert_eq!(select_mode(500.0), DeviceMode::Compact);
    assert_eq!(select_mode(1024.0), DeviceMode::Full);
}

#[test]
fn breakpoint_itself_is_full() {
    assert_eq!(select_mode(COMPACT_BREAKPOINT_PX), DeviceMode::Full);
    assert_eq!(select_mode(COMPACT_BREAKPOINT_PX - 0.5), DeviceMode::Compact);
}

#[test]
fn unmeasured_width_falls_back_to_full() {
    assert_eq!(select_mode(f64::NAN), DeviceMode::Full);
    assert_eq!(select_mode(f64::INFINITY), DeviceMode::Full);
}

#[test]
fn custom_breakpoint_is_respected() {
    assert_eq!(select_mode_with_breakpoint(900.0, 1000.0), DeviceMode::Compact);
    assert!(select_mode_with_breakpoint(900.0, 1000.0).is_compact());
    assert!(!DeviceMode::Full.is_compact());
}

#[test]
fn scope_reads_the_mode_once_at_attach() {
    let host = SimulatedViewport::new(Viewport::new(500.0, 900.0), 3000.0);
    let mut scope =
        ViewScope::attach(host, NullStyleSink::default(), &EngineConfig::default()).expect("scope");
    assert_eq!(scope.mode(), DeviceMode::Compact);
    assert_eq!(scope.reveal().mode(), DeviceMode::Compact);

    scope.host_mut().set_viewport(Viewport::new(1440.0, 900.0));
    assert_eq!(scope.mode(), DeviceMode::Compact);
}

#[test]
fn engine_breakpoint_feeds_mode_selection() {
    let host = SimulatedViewport::new(Viewport::new(900.0, 900.0), 3000.0);
    let config = EngineConfig::default().with_compact_breakpoint_px(1000.0);
    let scope = ViewScope::attach(host, NullStyleSink::default(), &config).expect("scope");
    assert_eq!(scope.mode(), DeviceMode::Compact);
}
