use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use scrollstage::api::{
    ACTIVE_MARKER_FLAG, EngineConfig, ProcessLayout, ProcessStep, ProcessStrategy, ProcessView,
    SequentialTimelineConfig, StepLayout, ViewScope,
};
use scrollstage::core::{Bounds, ElementId, Viewport, VisualState};
use scrollstage::extensions::{ViewContext, ViewEvent, ViewListener};
use scrollstage::interaction::SimulatedViewport;
use scrollstage::render::MemoryStyleSink;

type View = ProcessView<SimulatedViewport, MemoryStyleSink>;

const SECTION: ElementId = ElementId(1);
const BAR: ElementId = ElementId(2);
const STEPS: u64 = 5;

fn content(index: u64) -> ElementId {
    ElementId(10 + index)
}

fn marker(index: u64) -> ElementId {
    ElementId(20 + index)
}

fn steps() -> Vec<ProcessStep> {
    ["Discover", "Plan", "Design", "Build", "Launch"]
        .into_iter()
        .map(ProcessStep::new)
        .collect()
}

fn layout() -> ProcessLayout {
    ProcessLayout {
        section: SECTION,
        progress_bar: Some(BAR),
        steps: (0..STEPS)
            .map(|index| StepLayout {
                content: content(index),
                marker: marker(index),
            })
            .collect(),
    }
}

fn host(width: f64) -> SimulatedViewport {
    let mut host = SimulatedViewport::new(Viewport::new(width, 800.0), 10_000.0)
        .with_element(SECTION, Bounds::new(3000.0, 600.0));
    for index in 0..STEPS {
        host.insert_element(
            content(index),
            Bounds::new(1000.0 + index as f64 * 300.0, 200.0),
        );
    }
    host
}

fn setup(host: SimulatedViewport) -> View {
    let scope = ViewScope::attach(host, MemoryStyleSink::default(), &EngineConfig::default())
        .expect("scope");
    View::setup(scope, steps(), layout(), SequentialTimelineConfig::default()).expect("view")
}

struct StepRecorder {
    activated: Rc<RefCell<Vec<usize>>>,
}

impl ViewListener for StepRecorder {
    fn id(&self) -> &str {
        "steps"
    }

    fn on_event(&mut self, event: &ViewEvent, _context: ViewContext) {
        if let ViewEvent::StepActivated { index } = event {
            self.activated.borrow_mut().push(*index);
        }
    }
}

#[test]
fn full_mode_pins_and_renders_the_first_frame() {
    let view = setup(host(1280.0));
    assert!(matches!(view.strategy(), ProcessStrategy::Pinned(_)));

    let pin = view
        .timeline()
        .and_then(|timeline| timeline.pin())
        .expect("pinned");
    assert_relative_eq!(pin.start, 2900.0);
    assert_relative_eq!(pin.end, 6900.0);

    let sink = view.scope().sink();
    assert_eq!(view.active_step(), Some(0));
    assert_eq!(sink.fill_of(BAR), Some(0.0));
    assert!(sink.flag_of(marker(0), ACTIVE_MARKER_FLAG));
    assert!(!sink.flag_of(marker(1), ACTIVE_MARKER_FLAG));
    assert!(view.scope().registry().is_empty());
}

#[test]
fn scrolling_scrubs_steps_markers_and_fill() {
    let mut view = setup(host(1280.0));
    let activated = Rc::new(RefCell::new(Vec::new()));
    view.scope_mut()
        .register_listener(Box::new(StepRecorder {
            activated: Rc::clone(&activated),
        }))
        .expect("listener");

    view.scope_mut().host_mut().scroll_to(4940.0);
    let frame = view.handle_scroll().expect("frame");
    assert_eq!(frame.active_step, Some(2));

    let sink = view.scope().sink();
    assert_relative_eq!(sink.fill_of(BAR).expect("fill"), 0.51, epsilon = 1e-9);
    assert_eq!(sink.state_of(content(2)), Some(VisualState::NATURAL));
    let flags: Vec<bool> = (0..STEPS)
        .map(|index| sink.flag_of(marker(index), ACTIVE_MARKER_FLAG))
        .collect();
    assert_eq!(flags, vec![true, true, true, false, false]);
    assert_eq!(*activated.borrow(), vec![2]);

    // Same scroll offset again: no duplicate activation.
    view.handle_scroll();
    assert_eq!(*activated.borrow(), vec![2]);
}

#[test]
fn end_of_pin_clears_every_step() {
    let mut view = setup(host(1280.0));
    view.scope_mut().host_mut().scroll_to(6900.0);
    let frame = view.handle_scroll().expect("frame");
    let cleared = view.timeline().expect("pinned").config().cleared;

    assert_eq!(frame.active_step, None);
    assert_eq!(view.active_step(), None);
    let sink = view.scope().sink();
    assert_eq!(sink.fill_of(BAR), Some(1.0));
    assert_eq!(sink.state_of(content(4)), Some(cleared));
    assert!(sink.flag_of(marker(4), ACTIVE_MARKER_FLAG));
    assert_eq!(view.last_frame(), Some(&frame));
}

#[test]
fn scrubbing_backward_restores_the_earlier_step() {
    let mut view = setup(host(1280.0));
    view.scope_mut().host_mut().scroll_to(6000.0);
    view.handle_scroll();
    view.scope_mut().host_mut().scroll_to(4940.0);
    view.handle_scroll();

    assert_eq!(view.active_step(), Some(2));
    assert!(!view.scope().sink().flag_of(marker(3), ACTIVE_MARKER_FLAG));
}

#[test]
fn compact_mode_reveals_steps_on_entry() {
    let mut view = setup(host(500.0));
    assert!(matches!(view.strategy(), ProcessStrategy::Staggered(_)));
    assert!(view.timeline().is_none());
    assert_eq!(view.scope().registry().len(), STEPS as usize);
    assert_eq!(
        view.scope().sink().state_of(content(0)).map(|s| s.opacity),
        Some(0.0)
    );
    assert_eq!(view.handle_scroll(), None);

    assert!(view.poll().is_empty());
    view.scope_mut().host_mut().scroll_to(400.0);
    assert_eq!(view.poll(), vec![content(0)]);

    view.tick(1.0);
    assert_eq!(
        view.scope().sink().state_of(content(0)),
        Some(VisualState::NATURAL)
    );
    assert_eq!(view.scope().sink().fill_of(BAR), None);
}

#[test]
fn unmeasured_section_waits_for_relayout() {
    let mut host = host(1280.0);
    host.remove_element(SECTION);
    let mut view = setup(host);
    assert_eq!(view.handle_scroll(), None);
    assert_eq!(view.active_step(), None);

    view.scope_mut()
        .host_mut()
        .insert_element(SECTION, Bounds::new(3000.0, 600.0));
    assert!(view.relayout().is_some());
    assert!(view.handle_scroll().is_some());
    assert_eq!(view.active_step(), Some(0));
}

#[test]
fn layout_must_match_the_steps() {
    let scope = ViewScope::attach(
        host(1280.0),
        MemoryStyleSink::default(),
        &EngineConfig::default(),
    )
    .expect("scope");
    let mut short = layout();
    short.steps.pop();
    assert!(View::setup(scope, steps(), short, SequentialTimelineConfig::default()).is_err());
}

#[test]
fn detached_view_stops_rendering() {
    let mut view = setup(host(1280.0));
    let before = view.scope().sink().frames_applied();
    view.detach();
    view.scope_mut().host_mut().scroll_to(4940.0);
    assert_eq!(view.handle_scroll(), None);
    assert_eq!(view.scope().sink().frames_applied(), before);
}
