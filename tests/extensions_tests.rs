use std::cell::RefCell;
use std::rc::Rc;

use scrollstage::api::{EngineConfig, TimerTrigger, ViewScope};
use scrollstage::core::{Bounds, ElementId, Viewport};
use scrollstage::extensions::{
    AutoPlayCarousel, CountUp, CountUpConfig, DEFAULT_AUTO_PLAY_INTERVAL_SECS, ViewContext,
    ViewEvent, ViewListener, ViewTimer,
};
use scrollstage::interaction::{
    AutoScrollOutcome, AutoScrollStatus, ObserveOptions, ScrollTarget, SimulatedViewport,
};
use scrollstage::render::NullStyleSink;

type Scope = ViewScope<SimulatedViewport, NullStyleSink>;
type Log = Rc<RefCell<Vec<(ViewEvent, ViewContext)>>>;

const STATS: ElementId = ElementId(50);

fn scope() -> Scope {
    let host = SimulatedViewport::new(Viewport::new(1280.0, 800.0), 4000.0)
        .with_element(STATS, Bounds::new(1500.0, 200.0));
    ViewScope::attach(host, NullStyleSink::default(), &EngineConfig::default()).expect("scope")
}

struct Recorder {
    id: String,
    log: Log,
}

impl ViewListener for Recorder {
    fn id(&self) -> &str {
        &self.id
    }

    fn on_event(&mut self, event: &ViewEvent, context: ViewContext) {
        self.log.borrow_mut().push((event.clone(), context));
    }
}

fn record(scope: &mut Scope) -> Log {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    scope
        .register_listener(Box::new(Recorder {
            id: "recorder".to_owned(),
            log: Rc::clone(&log),
        }))
        .expect("listener");
    log
}

fn events(log: &Log) -> Vec<ViewEvent> {
    log.borrow().iter().map(|(event, _)| event.clone()).collect()
}

fn stats_counter() -> Box<CountUp> {
    Box::new(CountUp::new("stats", vec![150, 12], CountUpConfig::default()).expect("counter"))
}

#[test]
fn listener_ids_must_be_unique_and_non_empty() {
    let mut scope = scope();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let listener = |id: &str| {
        Box::new(Recorder {
            id: id.to_owned(),
            log: Rc::clone(&log),
        })
    };

    assert!(scope.register_listener(listener("")).is_err());
    scope.register_listener(listener("a")).expect("first");
    assert!(scope.register_listener(listener("a")).is_err());
    scope.register_listener(listener("b")).expect("second");
    assert_eq!(scope.listener_count(), 2);

    assert!(scope.unregister_listener("a"));
    assert!(!scope.unregister_listener("a"));
    assert_eq!(scope.listener_count(), 1);
}

#[test]
fn count_up_starts_when_its_element_enters() {
    let mut scope = scope();
    let log = record(&mut scope);
    let id = scope.add_timer(
        stats_counter(),
        TimerTrigger::OnEnter {
            element: STATS,
            options: ObserveOptions::once(),
        },
    );
    assert_eq!(scope.registry().len(), 1);

    scope.poll();
    scope.tick(1.0);
    assert!(events(&log).is_empty());
    assert!(!scope.timer::<CountUp>(id).expect("counter").is_running());

    scope.host_mut().scroll_to(1000.0);
    scope.poll();
    assert!(scope.registry().is_empty());
    assert_eq!(scope.active_timer_count(), 1);

    scope.tick(1.0);
    let Some(ViewEvent::CounterUpdated { values }) = events(&log).pop() else {
        panic!("expected a counter update");
    };
    assert!(values[0] > 0 && values[0] < 150);

    scope.tick(2.0);
    assert_eq!(
        events(&log).pop(),
        Some(ViewEvent::CounterUpdated {
            values: vec![150, 12]
        })
    );
    assert!(scope.timer::<CountUp>(id).expect("counter").is_finished());
    assert!(scope.timer::<AutoPlayCarousel>(id).is_none());
    assert_eq!(scope.active_timer_count(), 0);
}

#[test]
fn carousel_advances_on_its_interval() {
    let mut scope = scope();
    let log = record(&mut scope);
    let carousel = AutoPlayCarousel::new("quotes", 3, DEFAULT_AUTO_PLAY_INTERVAL_SECS)
        .expect("carousel");
    let id = scope.add_timer(Box::new(carousel), TimerTrigger::Immediate);

    scope.tick(4.0);
    assert!(events(&log).is_empty());
    scope.tick(1.0);
    assert_eq!(events(&log), vec![ViewEvent::CarouselAdvanced { index: 1 }]);

    let carousel = scope.timer_mut::<AutoPlayCarousel>(id).expect("carousel");
    assert!(carousel.go_to(0));
    scope.tick(4.5);
    assert_eq!(events(&log).len(), 1);
    assert_eq!(
        scope.timer::<AutoPlayCarousel>(id).expect("carousel").current(),
        0
    );
}

#[test]
fn removing_a_timer_releases_its_trigger() {
    let mut scope = scope();
    let id = scope.add_timer(
        stats_counter(),
        TimerTrigger::OnEnter {
            element: STATS,
            options: ObserveOptions::once(),
        },
    );
    assert!(scope.host().is_observing_element(STATS));

    assert!(scope.remove_timer(id));
    assert!(!scope.remove_timer(id));
    assert!(scope.registry().is_empty());
    assert_eq!(scope.host().observation_count(), 0);
    assert!(scope.timer::<CountUp>(id).is_none());
}

#[test]
fn auto_scroll_lifecycle_is_broadcast() {
    let mut scope = scope();
    let log = record(&mut scope);

    assert!(scope.start_auto_scroll(ScrollTarget::End));
    scope.tick(0.3);
    assert_eq!(scope.active_timer_count(), 0);
    assert_eq!(scope.active_task_count(), 1);
    assert!(scope.cancel_auto_scroll());

    assert_eq!(
        events(&log),
        vec![
            ViewEvent::AutoScrollStarted { target: 3200.0 },
            ViewEvent::AutoScrollFinished {
                outcome: AutoScrollOutcome::Cancelled
            },
        ]
    );
    let context = log.borrow()[1].1;
    assert_eq!(context.scroll_position, 10.0);
    assert_eq!(context.active_timers, 0);
    assert_eq!(context.active_tasks, 0);
    assert_eq!(log.borrow()[0].1.active_tasks, 1);
}

#[test]
fn detach_stops_timers_and_reports_what_it_released() {
    let mut scope = scope();
    let log = record(&mut scope);
    scope.add_timer(
        stats_counter(),
        TimerTrigger::OnEnter {
            element: STATS,
            options: ObserveOptions::once(),
        },
    );
    let carousel =
        AutoPlayCarousel::new("quotes", 3, DEFAULT_AUTO_PLAY_INTERVAL_SECS).expect("carousel");
    scope.add_timer(Box::new(carousel), TimerTrigger::Immediate);
    assert!(scope.start_auto_scroll(ScrollTarget::End));

    let report = scope.detach();
    assert_eq!(report.released_observers, 1);
    assert_eq!(report.released_timers, 1);
    assert!(report.cancelled_scroll);
    assert_eq!(scope.host().observation_count(), 0);
    assert_eq!(
        events(&log).last(),
        Some(&ViewEvent::Detached {
            released_observers: 1,
            released_timers: 1
        })
    );

    let before = log.borrow().len();
    assert_eq!(scope.tick(10.0), AutoScrollStatus::Idle);
    assert_eq!(scope.detach(), Default::default());
    assert_eq!(log.borrow().len(), before);
    assert_eq!(scope.active_timer_count(), 0);
}
