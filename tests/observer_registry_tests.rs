use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use scrollstage::core::{Bounds, ElementId, RootMargin, TriggerStart, Viewport};
use scrollstage::interaction::{
    IntersectionHost, ObserveOptions, ObservedTarget, ObserverRegistry, SimulatedViewport,
    TargetKind, Transition, intersection_ratio,
};

const CARD: ElementId = ElementId(7);

fn host() -> SimulatedViewport {
    SimulatedViewport::new(Viewport::new(1280.0, 800.0), 5000.0)
        .with_element(CARD, Bounds::new(1500.0, 100.0))
}

fn reveal_options() -> ObserveOptions {
    ObserveOptions::from_trigger(TriggerStart::top_at_percent(90.0)).expect("options")
}

#[test]
fn once_observation_fires_a_single_enter_and_releases_itself() {
    let mut host = host();
    let mut registry = ObserverRegistry::new();
    let handle = registry
        .observe(
            &mut host,
            ObservedTarget::new(CARD, TargetKind::Item),
            reveal_options(),
        )
        .expect("root attached");
    assert!(registry.is_observing(handle));

    let entries = host.take_entries();
    assert!(registry.dispatch(&mut host, &entries).is_empty());

    host.scroll_to(800.0);
    let entries = host.take_entries();
    let events = registry.dispatch(&mut host, &entries);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].transition, Transition::Enter);
    assert_eq!(events[0].kind, TargetKind::Item);
    assert!(registry.is_empty());
    assert_eq!(host.observation_count(), 0);

    host.scroll_to(0.0);
    host.scroll_to(900.0);
    let entries = host.take_entries();
    assert!(registry.dispatch(&mut host, &entries).is_empty());
}

#[test]
fn repeating_observation_reports_enter_and_leave() {
    let mut host = host();
    let mut registry = ObserverRegistry::new();
    registry
        .observe(
            &mut host,
            ObservedTarget::new(CARD, TargetKind::Section),
            reveal_options().with_once(false),
        )
        .expect("root attached");

    let mut transitions = Vec::new();
    for scroll in [0.0, 900.0, 2000.0, 900.0] {
        host.scroll_to(scroll);
        let entries = host.take_entries();
        transitions.extend(
            registry
                .dispatch(&mut host, &entries)
                .into_iter()
                .map(|event| event.transition),
        );
    }

    assert_eq!(
        transitions,
        vec![Transition::Enter, Transition::Leave, Transition::Enter]
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn unobserve_all_is_idempotent_and_leaves_nothing_behind() {
    let mut host = host()
        .with_element(ElementId(8), Bounds::new(2000.0, 50.0))
        .with_element(ElementId(9), Bounds::new(2500.0, 50.0));
    let mut registry = ObserverRegistry::new();
    for id in [7, 8, 9] {
        registry
            .observe(
                &mut host,
                ObservedTarget::new(ElementId(id), TargetKind::Item),
                ObserveOptions::repeating(),
            )
            .expect("root attached");
    }
    assert_eq!(host.observation_count(), 3);

    assert_eq!(registry.unobserve_all(&mut host), 3);
    assert_eq!(host.observation_count(), 0);
    assert_eq!(registry.unobserve_all(&mut host), 0);
    assert!(registry.is_empty());
}

#[test]
fn detached_root_makes_observe_a_silent_no_op() {
    let mut host = host();
    host.set_attached(false);
    let mut registry = ObserverRegistry::new();

    let handle = registry.observe(
        &mut host,
        ObservedTarget::new(CARD, TargetKind::Item),
        reveal_options(),
    );

    assert!(handle.is_none());
    assert!(registry.is_empty());
    assert_eq!(host.observation_count(), 0);
}

#[test]
fn enter_callback_runs_with_the_event() {
    let mut host = host();
    let mut registry = ObserverRegistry::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    registry
        .observe(
            &mut host,
            ObservedTarget::new(CARD, TargetKind::Item)
                .with_on_enter(move |event| sink.borrow_mut().push(event.element)),
            reveal_options(),
        )
        .expect("root attached");

    host.scroll_to(1000.0);
    let entries = host.take_entries();
    registry.dispatch(&mut host, &entries);

    assert_eq!(*seen.borrow(), vec![CARD]);
}

#[test]
fn entries_for_released_handles_are_dropped() {
    let mut host = host();
    let mut registry = ObserverRegistry::new();
    let handle = registry
        .observe(
            &mut host,
            ObservedTarget::new(CARD, TargetKind::Item),
            ObserveOptions::repeating(),
        )
        .expect("root attached");

    host.scroll_to(1000.0);
    let entries = host.take_entries();
    assert!(registry.unobserve(&mut host, handle));
    assert!(!registry.unobserve(&mut host, handle));
    assert!(registry.dispatch(&mut host, &entries).is_empty());
}

#[test]
fn out_of_range_threshold_is_clamped_not_rejected() {
    let mut host = host();
    let mut registry = ObserverRegistry::new();
    let handle = registry.observe(
        &mut host,
        ObservedTarget::new(CARD, TargetKind::Item),
        ObserveOptions::once().with_threshold(4.0),
    );
    assert!(handle.is_some());

    host.scroll_to(1000.0);
    let entries = host.take_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_intersecting);
    assert_relative_eq!(entries[0].ratio, 1.0);
}

#[test]
fn collapsed_root_counts_elements_crossing_the_center_line() {
    let viewport = Viewport::new(1280.0, 800.0);
    let margin = RootMargin::parse("-50% 0px -50% 0px").expect("margin");
    let group = Bounds::new(1000.0, 300.0);

    assert_eq!(intersection_ratio(group, viewport, 0.0, margin), None);
    assert_eq!(intersection_ratio(group, viewport, 700.0, margin), Some(1.0));
    assert_eq!(intersection_ratio(group, viewport, 1000.0, margin), None);
}

#[test]
fn partial_overlap_reports_visible_fraction() {
    let viewport = Viewport::new(1280.0, 800.0);
    let ratio = intersection_ratio(Bounds::new(750.0, 100.0), viewport, 0.0, RootMargin::ZERO)
        .expect("intersects");
    assert_relative_eq!(ratio, 0.5);
}
