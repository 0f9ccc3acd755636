use approx::assert_relative_eq;
use scrollstage::api::{ProcessStep, SequentialTimeline, SequentialTimelineConfig, StepPhase};
use scrollstage::core::{Bounds, Viewport, VisualState};

fn timeline(count: usize) -> SequentialTimeline {
    let steps = (0..count)
        .map(|index| {
            ProcessStep::new(format!("Step {index}")).with_description("what happens here")
        })
        .collect();
    SequentialTimeline::new(steps, SequentialTimelineConfig::default()).expect("timeline")
}

#[test]
fn five_step_windows_and_exit_span() {
    let timeline = timeline(5);
    let window = timeline.windows()[2];
    assert_relative_eq!(window.start, 0.4);
    assert_relative_eq!(window.end, 0.6);

    let (exit_start, exit_end) = timeline.exit_span(2).expect("step 2");
    assert_relative_eq!(exit_start, 0.52, epsilon = 1e-12);
    assert_relative_eq!(exit_end, 0.6);
    assert_eq!(timeline.exit_span(5), None);
}

#[test]
fn step_walks_through_every_phase_inside_its_window() {
    let timeline = timeline(5);
    let phases: Vec<StepPhase> = [0.3, 0.45, 0.51, 0.56, 0.7]
        .into_iter()
        .map(|progress| timeline.frame_at(progress).steps[2].phase)
        .collect();

    assert_eq!(
        phases,
        vec![
            StepPhase::Pending,
            StepPhase::Entering,
            StepPhase::Shown,
            StepPhase::Exiting,
            StepPhase::Cleared,
        ]
    );
}

#[test]
fn exit_interpolates_toward_the_cleared_state() {
    let timeline = timeline(5);
    let config = timeline.config();
    let frame = timeline.frame_at(0.56);
    let visual = frame.steps[2].visual;

    assert_relative_eq!(visual.opacity, 0.5, epsilon = 1e-9);
    assert_relative_eq!(visual.blur_px, config.cleared.blur_px / 2.0, epsilon = 1e-9);
    assert_relative_eq!(
        visual.translate_y,
        config.cleared.translate_y / 2.0,
        epsilon = 1e-9
    );
}

#[test]
fn entrance_starts_from_the_hidden_state() {
    let timeline = timeline(4);
    let frame = timeline.frame_at(0.0);

    assert_eq!(frame.active_step, Some(0));
    assert_eq!(frame.steps[0].phase, StepPhase::Entering);
    assert_eq!(frame.steps[0].visual, timeline.config().hidden);
    assert!(frame.steps[0].marker_active);
    assert!(!frame.steps[1].marker_active);
}

#[test]
fn markers_activate_at_window_start_and_stay_active() {
    let timeline = timeline(5);
    let frame = timeline.frame_at(0.65);
    let active: Vec<bool> = frame.steps.iter().map(|step| step.marker_active).collect();
    assert_eq!(active, vec![true, true, true, true, false]);
}

#[test]
fn full_progress_clears_every_step_including_the_last() {
    let timeline = timeline(5);
    let frame = timeline.frame_at(1.0);

    assert_eq!(frame.active_step, None);
    assert_relative_eq!(frame.progress_bar_fill, 1.0);
    assert!(
        frame
            .steps
            .iter()
            .all(|step| step.phase == StepPhase::Cleared && step.marker_active)
    );
    assert_eq!(frame.steps[4].visual, timeline.config().cleared);
}

#[test]
fn progress_bar_fill_is_linear() {
    let timeline = timeline(3);
    for progress in [0.0, 0.12, 0.5, 0.77, 0.99] {
        assert_relative_eq!(timeline.frame_at(progress).progress_bar_fill, progress);
    }
}

#[test]
fn out_of_range_progress_is_clamped() {
    let timeline = timeline(3);
    assert_relative_eq!(timeline.frame_at(1.7).progress, 1.0);
    assert_relative_eq!(timeline.frame_at(-0.3).progress, 0.0);
    assert_relative_eq!(timeline.frame_at(f64::NAN).progress, 0.0);
}

#[test]
fn scrubbing_backward_restores_earlier_frames() {
    let timeline = timeline(5);
    let forward = timeline.frame_at(0.33);
    let _ = timeline.frame_at(0.95);
    let back = timeline.frame_at(0.33);
    assert_eq!(forward, back);
}

#[test]
fn laid_out_timeline_maps_scroll_to_progress() {
    let mut timeline = timeline(5);
    let pin = timeline
        .layout(Bounds::new(3000.0, 600.0), Viewport::new(1280.0, 800.0))
        .expect("layout");

    assert_relative_eq!(pin.start, 2900.0);
    assert_relative_eq!(pin.end, 6900.0);
    assert_relative_eq!(timeline.progress_at(0.0), 0.0);
    assert_relative_eq!(timeline.progress_at(4900.0), 0.5);
    assert_relative_eq!(timeline.progress_at(10_000.0), 1.0);

    let frame = timeline.frame_at_scroll(4940.0);
    assert_eq!(frame.active_step, Some(2));
    assert_eq!(frame.steps[2].visual, VisualState::NATURAL);
}

#[test]
fn custom_scroll_distance_changes_the_pin_length() {
    let config = SequentialTimelineConfig::default().with_scroll_distance(1000.0);
    let mut timeline =
        SequentialTimeline::new(vec![ProcessStep::new("Only")], config).expect("timeline");
    let pin = timeline
        .layout(Bounds::new(1000.0, 800.0), Viewport::new(1280.0, 800.0))
        .expect("layout");
    assert_relative_eq!(pin.distance(), 1000.0);
    assert_eq!(timeline.frame_at(0.99).active_step, Some(0));
}

#[test]
fn invalid_configs_are_rejected() {
    let steps = || vec![ProcessStep::new("a"), ProcessStep::new("b")];
    for config in [
        SequentialTimelineConfig::default().with_scroll_distance(0.0),
        SequentialTimelineConfig::default().with_scroll_distance(f64::INFINITY),
        SequentialTimelineConfig::default().with_fractions(0.0, 0.4),
        SequentialTimelineConfig::default().with_fractions(0.5, 1.5),
    ] {
        assert!(SequentialTimeline::new(steps(), config).is_err());
    }

    let mut timeline = timeline(2);
    assert!(
        timeline
            .layout(Bounds::new(0.0, 100.0), Viewport::new(0.0, 0.0))
            .is_err()
    );
    assert_eq!(timeline.pin(), None);
}

#[test]
fn steps_deserialize_with_optional_fields() {
    let steps: Vec<ProcessStep> = serde_json::from_str(
        r#"[{"title": "Discover", "icon": "search", "duration_label": "1 week"}, {"title": "Ship"}]"#,
    )
    .expect("steps");
    assert_eq!(steps[0].icon, "search");
    assert_eq!(steps[1].description, "");
    assert!(SequentialTimeline::new(steps, SequentialTimelineConfig::default()).is_ok());
}
