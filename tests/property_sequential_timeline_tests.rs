use proptest::prelude::*;
use scrollstage::api::{ProcessStep, SequentialTimeline, SequentialTimelineConfig, StepPhase};
use scrollstage::core::{step_windows, window_index_at};

fn timeline(count: usize) -> SequentialTimeline {
    let steps = (0..count)
        .map(|index| ProcessStep::new(format!("step {index}")))
        .collect();
    SequentialTimeline::new(steps, SequentialTimelineConfig::default()).expect("timeline")
}

proptest! {
    #[test]
    fn windows_cover_unit_interval_without_gaps(count in 1usize..40) {
        let windows = step_windows(count);
        prop_assert_eq!(windows.len(), count);
        prop_assert_eq!(windows[0].start, 0.0);
        prop_assert_eq!(windows[count - 1].end, 1.0);
        for pair in windows.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
            prop_assert!(pair[0].start < pair[0].end);
        }
    }

    #[test]
    fn every_progress_below_one_has_exactly_one_window(
        count in 1usize..40,
        progress in 0.0f64..1.0
    ) {
        let windows = step_windows(count);
        let containing: Vec<usize> = windows
            .iter()
            .enumerate()
            .filter(|(_, window)| window.contains(progress))
            .map(|(index, _)| index)
            .collect();
        prop_assert_eq!(containing.len(), 1);
        prop_assert_eq!(window_index_at(count, progress), Some(containing[0]));
    }

    #[test]
    fn frames_are_a_pure_function_of_progress(
        count in 1usize..12,
        progress in 0.0f64..=1.0,
        detour in 0.0f64..=1.0
    ) {
        let timeline = timeline(count);
        let first = timeline.frame_at(progress);
        let _ = timeline.frame_at(detour);
        prop_assert_eq!(first, timeline.frame_at(progress));
    }

    #[test]
    fn at_most_one_step_is_fully_shown(count in 1usize..12, progress in 0.0f64..=1.0) {
        let frame = timeline(count).frame_at(progress);
        let shown = frame
            .steps
            .iter()
            .filter(|step| step.phase == StepPhase::Shown)
            .count();
        prop_assert!(shown <= 1);
        if let Some(active) = frame.active_step {
            prop_assert!(frame.steps[active].marker_active);
            prop_assert!(frame.steps[active].phase != StepPhase::Pending);
            prop_assert!(frame.steps[active].phase != StepPhase::Cleared);
        }
        for step in &frame.steps {
            prop_assert!((0.0..=1.0).contains(&step.visual.opacity));
        }
    }
}
