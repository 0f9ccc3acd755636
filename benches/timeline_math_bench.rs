use criterion::{Criterion, criterion_group, criterion_main};
use scrollstage::api::{
    EngineConfig, ProcessStep, RevealParams, SequentialTimeline, SequentialTimelineConfig,
    ViewScope,
};
use scrollstage::core::{Bounds, ChronicleRecord, ElementId, Viewport, aggregate};
use scrollstage::interaction::{
    ObserveOptions, ObservedTarget, ObserverRegistry, SimulatedViewport, TargetKind,
};
use scrollstage::render::NullStyleSink;
use std::hint::black_box;

fn bench_sequential_frame_scrub_12_steps(c: &mut Criterion) {
    let steps = (0..12)
        .map(|i| ProcessStep::new(format!("step {i}")))
        .collect();
    let mut timeline =
        SequentialTimeline::new(steps, SequentialTimelineConfig::default()).expect("timeline");
    timeline
        .layout(Bounds::new(2_000.0, 900.0), Viewport::new(1920.0, 1080.0))
        .expect("layout");

    c.bench_function("sequential_frame_scrub_12_steps", |b| {
        b.iter(|| {
            for i in 0..100 {
                let scroll = 1_500.0 + f64::from(i) * 45.0;
                let _ = timeline.frame_at_scroll(black_box(scroll));
            }
        })
    });
}

fn bench_aggregate_2k_records(c: &mut Criterion) {
    let clients: Vec<ChronicleRecord> = (0..1_000)
        .map(|i| ChronicleRecord::new(format!("client-{i}"), Some(1990 + i % 35)))
        .collect();
    let partners: Vec<ChronicleRecord> = (0..1_000)
        .map(|i| {
            let year = (i % 7 != 0).then_some(1990 + i % 35);
            ChronicleRecord::new(format!("partner-{i}"), year)
        })
        .collect();

    c.bench_function("aggregate_2k_records", |b| {
        b.iter(|| {
            let groups = aggregate(black_box(clients.clone()), black_box(partners.clone()));
            black_box(groups.len());
        })
    });
}

fn bench_reveal_dispatch_500_targets(c: &mut Criterion) {
    let targets: Vec<ElementId> = (1..=500).map(ElementId).collect();
    let mut host = SimulatedViewport::new(Viewport::new(1280.0, 800.0), 60_000.0);
    for (index, element) in targets.iter().enumerate() {
        host.insert_element(*element, Bounds::new(index as f64 * 110.0, 100.0));
    }

    c.bench_function("reveal_dispatch_500_targets", |b| {
        b.iter(|| {
            let mut scope =
                ViewScope::attach(host.clone(), NullStyleSink::default(), &EngineConfig::default())
                    .expect("scope");
            scope
                .register_reveal_group(&targets, TargetKind::Item, RevealParams::default())
                .expect("group");
            for step in 0..50 {
                scope.host_mut().scroll_to(f64::from(step) * 1_100.0);
                let _ = scope.poll();
                scope.tick(1.0 / 60.0);
            }
            black_box(scope.detach());
        })
    });
}

fn bench_observer_registry_churn_1k(c: &mut Criterion) {
    c.bench_function("observer_registry_churn_1k", |b| {
        b.iter(|| {
            let mut host = SimulatedViewport::new(Viewport::new(1280.0, 800.0), 10_000.0);
            let mut registry = ObserverRegistry::new();
            for i in 0..1_000 {
                let _ = registry.observe(
                    &mut host,
                    ObservedTarget::new(ElementId(i), TargetKind::Section),
                    ObserveOptions::repeating(),
                );
            }
            black_box(registry.unobserve_all(&mut host));
        })
    });
}

criterion_group!(
    benches,
    bench_sequential_frame_scrub_12_steps,
    bench_aggregate_2k_records,
    bench_reveal_dispatch_500_targets,
    bench_observer_registry_churn_1k
);
criterion_main!(benches);
