use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lottie_core::backend::LayerProperty;
use lottie_core::{
    CompatibilityMode, CompatibilityTracker, Keyframe, KeyframeGroup, LayerAnimationContext, LayerNode,
    NodeKind, TimingConfiguration, ValueProviderStore,
};

const COUNT: usize = 10_000;

fn track() -> KeyframeGroup<f32> {
    let keyframes = (0..COUNT)
        .map(|i| {
            if i % 7 == 0 {
                Keyframe::hold(i as f32, i as f32)
            } else {
                Keyframe::new(i as f32, i as f32)
            }
        })
        .collect();
    KeyframeGroup::new(keyframes)
}

fn bench_value_at(c: &mut Criterion) {
    let track = track();
    let mut group = c.benchmark_group("KeyframeGroup::value_at");
    for frame in [100.5_f32, 5000.5, 9990.5] {
        group.bench_with_input(BenchmarkId::new("frame", frame), &frame, |b, &frame| {
            b.iter(|| track.value_at(frame))
        });
    }
    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    let track = track();
    let context = LayerAnimationContext::new(
        0.0,
        COUNT as f32,
        30.0,
        TimingConfiguration::default(),
        Arc::new(ValueProviderStore::default()),
    );
    c.bench_function("LayerNode::add_animation/segmented", |b| {
        b.iter(|| {
            let mut node = LayerNode::new("bench", NodeKind::Container);
            let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
            node.add_animation(&LayerProperty::opacity(), &track, |v| v / 100.0, &context, &mut tracker)
        })
    });
}

criterion_group!(benches, bench_value_at, bench_emit);
criterion_main!(benches);
