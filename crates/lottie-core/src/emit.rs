//! Turns keyframe tracks into backend timed animations.

use glam::{Vec2, Vec3};
use kurbo::BezPath;
use tracing::{debug, trace};

use crate::animatable::Interpolatable;
use crate::backend::{
    AnimationBody, BackendValue, CalculationMode, KeyframeAnimation, LayerProperty, PropertyValue,
    SequencedAnimation, TimedAnimation, TimingCurve,
};
use crate::bezier::point;
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::keyframes::{AnimationFrameTime, Keyframe, KeyframeGroup, KeyframeSegment, SegmentMode};
use crate::node::LayerNode;

/// The untyped half of a `LayerProperty`.
struct EmitTarget<'a> {
    key_path: &'a str,
    default_value: Option<PropertyValue>,
    motion_path: bool,
}

impl LayerNode {
    /// Adds the animation for `property` described by `keyframes`, mapping
    /// each keyframe value to the backend representation with `value`.
    ///
    /// Static values are written directly to the node when possible. A
    /// value provider registered for a customizable property replaces the
    /// document keyframes.
    pub fn add_animation<T, V>(
        &mut self,
        property: &LayerProperty<V>,
        keyframes: &KeyframeGroup<T>,
        value: impl Fn(&T) -> V,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()>
    where
        T: Interpolatable,
        V: BackendValue,
    {
        let target = EmitTarget {
            key_path: property.key_path,
            default_value: property.default_value.clone().map(V::into_property_value),
            motion_path: property.motion_path,
        };

        if let Some(name) = property.customizable {
            let keypath = context.current_keypath.appending(name.as_str());
            if let Some(custom) = context.value_providers.custom_keyframes(&keypath) {
                if !custom.is_empty() && custom.all_values(|v| V::from_property_value(v).is_some()) {
                    debug!(keypath = %keypath, "using value provider");
                    let (custom, context) = resampled_for_context(&custom, context);
                    return self.emit(&target, custom, &context, false);
                }
                tracker.log_issue(
                    format!(
                        "The value provider for {} supplies values of the wrong type",
                        property.key_path
                    ),
                    keypath.to_string(),
                )?;
            }
        }

        if keyframes.is_empty() {
            return Ok(());
        }

        let (keyframes, context) = resampled_for_context(keyframes, context);
        let mapped = keyframes.map(|v| value(v).into_property_value());
        self.emit(&target, mapped, &context, true)
    }

    fn emit(
        &mut self,
        target: &EmitTarget<'_>,
        keyframes: KeyframeGroup<PropertyValue>,
        context: &LayerAnimationContext,
        allow_direct_write: bool,
    ) -> CompileResult<()> {
        let keyframes = clipped_to_play_range(keyframes, context);
        let body = match keyframes.keyframes() {
            [] => return Ok(()),
            [only] if allow_direct_write => {
                let value = only.value.clone();
                if target.default_value.as_ref() == Some(&value) {
                    return Ok(());
                }
                let current = self.value(target.key_path);
                let unchanged = current.is_none()
                    || current == target.default_value.as_ref()
                    || current == Some(&value);
                if unchanged {
                    trace!(key_path = target.key_path, "writing static value");
                    self.set_value(target.key_path, value);
                    return Ok(());
                }
                AnimationBody::Basic {
                    from: value.clone(),
                    to: value,
                }
            }
            [only] => AnimationBody::Keyframe(keyframe_animation(
                std::slice::from_ref(only),
                vec![context.progress_time(only.time).clamp(0.0, 1.0)],
                SegmentMode::Interpolated,
                target.motion_path,
            )),
            _ => match sequenced_body(target, &keyframes, context) {
                Some(body) => body,
                None => return Ok(()),
            },
        };

        trace!(key_path = target.key_path, keyframes = keyframes.len(), "emitting animation");
        self.add_timed_animation(TimedAnimation {
            key_path: target.key_path.to_string(),
            timing: context.animation_timing(),
            body,
        });
        Ok(())
    }
}

/// Samples the track at every global frame when the subtree's time
/// remapping cannot be inverted, returning a context for global frames.
fn resampled_for_context<T: Interpolatable>(
    keyframes: &KeyframeGroup<T>,
    context: &LayerAnimationContext,
) -> (KeyframeGroup<T>, LayerAnimationContext) {
    if !context.must_use_complex_time_remapping || !keyframes.is_animated() {
        return (keyframes.clone(), context.clone());
    }

    let remapping = &context.complex_time_remapping;
    let sampled = context
        .global_frames()
        .filter_map(|frame| {
            keyframes
                .value_at(remapping.resolve(frame))
                .map(|value| Keyframe::new(value, frame))
        })
        .collect();
    (KeyframeGroup::new(sampled), context.without_time_remapping())
}

/// Restricts an animated track to the local frames that play. A span
/// crossing either end of the play range is cut at the boundary with the
/// value it has there; keyframes wholly outside the range are dropped.
fn clipped_to_play_range(
    keyframes: KeyframeGroup<PropertyValue>,
    context: &LayerAnimationContext,
) -> KeyframeGroup<PropertyValue> {
    let Some((start, end)) = context.local_play_range() else {
        return keyframes;
    };
    let all = keyframes.keyframes();
    let (Some(first), Some(last)) = (all.first(), all.last()) else {
        return keyframes;
    };
    if !keyframes.is_animated() || (first.time >= start && last.time <= end) {
        return keyframes;
    }

    let inside: Vec<Keyframe<PropertyValue>> = all
        .iter()
        .filter(|kf| kf.time >= start && kf.time <= end)
        .cloned()
        .collect();
    let mut clipped = Vec::with_capacity(inside.len() + 2);
    if inside.first().map_or(true, |kf| kf.time > start) && first.time < start {
        clipped.extend(boundary_keyframe(&keyframes, start));
    }
    clipped.extend(inside);
    if clipped.last().map_or(true, |kf| kf.time < end) && last.time > end {
        clipped.extend(boundary_keyframe(&keyframes, end));
    }
    trace!(
        from = keyframes.len(),
        to = clipped.len(),
        "clipped keyframes to the play range"
    );
    KeyframeGroup::new(clipped)
}

/// A keyframe at `frame` continuing the span that contains it.
fn boundary_keyframe(
    keyframes: &KeyframeGroup<PropertyValue>,
    frame: AnimationFrameTime,
) -> Option<Keyframe<PropertyValue>> {
    let value = keyframes.value_at(frame)?;
    let holding = keyframes
        .keyframes()
        .iter()
        .rev()
        .find(|kf| kf.time <= frame)
        .map_or(false, |kf| kf.is_hold);
    Some(if holding {
        Keyframe::hold(value, frame)
    } else {
        Keyframe::new(value, frame)
    })
}

fn sequenced_body(
    target: &EmitTarget<'_>,
    keyframes: &KeyframeGroup<PropertyValue>,
    context: &LayerAnimationContext,
) -> Option<AnimationBody> {
    let segments = keyframes.segments_split_by_mode();
    if let [segment] = segments.as_slice() {
        let key_times = segment
            .keyframes
            .iter()
            .map(|kf| context.progress_time(kf.time))
            .collect();
        return Some(AnimationBody::Keyframe(keyframe_animation(
            &segment.keyframes,
            key_times,
            segment.mode,
            target.motion_path,
        )));
    }

    let last_index = segments.len().saturating_sub(1);
    let sequence: Vec<SequencedAnimation> = segments
        .iter()
        .enumerate()
        .filter_map(|(index, segment)| {
            sequenced_segment(target, segment, index == 0, index == last_index, context)
        })
        .collect();
    if sequence.is_empty() {
        debug!(key_path = target.key_path, "every segment is empty, nothing to emit");
        return None;
    }
    Some(AnimationBody::Sequence(sequence))
}

fn sequenced_segment(
    target: &EmitTarget<'_>,
    segment: &KeyframeSegment<PropertyValue>,
    is_first: bool,
    is_last: bool,
    context: &LayerAnimationContext,
) -> Option<SequencedAnimation> {
    let begin = if is_first {
        0.0
    } else {
        context.progress_time(segment.start_time())
    };
    let end = if is_last {
        1.0
    } else {
        context.progress_time(segment.end_time())
    };
    let duration = end - begin;
    if duration.is_nan() || duration <= 0.0 {
        trace!(key_path = target.key_path, "skipping empty segment");
        return None;
    }

    let key_times = segment
        .keyframes
        .iter()
        .map(|kf| ((context.progress_time(kf.time) - begin) / duration).clamp(0.0, 1.0))
        .collect();
    Some(SequencedAnimation {
        begin,
        duration,
        animation: keyframe_animation(&segment.keyframes, key_times, segment.mode, target.motion_path),
    })
}

/// Key times this close to `0.0` or `1.0` are snapped onto the boundary.
const KEY_TIME_TOLERANCE: f32 = 1e-5;

fn snapped(key_time: f32) -> f32 {
    if key_time.abs() < KEY_TIME_TOLERANCE {
        0.0
    } else if (key_time - 1.0).abs() < KEY_TIME_TOLERANCE {
        1.0
    } else {
        key_time
    }
}

/// Builds one backend keyframe animation, synthesizing `0.0` and `1.0`
/// key times by duplicating the nearest keyframe when they are missing.
fn keyframe_animation(
    keyframes: &[Keyframe<PropertyValue>],
    key_times: Vec<f32>,
    mode: SegmentMode,
    motion_path: bool,
) -> KeyframeAnimation {
    let mut entries: Vec<(f32, Keyframe<PropertyValue>)> = key_times
        .into_iter()
        .map(snapped)
        .zip(keyframes.iter().cloned())
        .collect();
    let mut timing_curves: Vec<TimingCurve> = entries
        .windows(2)
        .map(|pair| TimingCurve {
            c1: pair[0].1.out_tangent.unwrap_or(Vec2::ZERO),
            c2: pair[1].1.in_tangent.unwrap_or(Vec2::ONE),
        })
        .collect();

    if let Some((time, first)) = entries.first().cloned() {
        if time != 0.0 {
            entries.insert(0, (0.0, Keyframe::new(first.value, 0.0)));
            timing_curves.insert(0, TimingCurve::LINEAR);
        }
    }
    if let Some((time, last)) = entries.last().cloned() {
        if time != 1.0 {
            entries.push((1.0, Keyframe::new(last.value, 1.0)));
            timing_curves.push(TimingCurve::LINEAR);
        }
    }

    let key_times: Vec<f32> = entries.iter().map(|(time, _)| *time).collect();
    let calculation_mode = match mode {
        SegmentMode::Interpolated => CalculationMode::Linear,
        SegmentMode::Discrete => CalculationMode::Discrete,
    };

    let path = (motion_path && calculation_mode == CalculationMode::Linear)
        .then(|| motion_path_for(&entries))
        .flatten();

    let mut values: Vec<PropertyValue> = match path {
        Some(_) => Vec::new(),
        None => entries.into_iter().map(|(_, kf)| kf.value).collect(),
    };

    if calculation_mode == CalculationMode::Discrete {
        values.pop();
        timing_curves.clear();
    }

    KeyframeAnimation {
        values,
        path,
        key_times,
        timing_curves,
        calculation_mode,
    }
}

/// The path traced by point keyframes, curving where spatial tangents are
/// present.
fn motion_path_for(entries: &[(f32, Keyframe<PropertyValue>)]) -> Option<BezPath> {
    let points: Vec<Vec2> = entries
        .iter()
        .map(|(_, kf)| match kf.value {
            PropertyValue::Point(p) => Some(p),
            _ => None,
        })
        .collect::<Option<_>>()?;

    let mut path = BezPath::new();
    path.move_to(point(*points.first()?));
    for (index, pair) in entries.windows(2).enumerate() {
        let (from, to) = (&pair[0].1, &pair[1].1);
        let (start, end) = (points[index], points[index + 1]);
        let tangent = |t: Option<Vec3>| t.map(|t| t.truncate()).filter(|t| *t != Vec2::ZERO);
        match (tangent(from.spatial_out_tangent), tangent(to.spatial_in_tangent)) {
            (Some(out_tangent), Some(in_tangent)) => {
                path.curve_to(point(start + out_tangent), point(end + in_tangent), point(end))
            }
            _ => path.line_to(point(end)),
        }
    }
    path.close_path();
    Some(path)
}
