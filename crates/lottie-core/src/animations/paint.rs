use std::collections::BTreeMap;

use glam::Vec4;

use crate::backend::LayerProperty;
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::keyframes::{AnimationFrameTime, Keyframe, KeyframeGroup};
use crate::model::{DashElement, DashKind, Fill, GradientStroke, Stroke, Trim};
use crate::node::{LayerNode, LineCap, LineJoin, NodeKind};

use super::paths::PathMultiplier;

/// The stroke settings shared by solid and gradient strokes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StrokeStyle<'a> {
    pub color: Option<&'a KeyframeGroup<Vec4>>,
    pub opacity: &'a KeyframeGroup<f32>,
    pub width: &'a KeyframeGroup<f32>,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    pub dash: &'a [DashElement],
}

impl<'a> From<&'a Stroke> for StrokeStyle<'a> {
    fn from(stroke: &'a Stroke) -> Self {
        StrokeStyle {
            color: Some(&stroke.color),
            opacity: &stroke.opacity,
            width: &stroke.width,
            line_cap: stroke.line_cap,
            line_join: stroke.line_join,
            miter_limit: stroke.miter_limit,
            dash: &stroke.dash,
        }
    }
}

impl<'a> From<&'a GradientStroke> for StrokeStyle<'a> {
    fn from(stroke: &'a GradientStroke) -> Self {
        StrokeStyle {
            color: None,
            opacity: &stroke.opacity,
            width: &stroke.width,
            line_cap: stroke.line_cap,
            line_join: stroke.line_join,
            miter_limit: stroke.miter_limit,
            dash: &stroke.dash,
        }
    }
}

impl LayerNode {
    pub(crate) fn add_fill_animations(
        &mut self,
        fill: &Fill,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        if let NodeKind::Shape(attributes) = &mut self.kind {
            attributes.fill_rule = fill.fill_rule;
        }
        self.add_animation(&LayerProperty::fill_color(), &fill.color, |c| *c, context, tracker)?;
        self.add_opacity_animation(&fill.opacity, context, tracker)
    }

    pub(crate) fn add_stroke_animations(
        &mut self,
        stroke: StrokeStyle<'_>,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        let keypath = context.compatibility_context();
        let dash = match dash_configuration(stroke.dash) {
            Some((pattern, phase)) => {
                let mut values = Vec::with_capacity(pattern.len());
                for element in pattern {
                    values.push(element.exactly_one_keyframe(tracker, &keypath, "stroke dashPattern")?);
                }
                let no_dash = values.iter().all(|value| *value == 0.01);
                Some(((!no_dash).then_some(values), phase))
            }
            None => None,
        };

        if let NodeKind::Shape(attributes) = &mut self.kind {
            attributes.line_cap = stroke.line_cap;
            attributes.line_join = stroke.line_join;
            attributes.miter_limit = stroke.miter_limit;
            if let Some((pattern, _)) = &dash {
                attributes.dash_pattern = pattern.clone();
            }
        }

        if let Some(color) = stroke.color {
            self.add_animation(&LayerProperty::stroke_color(), color, |c| *c, context, tracker)?;
        }
        self.add_animation(&LayerProperty::line_width(), stroke.width, |w| *w, context, tracker)?;
        self.add_opacity_animation(stroke.opacity, context, tracker)?;

        if let Some((_, phase)) = dash {
            self.add_animation(&LayerProperty::line_dash_phase(), &phase, |p| *p, context, tracker)?;
        }
        Ok(())
    }

    /// Animates `strokeStart`/`strokeEnd` and returns how many times the
    /// path must be repeated to hold the trimmed range.
    pub(crate) fn add_trim_animations(
        &mut self,
        trim: &Trim,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<PathMultiplier> {
        let (start, end, multiplier) = trim_keyframes(trim, context, tracker)?;
        let scale = multiplier as f32 * 100.0;
        self.add_animation(&LayerProperty::stroke_start(), &start, |v| v / scale, context, tracker)?;
        self.add_animation(&LayerProperty::stroke_end(), &end, |v| v / scale, context, tracker)?;
        Ok(multiplier)
    }
}

/// Splits dash elements into the dash/gap pattern and the phase track.
fn dash_configuration(
    elements: &[DashElement],
) -> Option<(Vec<&KeyframeGroup<f32>>, KeyframeGroup<f32>)> {
    if elements.is_empty() {
        return None;
    }
    let pattern = elements
        .iter()
        .filter(|element| element.kind != DashKind::Offset)
        .map(|element| &element.value)
        .collect();
    let phase = elements
        .iter()
        .find(|element| element.kind == DashKind::Offset)
        .map(|element| element.value.clone())
        .unwrap_or_else(|| KeyframeGroup::from_value(0.0));
    Some((pattern, phase))
}

impl Trim {
    /// Whether the trim leaves the whole path visible.
    pub fn is_noop(&self) -> bool {
        let only = |group: &KeyframeGroup<f32>, value: f32| {
            !group.is_animated() && group.all_values(|v| *v == value)
        };
        only(&self.start, 0.0) && only(&self.end, 100.0) && only(&self.offset, 0.0)
    }

    fn start_always_at_or_past_end(&self) -> bool {
        let times = self
            .start
            .keyframes()
            .iter()
            .chain(self.end.keyframes())
            .map(|kf| kf.time);
        let mut compared = false;
        for time in times {
            if let (Some(start), Some(end)) = (self.start.value_at(time), self.end.value_at(time)) {
                if start < end {
                    return false;
                }
                compared = true;
            }
        }
        compared
    }
}

/// Start and end tracks in percent of the (repeated) path, plus the path
/// multiplier.
fn trim_keyframes(
    trim: &Trim,
    context: &LayerAnimationContext,
    tracker: &mut CompatibilityTracker,
) -> CompileResult<(KeyframeGroup<f32>, KeyframeGroup<f32>, PathMultiplier)> {
    let (start, end) = if trim.start_always_at_or_past_end() {
        (&trim.end, &trim.start)
    } else {
        (&trim.start, &trim.end)
    };

    if trim.offset.is_empty() || trim.offset.all_values(|offset| *offset == 0.0) {
        return Ok((start.clone(), end.clone(), 1));
    }

    let offset = trim.offset.manually_interpolated();
    let start = offset_adjusted(&start.manually_interpolated(), &offset);
    let end = offset_adjusted(&end.manually_interpolated(), &offset);

    let keypath = context.compatibility_context();
    let start = clamped_at_zero(start, tracker, &keypath)?;
    let end = clamped_at_zero(end, tracker, &keypath)?;

    let maximum = end
        .keyframes()
        .iter()
        .map(|kf| kf.value)
        .fold(None, |max: Option<f32>, v| Some(max.map_or(v, |m| m.max(v))))
        .unwrap_or(100.0);
    let multiplier = ((maximum / 100.0).ceil() as PathMultiplier).max(1);
    Ok((start, end, multiplier))
}

/// Folds the trim offset (degrees around the path) into a stroke track.
fn offset_adjusted(stroke: &KeyframeGroup<f32>, offset: &KeyframeGroup<f32>) -> KeyframeGroup<f32> {
    if stroke.is_empty() || offset.is_empty() {
        return stroke.clone();
    }

    let mut timeline: BTreeMap<OrderedTime, (Option<&Keyframe<f32>>, Option<&Keyframe<f32>>)> =
        BTreeMap::new();
    for keyframe in stroke.keyframes() {
        timeline.entry(OrderedTime(keyframe.time)).or_default().0 = Some(keyframe);
    }
    for keyframe in offset.keyframes() {
        timeline.entry(OrderedTime(keyframe.time)).or_default().1 = Some(keyframe);
    }

    let mut output = Vec::new();
    let mut last_stroke: Option<&Keyframe<f32>> = None;
    let mut last_offset: Option<&Keyframe<f32>> = None;
    for (OrderedTime(time), (stroke_kf, offset_kf)) in timeline {
        last_stroke = stroke_kf.or(last_stroke);
        last_offset = offset_kf.or(last_offset);
        let Some(current) = last_stroke else {
            continue;
        };
        let Some(current_offset) = last_offset else {
            if !(stroke.len() == 1 && current.is_hold) {
                output.push(current.clone());
            }
            continue;
        };
        let value = current.value + current_offset.value / 360.0 * 100.0;
        output.push(Keyframe {
            is_hold: current.is_hold,
            ..Keyframe::new(value, time)
        });
    }
    KeyframeGroup::new(output)
}

fn clamped_at_zero(
    track: KeyframeGroup<f32>,
    tracker: &mut CompatibilityTracker,
    keypath: &str,
) -> CompileResult<KeyframeGroup<f32>> {
    if track.all_values(|v| *v >= 0.0) {
        return Ok(track);
    }
    tracker.log_issue(
        "Trim offsets that move the start or end below 0% are not supported; clamping to 0%",
        keypath,
    )?;
    Ok(track.map(|v| v.max(0.0)))
}

/// Frame time with a total order, for use as a map key.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedTime(AnimationFrameTime);

impl Eq for OrderedTime {}

impl PartialOrd for OrderedTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::{PropertyValue, TimingConfiguration};
    use crate::compatibility::CompatibilityMode;
    use crate::model::TrimType;
    use crate::node::ShapeAttributes;
    use crate::value_providers::ValueProviderStore;

    fn context() -> LayerAnimationContext {
        LayerAnimationContext::new(
            0.0,
            30.0,
            30.0,
            TimingConfiguration::default(),
            Arc::new(ValueProviderStore::default()),
        )
    }

    fn trim(start: f32, end: f32, offset: f32) -> Trim {
        Trim {
            start: KeyframeGroup::from_value(start),
            end: KeyframeGroup::from_value(end),
            offset: KeyframeGroup::from_value(offset),
            trim_type: TrimType::Simultaneously,
        }
    }

    fn shape_node() -> LayerNode {
        LayerNode::new("shape", NodeKind::Shape(ShapeAttributes::default()))
    }

    #[test]
    fn reversed_trim_swaps_start_and_end() {
        let mut node = shape_node();
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        let multiplier = node.add_trim_animations(&trim(80.0, 20.0, 0.0), &context(), &mut tracker).unwrap();
        assert_eq!(multiplier, 1);
        assert_eq!(node.value("strokeStart"), Some(&PropertyValue::Scalar(0.2)));
        assert_eq!(node.value("strokeEnd"), Some(&PropertyValue::Scalar(0.8)));
    }

    #[test]
    fn offset_past_the_end_repeats_the_path() {
        let mut node = shape_node();
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        // 180 degrees shifts both ends by half the path.
        let multiplier = node
            .add_trim_animations(&trim(25.0, 75.0, 180.0), &context(), &mut tracker)
            .unwrap();
        assert_eq!(multiplier, 2);
        assert_eq!(node.value("strokeStart"), Some(&PropertyValue::Scalar(0.375)));
        assert_eq!(node.value("strokeEnd"), Some(&PropertyValue::Scalar(0.625)));
        assert!(tracker.issues().is_empty());
    }

    #[test]
    fn negative_offsets_are_clamped() {
        let mut node = shape_node();
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        node.add_trim_animations(&trim(10.0, 50.0, -90.0), &context(), &mut tracker)
            .unwrap();
        assert_eq!(tracker.issues().len(), 1);
        assert!(node.value("strokeStart").is_none(), "clamped start is the default");
    }

    #[test]
    fn placeholder_dash_pattern_is_dropped() {
        let stroke = Stroke {
            color: KeyframeGroup::from_value(Vec4::ONE),
            opacity: KeyframeGroup::from_value(100.0),
            width: KeyframeGroup::from_value(2.0),
            line_cap: LineCap::Round,
            line_join: LineJoin::Bevel,
            miter_limit: 4.0,
            dash: vec![
                DashElement {
                    kind: DashKind::Dash,
                    value: KeyframeGroup::from_value(0.01),
                },
                DashElement {
                    kind: DashKind::Gap,
                    value: KeyframeGroup::from_value(0.01),
                },
                DashElement {
                    kind: DashKind::Offset,
                    value: KeyframeGroup::from_value(3.0),
                },
            ],
        };
        let mut node = shape_node();
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        node.add_stroke_animations((&stroke).into(), &context(), &mut tracker)
            .unwrap();
        let NodeKind::Shape(attributes) = &node.kind else {
            unreachable!()
        };
        assert_eq!(attributes.dash_pattern, None);
        assert_eq!(attributes.line_cap, LineCap::Round);
        assert_eq!(node.value("lineDashPhase"), Some(&PropertyValue::Scalar(3.0)));
        assert_eq!(node.value("lineWidth"), Some(&PropertyValue::Scalar(2.0)));
    }

    #[test]
    fn noop_trims_are_detected() {
        assert!(trim(0.0, 100.0, 0.0).is_noop());
        assert!(!trim(0.0, 50.0, 0.0).is_noop());
    }
}
