use glam::{Vec2, Vec4};

use crate::backend::LayerProperty;
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::keyframes::KeyframeGroup;
use crate::model::{GradientFill, GradientStroke};
use crate::node::{GradientChannel, GradientType, LayerNode};

/// The gradient settings shared by gradient fills and gradient strokes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GradientSource<'a> {
    pub gradient_type: GradientType,
    pub color_count: usize,
    pub colors: &'a KeyframeGroup<Vec<f32>>,
    pub start_point: &'a KeyframeGroup<Vec2>,
    pub end_point: &'a KeyframeGroup<Vec2>,
    pub opacity: &'a KeyframeGroup<f32>,
}

impl<'a> From<&'a GradientFill> for GradientSource<'a> {
    fn from(fill: &'a GradientFill) -> Self {
        GradientSource {
            gradient_type: fill.gradient_type,
            color_count: fill.color_count,
            colors: &fill.colors,
            start_point: &fill.start_point,
            end_point: &fill.end_point,
            opacity: &fill.opacity,
        }
    }
}

impl<'a> From<&'a GradientStroke> for GradientSource<'a> {
    fn from(stroke: &'a GradientStroke) -> Self {
        GradientSource {
            gradient_type: stroke.gradient_type,
            color_count: stroke.color_count,
            colors: &stroke.colors,
            start_point: &stroke.start_point,
            end_point: &stroke.end_point,
            opacity: &stroke.opacity,
        }
    }
}

impl GradientSource<'_> {
    /// Whether the stop data carries alpha stops after the color stops.
    pub fn has_alpha(&self) -> bool {
        let color_values = self.color_count * 4;
        self.colors.any_value(|stops| stops.len() > color_values)
    }
}

impl LayerNode {
    pub(crate) fn add_gradient_animations(
        &mut self,
        gradient: GradientSource<'_>,
        channel: GradientChannel,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        let count = gradient.color_count;
        match channel {
            GradientChannel::Rgb => {
                self.add_animation(
                    &LayerProperty::colors(),
                    gradient.colors,
                    |stops| rgb_colors(stops, count),
                    context,
                    tracker,
                )?;
                self.add_animation(
                    &LayerProperty::locations(),
                    gradient.colors,
                    |stops| rgb_locations(stops, count),
                    context,
                    tracker,
                )?;
            }
            GradientChannel::Alpha => {
                self.add_animation(
                    &LayerProperty::colors(),
                    gradient.colors,
                    |stops| alpha_colors(stops, count),
                    context,
                    tracker,
                )?;
                self.add_animation(
                    &LayerProperty::locations(),
                    gradient.colors,
                    |stops| alpha_locations(stops, count),
                    context,
                    tracker,
                )?;
            }
        }

        self.add_opacity_animation(gradient.opacity, context, tracker)?;

        match gradient.gradient_type {
            GradientType::Linear => {
                self.add_animation(&LayerProperty::start_point(), gradient.start_point, |p| *p, context, tracker)?;
                self.add_animation(&LayerProperty::end_point(), gradient.end_point, |p| *p, context, tracker)
            }
            GradientType::Radial => {
                let keypath = context.compatibility_context();
                let start = gradient
                    .start_point
                    .exactly_one_keyframe(tracker, &keypath, "gradient startPoint")?;
                let end = gradient
                    .end_point
                    .exactly_one_keyframe(tracker, &keypath, "gradient endPoint")?;
                let radius = start.distance(end);
                self.add_animation(
                    &LayerProperty::start_point(),
                    &KeyframeGroup::from_value(start),
                    |p| *p,
                    context,
                    tracker,
                )?;
                self.add_animation(
                    &LayerProperty::end_point(),
                    &KeyframeGroup::from_value(start + Vec2::splat(radius)),
                    |p| *p,
                    context,
                    tracker,
                )
            }
        }
    }
}

/// Stop data is `count` runs of `[location, r, g, b]`, optionally followed by
/// `[location, alpha]` pairs.
fn rgb_colors(stops: &[f32], count: usize) -> Vec<Vec4> {
    let at = |i: usize| stops.get(i).copied().unwrap_or(0.0);
    (0..count)
        .map(|stop| {
            let base = stop * 4;
            Vec4::new(at(base + 1), at(base + 2), at(base + 3), 1.0)
        })
        .collect()
}

fn rgb_locations(stops: &[f32], count: usize) -> Vec<f32> {
    (0..count)
        .map(|stop| stops.get(stop * 4).copied().unwrap_or(0.0))
        .collect()
}

fn alpha_stops(stops: &[f32], count: usize) -> impl Iterator<Item = (f32, f32)> + '_ {
    stops
        .get(count * 4..)
        .unwrap_or_default()
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
}

fn alpha_colors(stops: &[f32], count: usize) -> Vec<Vec4> {
    alpha_stops(stops, count)
        .map(|(_, alpha)| Vec4::new(0.0, 0.0, 0.0, alpha))
        .collect()
}

fn alpha_locations(stops: &[f32], count: usize) -> Vec<f32> {
    alpha_stops(stops, count).map(|(location, _)| location).collect()
}
