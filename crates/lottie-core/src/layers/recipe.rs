use std::sync::Arc;

use glam::{Vec2, Vec4};

use crate::backend::LayerProperty;
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::geometry;
use crate::keyframes::{AnimationFrameTime, KeyframeGroup};
use crate::masking::MaskRecipe;
use crate::model::{LayerModel, ShapeKind, Transform};
use crate::node::LayerNode;
use crate::shape_groups::PositionedItem;

use super::shape::RepeaterCopy;
use super::shape_item::{RenderUnit, ShapeRole};

/// How a node rebuilds its own animations for a context, and the context
/// it hands to its children.
#[derive(Debug, Clone)]
pub(crate) enum AnimationRecipe {
    /// The "(Content)" node of a rendered layer.
    Layer(LayerRecipe),
    /// Null layers, hidden layers and parent wrappers.
    TransformOnly {
        layer_name: String,
        transform: Transform,
    },
    /// Moves children onto a precomp's time axis.
    ChildTiming(ChildTiming),
    Mask(MaskRecipe),
    Solid {
        color: Vec4,
        size: Vec2,
    },
    /// A shape group, animated by the first transform item among its items.
    ShapeGroup {
        transform: Option<PositionedItem>,
    },
    Repeater(RepeaterCopy),
    ShapeItem {
        unit: Arc<RenderUnit>,
        role: ShapeRole,
    },
}

impl AnimationRecipe {
    pub(crate) fn apply(
        &self,
        node: &mut LayerNode,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<LayerAnimationContext> {
        match self {
            AnimationRecipe::Layer(layer) => layer.apply(node, context, tracker),
            AnimationRecipe::TransformOnly {
                layer_name,
                transform,
            } => {
                let transform_context = context
                    .adding_keypath_component(layer_name)
                    .adding_keypath_component("Transform");
                node.add_transform_animations(transform, &transform_context, tracker)?;
                Ok(context.clone())
            }
            AnimationRecipe::ChildTiming(timing) => Ok(timing.apply(context)),
            AnimationRecipe::Mask(mask) => {
                mask.apply(node, context, tracker)?;
                Ok(context.clone())
            }
            AnimationRecipe::Solid { color, size } => {
                let path = geometry::rect_path(kurbo::Rect::new(0.0, 0.0, size.x as f64, size.y as f64));
                node.add_animation(
                    &LayerProperty::path(),
                    &KeyframeGroup::from_value(path),
                    |path| path.to_bez_path(),
                    context,
                    tracker,
                )?;
                node.add_animation(
                    &LayerProperty::fill_color(),
                    &KeyframeGroup::from_value(*color),
                    |color| *color,
                    context,
                    tracker,
                )?;
                Ok(context.clone())
            }
            AnimationRecipe::ShapeGroup { transform } => {
                if let Some(positioned) = transform {
                    if let ShapeKind::Transform(shape_transform) = &positioned.item.kind {
                        let item_context = positioned.context(context);
                        node.add_transform_animations(shape_transform, &item_context, tracker)?;
                        node.add_opacity_animation(&shape_transform.opacity, &item_context, tracker)?;
                    }
                }
                Ok(context.clone())
            }
            AnimationRecipe::Repeater(copy) => {
                node.add_transform_animations(&copy.transform, context, tracker)?;
                node.add_opacity_animation(&copy.opacity, context, tracker)?;
                Ok(context.clone())
            }
            AnimationRecipe::ShapeItem { unit, role } => {
                role.apply(unit, node, context, tracker)?;
                Ok(context.clone())
            }
        }
    }
}

/// Transform, opacity and visibility of a rendered layer.
#[derive(Debug, Clone)]
pub(crate) struct LayerRecipe {
    pub name: String,
    pub transform: Transform,
    pub in_frame: AnimationFrameTime,
    pub out_frame: AnimationFrameTime,
}

impl LayerRecipe {
    pub fn new(layer: &LayerModel) -> Self {
        LayerRecipe {
            name: layer.name.clone(),
            transform: layer.transform.clone(),
            in_frame: layer.in_frame,
            out_frame: layer.out_frame,
        }
    }

    fn apply(
        &self,
        node: &mut LayerNode,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<LayerAnimationContext> {
        let layer_context = context.adding_keypath_component(&self.name);
        let transform_context = layer_context.adding_keypath_component("Transform");

        node.add_transform_animations(&self.transform, &transform_context, tracker)?;
        node.add_opacity_animation(&self.transform.opacity, &transform_context, tracker)?;
        node.add_visibility_animation(self.in_frame, self.out_frame, &layer_context, tracker)?;
        Ok(layer_context)
    }
}

/// The time axis of a precomp's children relative to the precomp layer.
#[derive(Debug, Clone)]
pub(crate) enum ChildTiming {
    /// `parent = child * time_stretch + start_time`.
    Simple { start_time: f32, time_stretch: f32 },
    /// Child time in seconds, keyed by the layer's local frame.
    Remapped(Arc<KeyframeGroup<f32>>),
}

impl ChildTiming {
    pub fn apply(&self, context: &LayerAnimationContext) -> LayerAnimationContext {
        match self {
            ChildTiming::Simple {
                start_time,
                time_stretch,
            } => context.with_simple_time_remapping(*start_time, *time_stretch),
            ChildTiming::Remapped(track) => context.with_complex_time_remapping(Arc::clone(track)),
        }
    }
}
