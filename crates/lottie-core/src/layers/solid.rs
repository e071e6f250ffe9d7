use glam::{Vec2, Vec4};

use crate::model::LayerModel;
use crate::node::{LayerNode, NodeKind, ShapeAttributes};

use super::AnimationRecipe;

/// A filled rectangle covering the layer's size.
pub(super) fn solid_node(layer: &LayerModel, color: Vec4, width: f32, height: f32) -> LayerNode {
    LayerNode::new(format!("{} (Solid)", layer.name), NodeKind::Shape(ShapeAttributes::default()))
        .with_recipe(AnimationRecipe::Solid {
            color,
            size: Vec2::new(width, height),
        })
}
