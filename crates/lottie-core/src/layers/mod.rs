//! Builds compiled nodes for each layer type.
//!
//! Building happens once per document. Every node that animates carries an
//! [`AnimationRecipe`] describing how to rebuild its animations, so the
//! whole tree can be re-animated for a new context (different timing, new
//! value providers) without walking the document again.

mod image;
mod precomp;
mod recipe;
mod shape;
mod shape_item;
mod solid;
mod text;

use tracing::debug;

use crate::compatibility::CompatibilityTracker;
use crate::compiler::{CompilerOptions, Providers};
use crate::error::CompileResult;
use crate::model::{AnimationDocument, BlendMode, LayerContent, LayerModel};
use crate::node::{CompositingFilter, LayerNode, NodeKind};

pub(crate) use recipe::{AnimationRecipe, ChildTiming, LayerRecipe};

/// Shared state while turning document layers into nodes.
pub(crate) struct LayerBuilder<'a> {
    pub document: &'a AnimationDocument,
    pub providers: &'a Providers,
    pub options: &'a CompilerOptions,
    pub tracker: &'a mut CompatibilityTracker,
    /// Name of the layer being built, used as the context of build-time
    /// compatibility issues.
    layer_name: String,
    /// Precomp assets currently being expanded, innermost last.
    precomp_stack: Vec<String>,
    /// Product of the copy counts of the repeaters enclosing the items
    /// being built.
    repeater_copies: usize,
}

impl<'a> LayerBuilder<'a> {
    pub fn new(
        document: &'a AnimationDocument,
        providers: &'a Providers,
        options: &'a CompilerOptions,
        tracker: &'a mut CompatibilityTracker,
    ) -> Self {
        LayerBuilder {
            document,
            providers,
            options,
            tracker,
            layer_name: String::new(),
            precomp_stack: Vec::new(),
            repeater_copies: 1,
        }
    }

    pub fn log_issue(&mut self, message: impl Into<String>) -> CompileResult<()> {
        let context = self.layer_name.clone();
        self.tracker.log_issue(message, context)
    }

    pub fn compatibility_assert(&mut self, condition: bool, message: impl Into<String>) -> CompileResult<()> {
        let context = self.layer_name.clone();
        self.tracker.assert(condition, message, context)
    }

    /// The node for one layer, or `None` when the layer renders nothing.
    pub fn make_layer_node(&mut self, layer: &LayerModel) -> CompileResult<Option<LayerNode>> {
        let previous = std::mem::replace(&mut self.layer_name, layer.name.clone());
        let node = self.layer_node(layer);
        self.layer_name = previous;
        node
    }

    fn layer_node(&mut self, layer: &LayerModel) -> CompileResult<Option<LayerNode>> {
        if layer.hidden {
            return Ok(Some(transform_layer_node(layer, &layer.name).with_keypath_name(&layer.name)));
        }

        let children = match &layer.content {
            LayerContent::Solid { color, width, height } => vec![solid::solid_node(layer, *color, *width, *height)],
            LayerContent::Shape { items } => self.shape_layer_nodes(items)?,
            LayerContent::Image { reference_id } => vec![self.image_node(reference_id)],
            LayerContent::Text {
                document,
                has_animators,
            } => vec![self.text_node(layer, document, *has_animators)?],
            LayerContent::PreComp {
                reference_id,
                width,
                height,
                time_remapping,
            } => vec![self.precomp_children(layer, reference_id, *width, *height, time_remapping.clone())?],
            LayerContent::Null => {
                return Ok(Some(transform_layer_node(layer, &layer.name).with_keypath_name(&layer.name)));
            }
            LayerContent::Unsupported { type_code } => {
                self.log_issue(format!("Unexpected layer type {type_code}"))?;
                return Ok(None);
            }
        };

        debug!(layer = %layer.name, kind = layer.content.type_name(), "built layer");
        Ok(Some(self.composition_node(layer, children)?))
    }

    /// Wraps a layer's rendered children. The outer node is what parent
    /// wrappers and mattes see; the inner "(Content)" node carries the
    /// layer transform, opacity, visibility and masks.
    fn composition_node(&mut self, layer: &LayerModel, children: Vec<LayerNode>) -> CompileResult<LayerNode> {
        let mut contents = LayerNode::container(format!("{} (Content)", layer.name))
            .with_recipe(AnimationRecipe::Layer(LayerRecipe::new(layer)));
        if let Some(masks) = self.mask_composition(&layer.masks)? {
            contents.set_mask(masks);
        }
        for child in children {
            contents.add_sublayer(child);
        }

        let mut outer = LayerNode::container(&layer.name).with_keypath_name(&layer.name);
        outer.compositing_filter = blend_filter(layer.blend_mode);
        outer.add_sublayer(contents);
        Ok(outer)
    }
}

/// A node that only applies `layer`'s transform to its children.
pub(crate) fn transform_layer_node(layer: &LayerModel, name: &str) -> LayerNode {
    LayerNode::new(name, NodeKind::Transform).with_recipe(AnimationRecipe::TransformOnly {
        layer_name: layer.name.clone(),
        transform: layer.transform.clone(),
    })
}

fn blend_filter(mode: BlendMode) -> Option<CompositingFilter> {
    (mode != BlendMode::Normal).then_some(CompositingFilter::Blend(mode))
}
