use std::sync::Arc;

use kurbo::Rect;
use tracing::{debug, warn};

use crate::error::CompileResult;
use crate::keyframes::KeyframeGroup;
use crate::model::LayerModel;
use crate::node::LayerNode;

use super::{AnimationRecipe, ChildTiming, LayerBuilder};

impl LayerBuilder<'_> {
    /// The children of a precomp layer, clipped to the precomp's size and
    /// moved onto its time axis.
    ///
    /// The remapping lives on this node rather than the layer's contents
    /// node, so the layer's own transform and masks keep the parent's
    /// timing.
    pub(super) fn precomp_children(
        &mut self,
        layer: &LayerModel,
        reference_id: &str,
        width: f32,
        height: f32,
        time_remapping: Option<Arc<KeyframeGroup<f32>>>,
    ) -> CompileResult<LayerNode> {
        let timing = match time_remapping {
            Some(track) => ChildTiming::Remapped(track),
            None => ChildTiming::Simple {
                start_time: layer.start_time,
                time_stretch: layer.time_stretch,
            },
        };
        let mut node = LayerNode::container(format!("{} (Children)", layer.name))
            .with_recipe(AnimationRecipe::ChildTiming(timing));
        node.bounds = Some(Rect::new(0.0, 0.0, width as f64, height as f64));
        node.masks_to_bounds = true;

        let document = self.document;
        let Some(asset) = document.assets.precomps.get(reference_id) else {
            self.log_issue(format!("Missing precomp asset {reference_id}"))?;
            return Ok(node);
        };
        if self.precomp_stack.iter().any(|id| id == reference_id) {
            warn!(asset = reference_id, "precomp references itself");
            self.log_issue(format!("Precomp {reference_id} contains itself"))?;
            return Ok(node);
        }

        self.precomp_stack.push(reference_id.to_string());
        let children = self.build_composition(&asset.layers);
        self.precomp_stack.pop();

        let children = children?;
        debug!(asset = reference_id, children = children.len(), "expanded precomp");
        for child in children {
            node.add_sublayer(child);
        }
        Ok(node)
    }
}
