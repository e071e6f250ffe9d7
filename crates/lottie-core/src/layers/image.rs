use glam::Vec2;
use tracing::debug;

use crate::node::{LayerNode, NodeKind};

use super::LayerBuilder;

impl LayerBuilder<'_> {
    /// The image drawn by an image layer. Unresolvable assets draw nothing.
    pub(super) fn image_node(&mut self, reference_id: &str) -> LayerNode {
        let asset = self.document.assets.images.get(reference_id);
        let image = asset.and_then(|asset| self.providers.image.image_for(asset));
        if image.is_none() {
            debug!(layer = %self.layer_name, asset = reference_id, "no image for layer");
        }
        let size = asset.map_or(Vec2::ZERO, |asset| Vec2::new(asset.width, asset.height));
        LayerNode::new(format!("{reference_id} (Image)"), NodeKind::Image { image, size })
    }
}
