//! Orders a composition's layers and wires up parenting and track mattes.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::error::CompileResult;
use crate::layers::{transform_layer_node, LayerBuilder};
use crate::model::LayerModel;
use crate::node::LayerNode;

impl LayerBuilder<'_> {
    /// Nodes for `layers` (front to back in the document), back to front.
    ///
    /// A layer with a matte consumes the layer directly above it, which is
    /// then only drawn as that matte.
    pub(crate) fn build_composition(&mut self, layers: &[LayerModel]) -> CompileResult<Vec<LayerNode>> {
        let by_index: HashMap<i64, &LayerModel> = layers.iter().map(|layer| (layer.index, layer)).collect();
        let mut nodes = Vec::with_capacity(layers.len());
        let mut consumed_indices = HashSet::new();

        for i in (0..layers.len()).rev() {
            if consumed_indices.contains(&i) {
                continue;
            }
            let layer = &layers[i];
            let Some(node) = self.make_layer_node(layer)? else {
                continue;
            };
            let node = self.parent_wrapped(layer, node, &by_index)?;

            let Some(matte_type) = layer.matte else {
                nodes.push(node);
                continue;
            };
            if i == 0 || consumed_indices.contains(&(i - 1)) {
                self.log_issue(format!("Layer {} has a matte but no layer above it", layer.name))?;
                nodes.push(node);
                continue;
            }

            let matte_index = i - 1;
            consumed_indices.insert(matte_index);
            let matte_layer = &layers[matte_index];
            let Some(matte) = self.make_layer_node(matte_layer)? else {
                nodes.push(node);
                continue;
            };
            let matte = self.parent_wrapped(matte_layer, matte, &by_index)?;

            let mut mask = LayerNode::container(format!("{} (mask of {})", matte_layer.name, layer.name));
            mask.add_sublayer(matte);
            let mask = self.matte_node(mask, matte_type)?;

            let mut masked = LayerNode::container(format!("{} (masked)", layer.name));
            masked.add_sublayer(node);
            masked.set_mask(mask);
            trace!(layer = %layer.name, matte = %matte_layer.name, "applied track matte");
            nodes.push(masked);
        }
        Ok(nodes)
    }

    /// Wraps `node` in one transform node per ancestor of `layer`, nearest
    /// ancestor innermost.
    fn parent_wrapped(
        &mut self,
        layer: &LayerModel,
        mut node: LayerNode,
        by_index: &HashMap<i64, &LayerModel>,
    ) -> CompileResult<LayerNode> {
        let mut visited = HashSet::from([layer.index]);
        let mut current = layer;
        while let Some(parent_index) = current.parent {
            let Some(parent) = by_index.get(&parent_index).copied() else {
                self.log_issue(format!("Parent layer {parent_index} of {} does not exist", layer.name))?;
                break;
            };
            if !visited.insert(parent.index) {
                self.log_issue(format!("Layer {} has a parenting cycle", layer.name))?;
                break;
            }
            let mut wrapper = transform_layer_node(parent, &format!("{} (parent, {})", layer.name, parent.name));
            wrapper.add_sublayer(node);
            node = wrapper;
            current = parent;
        }
        Ok(node)
    }
}
