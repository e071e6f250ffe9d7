use glam::Vec3;
use tracing::debug;

use crate::combine::{KeyframeTimeline, Keyframes};
use crate::error::CompileResult;
use crate::keyframes::KeyframeGroup;
use crate::model::{Repeater, ShapeItem, ShapeKind, Transform};
use crate::node::{LayerNode, NodeKind};
use crate::shape_groups::{combined_shape_item, shape_render_groups, PositionedItem};

use super::shape_item::{shape_item_node, RenderUnit};
use super::{AnimationRecipe, LayerBuilder};

/// Upper bound on the copies produced by a repeater, counting the copies
/// of every enclosing repeater.
pub(crate) const MAX_REPEATER_COPIES: usize = 1000;

/// The transform and opacity of one repeater copy.
#[derive(Debug, Clone)]
pub(crate) struct RepeaterCopy {
    pub transform: Transform,
    /// Percent.
    pub opacity: KeyframeGroup<f32>,
}

impl RepeaterCopy {
    /// Copy `index` of `count`, offset by the repeater's `offset` copies.
    /// Position and rotation accumulate per copy; anchor and scale apply
    /// to every copy once.
    fn new(repeater: &Repeater, index: usize, count: usize, offset: f32) -> Self {
        let factor = index as f32 + offset;
        let source = &repeater.transform;
        let transform = Transform {
            anchor: source.anchor.clone(),
            position: source.position.as_ref().map(|p| p.map(|v| *v * factor)),
            position_x: source.position_x.as_ref().map(|p| p.map(|v| v * factor)),
            position_y: source.position_y.as_ref().map(|p| p.map(|v| v * factor)),
            scale: source.scale.clone(),
            rotation_x: source.rotation_x.map(|v| v * factor),
            rotation_y: source.rotation_y.map(|v| v * factor),
            rotation_z: source.rotation_z.map(|v| v * factor),
            opacity: KeyframeGroup::from_value(100.0),
            skew: None,
            skew_axis: None,
        };

        let progress = if count > 1 {
            index as f32 / (count - 1) as f32
        } else {
            0.0
        };
        let start = &repeater.start_opacity;
        let end = &repeater.end_opacity;
        let opacity = Keyframes::combined(
            &[start as &dyn KeyframeTimeline, end as &dyn KeyframeTimeline],
            false,
            |at| {
                let start = start.value_for(at)?;
                let end = end.value_for(at)?;
                Some(start + (end - start) * progress)
            },
        );
        RepeaterCopy { transform, opacity }
    }
}

impl LayerBuilder<'_> {
    /// The nodes of a shape layer's top-level items.
    pub(super) fn shape_layer_nodes(&mut self, items: &[ShapeItem]) -> CompileResult<Vec<LayerNode>> {
        let positioned: Vec<PositionedItem> = items
            .iter()
            .map(|item| PositionedItem::new(item.clone(), Vec::new()))
            .collect();
        self.group_children(&positioned, true)
    }

    /// Group nodes for `items`, repeated once per copy when the items
    /// contain a repeater.
    fn group_children(&mut self, items: &[PositionedItem], top_level: bool) -> CompileResult<Vec<LayerNode>> {
        let repeater = items.iter().position(|positioned| {
            !positioned.item.hidden && matches!(positioned.item.kind, ShapeKind::Repeater(_))
        });
        let Some(repeater_index) = repeater else {
            return self.group_nodes(items, top_level);
        };
        let ShapeKind::Repeater(repeater) = &items[repeater_index].item.kind else {
            return self.group_nodes(items, top_level);
        };

        let context = self.layer_name.clone();
        let copies = repeater
            .copies
            .exactly_one_keyframe(self.tracker, &context, "repeater copies")?;
        let offset = repeater
            .offset
            .exactly_one_keyframe(self.tracker, &context, "repeater offset")?;
        let requested = copies.round().max(0.0) as usize;
        let budget = MAX_REPEATER_COPIES / self.repeater_copies.max(1);
        let count = requested.min(budget);
        if count < requested {
            self.log_issue(format!(
                "Repeaters are limited to {MAX_REPEATER_COPIES} copies in total, {requested} requested"
            ))?;
        }

        let remaining: Vec<PositionedItem> = items
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != repeater_index)
            .map(|(_, positioned)| positioned.clone())
            .collect();

        let enclosing = self.repeater_copies;
        self.repeater_copies = enclosing.saturating_mul(count.max(1));
        let mut built = Vec::new();
        for _ in 0..count {
            match self.group_nodes(&remaining, top_level) {
                Ok(groups) => built.push(groups),
                Err(error) => {
                    self.repeater_copies = enclosing;
                    return Err(error);
                }
            }
        }
        self.repeater_copies = enclosing;

        let mut nodes = Vec::new();
        for (index, groups) in built.into_iter().enumerate() {
            for group in groups {
                let mut copy = LayerNode::new(format!("{} (Copy {index})", items[repeater_index].item.name), NodeKind::Transform)
                    .with_recipe(AnimationRecipe::Repeater(RepeaterCopy::new(repeater, index, count, offset)));
                copy.add_sublayer(group);
                nodes.push(copy);
            }
        }
        debug!(copies = count, groups = nodes.len(), "expanded repeater");
        Ok(nodes)
    }

    /// One node per visible group in `items`, back to front. Items that
    /// aren't groups and that no render group uses are inherited by every
    /// child group.
    fn group_nodes(&mut self, items: &[PositionedItem], top_level: bool) -> CompileResult<Vec<LayerNode>> {
        let visible: Vec<&PositionedItem> = items.iter().filter(|p| !p.item.hidden).collect();
        let (mut groups, mut others): (Vec<PositionedItem>, Vec<PositionedItem>) = visible
            .iter()
            .map(|p| (*p).clone())
            .partition(|p| p.item.is_group());

        if others.iter().any(|p| matches!(p.item.kind, ShapeKind::Merge(_))) {
            self.log_issue("Merge paths are not supported")?;
        }

        // Top-level paths render through an unnamed group wrapping the
        // whole layer, so they share the path with nested groups.
        if top_level && others.iter().any(|p| p.item.draws_path()) {
            let all = visible.iter().map(|p| p.item.clone()).collect();
            groups = vec![PositionedItem::new(ShapeItem::new("", ShapeKind::Group(all)), Vec::new())];
            others.clear();
        }

        let inherited = if others.is_empty() {
            Vec::new()
        } else {
            shape_render_groups(&others, !groups.is_empty()).unused
        };

        let mut nodes = Vec::with_capacity(groups.len());
        for group in groups.iter().rev() {
            let ShapeKind::Group(children) = &group.item.kind else {
                continue;
            };
            let mut path_for_children = group.group_path.clone();
            if !group.item.name.is_empty() {
                path_for_children.push(group.item.name.clone());
            }

            let mut child_items: Vec<PositionedItem> = children
                .iter()
                .filter(|item| !item.hidden)
                .map(|item| PositionedItem::new(item.clone(), path_for_children.clone()))
                .collect();
            for item in &inherited {
                child_items.push(self.inherited_by(item, children)?);
            }

            nodes.push(self.group_node(group, children, &path_for_children, child_items)?);
        }
        Ok(nodes)
    }

    /// `item` as seen from inside a child group whose transform scales it.
    /// Strokes keep their on-screen width.
    fn inherited_by(&mut self, item: &PositionedItem, group_items: &[ShapeItem]) -> CompileResult<PositionedItem> {
        let transform = group_items.iter().find_map(|child| match &child.kind {
            ShapeKind::Transform(transform) => Some(transform),
            _ => None,
        });
        let Some(transform) = transform else {
            return Ok(item.clone());
        };
        if !item.item.is_stroke() {
            return Ok(item.clone());
        }

        let context = self.layer_name.clone();
        let scale: Vec3 = transform
            .scale
            .exactly_one_keyframe(self.tracker, &context, "scale of a group inheriting a stroke")?;
        self.compatibility_assert(
            scale.x == scale.y,
            "Groups with non-uniform scale cannot inherit strokes from their parent",
        )?;
        if scale.x == 0.0 {
            return Ok(item.clone());
        }

        let factor = 100.0 / scale.x;
        let mut scaled = item.clone();
        match &mut scaled.item.kind {
            ShapeKind::Stroke(stroke) => stroke.width = stroke.width.map(|w| w * factor),
            ShapeKind::GradientStroke(stroke) => stroke.width = stroke.width.map(|w| w * factor),
            _ => {}
        }
        Ok(scaled)
    }

    /// A shape group: its nested groups behind, then one subtree per render
    /// unit of its own items.
    fn group_node(
        &mut self,
        group: &PositionedItem,
        raw_items: &[ShapeItem],
        path_for_children: &[String],
        items: Vec<PositionedItem>,
    ) -> CompileResult<LayerNode> {
        let (child_groups, non_groups): (Vec<PositionedItem>, Vec<PositionedItem>) =
            items.into_iter().partition(|p| p.item.is_group());

        let transform = non_groups
            .iter()
            .find(|p| matches!(p.item.kind, ShapeKind::Transform(_)))
            .cloned();
        let mut node = LayerNode::container(&group.item.name)
            .with_keypath_name(&group.item.name)
            .with_recipe(AnimationRecipe::ShapeGroup { transform });

        let raw: Vec<PositionedItem> = raw_items
            .iter()
            .map(|item| PositionedItem::new(item.clone(), path_for_children.to_vec()))
            .collect();
        for child in self.group_children(&raw, false)? {
            node.add_sublayer(child);
        }

        let render_groups = shape_render_groups(&non_groups, !child_groups.is_empty());
        let resample = self.options.resample_mismatched_combined_shapes;
        for render_group in render_groups.valid.iter().rev() {
            let units = match combined_shape_item(render_group, &group.item.name, resample) {
                Some(combined) => vec![RenderUnit {
                    shape: combined,
                    others: render_group.other_items.clone(),
                }],
                None => render_group
                    .path_items
                    .iter()
                    .map(|path| RenderUnit {
                        shape: path.clone(),
                        others: render_group.other_items.clone(),
                    })
                    .collect(),
            };
            for unit in units {
                node.add_sublayer(shape_item_node(unit, self.tracker)?);
            }
        }
        Ok(node)
    }
}
