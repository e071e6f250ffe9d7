use std::sync::Arc;

use glam::Vec4;

use crate::animations::{GradientSource, PathMultiplier, StrokeStyle};
use crate::backend::PropertyValue;
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::model::{Fill, GradientFill, GradientStroke, ShapeKind, Stroke, Trim};
use crate::node::{
    FillRule, GradientAttributes, GradientChannel, GradientType, LayerNode, NodeKind, ShapeAttributes,
};
use crate::shape_groups::PositionedItem;

use super::AnimationRecipe;

const BLACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// One path (or combined path) plus the paints and modifiers drawing it.
#[derive(Debug, Clone)]
pub(crate) struct RenderUnit {
    pub shape: PositionedItem,
    pub others: Vec<PositionedItem>,
}

impl RenderUnit {
    /// The first other item of one kind, with the item it came from.
    fn find<'a, T>(&'a self, pick: impl Fn(&'a ShapeKind) -> Option<&'a T>) -> Option<(&'a T, &'a PositionedItem)> {
        self.others
            .iter()
            .find_map(|positioned| pick(&positioned.item.kind).map(|value| (value, positioned)))
    }

    fn fill(&self) -> Option<(&Fill, &PositionedItem)> {
        self.find(|kind| match kind {
            ShapeKind::Fill(fill) => Some(fill),
            _ => None,
        })
    }

    fn stroke(&self) -> Option<(&Stroke, &PositionedItem)> {
        self.find(|kind| match kind {
            ShapeKind::Stroke(stroke) => Some(stroke),
            _ => None,
        })
    }

    fn gradient_fill(&self) -> Option<(&GradientFill, &PositionedItem)> {
        self.find(|kind| match kind {
            ShapeKind::GradientFill(fill) => Some(fill),
            _ => None,
        })
    }

    fn gradient_stroke(&self) -> Option<(&GradientStroke, &PositionedItem)> {
        self.find(|kind| match kind {
            ShapeKind::GradientStroke(stroke) => Some(stroke),
            _ => None,
        })
    }

    fn trim(&self) -> Option<(&Trim, &PositionedItem)> {
        self.find(|kind| match kind {
            ShapeKind::Trim(trim) if !trim.is_noop() => Some(trim),
            _ => None,
        })
    }

    /// Animates the trim and the (possibly repeated) path onto `node`.
    fn add_trimmed_path(
        &self,
        node: &mut LayerNode,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        let multiplier: PathMultiplier = match self.trim() {
            Some((trim, positioned)) => node.add_trim_animations(trim, &positioned.context(context), tracker)?,
            None => 1,
        };
        node.add_path_animations(&self.shape.item, multiplier, &self.shape.context(context), tracker)
    }
}

/// What a node inside a render unit's subtree draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShapeRole {
    /// The path with its solid fill and solid stroke.
    SolidFill,
    /// Black path that clips a gradient fill to the shape.
    GradientPathMask,
    GradientFillColor(GradientChannel),
    /// The solid stroke drawn above a gradient fill.
    GradientOverlay,
    /// Black stroke that clips a gradient stroke to the outline.
    GradientStrokeMask,
    GradientStrokeColor(GradientChannel),
}

impl ShapeRole {
    pub(crate) fn apply(
        &self,
        unit: &RenderUnit,
        node: &mut LayerNode,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        match self {
            ShapeRole::SolidFill => {
                if unit.trim().is_some() && unit.fill().is_some() {
                    tracker.log_issue(
                        "Trim paths on filled shapes are not supported; the fill ignores the trim",
                        unit.shape.context(context).compatibility_context(),
                    )?;
                }
                unit.add_trimmed_path(node, context, tracker)?;
                if let Some((fill, positioned)) = unit.fill() {
                    node.add_fill_animations(fill, &positioned.context(context), tracker)?;
                }
                if let Some((stroke, positioned)) = unit.stroke() {
                    node.add_stroke_animations(stroke.into(), &positioned.context(context), tracker)?;
                }
                Ok(())
            }
            ShapeRole::GradientPathMask => unit.add_trimmed_path(node, context, tracker),
            ShapeRole::GradientFillColor(channel) => match unit.gradient_fill() {
                Some((fill, positioned)) => {
                    node.add_gradient_animations(fill.into(), *channel, &positioned.context(context), tracker)
                }
                None => Ok(()),
            },
            ShapeRole::GradientOverlay => {
                unit.add_trimmed_path(node, context, tracker)?;
                if let Some((stroke, positioned)) = unit.stroke() {
                    node.add_stroke_animations(stroke.into(), &positioned.context(context), tracker)?;
                }
                Ok(())
            }
            ShapeRole::GradientStrokeMask => {
                unit.add_trimmed_path(node, context, tracker)?;
                if let Some((stroke, positioned)) = unit.gradient_stroke() {
                    node.add_stroke_animations(StrokeStyle::from(stroke), &positioned.context(context), tracker)?;
                }
                Ok(())
            }
            ShapeRole::GradientStrokeColor(channel) => match unit.gradient_stroke() {
                Some((stroke, positioned)) => {
                    node.add_gradient_animations(stroke.into(), *channel, &positioned.context(context), tracker)
                }
                None => Ok(()),
            },
        }
    }
}

/// Builds the node subtree drawing one render unit.
pub(crate) fn shape_item_node(unit: RenderUnit, tracker: &mut CompatibilityTracker) -> CompileResult<LayerNode> {
    let unit = Arc::new(unit);
    let name = unit.shape.item.name.clone();

    if let Some((fill, positioned)) = unit.gradient_fill() {
        if unit.gradient_stroke().is_some() {
            tracker.log_issue(
                "A gradient stroke drawn with a gradient fill is not supported",
                positioned.item.name.clone(),
            )?;
        }
        let source = GradientSource::from(fill);
        return Ok(gradient_fill_node(&unit, &name, fill.fill_rule, source.has_alpha()));
    }

    if let Some((stroke, _)) = unit.gradient_stroke() {
        let has_alpha = GradientSource::from(stroke).has_alpha();
        return Ok(gradient_stroke_node(&unit, &name, has_alpha));
    }

    Ok(role_node(&unit, name, shape_kind(), ShapeRole::SolidFill))
}

fn shape_kind() -> NodeKind {
    NodeKind::Shape(ShapeAttributes::default())
}

fn role_node(unit: &Arc<RenderUnit>, name: impl Into<String>, kind: NodeKind, role: ShapeRole) -> LayerNode {
    LayerNode::new(name, kind).with_recipe(AnimationRecipe::ShapeItem {
        unit: Arc::clone(unit),
        role,
    })
}

/// The rgb gradient, masked by the alpha gradient when the stops carry alpha.
fn gradient_nodes(
    unit: &Arc<RenderUnit>,
    name: &str,
    gradient_type: GradientType,
    has_alpha: bool,
    role: impl Fn(GradientChannel) -> ShapeRole,
) -> LayerNode {
    let kind = |channel| {
        NodeKind::Gradient(GradientAttributes {
            gradient_type,
            channel,
        })
    };
    let mut rgb = role_node(unit, format!("{name} (Gradient)"), kind(GradientChannel::Rgb), role(GradientChannel::Rgb));
    if has_alpha {
        let alpha = role_node(
            unit,
            format!("{name} (Gradient Alpha)"),
            kind(GradientChannel::Alpha),
            role(GradientChannel::Alpha),
        );
        rgb.set_mask(alpha);
    }
    rgb
}

fn gradient_fill_node(unit: &Arc<RenderUnit>, name: &str, fill_rule: FillRule, has_alpha: bool) -> LayerNode {
    let gradient_type = unit
        .gradient_fill()
        .map_or(GradientType::Linear, |(fill, _)| fill.gradient_type);

    let mut path_mask = role_node(
        unit,
        format!("{name} (Path Mask)"),
        NodeKind::Shape(ShapeAttributes {
            fill_rule,
            ..ShapeAttributes::default()
        }),
        ShapeRole::GradientPathMask,
    );
    path_mask.set_value("fillColor", PropertyValue::Color(BLACK));

    let mut path_container = LayerNode::container(format!("{name} (Path Container)"));
    path_container.set_mask(path_mask);
    path_container.add_sublayer(gradient_nodes(unit, name, gradient_type, has_alpha, ShapeRole::GradientFillColor));

    let overlay = role_node(unit, format!("{name} (Overlay)"), shape_kind(), ShapeRole::GradientOverlay);

    let mut container = LayerNode::container(name);
    container.add_sublayer(path_container);
    container.add_sublayer(overlay);
    container
}

fn gradient_stroke_node(unit: &Arc<RenderUnit>, name: &str, has_alpha: bool) -> LayerNode {
    let gradient_type = unit
        .gradient_stroke()
        .map_or(GradientType::Linear, |(stroke, _)| stroke.gradient_type);

    let mut stroke_mask = role_node(unit, format!("{name} (Stroke Mask)"), shape_kind(), ShapeRole::GradientStrokeMask);
    stroke_mask.set_value("strokeColor", PropertyValue::Color(BLACK));

    let mut container = LayerNode::container(name);
    container.set_mask(stroke_mask);
    container.add_sublayer(gradient_nodes(unit, name, gradient_type, has_alpha, ShapeRole::GradientStrokeColor));
    container
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;

    use super::*;
    use crate::backend::TimingConfiguration;
    use crate::compatibility::CompatibilityMode;
    use crate::keyframes::KeyframeGroup;
    use crate::model::{Ellipse, PathDirection, ShapeItem, TrimType};
    use crate::node::{LineCap, LineJoin};
    use crate::value_providers::ValueProviderStore;

    fn positioned(name: &str, kind: ShapeKind) -> PositionedItem {
        PositionedItem::new(ShapeItem::new(name, kind), vec!["Group".to_string()])
    }

    fn ellipse() -> PositionedItem {
        positioned(
            "Ellipse",
            ShapeKind::Ellipse(Ellipse {
                direction: PathDirection::Clockwise,
                position: KeyframeGroup::from_value(Vec2::ZERO),
                size: KeyframeGroup::from_value(Vec2::splat(20.0)),
            }),
        )
    }

    fn gradient_fill(stops: Vec<f32>) -> PositionedItem {
        positioned(
            "Gradient",
            ShapeKind::GradientFill(GradientFill {
                opacity: KeyframeGroup::from_value(100.0),
                start_point: KeyframeGroup::from_value(Vec2::ZERO),
                end_point: KeyframeGroup::from_value(Vec2::new(10.0, 0.0)),
                gradient_type: GradientType::Linear,
                color_count: 2,
                colors: KeyframeGroup::from_value(stops),
                highlight_length: None,
                highlight_angle: None,
                fill_rule: FillRule::EvenOdd,
            }),
        )
    }

    fn context() -> LayerAnimationContext {
        LayerAnimationContext::new(
            0.0,
            30.0,
            30.0,
            TimingConfiguration::default(),
            Arc::new(ValueProviderStore::default()),
        )
        .adding_keypath_component("Layer")
    }

    fn animate(node: &mut LayerNode, tracker: &mut CompatibilityTracker) {
        node.apply_timed_animations(&context(), tracker).unwrap();
    }

    #[test]
    fn solid_fill_draws_path_fill_and_stroke_on_one_node() {
        let unit = RenderUnit {
            shape: ellipse(),
            others: vec![
                positioned(
                    "Stroke",
                    ShapeKind::Stroke(Stroke {
                        color: KeyframeGroup::from_value(Vec4::new(0.0, 1.0, 0.0, 1.0)),
                        opacity: KeyframeGroup::from_value(100.0),
                        width: KeyframeGroup::from_value(4.0),
                        line_cap: LineCap::Round,
                        line_join: LineJoin::Round,
                        miter_limit: 4.0,
                        dash: Vec::new(),
                    }),
                ),
                positioned(
                    "Fill",
                    ShapeKind::Fill(Fill {
                        color: KeyframeGroup::from_value(Vec4::new(1.0, 0.0, 0.0, 1.0)),
                        opacity: KeyframeGroup::from_value(100.0),
                        fill_rule: FillRule::NonZero,
                    }),
                ),
            ],
        };
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        let mut node = shape_item_node(unit, &mut tracker).unwrap();
        animate(&mut node, &mut tracker);

        assert!(node.sublayers.is_empty());
        assert!(matches!(node.value("path"), Some(PropertyValue::Path(_))));
        assert_eq!(node.value("fillColor"), Some(&PropertyValue::Color(Vec4::new(1.0, 0.0, 0.0, 1.0))));
        assert_eq!(node.value("strokeColor"), Some(&PropertyValue::Color(Vec4::new(0.0, 1.0, 0.0, 1.0))));
        assert_eq!(node.value("lineWidth"), Some(&PropertyValue::Scalar(4.0)));
        let NodeKind::Shape(attributes) = &node.kind else {
            panic!("expected a shape node");
        };
        assert_eq!(attributes.line_cap, LineCap::Round);
        assert!(tracker.issues().is_empty());
    }

    #[test]
    fn gradient_fill_with_alpha_is_masked_twice() {
        let stops = vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.5];
        let unit = RenderUnit {
            shape: ellipse(),
            others: vec![gradient_fill(stops)],
        };
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        let mut node = shape_item_node(unit, &mut tracker).unwrap();
        animate(&mut node, &mut tracker);

        assert_eq!(node.name, "Ellipse");
        assert_eq!(node.sublayers.len(), 2);
        let path_container = &node.sublayers[0];
        let path_mask = path_container.mask.as_deref().expect("path mask");
        assert_eq!(path_mask.value("fillColor"), Some(&PropertyValue::Color(BLACK)));
        assert!(matches!(path_mask.value("path"), Some(PropertyValue::Path(_))));
        let NodeKind::Shape(attributes) = &path_mask.kind else {
            panic!("expected a shape mask");
        };
        assert_eq!(attributes.fill_rule, FillRule::EvenOdd);

        let gradient = &path_container.sublayers[0];
        assert!(gradient.value("colors").is_some());
        let alpha = gradient.mask.as_deref().expect("alpha mask");
        assert_eq!(alpha.value("locations"), Some(&PropertyValue::ScalarList(vec![0.0, 1.0])));

        let overlay = &node.sublayers[1];
        assert!(overlay.value("fillColor").is_none());
    }

    #[test]
    fn gradient_without_alpha_has_no_alpha_mask() {
        let unit = RenderUnit {
            shape: ellipse(),
            others: vec![gradient_fill(vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0])],
        };
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        let node = shape_item_node(unit, &mut tracker).unwrap();
        assert!(node.sublayers[0].sublayers[0].mask.is_none());
    }

    #[test]
    fn trimming_a_filled_shape_is_reported() {
        let unit = RenderUnit {
            shape: ellipse(),
            others: vec![
                positioned(
                    "Fill",
                    ShapeKind::Fill(Fill {
                        color: KeyframeGroup::from_value(Vec4::ONE),
                        opacity: KeyframeGroup::from_value(100.0),
                        fill_rule: FillRule::NonZero,
                    }),
                ),
                positioned(
                    "Trim",
                    ShapeKind::Trim(Trim {
                        start: KeyframeGroup::from_value(0.0),
                        end: KeyframeGroup::from_value(50.0),
                        offset: KeyframeGroup::from_value(0.0),
                        trim_type: TrimType::Simultaneously,
                    }),
                ),
            ],
        };
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        let mut node = shape_item_node(unit, &mut tracker).unwrap();
        animate(&mut node, &mut tracker);
        assert_eq!(node.value("strokeEnd"), Some(&PropertyValue::Scalar(0.5)));
        assert_eq!(tracker.issues().len(), 1);
        assert_eq!(tracker.issues()[0].context, "Layer.Group.Ellipse");
    }
}
