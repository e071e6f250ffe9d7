//! Layer masks and track mattes.

use glam::Vec4;
use kurbo::BezPath;

use crate::backend::{LayerProperty, PropertyValue};
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::geometry::{rect_path, VERY_LARGE_RECT};
use crate::layers::{AnimationRecipe, LayerBuilder};
use crate::model::{Mask, MaskMode, MatteType};
use crate::node::{CompositingFilter, FillRule, LayerNode, NodeKind, ShapeAttributes};

const BLACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// Padding of the plane an inverted matte is cut out of.
const INVERTED_MATTE_PADDING: f32 = 1e8;

/// Animates one mask's path and opacity.
#[derive(Debug, Clone)]
pub(crate) struct MaskRecipe {
    pub mask: Mask,
    /// Draw everything outside the path instead of inside it.
    pub invert: bool,
}

impl MaskRecipe {
    fn new(mask: &Mask) -> Self {
        let invert = match mask.mode.usable() {
            MaskMode::Subtract => !mask.inverted,
            MaskMode::Add => mask.inverted,
            _ => false,
        };
        MaskRecipe {
            mask: mask.clone(),
            invert,
        }
    }

    pub(crate) fn apply(
        &self,
        node: &mut LayerNode,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        let invert = self.invert;
        node.add_animation(
            &LayerProperty::path(),
            &self.mask.shape,
            |path| {
                if invert {
                    let mut inverted = BezPath::new();
                    rect_path(VERY_LARGE_RECT).append_to(&mut inverted);
                    path.append_to(&mut inverted);
                    inverted
                } else {
                    path.to_bez_path()
                }
            },
            context,
            tracker,
        )?;
        node.add_opacity_animation(&self.mask.opacity, context, tracker)
    }
}

fn mask_node(mask: &Mask) -> LayerNode {
    let attributes = ShapeAttributes {
        fill_rule: FillRule::EvenOdd,
        ..ShapeAttributes::default()
    };
    let mut node = LayerNode::new(&mask.name, NodeKind::Shape(attributes))
        .with_recipe(AnimationRecipe::Mask(MaskRecipe::new(mask)));
    node.set_value("fillColor", PropertyValue::Color(BLACK));
    node
}

impl LayerBuilder<'_> {
    /// Combines a layer's masks into one node usable as the layer's mask,
    /// or `None` when no mask has an effect.
    ///
    /// Additive masks draw side by side. Any other mode masks everything
    /// composed so far, which then becomes the input of the next mask.
    pub(crate) fn mask_composition(&mut self, masks: &[Mask]) -> CompileResult<Option<LayerNode>> {
        let mut container: Option<LayerNode> = None;
        for mask in masks {
            let mode = mask.mode.usable();
            if mode == MaskMode::None {
                continue;
            }
            self.compatibility_assert(
                mask.expansion.all_values(|expansion| *expansion == 0.0),
                "Mask expansion is not supported",
            )?;

            let node = mask_node(mask);
            container = Some(match container {
                None => {
                    let mut first = LayerNode::container("Masks");
                    first.add_sublayer(node);
                    first
                }
                Some(mut current) if mode == MaskMode::Add => {
                    current.add_sublayer(node);
                    current
                }
                Some(mut current) => {
                    current.set_mask(node);
                    let mut wrapper = LayerNode::container("Masks");
                    wrapper.add_sublayer(current);
                    wrapper
                }
            });
        }
        Ok(container)
    }

    /// Applies `matte` to the node of the layer providing the matte.
    pub(crate) fn matte_node(&mut self, mut matte: LayerNode, matte_type: MatteType) -> CompileResult<LayerNode> {
        let matte_type = match matte_type {
            MatteType::Luma => {
                self.log_issue("Luma mattes are not supported; using the alpha channel")?;
                MatteType::Add
            }
            MatteType::LumaInverted => {
                self.log_issue("Inverted luma mattes are not supported; using the inverted alpha channel")?;
                MatteType::Invert
            }
            other => other,
        };

        match matte_type {
            MatteType::Invert => {
                let mut plane = LayerNode::new(
                    format!("{} (Inverted)", matte.name),
                    NodeKind::InfinitePlane {
                        color: BLACK,
                        padding: INVERTED_MATTE_PADDING,
                    },
                );
                matte.compositing_filter = Some(CompositingFilter::Xor);
                plane.add_sublayer(matte);
                Ok(plane)
            }
            _ => Ok(matte),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;

    use super::*;
    use crate::backend::TimingConfiguration;
    use crate::bezier::{BezierPath, CurveVertex};
    use crate::compatibility::CompatibilityMode;
    use crate::compiler::{CompilerOptions, Providers};
    use crate::keyframes::KeyframeGroup;
    use crate::model::AnimationDocument;
    use crate::value_providers::ValueProviderStore;

    fn mask(name: &str, mode: MaskMode, inverted: bool) -> Mask {
        let square = BezierPath::new(
            vec![
                CurveVertex::corner(Vec2::ZERO),
                CurveVertex::corner(Vec2::new(10.0, 0.0)),
                CurveVertex::corner(Vec2::new(10.0, 10.0)),
                CurveVertex::corner(Vec2::new(0.0, 10.0)),
            ],
            true,
        );
        Mask {
            name: name.into(),
            mode,
            inverted,
            shape: KeyframeGroup::from_value(square),
            opacity: KeyframeGroup::from_value(100.0),
            expansion: KeyframeGroup::from_value(0.0),
        }
    }

    fn compose(masks: &[Mask]) -> (Option<LayerNode>, usize) {
        let document = AnimationDocument::default();
        let providers = Providers::default();
        let options = CompilerOptions::default();
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        let node = LayerBuilder::new(&document, &providers, &options, &mut tracker)
            .mask_composition(masks)
            .unwrap();
        (node, tracker.issues().len())
    }

    #[test]
    fn additive_masks_share_a_container() {
        let (node, issues) = compose(&[mask("A", MaskMode::Add, false), mask("B", MaskMode::Lighten, false)]);
        let node = node.expect("masks");
        assert_eq!(node.sublayers.len(), 2);
        assert!(node.mask.is_none());
        assert_eq!(issues, 0);
    }

    #[test]
    fn subtracting_masks_the_composition_so_far() {
        let (node, _) = compose(&[mask("A", MaskMode::Add, false), mask("B", MaskMode::Subtract, false)]);
        let outer = node.expect("masks");
        assert_eq!(outer.sublayers.len(), 1);
        let inner = &outer.sublayers[0];
        assert_eq!(inner.sublayers[0].name, "A");
        let subtract = inner.mask.as_deref().expect("subtract mask");
        let Some(AnimationRecipe::Mask(recipe)) = &subtract.recipe else {
            panic!("expected a mask recipe");
        };
        assert!(recipe.invert);
    }

    #[test]
    fn unused_masks_compose_to_nothing() {
        let (node, _) = compose(&[mask("A", MaskMode::None, false)]);
        assert!(node.is_none());
    }

    #[test]
    fn inverted_masks_are_cut_out_of_a_large_rect() {
        let mut node = mask_node(&mask("A", MaskMode::Add, true));
        let context = LayerAnimationContext::new(
            0.0,
            30.0,
            30.0,
            TimingConfiguration::default(),
            Arc::new(ValueProviderStore::default()),
        );
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        node.apply_timed_animations(&context, &mut tracker).unwrap();
        let Some(PropertyValue::Path(path)) = node.value("path") else {
            panic!("expected a static path");
        };
        let bounds = kurbo::Shape::bounding_box(path);
        assert_eq!(bounds.x0, VERY_LARGE_RECT.x0);
        assert_eq!(node.value("fillColor"), Some(&PropertyValue::Color(BLACK)));
    }

    #[test]
    fn expanded_masks_are_reported() {
        let mut expanded = mask("A", MaskMode::Add, false);
        expanded.expansion = KeyframeGroup::from_value(4.0);
        let (_, issues) = compose(&[expanded]);
        assert_eq!(issues, 1);
    }
}
