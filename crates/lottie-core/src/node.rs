use std::collections::BTreeMap;

use glam::{Vec2, Vec4};
use kurbo::Rect;
use tracing::trace;

use crate::backend::{PropertyValue, TimedAnimation};
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::keypath::keys_match;
use crate::layers::AnimationRecipe;
use crate::model::BlendMode;
use crate::providers::{FontHandle, ImageData};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// How a node is composited onto what is already drawn beneath it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositingFilter {
    /// Clears destination pixels wherever this node draws.
    Xor,
    Blend(BlendMode),
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ShapeAttributes {
    pub fill_rule: FillRule,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    pub dash_pattern: Option<Vec<f32>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientType {
    Linear,
    Radial,
}

/// Which part of the stop data a gradient node renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientChannel {
    Rgb,
    Alpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GradientAttributes {
    pub gradient_type: GradientType,
    pub channel: GradientChannel,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TextAttributes {
    pub text: String,
    pub font: Option<FontHandle>,
    pub font_size: f32,
    pub fill_color: Option<Vec4>,
    pub stroke_color: Option<Vec4>,
    pub stroke_width: f32,
    pub tracking: f32,
    pub line_height: f32,
    pub justification: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Container,
    /// Carries a transform and nothing else.
    Transform,
    Shape(ShapeAttributes),
    Gradient(GradientAttributes),
    Image {
        image: Option<ImageData>,
        size: Vec2,
    },
    Text(TextAttributes),
    /// A filled plane that grows `padding` beyond its parent's bounds on
    /// every side.
    InfinitePlane { color: Vec4, padding: f32 },
}

/// A compiled scene node: geometry and state written directly, plus the
/// timed animations that drive it.
#[derive(Debug, Clone)]
pub struct LayerNode {
    pub name: String,
    /// Name used to address this node through keypaths.
    pub keypath_name: Option<String>,
    pub kind: NodeKind,
    pub bounds: Option<Rect>,
    pub masks_to_bounds: bool,
    pub compositing_filter: Option<CompositingFilter>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub animations: Vec<TimedAnimation>,
    /// Children, back to front.
    pub sublayers: Vec<LayerNode>,
    /// Only the parts of this node covered by the mask's alpha are visible.
    pub mask: Option<Box<LayerNode>>,
    pub(crate) recipe: Option<AnimationRecipe>,
}

impl LayerNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        LayerNode {
            name: name.into(),
            keypath_name: None,
            kind,
            bounds: None,
            masks_to_bounds: false,
            compositing_filter: None,
            properties: BTreeMap::new(),
            animations: Vec::new(),
            sublayers: Vec::new(),
            mask: None,
            recipe: None,
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        LayerNode::new(name, NodeKind::Container)
    }

    pub fn with_keypath_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.keypath_name = (!name.is_empty()).then_some(name);
        self
    }

    pub(crate) fn with_recipe(mut self, recipe: AnimationRecipe) -> Self {
        self.recipe = Some(recipe);
        self
    }

    pub fn add_sublayer(&mut self, node: LayerNode) {
        self.sublayers.push(node);
    }

    pub fn set_mask(&mut self, mask: LayerNode) {
        self.mask = Some(Box::new(mask));
    }

    pub fn value(&self, key_path: &str) -> Option<&PropertyValue> {
        self.properties.get(key_path)
    }

    pub fn set_value(&mut self, key_path: &str, value: PropertyValue) {
        self.properties.insert(key_path.to_string(), value);
    }

    pub fn animation(&self, key_path: &str) -> Option<&TimedAnimation> {
        self.animations.iter().find(|a| a.key_path == key_path)
    }

    /// Attaches an animation, replacing any animation on the same key path.
    pub fn add_timed_animation(&mut self, animation: TimedAnimation) {
        self.animations.retain(|a| a.key_path != animation.key_path);
        self.animations.push(animation);
    }

    /// Rebuilds every animation in this subtree for `context`.
    pub fn apply_timed_animations(
        &mut self,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        self.animations.clear();

        let recipe = self.recipe.take();
        let child_context = match &recipe {
            Some(recipe) => recipe.apply(self, context, tracker),
            None => Ok(context.clone()),
        };
        self.recipe = recipe;
        let child_context = child_context?;

        trace!(node = %self.name, animations = self.animations.len(), "applied animations");

        if let Some(mask) = self.mask.as_deref_mut() {
            mask.apply_timed_animations(&child_context, tracker)?;
        }
        for sublayer in &mut self.sublayers {
            sublayer.apply_timed_animations(&child_context, tracker)?;
        }
        Ok(())
    }

    /// Finds the node addressed by `path`, relative to this node. Nodes
    /// without a keypath name are transparent to the lookup.
    pub fn node_for_path(&self, path: &[&str]) -> Option<&LayerNode> {
        if path.is_empty() {
            return Some(self);
        }
        self.sublayers
            .iter()
            .find_map(|child| child.match_path(path))
    }

    pub fn node_for_path_mut(&mut self, path: &[&str]) -> Option<&mut LayerNode> {
        let indices = self.path_indices(path)?;
        let mut node = self;
        for index in indices {
            node = node.sublayers.get_mut(index)?;
        }
        Some(node)
    }

    fn match_path(&self, path: &[&str]) -> Option<&LayerNode> {
        let Some(name) = self.keypath_name.as_deref() else {
            return self.node_for_path(path);
        };
        let (head, rest) = path.split_first()?;
        match *head {
            "**" if rest.is_empty() => Some(self),
            "**" => self.match_path(rest).or_else(|| self.node_for_path(path)),
            key if keys_match(&[key], &[name]) => self.node_for_path(rest),
            _ => None,
        }
    }

    fn path_indices(&self, path: &[&str]) -> Option<Vec<usize>> {
        let target: *const LayerNode = self.node_for_path(path)?;
        let mut trail = Vec::new();
        self.locate(target, &mut trail).then_some(trail)
    }

    fn locate(&self, target: *const LayerNode, trail: &mut Vec<usize>) -> bool {
        if std::ptr::eq(self, target) {
            return true;
        }
        for (index, child) in self.sublayers.iter().enumerate() {
            trail.push(index);
            if child.locate(target, trail) {
                return true;
            }
            trail.pop();
        }
        false
    }

    /// Depth-first walk over this node, its mask and its sublayers.
    pub fn visit(&self, depth: usize, f: &mut impl FnMut(&LayerNode, usize)) {
        f(self, depth);
        if let Some(mask) = &self.mask {
            mask.visit(depth + 1, f);
        }
        for sublayer in &self.sublayers {
            sublayer.visit(depth + 1, f);
        }
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(0, &mut |_, _| count += 1);
        count
    }

    pub fn animation_count(&self) -> usize {
        let mut count = 0;
        self.visit(0, &mut |node, _| count += node.animations.len());
        count
    }
}
