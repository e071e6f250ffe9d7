use std::sync::Arc;

use glam::{Vec3, Vec4};

use crate::bezier::BezierPath;
use crate::keyframes::{AnimationFrameTime, KeyframeGroup};
use crate::model::{BlendMode, ShapeItem, TextDocument};

/// A layer or shape-group transform, in document units.
#[derive(Debug, Clone)]
pub struct Transform {
    pub anchor: KeyframeGroup<Vec3>,
    /// `None` when the position is split into separate axes.
    pub position: Option<KeyframeGroup<Vec3>>,
    pub position_x: Option<KeyframeGroup<f32>>,
    pub position_y: Option<KeyframeGroup<f32>>,
    /// Percent.
    pub scale: KeyframeGroup<Vec3>,
    /// Degrees.
    pub rotation_x: KeyframeGroup<f32>,
    pub rotation_y: KeyframeGroup<f32>,
    pub rotation_z: KeyframeGroup<f32>,
    /// Percent.
    pub opacity: KeyframeGroup<f32>,
    pub skew: Option<KeyframeGroup<f32>>,
    pub skew_axis: Option<KeyframeGroup<f32>>,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            anchor: KeyframeGroup::from_value(Vec3::ZERO),
            position: Some(KeyframeGroup::from_value(Vec3::ZERO)),
            position_x: None,
            position_y: None,
            scale: KeyframeGroup::from_value(Vec3::splat(100.0)),
            rotation_x: KeyframeGroup::from_value(0.0),
            rotation_y: KeyframeGroup::from_value(0.0),
            rotation_z: KeyframeGroup::from_value(0.0),
            opacity: KeyframeGroup::from_value(100.0),
            skew: None,
            skew_axis: None,
        }
    }
}

impl Transform {
    /// Whether a skew with a non-zero value appears anywhere on the track.
    pub fn has_skew(&self) -> bool {
        self.skew
            .as_ref()
            .map_or(false, |skew| skew.any_value(|v| *v != 0.0))
    }

    pub fn has_negative_x_scale(&self) -> bool {
        self.scale.any_value(|scale| scale.x < 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatteType {
    Add,
    Invert,
    Luma,
    LumaInverted,
}

impl MatteType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MatteType::Add),
            2 => Some(MatteType::Invert),
            3 => Some(MatteType::Luma),
            4 => Some(MatteType::LumaInverted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    Add,
    Subtract,
    Intersect,
    Lighten,
    Darken,
    Difference,
    None,
}

impl MaskMode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "s" => MaskMode::Subtract,
            "i" => MaskMode::Intersect,
            "l" => MaskMode::Lighten,
            "d" => MaskMode::Darken,
            "f" => MaskMode::Difference,
            "n" => MaskMode::None,
            _ => MaskMode::Add,
        }
    }

    /// The subset of modes the backend can composite. Lighten behaves like
    /// add and difference like intersect.
    pub fn usable(self) -> MaskMode {
        match self {
            MaskMode::Lighten => MaskMode::Add,
            MaskMode::Difference => MaskMode::Intersect,
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mask {
    pub name: String,
    pub mode: MaskMode,
    pub inverted: bool,
    pub shape: KeyframeGroup<BezierPath>,
    /// Percent.
    pub opacity: KeyframeGroup<f32>,
    pub expansion: KeyframeGroup<f32>,
}

#[derive(Debug, Clone)]
pub enum LayerContent {
    Solid {
        color: Vec4,
        width: f32,
        height: f32,
    },
    Shape {
        items: Vec<ShapeItem>,
    },
    Image {
        reference_id: String,
    },
    Text {
        document: KeyframeGroup<TextDocument>,
        has_animators: bool,
    },
    PreComp {
        reference_id: String,
        width: f32,
        height: f32,
        /// Child time in seconds, keyed by this layer's local frame.
        time_remapping: Option<Arc<KeyframeGroup<f32>>>,
    },
    Null,
    /// A layer type the compiler has no node for.
    Unsupported {
        type_code: u8,
    },
}

impl LayerContent {
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerContent::Solid { .. } => "solid",
            LayerContent::Shape { .. } => "shape",
            LayerContent::Image { .. } => "image",
            LayerContent::Text { .. } => "text",
            LayerContent::PreComp { .. } => "precomp",
            LayerContent::Null => "null",
            LayerContent::Unsupported { .. } => "unsupported",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerModel {
    pub name: String,
    /// Unique within the layer's sibling list.
    pub index: i64,
    pub parent: Option<i64>,
    pub in_frame: AnimationFrameTime,
    pub out_frame: AnimationFrameTime,
    pub start_time: AnimationFrameTime,
    pub time_stretch: f32,
    pub transform: Transform,
    pub hidden: bool,
    pub blend_mode: BlendMode,
    /// Matte applied using the layer directly above this one.
    pub matte: Option<MatteType>,
    pub masks: Vec<Mask>,
    pub content: LayerContent,
}

impl LayerModel {
    /// A visible layer spanning frames 0 to 60 with an identity transform.
    pub fn new(content: LayerContent) -> Self {
        LayerModel {
            name: String::new(),
            index: 0,
            parent: None,
            in_frame: 0.0,
            out_frame: 60.0,
            start_time: 0.0,
            time_stretch: 1.0,
            transform: Transform::default(),
            hidden: false,
            blend_mode: BlendMode::Normal,
            matte: None,
            masks: Vec::new(),
            content,
        }
    }
}
