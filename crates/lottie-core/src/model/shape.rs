use glam::{Vec2, Vec4};

use crate::bezier::BezierPath;
use crate::keyframes::KeyframeGroup;
use crate::model::Transform;
use crate::node::{FillRule, GradientType, LineCap, LineJoin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathDirection {
    #[default]
    Clockwise,
    UserSetClockwise,
    CounterClockwise,
}

impl PathDirection {
    pub fn from_code(code: Option<u8>) -> Self {
        match code {
            Some(2) => PathDirection::UserSetClockwise,
            Some(3) => PathDirection::CounterClockwise,
            _ => PathDirection::Clockwise,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ellipse {
    pub direction: PathDirection,
    pub position: KeyframeGroup<Vec2>,
    pub size: KeyframeGroup<Vec2>,
}

#[derive(Debug, Clone)]
pub struct Rectangle {
    pub direction: PathDirection,
    pub position: KeyframeGroup<Vec2>,
    pub size: KeyframeGroup<Vec2>,
    pub corner_radius: KeyframeGroup<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarType {
    Star,
    Polygon,
}

#[derive(Debug, Clone)]
pub struct Star {
    pub direction: PathDirection,
    pub position: KeyframeGroup<Vec2>,
    pub outer_radius: KeyframeGroup<f32>,
    /// Percent.
    pub outer_roundness: KeyframeGroup<f32>,
    pub inner_radius: Option<KeyframeGroup<f32>>,
    pub inner_roundness: Option<KeyframeGroup<f32>>,
    /// Degrees.
    pub rotation: KeyframeGroup<f32>,
    pub points: KeyframeGroup<f32>,
    pub star_type: StarType,
}

#[derive(Debug, Clone)]
pub struct CustomPath {
    pub direction: PathDirection,
    pub path: KeyframeGroup<BezierPath>,
}

/// Several arbitrary paths drawn as one, so overlapping regions fill with a
/// single fill rule.
#[derive(Debug, Clone)]
pub struct CombinedShape {
    pub shapes: KeyframeGroup<Vec<BezierPath>>,
}

#[derive(Debug, Clone)]
pub struct Fill {
    pub color: KeyframeGroup<Vec4>,
    /// Percent.
    pub opacity: KeyframeGroup<f32>,
    pub fill_rule: FillRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashKind {
    Dash,
    Gap,
    Offset,
}

#[derive(Debug, Clone)]
pub struct DashElement {
    pub kind: DashKind,
    pub value: KeyframeGroup<f32>,
}

#[derive(Debug, Clone)]
pub struct Stroke {
    pub color: KeyframeGroup<Vec4>,
    pub opacity: KeyframeGroup<f32>,
    pub width: KeyframeGroup<f32>,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    pub dash: Vec<DashElement>,
}

#[derive(Debug, Clone)]
pub struct GradientFill {
    pub opacity: KeyframeGroup<f32>,
    pub start_point: KeyframeGroup<Vec2>,
    pub end_point: KeyframeGroup<Vec2>,
    pub gradient_type: GradientType,
    /// Number of color stops at the front of `colors`. Any values beyond
    /// `4 * color_count` are `(location, alpha)` pairs.
    pub color_count: usize,
    pub colors: KeyframeGroup<Vec<f32>>,
    pub highlight_length: Option<KeyframeGroup<f32>>,
    pub highlight_angle: Option<KeyframeGroup<f32>>,
    pub fill_rule: FillRule,
}

#[derive(Debug, Clone)]
pub struct GradientStroke {
    pub opacity: KeyframeGroup<f32>,
    pub width: KeyframeGroup<f32>,
    pub start_point: KeyframeGroup<Vec2>,
    pub end_point: KeyframeGroup<Vec2>,
    pub gradient_type: GradientType,
    pub color_count: usize,
    pub colors: KeyframeGroup<Vec<f32>>,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    pub dash: Vec<DashElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimType {
    Simultaneously,
    Individually,
}

#[derive(Debug, Clone)]
pub struct Trim {
    /// Percent.
    pub start: KeyframeGroup<f32>,
    pub end: KeyframeGroup<f32>,
    /// Degrees.
    pub offset: KeyframeGroup<f32>,
    pub trim_type: TrimType,
}

#[derive(Debug, Clone)]
pub struct Repeater {
    pub copies: KeyframeGroup<f32>,
    pub offset: KeyframeGroup<f32>,
    pub transform: Transform,
    /// Percent.
    pub start_opacity: KeyframeGroup<f32>,
    pub end_opacity: KeyframeGroup<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub mode: u8,
}

#[derive(Debug, Clone)]
pub enum ShapeKind {
    Group(Vec<ShapeItem>),
    Ellipse(Ellipse),
    Rectangle(Rectangle),
    Star(Star),
    Shape(CustomPath),
    CombinedShape(CombinedShape),
    Fill(Fill),
    GradientFill(GradientFill),
    Stroke(Stroke),
    GradientStroke(GradientStroke),
    Trim(Trim),
    Transform(Transform),
    Repeater(Repeater),
    Merge(Merge),
}

#[derive(Debug, Clone)]
pub struct ShapeItem {
    pub name: String,
    pub hidden: bool,
    pub kind: ShapeKind,
}

impl ShapeItem {
    pub fn new(name: impl Into<String>, kind: ShapeKind) -> Self {
        ShapeItem {
            name: name.into(),
            hidden: false,
            kind,
        }
    }

    /// Whether this item produces geometry.
    pub fn draws_path(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::Ellipse(_)
                | ShapeKind::Rectangle(_)
                | ShapeKind::Star(_)
                | ShapeKind::Shape(_)
                | ShapeKind::CombinedShape(_)
        )
    }

    pub fn is_fill(&self) -> bool {
        matches!(self.kind, ShapeKind::Fill(_) | ShapeKind::GradientFill(_))
    }

    pub fn is_stroke(&self) -> bool {
        matches!(self.kind, ShapeKind::Stroke(_) | ShapeKind::GradientStroke(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ShapeKind::Group(_))
    }

    /// Opacity track of a fill or stroke.
    pub fn paint_opacity(&self) -> Option<&KeyframeGroup<f32>> {
        match &self.kind {
            ShapeKind::Fill(fill) => Some(&fill.opacity),
            ShapeKind::GradientFill(fill) => Some(&fill.opacity),
            ShapeKind::Stroke(stroke) => Some(&stroke.opacity),
            ShapeKind::GradientStroke(stroke) => Some(&stroke.opacity),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ShapeKind::Group(_) => "group",
            ShapeKind::Ellipse(_) => "ellipse",
            ShapeKind::Rectangle(_) => "rectangle",
            ShapeKind::Star(_) => "star",
            ShapeKind::Shape(_) => "shape",
            ShapeKind::CombinedShape(_) => "combined shape",
            ShapeKind::Fill(_) => "fill",
            ShapeKind::GradientFill(_) => "gradient fill",
            ShapeKind::Stroke(_) => "stroke",
            ShapeKind::GradientStroke(_) => "gradient stroke",
            ShapeKind::Trim(_) => "trim",
            ShapeKind::Transform(_) => "transform",
            ShapeKind::Repeater(_) => "repeater",
            ShapeKind::Merge(_) => "merge",
        }
    }
}
