//! The abstract animation backend: property values, animatable key paths
//! and the timed animation records attached to compiled nodes.

use glam::{Mat4, Vec2, Vec4};
use kurbo::BezPath;
use serde::{Deserialize, Serialize};

use crate::animatable::Interpolatable;

/// A value the backend can store on a node or interpolate in an animation.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Scalar(f32),
    Point(Vec2),
    Color(Vec4),
    Path(BezPath),
    Transform(Mat4),
    ScalarList(Vec<f32>),
    ColorList(Vec<Vec4>),
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Scalar(_) => "scalar",
            PropertyValue::Point(_) => "point",
            PropertyValue::Color(_) => "color",
            PropertyValue::Path(_) => "path",
            PropertyValue::Transform(_) => "transform",
            PropertyValue::ScalarList(_) => "scalar list",
            PropertyValue::ColorList(_) => "color list",
        }
    }
}

impl Interpolatable for PropertyValue {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        use PropertyValue::*;
        match (self, other) {
            (Scalar(a), Scalar(b)) => Scalar(Interpolatable::lerp(a, b, t)),
            (Point(a), Point(b)) => Point(Vec2::lerp(*a, *b, t)),
            (Color(a), Color(b)) => Color(Vec4::lerp(*a, *b, t)),
            (Transform(a), Transform(b)) => Transform(a.lerp(b, t)),
            (ScalarList(a), ScalarList(b)) => ScalarList(a.lerp(b, t)),
            (ColorList(a), ColorList(b)) => ColorList(a.lerp(b, t)),
            _ if t < 1.0 => self.clone(),
            _ => other.clone(),
        }
    }
}

/// Conversion between a typed property value and the backend value set.
pub trait BackendValue: Clone + PartialEq {
    fn into_property_value(self) -> PropertyValue;
    fn from_property_value(value: &PropertyValue) -> Option<Self>;
}

macro_rules! backend_value {
    ($ty:ty, $variant:ident) => {
        impl BackendValue for $ty {
            fn into_property_value(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }

            fn from_property_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for PropertyValue {
            fn from(value: $ty) -> Self {
                PropertyValue::$variant(value)
            }
        }
    };
}

backend_value!(bool, Bool);
backend_value!(f32, Scalar);
backend_value!(Vec2, Point);
backend_value!(Vec4, Color);
backend_value!(BezPath, Path);
backend_value!(Mat4, Transform);
backend_value!(Vec<f32>, ScalarList);
backend_value!(Vec<Vec4>, ColorList);

/// Property names that external value providers can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyName {
    Color,
}

impl PropertyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyName::Color => "Color",
        }
    }
}

/// An animatable backend key path.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProperty<V> {
    pub key_path: &'static str,
    /// The value a fresh node reports for this key path, if it has one.
    pub default_value: Option<V>,
    pub customizable: Option<PropertyName>,
    /// Keyframes are emitted as a path the value travels along.
    pub motion_path: bool,
}

impl<V> LayerProperty<V> {
    fn new(key_path: &'static str, default_value: Option<V>) -> Self {
        LayerProperty {
            key_path,
            default_value,
            customizable: None,
            motion_path: false,
        }
    }

    fn customizable(mut self, name: PropertyName) -> Self {
        self.customizable = Some(name);
        self
    }
}

impl LayerProperty<Vec2> {
    pub fn translation() -> Self {
        LayerProperty {
            motion_path: true,
            ..LayerProperty::new("transform.translation", Some(Vec2::ZERO))
        }
    }

    pub fn anchor_point() -> Self {
        LayerProperty::new("anchorPoint", Some(Vec2::ZERO))
    }

    pub fn start_point() -> Self {
        LayerProperty::new("startPoint", None)
    }

    pub fn end_point() -> Self {
        LayerProperty::new("endPoint", None)
    }
}

impl LayerProperty<f32> {
    pub fn translation_x() -> Self {
        LayerProperty::new("transform.translation.x", Some(0.0))
    }

    pub fn translation_y() -> Self {
        LayerProperty::new("transform.translation.y", Some(0.0))
    }

    pub fn scale_x() -> Self {
        LayerProperty::new("transform.scale.x", Some(1.0))
    }

    pub fn scale_y() -> Self {
        LayerProperty::new("transform.scale.y", Some(1.0))
    }

    pub fn rotation_x() -> Self {
        LayerProperty::new("transform.rotation.x", Some(0.0))
    }

    pub fn rotation_y() -> Self {
        LayerProperty::new("transform.rotation.y", Some(0.0))
    }

    pub fn rotation_z() -> Self {
        LayerProperty::new("transform.rotation.z", Some(0.0))
    }

    pub fn opacity() -> Self {
        LayerProperty::new("opacity", Some(1.0))
    }

    pub fn line_width() -> Self {
        LayerProperty::new("lineWidth", Some(1.0))
    }

    pub fn line_dash_phase() -> Self {
        LayerProperty::new("lineDashPhase", Some(0.0))
    }

    pub fn stroke_start() -> Self {
        LayerProperty::new("strokeStart", Some(0.0))
    }

    pub fn stroke_end() -> Self {
        LayerProperty::new("strokeEnd", Some(1.0))
    }
}

impl LayerProperty<bool> {
    pub fn hidden() -> Self {
        LayerProperty::new("hidden", Some(false))
    }
}

impl LayerProperty<Mat4> {
    pub fn transform() -> Self {
        LayerProperty::new("transform", Some(Mat4::IDENTITY))
    }
}

impl LayerProperty<BezPath> {
    pub fn path() -> Self {
        LayerProperty::new("path", None)
    }
}

impl LayerProperty<Vec4> {
    pub fn fill_color() -> Self {
        LayerProperty::new("fillColor", None).customizable(PropertyName::Color)
    }

    pub fn stroke_color() -> Self {
        LayerProperty::new("strokeColor", None).customizable(PropertyName::Color)
    }
}

impl LayerProperty<Vec<Vec4>> {
    pub fn colors() -> Self {
        LayerProperty::new("colors", None)
    }
}

impl LayerProperty<Vec<f32>> {
    pub fn locations() -> Self {
        LayerProperty::new("locations", None)
    }
}

/// Cubic timing function through (0,0), `c1`, `c2`, (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingCurve {
    pub c1: Vec2,
    pub c2: Vec2,
}

impl TimingCurve {
    pub const LINEAR: TimingCurve = TimingCurve {
        c1: Vec2::ZERO,
        c2: Vec2::ONE,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationMode {
    Linear,
    Discrete,
}

/// Per-key-time values, or a motion path, over a normalized time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeAnimation {
    pub values: Vec<PropertyValue>,
    pub path: Option<BezPath>,
    pub key_times: Vec<f32>,
    pub timing_curves: Vec<TimingCurve>,
    pub calculation_mode: CalculationMode,
}

/// One mode segment of a sequenced animation. `begin` and `duration` are
/// fractions of the parent duration.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedAnimation {
    pub begin: f32,
    pub duration: f32,
    pub animation: KeyframeAnimation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationBody {
    Basic {
        from: PropertyValue,
        to: PropertyValue,
    },
    Keyframe(KeyframeAnimation),
    Sequence(Vec<SequencedAnimation>),
}

/// Playback settings copied onto every emitted animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfiguration {
    pub speed: f32,
    pub time_offset_seconds: f32,
    pub repeat_count: f32,
    pub autoreverses: bool,
}

impl Default for TimingConfiguration {
    fn default() -> Self {
        TimingConfiguration {
            speed: 1.0,
            time_offset_seconds: 0.0,
            repeat_count: 1.0,
            autoreverses: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTiming {
    pub start_frame: f32,
    pub end_frame: f32,
    pub duration_seconds: f32,
    pub speed: f32,
    pub time_offset_seconds: f32,
    pub repeat_count: f32,
    pub autoreverses: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedAnimation {
    pub key_path: String,
    pub timing: AnimationTiming,
    pub body: AnimationBody,
}

impl TimedAnimation {
    /// Every key time list carried by this animation.
    pub fn key_time_lists(&self) -> Vec<&[f32]> {
        match &self.body {
            AnimationBody::Basic { .. } => Vec::new(),
            AnimationBody::Keyframe(animation) => vec![animation.key_times.as_slice()],
            AnimationBody::Sequence(segments) => segments
                .iter()
                .map(|segment| segment.animation.key_times.as_slice())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_values_round_trip_through_their_variant() {
        let value = Vec4::new(1.0, 0.0, 0.0, 1.0).into_property_value();
        assert_eq!(value.kind(), "color");
        assert_eq!(Vec4::from_property_value(&value), Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(f32::from_property_value(&value), None);
    }

    #[test]
    fn customizable_properties() {
        assert_eq!(LayerProperty::fill_color().customizable, Some(PropertyName::Color));
        assert_eq!(LayerProperty::opacity().customizable, None);
        assert!(LayerProperty::translation().motion_path);
    }

    #[test]
    fn property_values_interpolate_within_a_variant() {
        let a = PropertyValue::Scalar(0.0);
        let b = PropertyValue::Scalar(10.0);
        assert_eq!(a.lerp(&b, 0.5), PropertyValue::Scalar(5.0));
        let flag = PropertyValue::Bool(true);
        assert_eq!(a.lerp(&flag, 0.5), a);
    }

    #[test]
    fn points_and_colors_interpolate_componentwise() {
        let from = PropertyValue::Point(Vec2::new(0.0, 10.0));
        let to = PropertyValue::Point(Vec2::new(20.0, 30.0));
        assert_eq!(from.lerp(&to, 0.5), PropertyValue::Point(Vec2::new(10.0, 20.0)));

        let black = PropertyValue::Color(Vec4::new(0.0, 0.0, 0.0, 1.0));
        let white = PropertyValue::Color(Vec4::ONE);
        assert_eq!(
            black.lerp(&white, 0.25),
            PropertyValue::Color(Vec4::new(0.25, 0.25, 0.25, 1.0))
        );
    }
}
