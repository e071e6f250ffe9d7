use serde::{de::DeserializeOwned, de::SeqAccess, Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LottieJson {
    #[serde(default)]
    pub v: Option<String>,
    pub ip: f32,
    pub op: f32,
    pub fr: f32,
    pub w: u32,
    pub h: u32,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Marker {
    #[serde(default)]
    pub cm: String,
    #[serde(default)]
    pub tm: f32,
    #[serde(default)]
    pub dr: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Layer {
    #[serde(default)]
    pub ty: u8,
    #[serde(default)]
    pub ind: Option<i64>,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub ip: f32,
    #[serde(default)]
    pub op: f32,
    #[serde(default)]
    pub st: f32,
    #[serde(default = "default_stretch")]
    pub sr: f32,
    #[serde(default)]
    pub ks: Transform,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub bm: u8,
    /// Matte mode applied to this layer using the layer above it.
    #[serde(default)]
    pub tt: Option<u8>,
    /// Set on the layer that acts as a matte source.
    #[serde(default)]
    pub td: Option<u8>,
    #[serde(default)]
    pub tm: Option<Property<f32>>,

    #[serde(default, rename = "masksProperties")]
    pub masks_properties: Option<Vec<MaskProperties>>,

    // Type specific payloads
    #[serde(default, rename = "refId")]
    pub ref_id: Option<String>, // PreComp, Image
    #[serde(default)]
    pub w: Option<u32>, // PreComp
    #[serde(default)]
    pub h: Option<u32>, // PreComp
    #[serde(default, rename = "sc")]
    pub color: Option<String>, // Solid color
    #[serde(default)]
    pub sw: Option<u32>, // Solid width
    #[serde(default)]
    pub sh: Option<u32>, // Solid height
    #[serde(default)]
    pub shapes: Option<Vec<Shape>>, // Shape Layer
    #[serde(default)]
    pub t: Option<TextData>, // Text Layer
}

fn default_stretch() -> f32 {
    1.0
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaskProperties {
    #[serde(default)]
    pub inv: bool,
    #[serde(default)]
    pub mode: Option<String>,
    pub pt: Property<BezierPath>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub x: Property<f32>,
    #[serde(default)]
    pub nm: Option<String>,
}

// Shapes

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "ty")]
pub enum Shape {
    #[serde(rename = "gr")]
    Group(GroupShape),
    #[serde(rename = "rc")]
    Rect(RectShape),
    #[serde(rename = "el")]
    Ellipse(EllipseShape),
    #[serde(rename = "fl")]
    Fill(FillShape),
    #[serde(rename = "st")]
    Stroke(StrokeShape),
    #[serde(rename = "gf")]
    GradientFill(GradientFillShape),
    #[serde(rename = "gs")]
    GradientStroke(GradientStrokeShape),
    #[serde(rename = "tr")]
    Transform(TransformShape),
    #[serde(rename = "sh")]
    Path(PathShape),
    #[serde(rename = "tm")]
    Trim(TrimShape),
    #[serde(rename = "sr")]
    Polystar(PolystarShape),
    #[serde(rename = "rp")]
    Repeater(RepeaterShape),
    #[serde(rename = "mm")]
    MergePaths(MergePathsShape),
    #[serde(other)]
    Unknown,
}

impl Shape {
    /// Short type tag, used when reporting skipped items.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Shape::Group(_) => "gr",
            Shape::Rect(_) => "rc",
            Shape::Ellipse(_) => "el",
            Shape::Fill(_) => "fl",
            Shape::Stroke(_) => "st",
            Shape::GradientFill(_) => "gf",
            Shape::GradientStroke(_) => "gs",
            Shape::Transform(_) => "tr",
            Shape::Path(_) => "sh",
            Shape::Trim(_) => "tm",
            Shape::Polystar(_) => "sr",
            Shape::Repeater(_) => "rp",
            Shape::MergePaths(_) => "mm",
            Shape::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergePathsShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub mm: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolystarShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    #[serde(default)]
    pub p: Property<Vec3DefaultZero>,
    pub or: Property<f32>,
    #[serde(default)]
    pub os: Property<f32>,
    #[serde(default)]
    pub r: Property<f32>,
    pub pt: Property<f32>,
    #[serde(default = "default_star_type")]
    pub sy: u8,
    #[serde(default)]
    pub ir: Option<Property<f32>>,
    #[serde(default)]
    pub is: Option<Property<f32>>,
}

fn default_star_type() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepeaterShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub c: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub m: u8,
    pub tr: RepeaterTransform,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepeaterTransform {
    #[serde(flatten)]
    pub t: Transform,
    #[serde(default)]
    pub so: Property<f32>,
    #[serde(default)]
    pub eo: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub it: Vec<Shape>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RectShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    pub s: Property<Vec2>,
    pub p: Property<Vec2>,
    #[serde(default)]
    pub r: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EllipseShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    pub s: Property<Vec2>,
    pub p: Property<Vec2>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FillShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub c: Property<ColorValue>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub r: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StrokeShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub c: Property<ColorValue>,
    pub w: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub lc: u8,
    #[serde(default)]
    pub lj: u8,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashProperty {
    #[serde(default)]
    pub n: Option<String>,
    pub v: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GradientFillShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub o: Property<f32>,
    pub s: Property<Vec2>,
    pub e: Property<Vec2>,
    #[serde(default = "default_gradient_type")]
    pub t: u8,
    pub g: GradientColors,
    #[serde(default)]
    pub r: Option<u8>,
    #[serde(default)]
    pub h: Option<Property<f32>>,
    #[serde(default)]
    pub a: Option<Property<f32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GradientStrokeShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub o: Property<f32>,
    pub w: Property<f32>,
    pub s: Property<Vec2>,
    pub e: Property<Vec2>,
    #[serde(default = "default_gradient_type")]
    pub t: u8,
    pub g: GradientColors,
    #[serde(default)]
    pub lc: u8,
    #[serde(default)]
    pub lj: u8,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

fn default_gradient_type() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GradientColors {
    pub p: u32,
    pub k: Property<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    pub ks: Property<BezierPath>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrimShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub s: Property<f32>,
    pub e: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub m: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransformShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(flatten)]
    pub t: Transform,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Transform {
    #[serde(default)]
    pub a: Property<Vec3DefaultZero>,
    #[serde(default)]
    pub p: PositionProperty,
    #[serde(default)]
    pub s: Property<Vec3Scale>,
    #[serde(default, alias = "r")]
    pub rz: Property<f32>,
    #[serde(default)]
    pub rx: Option<Property<f32>>,
    #[serde(default)]
    pub ry: Option<Property<f32>>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub sk: Option<Property<f32>>,
    #[serde(default)]
    pub sa: Option<Property<f32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum PositionProperty {
    Split {
        #[serde(default)]
        s: bool,
        x: Property<f32>,
        y: Property<f32>,
        #[serde(default)]
        z: Option<Property<f32>>,
    },
    Unified(Property<Vec3DefaultZero>),
}

impl Default for PositionProperty {
    fn default() -> Self {
        PositionProperty::Unified(Property::default())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property<T> {
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    #[serde(bound(deserialize = "T: DeserializeOwned"))]
    pub k: Value<T>,
    #[serde(default)]
    pub ix: Option<u32>,
    #[serde(default)]
    pub x: Option<String>,
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            ix: None,
            x: None,
        }
    }
}

impl<T> Property<T> {
    pub fn from_static(value: T) -> Self {
        Property {
            k: Value::Static(value),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub enum Value<T> {
    Default,
    Static(T),
    Animated(Vec<Keyframe<T>>),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;

        if v.is_null() {
            return Ok(Value::Default);
        }

        // A keyframe list is an array of objects carrying a `t` field.
        let is_keyframe_list = v
            .as_array()
            .and_then(|items| items.first())
            .map_or(false, |first| first.get("t").is_some());

        if is_keyframe_list {
            let keyframes = serde_json::from_value::<Vec<Keyframe<T>>>(v)
                .map_err(serde::de::Error::custom)?;
            return Ok(Value::Animated(keyframes));
        }

        if let Ok(val) = serde_json::from_value::<T>(v.clone()) {
            return Ok(Value::Static(val));
        }

        if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
            if let Some(first) = vec.into_iter().next() {
                return Ok(Value::Static(first));
            }
        }

        Ok(Value::Default)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Default
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Keyframe<T> {
    pub t: f32,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub s: Option<T>,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub e: Option<T>,
    #[serde(default)]
    pub i: Option<EasingHandle>,
    #[serde(default)]
    pub o: Option<EasingHandle>,
    #[serde(default)]
    pub to: Option<Vec<f32>>,
    #[serde(default)]
    pub ti: Option<Vec<f32>>,
    #[serde(default)]
    pub h: Option<u8>,
}

impl<T> Keyframe<T> {
    pub fn is_hold(&self) -> bool {
        self.h == Some(1)
    }
}

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    if let Ok(val) = serde_json::from_value(v.clone()) {
        return Ok(Some(val));
    }

    if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
        if let Some(first) = vec.into_iter().next() {
            return Ok(Some(first));
        }
    }

    Ok(None)
}

pub type Vec2 = [f32; 2];
pub type Vec3 = [f32; 3];
pub type Vec4 = [f32; 4];

/// Easing control point of a keyframe. Exported documents store each axis
/// either as a number or as a per-dimension array; only the first
/// dimension is kept.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct EasingHandle {
    pub x: f32,
    pub y: f32,
}

impl<'de> Deserialize<'de> for EasingHandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Axis {
            Scalar(f32),
            List(Vec<f32>),
        }

        impl Axis {
            fn first(&self) -> f32 {
                match self {
                    Axis::Scalar(v) => *v,
                    Axis::List(values) => values.first().copied().unwrap_or(0.0),
                }
            }
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Object { x: Axis, y: Axis },
            Pair(Vec<f32>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Object { x, y } => Ok(EasingHandle {
                x: x.first(),
                y: y.first(),
            }),
            Raw::Pair(values) => Ok(EasingHandle {
                x: values.first().copied().unwrap_or(0.0),
                y: values.get(1).copied().unwrap_or(0.0),
            }),
        }
    }
}

fn visit_padded<'de, A>(mut seq: A, defaults: [f32; 4]) -> Result<[f32; 4], A::Error>
where
    A: SeqAccess<'de>,
{
    let mut out = defaults;
    let mut index = 0;
    while let Some(component) = seq.next_element::<f32>()? {
        if index < out.len() {
            out[index] = component;
        }
        index += 1;
    }
    Ok(out)
}

macro_rules! padded_vector {
    ($name:ident, $len:expr, $defaults:expr, $expecting:expr) => {
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                struct PaddedVisitor;
                impl<'de> serde::de::Visitor<'de> for PaddedVisitor {
                    type Value = $name;
                    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                        formatter.write_str($expecting)
                    }
                    fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
                    where
                        A: SeqAccess<'de>,
                    {
                        let padded = visit_padded(seq, $defaults)?;
                        let mut out = [0.0; $len];
                        out.copy_from_slice(&padded[..$len]);
                        Ok($name(out))
                    }
                }
                deserializer.deserialize_seq(PaddedVisitor)
            }
        }
    };
}

/// Three component vector whose missing `z` is zero.
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq)]
pub struct Vec3DefaultZero(pub Vec3);

/// Three component scale whose missing `z` is 100%.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Vec3Scale(pub Vec3);

impl Default for Vec3Scale {
    fn default() -> Self {
        Vec3Scale([100.0, 100.0, 100.0])
    }
}

/// RGBA color in 0..1 components; a missing alpha is opaque.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ColorValue(pub Vec4);

impl Default for ColorValue {
    fn default() -> Self {
        ColorValue([0.0, 0.0, 0.0, 1.0])
    }
}

padded_vector!(
    Vec3DefaultZero,
    3,
    [0.0, 0.0, 0.0, 0.0],
    "a sequence of 2 or 3 floats"
);
padded_vector!(
    Vec3Scale,
    3,
    [100.0, 100.0, 100.0, 0.0],
    "a sequence of 2 or 3 floats"
);
padded_vector!(
    ColorValue,
    4,
    [0.0, 0.0, 0.0, 1.0],
    "a sequence of 3 or 4 color components"
);

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BezierPath {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<Vec2>,
    #[serde(default)]
    pub o: Vec<Vec2>,
    #[serde(default)]
    pub v: Vec<Vec2>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub layers: Option<Vec<Layer>>,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
    #[serde(default)]
    pub u: Option<String>,
    #[serde(default)]
    pub p: Option<String>,
    #[serde(default)]
    pub e: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextData {
    pub d: Property<TextDocument>,
    #[serde(default)]
    pub a: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TextDocument {
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub f: String,
    #[serde(default)]
    pub s: f32,
    #[serde(default)]
    pub j: u8,
    #[serde(default)]
    pub tr: f32,
    #[serde(default)]
    pub lh: f32,
    #[serde(default)]
    pub fc: Option<ColorValue>,
    #[serde(default)]
    pub sc: Option<ColorValue>,
    #[serde(default)]
    pub sw: Option<f32>,
    #[serde(default)]
    pub of: Option<bool>,
}
