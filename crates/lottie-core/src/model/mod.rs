//! The typed, validated animation document the compiler walks.
//!
//! Built once from the serialized `lottie_data` structs and read-only
//! afterwards. Every animatable field is a [`KeyframeGroup`] in document
//! units (percentages, degrees, frames).

mod decode;
mod layer;
mod shape;

use std::collections::HashMap;

use glam::Vec4;
use lottie_data::LottieJson;

use crate::error::CompileResult;
use crate::keyframes::AnimationFrameTime;

pub use layer::{LayerContent, LayerModel, Mask, MaskMode, MatteType, Transform};
pub use shape::{
    CombinedShape, CustomPath, DashElement, DashKind, Ellipse, Fill, GradientFill,
    GradientStroke, Merge, PathDirection, Rectangle, Repeater, ShapeItem, ShapeKind, Star,
    StarType, Stroke, Trim, TrimType,
};

#[derive(Debug, Clone)]
pub struct AnimationDocument {
    pub start_frame: AnimationFrameTime,
    pub end_frame: AnimationFrameTime,
    pub framerate: f32,
    pub width: f32,
    pub height: f32,
    /// Front to back, in document order.
    pub layers: Vec<LayerModel>,
    pub markers: Vec<Marker>,
    pub assets: AssetLibrary,
}

impl Default for AnimationDocument {
    fn default() -> Self {
        AnimationDocument {
            start_frame: 0.0,
            end_frame: 60.0,
            framerate: 30.0,
            width: 100.0,
            height: 100.0,
            layers: Vec::new(),
            markers: Vec::new(),
            assets: AssetLibrary::default(),
        }
    }
}

impl AnimationDocument {
    pub fn from_json(json: &str) -> CompileResult<Self> {
        let raw = lottie_data::from_str(json)?;
        AnimationDocument::try_from(&raw)
    }

    pub fn from_slice(bytes: &[u8]) -> CompileResult<Self> {
        let raw = lottie_data::from_slice(bytes)?;
        AnimationDocument::try_from(&raw)
    }

    pub fn duration_frames(&self) -> f32 {
        self.end_frame - self.start_frame
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration_frames() / self.framerate
    }

    pub fn marker(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.name == name)
    }

    /// Where the named marker sits on the `[0, 1]` progress axis.
    pub fn progress_for_marker(&self, name: &str) -> Option<f32> {
        let marker = self.marker(name)?;
        let duration = self.duration_frames();
        if duration <= 0.0 {
            return Some(0.0);
        }
        Some(((marker.frame - self.start_frame) / duration).clamp(0.0, 1.0))
    }
}

impl TryFrom<&LottieJson> for AnimationDocument {
    type Error = crate::error::CompileError;

    fn try_from(raw: &LottieJson) -> CompileResult<Self> {
        decode::document(raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: String,
    pub frame: AnimationFrameTime,
    pub duration_frames: f32,
}

#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    pub precomps: HashMap<String, PrecompAsset>,
    pub images: HashMap<String, ImageAsset>,
}

#[derive(Debug, Clone)]
pub struct PrecompAsset {
    pub id: String,
    pub layers: Vec<LayerModel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub id: String,
    pub width: f32,
    pub height: f32,
    /// Directory the image is stored in, relative to the document.
    pub directory: String,
    /// File name, or the whole `data:` URL for embedded images.
    pub name: String,
}

impl ImageAsset {
    pub fn is_embedded(&self) -> bool {
        self.name.starts_with("data:")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextJustification {
    #[default]
    Left,
    Right,
    Center,
}

/// One static state of a text layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextDocument {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub justification: TextJustification,
    pub tracking: f32,
    pub line_height: f32,
    pub fill_color: Option<Vec4>,
    pub stroke_color: Option<Vec4>,
    pub stroke_width: f32,
    pub stroke_over_fill: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => BlendMode::Multiply,
            2 => BlendMode::Screen,
            3 => BlendMode::Overlay,
            4 => BlendMode::Darken,
            5 => BlendMode::Lighten,
            6 => BlendMode::ColorDodge,
            7 => BlendMode::ColorBurn,
            8 => BlendMode::HardLight,
            9 => BlendMode::SoftLight,
            10 => BlendMode::Difference,
            11 => BlendMode::Exclusion,
            12 => BlendMode::Hue,
            13 => BlendMode::Saturation,
            14 => BlendMode::Color,
            15 => BlendMode::Luminosity,
            _ => BlendMode::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn markers_map_to_progress() {
        let data = json!({
            "ip": 0, "op": 100, "fr": 30, "w": 100, "h": 100,
            "layers": [],
            "markers": [{ "cm": "intro", "tm": 25, "dr": 10 }]
        });
        let document = AnimationDocument::from_json(&data.to_string()).unwrap();
        assert_eq!(document.marker("intro").map(|m| m.duration_frames), Some(10.0));
        assert_eq!(document.progress_for_marker("intro"), Some(0.25));
        assert_eq!(document.progress_for_marker("missing"), None);
    }
}
