//! Conversion from the serialized document structs into the typed model.

use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};
use lottie_data::model as data;
use tracing::debug;

use crate::bezier::BezierPath;
use crate::error::{CompileError, CompileResult};
use crate::keyframes::{Keyframe, KeyframeGroup};
use crate::model::{
    AnimationDocument, AssetLibrary, BlendMode, CustomPath, DashElement, DashKind, Ellipse, Fill,
    GradientFill, GradientStroke, ImageAsset, LayerContent, LayerModel, Marker, Mask, MaskMode,
    MatteType, Merge, PathDirection, PrecompAsset, Rectangle, Repeater, ShapeItem, ShapeKind,
    Star, StarType, Stroke, TextDocument, TextJustification, Transform, Trim, TrimType,
};
use crate::node::{FillRule, GradientType, LineCap, LineJoin};

pub(super) fn document(raw: &data::LottieJson) -> CompileResult<AnimationDocument> {
    let mut assets = AssetLibrary::default();
    for asset in &raw.assets {
        match &asset.layers {
            Some(layers) => {
                let precomp = PrecompAsset {
                    id: asset.id.clone(),
                    layers: layers_from(layers)?,
                };
                assets.precomps.insert(asset.id.clone(), precomp);
            }
            None => {
                let image = ImageAsset {
                    id: asset.id.clone(),
                    width: asset.w.unwrap_or(0) as f32,
                    height: asset.h.unwrap_or(0) as f32,
                    directory: asset.u.clone().unwrap_or_default(),
                    name: asset.p.clone().unwrap_or_default(),
                };
                assets.images.insert(asset.id.clone(), image);
            }
        }
    }

    let markers = raw
        .markers
        .iter()
        .map(|marker| Marker {
            name: marker.cm.clone(),
            frame: marker.tm,
            duration_frames: marker.dr,
        })
        .collect();

    Ok(AnimationDocument {
        start_frame: raw.ip,
        end_frame: raw.op,
        framerate: raw.fr,
        width: raw.w as f32,
        height: raw.h as f32,
        layers: layers_from(&raw.layers)?,
        markers,
        assets,
    })
}

fn layers_from(layers: &[data::Layer]) -> CompileResult<Vec<LayerModel>> {
    layers
        .iter()
        .enumerate()
        .map(|(position, layer)| layer_from(layer, position))
        .collect()
}

fn layer_from(raw: &data::Layer, position: usize) -> CompileResult<LayerModel> {
    let name = raw.nm.clone().unwrap_or_default();
    let masks = raw
        .masks_properties
        .iter()
        .flatten()
        .map(mask_from)
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(LayerModel {
        index: raw.ind.unwrap_or(position as i64),
        parent: raw.parent,
        in_frame: raw.ip,
        out_frame: raw.op,
        start_time: raw.st,
        time_stretch: raw.sr,
        transform: transform_from(&raw.ks)?,
        hidden: raw.hd,
        blend_mode: BlendMode::from_code(raw.bm),
        matte: raw.tt.and_then(MatteType::from_code),
        masks,
        content: content_from(raw, &name)?,
        name,
    })
}

fn content_from(raw: &data::Layer, name: &str) -> CompileResult<LayerContent> {
    let content = match raw.ty {
        0 => LayerContent::PreComp {
            reference_id: raw.ref_id.clone().unwrap_or_default(),
            width: raw.w.unwrap_or(0) as f32,
            height: raw.h.unwrap_or(0) as f32,
            time_remapping: raw
                .tm
                .as_ref()
                .map(|tm| scalar(tm, 0.0))
                .transpose()?
                .map(Arc::new),
        },
        1 => LayerContent::Solid {
            color: raw
                .color
                .as_deref()
                .and_then(hex_color)
                .unwrap_or(Vec4::new(0.0, 0.0, 0.0, 1.0)),
            width: raw.sw.unwrap_or(0) as f32,
            height: raw.sh.unwrap_or(0) as f32,
        },
        2 => LayerContent::Image {
            reference_id: raw.ref_id.clone().unwrap_or_default(),
        },
        3 => LayerContent::Null,
        4 => LayerContent::Shape {
            items: shapes_from(raw.shapes.as_deref().unwrap_or_default())?,
        },
        5 => match &raw.t {
            Some(text) => LayerContent::Text {
                document: track(&text.d, TextDocument::default(), text_document_from)?,
                has_animators: text.a.as_ref().map_or(false, |a| !a.is_empty()),
            },
            None => {
                return Err(CompileError::invalid_document(format!(
                    "text layer \"{name}\" has no text data"
                )))
            }
        },
        other => LayerContent::Unsupported { type_code: other },
    };
    Ok(content)
}

/// Parses `#rrggbb` (or `#rrggbbaa`) into a 0..1 color.
fn hex_color(hex: &str) -> Option<Vec4> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 && digits.len() != 8 {
        return None;
    }
    let channel = |index: usize| {
        digits
            .get(index * 2..index * 2 + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .map(|value| value as f32 / 255.0)
    };
    let alpha = if digits.len() == 8 { channel(3)? } else { 1.0 };
    Some(Vec4::new(channel(0)?, channel(1)?, channel(2)?, alpha))
}

fn mask_from(raw: &data::MaskProperties) -> CompileResult<Mask> {
    Ok(Mask {
        name: raw.nm.clone().unwrap_or_default(),
        mode: raw.mode.as_deref().map_or(MaskMode::Add, MaskMode::from_code),
        inverted: raw.inv,
        shape: track(&raw.pt, BezierPath::default(), BezierPath::from_data)?,
        opacity: scalar(&raw.o, 100.0)?,
        expansion: scalar(&raw.x, 0.0)?,
    })
}

fn transform_from(raw: &data::Transform) -> CompileResult<Transform> {
    let (position, position_x, position_y) = match &raw.p {
        data::PositionProperty::Unified(property) => {
            let position = match property.k {
                data::Value::Default => None,
                _ => Some(track(property, Vec3::ZERO, |p| Vec3::from(p.0))?),
            };
            (position, None, None)
        }
        data::PositionProperty::Split { x, y, .. } => {
            (None, Some(scalar(x, 0.0)?), Some(scalar(y, 0.0)?))
        }
    };

    let optional = |property: &Option<data::Property<f32>>| -> CompileResult<Option<KeyframeGroup<f32>>> {
        property.as_ref().map(|p| scalar(p, 0.0)).transpose()
    };

    Ok(Transform {
        anchor: track(&raw.a, Vec3::ZERO, |a| Vec3::from(a.0))?,
        position,
        position_x,
        position_y,
        scale: track(&raw.s, Vec3::splat(100.0), |s| Vec3::from(s.0))?,
        rotation_x: optional(&raw.rx)?.unwrap_or_else(|| KeyframeGroup::from_value(0.0)),
        rotation_y: optional(&raw.ry)?.unwrap_or_else(|| KeyframeGroup::from_value(0.0)),
        rotation_z: scalar(&raw.rz, 0.0)?,
        opacity: scalar(&raw.o, 100.0)?,
        skew: optional(&raw.sk)?,
        skew_axis: optional(&raw.sa)?,
    })
}

fn shapes_from(shapes: &[data::Shape]) -> CompileResult<Vec<ShapeItem>> {
    let mut items = Vec::with_capacity(shapes.len());
    for shape in shapes {
        match shape_from(shape)? {
            Some(item) => items.push(item),
            None => debug!(shape = shape.type_tag(), "skipping unknown shape item"),
        }
    }
    Ok(items)
}

fn shape_from(shape: &data::Shape) -> CompileResult<Option<ShapeItem>> {
    let item = |name: &Option<String>, hidden: bool, kind: ShapeKind| ShapeItem {
        name: name.clone().unwrap_or_default(),
        hidden,
        kind,
    };

    let item = match shape {
        data::Shape::Group(group) => item(&group.nm, group.hd, ShapeKind::Group(shapes_from(&group.it)?)),
        data::Shape::Rect(rect) => item(
            &rect.nm,
            rect.hd,
            ShapeKind::Rectangle(Rectangle {
                direction: PathDirection::from_code(rect.d),
                position: point(&rect.p)?,
                size: point(&rect.s)?,
                corner_radius: scalar(&rect.r, 0.0)?,
            }),
        ),
        data::Shape::Ellipse(ellipse) => item(
            &ellipse.nm,
            ellipse.hd,
            ShapeKind::Ellipse(Ellipse {
                direction: PathDirection::from_code(ellipse.d),
                position: point(&ellipse.p)?,
                size: point(&ellipse.s)?,
            }),
        ),
        data::Shape::Polystar(star) => {
            let optional = |p: &Option<data::Property<f32>>| p.as_ref().map(|p| scalar(p, 0.0)).transpose();
            item(
                &star.nm,
                star.hd,
                ShapeKind::Star(Star {
                    direction: PathDirection::from_code(star.d),
                    position: track(&star.p, Vec2::ZERO, |p| Vec2::new(p.0[0], p.0[1]))?,
                    outer_radius: scalar(&star.or, 0.0)?,
                    outer_roundness: scalar(&star.os, 0.0)?,
                    inner_radius: optional(&star.ir)?,
                    inner_roundness: optional(&star.is)?,
                    rotation: scalar(&star.r, 0.0)?,
                    points: scalar(&star.pt, 5.0)?,
                    star_type: if star.sy == 2 {
                        StarType::Polygon
                    } else {
                        StarType::Star
                    },
                }),
            )
        }
        data::Shape::Path(path) => item(
            &path.nm,
            path.hd,
            ShapeKind::Shape(CustomPath {
                direction: PathDirection::from_code(path.d),
                path: track(&path.ks, BezierPath::default(), BezierPath::from_data)?,
            }),
        ),
        data::Shape::Fill(fill) => item(
            &fill.nm,
            fill.hd,
            ShapeKind::Fill(Fill {
                color: color(&fill.c)?,
                opacity: scalar(&fill.o, 100.0)?,
                fill_rule: fill_rule(fill.r),
            }),
        ),
        data::Shape::Stroke(stroke) => item(
            &stroke.nm,
            stroke.hd,
            ShapeKind::Stroke(Stroke {
                color: color(&stroke.c)?,
                opacity: scalar(&stroke.o, 100.0)?,
                width: scalar(&stroke.w, 1.0)?,
                line_cap: line_cap(stroke.lc),
                line_join: line_join(stroke.lj),
                miter_limit: stroke.ml.unwrap_or(4.0),
                dash: dash_from(&stroke.d)?,
            }),
        ),
        data::Shape::GradientFill(fill) => item(
            &fill.nm,
            fill.hd,
            ShapeKind::GradientFill(GradientFill {
                opacity: scalar(&fill.o, 100.0)?,
                start_point: point(&fill.s)?,
                end_point: point(&fill.e)?,
                gradient_type: gradient_type(fill.t),
                color_count: fill.g.p as usize,
                colors: track(&fill.g.k, Vec::new(), Clone::clone)?,
                highlight_length: fill.h.as_ref().map(|h| scalar(h, 0.0)).transpose()?,
                highlight_angle: fill.a.as_ref().map(|a| scalar(a, 0.0)).transpose()?,
                fill_rule: fill_rule(fill.r),
            }),
        ),
        data::Shape::GradientStroke(stroke) => item(
            &stroke.nm,
            stroke.hd,
            ShapeKind::GradientStroke(GradientStroke {
                opacity: scalar(&stroke.o, 100.0)?,
                width: scalar(&stroke.w, 1.0)?,
                start_point: point(&stroke.s)?,
                end_point: point(&stroke.e)?,
                gradient_type: gradient_type(stroke.t),
                color_count: stroke.g.p as usize,
                colors: track(&stroke.g.k, Vec::new(), Clone::clone)?,
                line_cap: line_cap(stroke.lc),
                line_join: line_join(stroke.lj),
                miter_limit: stroke.ml.unwrap_or(4.0),
                dash: dash_from(&stroke.d)?,
            }),
        ),
        data::Shape::Trim(trim) => item(
            &trim.nm,
            trim.hd,
            ShapeKind::Trim(Trim {
                start: scalar(&trim.s, 0.0)?,
                end: scalar(&trim.e, 100.0)?,
                offset: scalar(&trim.o, 0.0)?,
                trim_type: if trim.m == 2 {
                    TrimType::Individually
                } else {
                    TrimType::Simultaneously
                },
            }),
        ),
        data::Shape::Transform(transform) => item(
            &transform.nm,
            transform.hd,
            ShapeKind::Transform(transform_from(&transform.t)?),
        ),
        data::Shape::Repeater(repeater) => item(
            &repeater.nm,
            repeater.hd,
            ShapeKind::Repeater(Repeater {
                copies: scalar(&repeater.c, 1.0)?,
                offset: scalar(&repeater.o, 0.0)?,
                transform: transform_from(&repeater.tr.t)?,
                start_opacity: scalar(&repeater.tr.so, 100.0)?,
                end_opacity: scalar(&repeater.tr.eo, 100.0)?,
            }),
        ),
        data::Shape::MergePaths(merge) => item(
            &merge.nm,
            merge.hd,
            ShapeKind::Merge(Merge { mode: merge.mm }),
        ),
        data::Shape::Unknown => return Ok(None),
    };
    Ok(Some(item))
}

fn dash_from(dashes: &[data::DashProperty]) -> CompileResult<Vec<DashElement>> {
    dashes
        .iter()
        .map(|dash| {
            let kind = match dash.n.as_deref() {
                Some("g") => DashKind::Gap,
                Some("o") => DashKind::Offset,
                _ => DashKind::Dash,
            };
            Ok(DashElement {
                kind,
                value: scalar(&dash.v, 0.0)?,
            })
        })
        .collect()
}

fn fill_rule(code: Option<u8>) -> FillRule {
    match code {
        Some(2) => FillRule::EvenOdd,
        _ => FillRule::NonZero,
    }
}

fn line_cap(code: u8) -> LineCap {
    match code {
        2 => LineCap::Round,
        3 => LineCap::Square,
        _ => LineCap::Butt,
    }
}

fn line_join(code: u8) -> LineJoin {
    match code {
        2 => LineJoin::Round,
        3 => LineJoin::Bevel,
        _ => LineJoin::Miter,
    }
}

fn gradient_type(code: u8) -> GradientType {
    match code {
        2 => GradientType::Radial,
        _ => GradientType::Linear,
    }
}

fn text_document_from(raw: &data::TextDocument) -> TextDocument {
    TextDocument {
        text: raw.t.clone(),
        font_family: raw.f.clone(),
        font_size: raw.s,
        justification: match raw.j {
            1 => TextJustification::Right,
            2 => TextJustification::Center,
            _ => TextJustification::Left,
        },
        tracking: raw.tr,
        line_height: raw.lh,
        fill_color: raw.fc.map(|c| Vec4::from(c.0)),
        stroke_color: raw.sc.map(|c| Vec4::from(c.0)),
        stroke_width: raw.sw.unwrap_or(0.0),
        stroke_over_fill: raw.of.unwrap_or(false),
    }
}

fn scalar(property: &data::Property<f32>, fallback: f32) -> CompileResult<KeyframeGroup<f32>> {
    track(property, fallback, |v| *v)
}

fn point(property: &data::Property<data::Vec2>) -> CompileResult<KeyframeGroup<Vec2>> {
    track(property, Vec2::ZERO, |p| Vec2::from(*p))
}

fn color(property: &data::Property<data::ColorValue>) -> CompileResult<KeyframeGroup<Vec4>> {
    track(property, Vec4::new(0.0, 0.0, 0.0, 1.0), |c| Vec4::from(c.0))
}

fn easing(handle: Option<data::EasingHandle>) -> Option<Vec2> {
    handle.map(|h| Vec2::new(h.x, h.y))
}

fn spatial(tangent: &Option<Vec<f32>>) -> Option<Vec3> {
    tangent.as_ref().map(|components| {
        let component = |index: usize| components.get(index).copied().unwrap_or(0.0);
        Vec3::new(component(0), component(1), component(2))
    })
}

/// Converts a serialized property into a keyframe track.
///
/// Serialized keyframes describe spans: each one carries the tangents that
/// leave it and the tangents that arrive at its successor, and a span's end
/// value doubles as the next keyframe's value when that one has none.
fn track<T, U>(
    property: &data::Property<T>,
    fallback: U,
    convert: impl Fn(&T) -> U,
) -> CompileResult<KeyframeGroup<U>> {
    let raw_keyframes = match &property.k {
        data::Value::Default => return Ok(KeyframeGroup::from_value(fallback)),
        data::Value::Static(value) => return Ok(KeyframeGroup::from_value(convert(value))),
        data::Value::Animated(keyframes) => keyframes,
    };

    let mut keyframes = Vec::with_capacity(raw_keyframes.len());
    let mut previous: Option<&data::Keyframe<T>> = None;
    for raw in raw_keyframes {
        let value = raw
            .s
            .as_ref()
            .or_else(|| previous.and_then(|p| p.e.as_ref()))
            .ok_or_else(|| {
                CompileError::invalid_document(format!("keyframe at frame {} has no value", raw.t))
            })?;

        keyframes.push(Keyframe {
            value: convert(value),
            time: raw.t,
            is_hold: raw.is_hold(),
            in_tangent: previous.and_then(|p| easing(p.i)),
            out_tangent: easing(raw.o),
            spatial_in_tangent: previous.and_then(|p| spatial(&p.ti)),
            spatial_out_tangent: spatial(&raw.to),
        });
        previous = Some(raw);
    }
    Ok(KeyframeGroup::new(keyframes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyframe_tangents_come_from_the_previous_span() {
        let property: data::Property<f32> = serde_json::from_value(json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [0], "e": [50], "o": { "x": [0.3], "y": [0.0] }, "i": { "x": [0.7], "y": [1.0] } },
                { "t": 10, "s": [50], "e": [50], "h": 1 },
                { "t": 20 }
            ]
        }))
        .unwrap();

        let group = scalar(&property, 0.0).unwrap();
        let keyframes = group.keyframes();
        assert_eq!(keyframes.len(), 3);
        assert_eq!(keyframes[0].out_tangent, Some(Vec2::new(0.3, 0.0)));
        assert_eq!(keyframes[0].in_tangent, None);
        assert_eq!(keyframes[1].in_tangent, Some(Vec2::new(0.7, 1.0)));
        assert!(keyframes[1].is_hold);
        assert_eq!(keyframes[2].value, 50.0);
    }

    #[test]
    fn missing_keyframe_value_is_invalid() {
        let property: data::Property<f32> = serde_json::from_value(json!({
            "a": 1,
            "k": [{ "t": 0 }, { "t": 10, "s": [1] }]
        }))
        .unwrap();
        assert!(matches!(
            scalar(&property, 0.0),
            Err(CompileError::InvalidDocument(_))
        ));
    }

    #[test]
    fn hex_colors() {
        assert_eq!(hex_color("#ff0000"), Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(hex_color("00ff0080").map(|c| c.y), Some(1.0));
        assert_eq!(hex_color("#fff"), None);
    }

    #[test]
    fn layer_payloads_by_type() {
        let data = json!({
            "ip": 0, "op": 60, "fr": 30, "w": 200, "h": 100,
            "layers": [
                { "ty": 1, "nm": "Solid", "ind": 1, "sc": "#00ff00", "sw": 20, "sh": 10, "ip": 0, "op": 60 },
                { "ty": 3, "nm": "Null", "ind": 2, "ip": 0, "op": 60 },
                { "ty": 9, "nm": "Audio", "ind": 3, "ip": 0, "op": 60 },
                { "ty": 4, "nm": "Shapes", "ind": 4, "ip": 0, "op": 60, "tt": 2,
                  "shapes": [{ "ty": "zz" }, { "ty": "fl", "c": { "a": 0, "k": [1, 0, 0] }, "o": { "a": 0, "k": 100 }, "r": 2 }] }
            ]
        });
        let raw = lottie_data::from_str(&data.to_string()).unwrap();
        let document = AnimationDocument::try_from(&raw).unwrap();
        assert!(matches!(
            document.layers[0].content,
            LayerContent::Solid { width, .. } if width == 20.0
        ));
        assert!(matches!(document.layers[1].content, LayerContent::Null));
        assert!(matches!(
            document.layers[2].content,
            LayerContent::Unsupported { type_code: 9 }
        ));
        assert_eq!(document.layers[3].matte, Some(MatteType::Invert));
        let LayerContent::Shape { items } = &document.layers[3].content else {
            panic!("Expected a shape layer");
        };
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0].kind, ShapeKind::Fill(fill) if fill.fill_rule == FillRule::EvenOdd));
    }
}
