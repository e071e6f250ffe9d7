// lottie-data: Serde structs for the serialized animation document
pub mod model;

use std::io::Read;

use thiserror::Error;

pub use model::LottieJson;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid animation JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Animation has a non-positive framerate: {0}")]
    InvalidFramerate(f32),
}

/// Decodes a document from a JSON string.
pub fn from_str(json: &str) -> Result<LottieJson, DecodeError> {
    validate(serde_json::from_str(json)?)
}

pub fn from_slice(bytes: &[u8]) -> Result<LottieJson, DecodeError> {
    validate(serde_json::from_slice(bytes)?)
}

pub fn from_reader<R: Read>(reader: R) -> Result<LottieJson, DecodeError> {
    validate(serde_json::from_reader(reader)?)
}

fn validate(document: LottieJson) -> Result<LottieJson, DecodeError> {
    if document.fr <= 0.0 {
        return Err(DecodeError::InvalidFramerate(document.fr));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::model::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let data = json!({
            "v": "5.5.2",
            "ip": 0,
            "op": 60,
            "fr": 60,
            "w": 500,
            "h": 500,
            "layers": []
        });
        let lottie: LottieJson = serde_json::from_value(data).unwrap();
        assert_eq!(lottie.w, 500);
        assert!(lottie.markers.is_empty());
    }

    #[test]
    fn test_rejects_zero_framerate() {
        let text = r#"{"ip":0,"op":10,"fr":0,"w":10,"h":10,"layers":[]}"#;
        assert!(matches!(from_str(text), Err(DecodeError::InvalidFramerate(_))));
    }

    #[test]
    fn test_deserialize_shape_layer() {
        let data = json!({
            "v": "5.5.2",
            "ip": 0, "op": 60, "fr": 60, "w": 100, "h": 100,
            "layers": [
                {
                    "ty": 4,
                    "ind": 1,
                    "nm": "MyShape",
                    "ip": 0, "op": 60, "st": 0,
                    "ks": {},
                    "shapes": [
                        {
                            "ty": "rc",
                            "nm": "Rect",
                            "s": { "a": 0, "k": [100, 100] },
                            "p": { "a": 0, "k": [50, 50] },
                            "r": { "a": 0, "k": 0 }
                        },
                        {
                            "ty": "fl",
                            "c": { "a": 0, "k": [1, 0, 0] },
                            "o": { "a": 0, "k": 100 }
                        },
                        { "ty": "zz", "nm": "Zig" }
                    ]
                }
            ]
        });
        let lottie: LottieJson = serde_json::from_value(data).unwrap();
        let layer = &lottie.layers[0];
        assert_eq!(layer.ty, 4);
        assert_eq!(layer.sr, 1.0);
        let shapes = layer.shapes.as_ref().expect("Expected shapes");
        assert_eq!(shapes.len(), 3);
        match &shapes[0] {
            Shape::Rect(rect) => assert_eq!(rect.nm.as_deref(), Some("Rect")),
            other => panic!("Expected Rect, got {:?}", other),
        }
        match &shapes[1] {
            Shape::Fill(fill) => match &fill.c.k {
                Value::Static(color) => assert_eq!(color.0, [1.0, 0.0, 0.0, 1.0]),
                other => panic!("Expected static color, got {:?}", other),
            },
            other => panic!("Expected Fill, got {:?}", other),
        }
        assert!(matches!(shapes[2], Shape::Unknown));
    }

    #[test]
    fn test_keyframe_easing_handles() {
        let data = json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [0], "i": { "x": [0.2], "y": [1] }, "o": { "x": 0.8, "y": 0 } },
                { "t": 10, "s": [50], "h": 1 },
                { "t": 20 }
            ]
        });
        let prop: Property<f32> = serde_json::from_value(data).unwrap();
        let Value::Animated(keyframes) = prop.k else {
            panic!("Expected animated value");
        };
        assert_eq!(keyframes.len(), 3);
        assert_eq!(keyframes[0].s, Some(0.0));
        assert_eq!(keyframes[0].i, Some(EasingHandle { x: 0.2, y: 1.0 }));
        assert_eq!(keyframes[0].o, Some(EasingHandle { x: 0.8, y: 0.0 }));
        assert!(keyframes[1].is_hold());
        assert_eq!(keyframes[2].s, None);
    }

    #[test]
    fn test_split_position() {
        let data = json!({
            "p": { "s": true, "x": { "a": 0, "k": 10 }, "y": { "a": 0, "k": 20 } }
        });
        let transform: Transform = serde_json::from_value(data).unwrap();
        match transform.p {
            PositionProperty::Split { x, y, .. } => {
                assert!(matches!(x.k, Value::Static(v) if v == 10.0));
                assert!(matches!(y.k, Value::Static(v) if v == 20.0));
            }
            other => panic!("Expected split position, got {:?}", other),
        }
        assert_eq!(Vec3Scale::default().0, [100.0, 100.0, 100.0]);
    }
}
