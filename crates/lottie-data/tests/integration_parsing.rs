use lottie_data::model::{Layer, PositionProperty, Shape, Value};

const DOCUMENT: &str = r#"{
    "v": "5.7.4", "ip": 0, "op": 90, "fr": 30, "w": 200, "h": 200,
    "markers": [{ "cm": "intro", "tm": 0, "dr": 30 }],
    "assets": [
        { "id": "comp_0", "layers": [
            { "ty": 3, "ind": 1, "nm": "Null", "ip": 0, "op": 90, "ks": {} }
        ] },
        { "id": "image_0", "w": 10, "h": 10, "u": "", "p": "data:image/png;base64,AAAA", "e": 1 }
    ],
    "layers": [
        { "ty": 4, "ind": 1, "nm": "Matte", "td": 1, "ip": 0, "op": 90, "ks": {},
          "shapes": [ { "ty": "el", "s": { "a": 0, "k": [40, 40] }, "p": { "a": 0, "k": [0, 0] } } ] },
        { "ty": 0, "ind": 2, "nm": "Comp", "tt": 2, "refId": "comp_0", "w": 200, "h": 200,
          "ip": 0, "op": 90, "sr": 2, "st": 5,
          "tm": { "a": 1, "k": [ { "t": 0, "s": [0] }, { "t": 90, "s": [3] } ] },
          "ks": { "p": { "a": 1, "k": [
              { "t": 0, "s": [0, 0, 0], "to": [10, 0, 0], "ti": [0, 0, 0],
                "i": { "x": 0.5, "y": 1 }, "o": { "x": 0.5, "y": 0 } },
              { "t": 30, "s": [100, 0, 0] } ] } },
          "masksProperties": [
              { "inv": true, "mode": "s", "o": { "a": 0, "k": 100 },
                "pt": { "a": 0, "k": { "c": true, "v": [[0,0],[10,0],[10,10]], "i": [[0,0],[0,0],[0,0]], "o": [[0,0],[0,0],[0,0]] } } }
          ] }
    ]
}"#;

fn layer<'a>(layers: &'a [Layer], name: &str) -> &'a Layer {
    layers
        .iter()
        .find(|layer| layer.nm.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("missing layer {name}"))
}

#[test]
fn test_parse_document_with_precomp_and_mattes() {
    let lottie = lottie_data::from_str(DOCUMENT).expect("document should decode");
    assert_eq!(lottie.markers.len(), 1);
    assert_eq!(lottie.markers[0].cm, "intro");
    assert_eq!(lottie.assets.len(), 2);

    let matte = layer(&lottie.layers, "Matte");
    assert_eq!(matte.td, Some(1));
    assert!(matches!(matte.shapes.as_deref(), Some([Shape::Ellipse(_)])));

    let comp = layer(&lottie.layers, "Comp");
    assert_eq!(comp.tt, Some(2));
    assert_eq!(comp.sr, 2.0);
    assert_eq!(comp.st, 5.0);
    assert!(comp.tm.is_some());

    let masks = comp.masks_properties.as_ref().expect("masks");
    assert_eq!(masks[0].mode.as_deref(), Some("s"));
    assert!(masks[0].inv);
    match &masks[0].pt.k {
        Value::Static(path) => assert_eq!(path.v.len(), 3),
        other => panic!("Expected static path, got {:?}", other),
    }
}

#[test]
fn test_parse_spatial_position_keyframes() {
    let lottie = lottie_data::from_slice(DOCUMENT.as_bytes()).expect("document should decode");
    let comp = layer(&lottie.layers, "Comp");
    let PositionProperty::Unified(position) = &comp.ks.p else {
        panic!("Expected unified position");
    };
    let Value::Animated(keyframes) = &position.k else {
        panic!("Expected animated position");
    };
    assert_eq!(keyframes.len(), 2);
    assert_eq!(keyframes[0].to.as_deref(), Some(&[10.0, 0.0, 0.0][..]));
    assert_eq!(keyframes[1].s.map(|v| v.0), Some([100.0, 0.0, 0.0]));
}
