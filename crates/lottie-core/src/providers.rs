//! Pull-based collaborators consulted while compiling image and text
//! layers. Lookups never fail the compilation: an asset that cannot be
//! resolved becomes `None`.

use std::collections::HashMap;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use tracing::{debug, warn};

use crate::error::{CompileError, CompileResult};
use crate::model::ImageAsset;

/// Encoded image bytes (PNG, JPEG, ...) handed to the backend untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub asset_id: String,
    pub bytes: Vec<u8>,
}

pub trait ImageProvider: Send + Sync {
    fn image_for(&self, asset: &ImageAsset) -> Option<ImageData>;
}

/// Decodes images embedded as base64 `data:` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlImageProvider;

impl ImageProvider for DataUrlImageProvider {
    fn image_for(&self, asset: &ImageAsset) -> Option<ImageData> {
        if !asset.is_embedded() {
            debug!(asset = %asset.id, "image is not embedded");
            return None;
        }
        embedded_image(asset)
    }
}

/// Reads images from a directory, falling back to embedded data.
#[derive(Debug, Clone)]
pub struct FilepathImageProvider {
    root: PathBuf,
}

impl FilepathImageProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FilepathImageProvider { root: root.into() }
    }

    fn read(&self, asset: &ImageAsset) -> CompileResult<Vec<u8>> {
        let path = self.root.join(&asset.directory).join(&asset.name);
        Ok(std::fs::read(path)?)
    }
}

impl ImageProvider for FilepathImageProvider {
    fn image_for(&self, asset: &ImageAsset) -> Option<ImageData> {
        if asset.is_embedded() {
            return embedded_image(asset);
        }
        match self.read(asset) {
            Ok(bytes) => Some(ImageData {
                asset_id: asset.id.clone(),
                bytes,
            }),
            Err(error) => {
                warn!(asset = %asset.id, %error, "failed to load image");
                None
            }
        }
    }
}

/// Images supplied up front by the caller, keyed by asset id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryImageProvider {
    images: HashMap<String, Vec<u8>>,
}

impl InMemoryImageProvider {
    pub fn insert(&mut self, asset_id: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(asset_id.into(), bytes);
    }
}

impl ImageProvider for InMemoryImageProvider {
    fn image_for(&self, asset: &ImageAsset) -> Option<ImageData> {
        self.images.get(&asset.id).map(|bytes| ImageData {
            asset_id: asset.id.clone(),
            bytes: bytes.clone(),
        })
    }
}

fn embedded_image(asset: &ImageAsset) -> Option<ImageData> {
    match decode_data_url(&asset.id, &asset.name) {
        Ok(bytes) => Some(ImageData {
            asset_id: asset.id.clone(),
            bytes,
        }),
        Err(error) => {
            warn!(asset = %asset.id, %error, "failed to decode embedded image");
            None
        }
    }
}

pub(crate) fn decode_data_url(asset_id: &str, url: &str) -> CompileResult<Vec<u8>> {
    let failure = |reason: &str| CompileError::AssetDecoding {
        id: asset_id.to_string(),
        reason: reason.to_string(),
    };
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| failure("data URL has no payload"))?;
    if !header.ends_with(";base64") {
        return Err(failure("only base64 data URLs are supported"));
    }
    BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|error| failure(&error.to_string()))
}

/// Supplies the string drawn by a text layer.
pub trait TextProvider: Send + Sync {
    fn text_for(&self, keypath_name: &str, source_text: &str) -> String;
}

/// Draws the text stored in the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTextProvider;

impl TextProvider for DefaultTextProvider {
    fn text_for(&self, _keypath_name: &str, source_text: &str) -> String {
        source_text.to_string()
    }
}

/// Replaces the text of layers by keypath name.
#[derive(Debug, Clone, Default)]
pub struct DictionaryTextProvider {
    values: HashMap<String, String>,
}

impl DictionaryTextProvider {
    pub fn new(values: HashMap<String, String>) -> Self {
        DictionaryTextProvider { values }
    }
}

impl TextProvider for DictionaryTextProvider {
    fn text_for(&self, keypath_name: &str, source_text: &str) -> String {
        self.values
            .get(keypath_name)
            .cloned()
            .unwrap_or_else(|| source_text.to_string())
    }
}

/// A font the backend can draw with.
#[derive(Debug, Clone, PartialEq)]
pub struct FontHandle {
    pub family: String,
    pub size: f32,
}

pub trait FontProvider: Send + Sync {
    fn font_for(&self, family: &str, size: f32) -> Option<FontHandle>;
}

/// Trusts the backend to resolve any family name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFontProvider;

impl FontProvider for DefaultFontProvider {
    fn font_for(&self, family: &str, size: f32) -> Option<FontHandle> {
        Some(FontHandle {
            family: family.to_string(),
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> ImageAsset {
        ImageAsset {
            id: "image_0".into(),
            width: 1.0,
            height: 1.0,
            directory: String::new(),
            name: name.into(),
        }
    }

    #[test]
    fn decodes_base64_data_urls() {
        let url = format!("data:image/png;base64,{}", BASE64_STANDARD.encode([1u8, 2, 3]));
        let image = DataUrlImageProvider.image_for(&asset(&url)).unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn broken_images_become_none() {
        assert!(DataUrlImageProvider
            .image_for(&asset("data:image/png;base64,***"))
            .is_none());
        assert!(DataUrlImageProvider.image_for(&asset("img_0.png")).is_none());
        assert!(FilepathImageProvider::new("/nonexistent")
            .image_for(&asset("img_0.png"))
            .is_none());
        assert!(matches!(
            decode_data_url("a", "data:image/png,raw"),
            Err(CompileError::AssetDecoding { .. })
        ));
    }

    #[test]
    fn dictionary_text_falls_back_to_source() {
        let provider = DictionaryTextProvider::new(HashMap::from([(
            "Title".to_string(),
            "Hello".to_string(),
        )]));
        assert_eq!(provider.text_for("Title", "Source"), "Hello");
        assert_eq!(provider.text_for("Other", "Source"), "Source");
    }
}
