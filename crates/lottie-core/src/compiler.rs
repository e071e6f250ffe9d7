//! Entry point: compiles a document into an animated node tree.

use std::fmt;
use std::sync::Arc;

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::TimingConfiguration;
use crate::compatibility::{CompatibilityIssue, CompatibilityMode, CompatibilityTracker};
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::keypath::AnimationKeypath;
use crate::layers::LayerBuilder;
use crate::model::AnimationDocument;
use crate::node::LayerNode;
use crate::providers::{
    DataUrlImageProvider, DefaultFontProvider, DefaultTextProvider, FontProvider, ImageProvider, TextProvider,
};
use crate::value_providers::{ProviderValue, ValueProviderStore};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub compatibility_mode: CompatibilityMode,
    pub timing: TimingConfiguration,
    /// Merge the paths of a render group into one combined shape even when
    /// their keyframe timings differ, by sampling every frame.
    pub resample_mismatched_combined_shapes: bool,
    /// `(start_frame, end_frame)` to play instead of the document's range.
    pub play_range: Option<(f32, f32)>,
}

impl CompilerOptions {
    pub fn from_json(json: &str) -> CompileResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Collaborators consulted while compiling.
#[derive(Clone)]
pub struct Providers {
    pub image: Arc<dyn ImageProvider>,
    pub text: Arc<dyn TextProvider>,
    pub font: Arc<dyn FontProvider>,
    pub values: ValueProviderStore,
}

impl Default for Providers {
    fn default() -> Self {
        Providers {
            image: Arc::new(DataUrlImageProvider),
            text: Arc::new(DefaultTextProvider),
            font: Arc::new(DefaultFontProvider),
            values: ValueProviderStore::default(),
        }
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnimationCompiler {
    options: CompilerOptions,
    providers: Providers,
}

impl AnimationCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        AnimationCompiler {
            options,
            providers: Providers::default(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn with_image_provider(mut self, provider: impl ImageProvider + 'static) -> Self {
        self.providers.image = Arc::new(provider);
        self
    }

    pub fn with_text_provider(mut self, provider: impl TextProvider + 'static) -> Self {
        self.providers.text = Arc::new(provider);
        self
    }

    pub fn with_font_provider(mut self, provider: impl FontProvider + 'static) -> Self {
        self.providers.font = Arc::new(provider);
        self
    }

    pub fn with_value_provider(mut self, keypath: &str, value: ProviderValue) -> Self {
        self.providers
            .values
            .set_value_provider(AnimationKeypath::parse(keypath), value);
        self
    }

    /// Builds the node tree for `document` and attaches its animations.
    ///
    /// Under [`CompatibilityMode::Abort`] the first compatibility issue is
    /// returned as an error; otherwise issues are collected on the result.
    pub fn compile(&self, document: &AnimationDocument) -> CompileResult<CompiledAnimation> {
        let mut tracker = CompatibilityTracker::new(self.options.compatibility_mode);

        let layers = LayerBuilder::new(document, &self.providers, &self.options, &mut tracker)
            .build_composition(&document.layers)?;

        let mut root = LayerNode::container("Root");
        root.bounds = Some(Rect::new(0.0, 0.0, document.width as f64, document.height as f64));
        root.masks_to_bounds = true;
        for layer in layers {
            root.add_sublayer(layer);
        }

        let (start_frame, end_frame) = self
            .options
            .play_range
            .unwrap_or((document.start_frame, document.end_frame));
        let context = LayerAnimationContext::new(
            start_frame,
            end_frame,
            document.framerate,
            self.options.timing,
            Arc::new(self.providers.values.clone()),
        );
        root.apply_timed_animations(&context, &mut tracker)?;

        let issues = tracker.into_issues();
        info!(
            layers = document.layers.len(),
            nodes = root.node_count(),
            animations = root.animation_count(),
            issues = issues.len(),
            "compiled animation"
        );
        Ok(CompiledAnimation {
            root,
            issues,
            context,
            mode: self.options.compatibility_mode,
        })
    }
}

/// A compiled node tree plus what is needed to re-animate it.
#[derive(Debug, Clone)]
pub struct CompiledAnimation {
    pub root: LayerNode,
    pub issues: Vec<CompatibilityIssue>,
    context: LayerAnimationContext,
    mode: CompatibilityMode,
}

impl CompiledAnimation {
    pub fn context(&self) -> &LayerAnimationContext {
        &self.context
    }

    /// Resolves a keypath below the root, for example `["Layer", "Group"]`.
    pub fn node_for_path(&self, path: &[&str]) -> Option<&LayerNode> {
        self.root.node_for_path(path)
    }

    pub fn node_for_path_mut(&mut self, path: &[&str]) -> Option<&mut LayerNode> {
        self.root.node_for_path_mut(path)
    }

    /// Registers a value override and rebuilds the animations it affects.
    pub fn set_value_provider(&mut self, keypath: &str, value: ProviderValue) -> CompileResult<()> {
        Arc::make_mut(&mut self.context.value_providers)
            .set_value_provider(AnimationKeypath::parse(keypath), value);
        self.reapply()
    }

    /// Replaces the playback settings copied onto every animation.
    pub fn set_timing(&mut self, timing: TimingConfiguration) -> CompileResult<()> {
        self.context.timing = timing;
        self.reapply()
    }

    /// Rebuilds every animation in the tree from the current context.
    pub fn reapply(&mut self) -> CompileResult<()> {
        let mut tracker = CompatibilityTracker::new(self.mode);
        self.root.apply_timed_animations(&self.context, &mut tracker)?;
        for issue in tracker.into_issues() {
            if !self.issues.contains(&issue) {
                self.issues.push(issue);
            }
        }
        debug!(animations = self.root.animation_count(), "reapplied animations");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_load_from_partial_json() {
        let options = CompilerOptions::from_json(
            r#"{"compatibility_mode": "abort", "timing": {"speed": 2.0}, "play_range": [10, 20]}"#,
        )
        .unwrap();
        assert_eq!(options.compatibility_mode, CompatibilityMode::Abort);
        assert_eq!(options.timing.speed, 2.0);
        assert_eq!(options.timing.repeat_count, 1.0);
        assert_eq!(options.play_range, Some((10.0, 20.0)));
        assert!(!options.resample_mismatched_combined_shapes);
    }

    #[test]
    fn empty_document_compiles_to_a_clipped_root() {
        let document = AnimationDocument {
            width: 320.0,
            height: 240.0,
            ..AnimationDocument::default()
        };
        let compiled = AnimationCompiler::default().compile(&document).unwrap();
        assert_eq!(compiled.root.bounds, Some(Rect::new(0.0, 0.0, 320.0, 240.0)));
        assert!(compiled.root.masks_to_bounds);
        assert!(compiled.issues.is_empty());
    }
}
