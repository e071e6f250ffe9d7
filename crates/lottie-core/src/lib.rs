//! Keyframe animation compiler.
//!
//! Walks an [`AnimationDocument`] once and produces a tree of [`LayerNode`]s
//! mirroring the document's layer hierarchy, with every animatable property
//! compiled into backend [`TimedAnimation`]s.
//!
//! ```no_run
//! use lottie_core::{AnimationCompiler, AnimationDocument, CompilerOptions};
//!
//! # fn main() -> lottie_core::CompileResult<()> {
//! let document = AnimationDocument::from_json(r#"{"fr":30,"ip":0,"op":60,"w":100,"h":100,"layers":[]}"#)?;
//! let compiled = AnimationCompiler::new(CompilerOptions::default()).compile(&document)?;
//! for issue in &compiled.issues {
//!     eprintln!("{issue}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod animatable;
pub mod backend;
pub mod bezier;
pub mod combine;
pub mod compatibility;
pub mod compiler;
pub mod context;
pub mod error;
pub mod geometry;
pub mod keyframes;
pub mod keypath;
pub mod model;
pub mod node;
pub mod providers;
pub mod shape_groups;
pub mod time_remap;
pub mod value_providers;

mod animations;
mod emit;
mod hierarchy;
mod layers;
mod masking;

pub use animatable::Interpolatable;
pub use animations::PathMultiplier;
pub use backend::{
    AnimationBody, AnimationTiming, CalculationMode, KeyframeAnimation, LayerProperty, PropertyValue,
    SequencedAnimation, TimedAnimation, TimingConfiguration, TimingCurve,
};
pub use combine::{CombinedAt, Keyframes};
pub use compatibility::{CompatibilityIssue, CompatibilityMode, CompatibilityTracker};
pub use compiler::{AnimationCompiler, CompiledAnimation, CompilerOptions, Providers};
pub use context::LayerAnimationContext;
pub use error::{CompileError, CompileResult};
pub use keyframes::{AnimationFrameTime, Keyframe, KeyframeGroup, KeyframeSegment, SegmentMode};
pub use keypath::AnimationKeypath;
pub use model::AnimationDocument;
pub use node::{CompositingFilter, LayerNode, NodeKind};
pub use providers::{
    DataUrlImageProvider, DefaultFontProvider, DefaultTextProvider, DictionaryTextProvider,
    FilepathImageProvider, FontHandle, FontProvider, ImageData, ImageProvider, InMemoryImageProvider,
    TextProvider,
};
pub use value_providers::{ProviderValue, ValueProviderStore};
