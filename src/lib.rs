//! Compiles keyframed vector animation documents into trees of nodes
//! carrying timed backend animations.
//!
//! The work happens in [`lottie_core`]; [`lottie_data`] holds the serde
//! structs for the serialized document.

pub use lottie_core as core;
pub use lottie_data as data;

pub use lottie_core::{
    AnimationCompiler, AnimationDocument, CompatibilityIssue, CompatibilityMode, CompileError, CompileResult,
    CompiledAnimation, CompilerOptions, LayerNode,
};
