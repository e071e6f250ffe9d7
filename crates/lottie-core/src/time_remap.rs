use std::sync::Arc;

use crate::keyframes::{AnimationFrameTime, KeyframeGroup};

/// Invertible mapping from a subtree's local frame to the root's global
/// frame: `global = local * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleTimeRemapping {
    pub scale: f32,
    pub offset: f32,
}

impl Default for SimpleTimeRemapping {
    fn default() -> Self {
        SimpleTimeRemapping::IDENTITY
    }
}

impl SimpleTimeRemapping {
    pub const IDENTITY: SimpleTimeRemapping = SimpleTimeRemapping {
        scale: 1.0,
        offset: 0.0,
    };

    pub fn resolve(&self, local: AnimationFrameTime) -> AnimationFrameTime {
        local * self.scale + self.offset
    }

    pub fn inverse(&self, global: AnimationFrameTime) -> Option<AnimationFrameTime> {
        (self.scale != 0.0).then(|| (global - self.offset) / self.scale)
    }

    /// Composes a nested precomp whose local time maps into this subtree's
    /// local time as `local * time_stretch + start_time`.
    pub fn nested(&self, start_time: f32, time_stretch: f32) -> Self {
        SimpleTimeRemapping {
            scale: self.scale * time_stretch,
            offset: self.scale * start_time + self.offset,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == SimpleTimeRemapping::IDENTITY
    }
}

/// One level of a global-to-local mapping chain.
#[derive(Debug, Clone)]
pub enum TimeRemapStep {
    /// A precomp's `start_time`/`time_stretch`, applied in reverse.
    Affine { start_time: f32, time_stretch: f32 },
    /// Explicit remapping keyframes whose values are seconds of child time.
    Keyframes {
        track: Arc<KeyframeGroup<f32>>,
        framerate: f32,
    },
}

impl TimeRemapStep {
    fn apply(&self, parent: AnimationFrameTime) -> AnimationFrameTime {
        match self {
            TimeRemapStep::Affine {
                start_time,
                time_stretch,
            } => {
                if *time_stretch == 0.0 {
                    parent - start_time
                } else {
                    (parent - start_time) / time_stretch
                }
            }
            TimeRemapStep::Keyframes { track, framerate } => track
                .value_at(parent)
                .map_or(parent, |seconds| seconds * framerate),
        }
    }
}

/// Possibly non-invertible mapping from global frame to local frame.
#[derive(Debug, Clone, Default)]
pub struct ComplexTimeRemapping {
    steps: Vec<TimeRemapStep>,
}

impl ComplexTimeRemapping {
    pub fn resolve(&self, global: AnimationFrameTime) -> AnimationFrameTime {
        self.steps.iter().fold(global, |time, step| step.apply(time))
    }

    pub fn push(&mut self, step: TimeRemapStep) {
        self.steps.push(step);
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[TimeRemapStep] {
        &self.steps
    }
}
