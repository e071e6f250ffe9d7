use std::sync::Arc;

use crate::backend::{AnimationTiming, TimingConfiguration};
use crate::keyframes::{AnimationFrameTime, KeyframeGroup};
use crate::keypath::AnimationKeypath;
use crate::time_remap::{ComplexTimeRemapping, SimpleTimeRemapping, TimeRemapStep};
use crate::value_providers::ValueProviderStore;

/// Per-node state threaded through animation setup. Descending into a
/// child always works on a copy, so siblings never see each other's changes.
#[derive(Debug, Clone)]
pub struct LayerAnimationContext {
    pub start_frame: AnimationFrameTime,
    pub end_frame: AnimationFrameTime,
    pub framerate: f32,
    pub timing: TimingConfiguration,
    pub current_keypath: AnimationKeypath,
    pub simple_time_remapping: SimpleTimeRemapping,
    pub complex_time_remapping: ComplexTimeRemapping,
    /// Set once a subtree sits below explicit remapping keyframes. Never
    /// cleared for descendants.
    pub must_use_complex_time_remapping: bool,
    pub value_providers: Arc<ValueProviderStore>,
}

impl LayerAnimationContext {
    pub fn new(
        start_frame: AnimationFrameTime,
        end_frame: AnimationFrameTime,
        framerate: f32,
        timing: TimingConfiguration,
        value_providers: Arc<ValueProviderStore>,
    ) -> Self {
        LayerAnimationContext {
            start_frame,
            end_frame,
            framerate,
            timing,
            current_keypath: AnimationKeypath::default(),
            simple_time_remapping: SimpleTimeRemapping::IDENTITY,
            complex_time_remapping: ComplexTimeRemapping::default(),
            must_use_complex_time_remapping: false,
            value_providers,
        }
    }

    pub fn adding_keypath_component(&self, component: &str) -> Self {
        if component.is_empty() {
            return self.clone();
        }
        LayerAnimationContext {
            current_keypath: self.current_keypath.appending(component),
            ..self.clone()
        }
    }

    /// Context for the children of a precomp placed at `start_time` and
    /// played at `time_stretch`.
    pub fn with_simple_time_remapping(&self, start_time: f32, time_stretch: f32) -> Self {
        let mut context = self.clone();
        context.simple_time_remapping = self.simple_time_remapping.nested(start_time, time_stretch);
        context.complex_time_remapping.push(TimeRemapStep::Affine {
            start_time,
            time_stretch,
        });
        context
    }

    /// Context for the children of a precomp with explicit remapping
    /// keyframes, valued in seconds of child time.
    pub fn with_complex_time_remapping(&self, track: Arc<KeyframeGroup<f32>>) -> Self {
        let mut context = self.clone();
        context.complex_time_remapping.push(TimeRemapStep::Keyframes {
            track,
            framerate: self.framerate,
        });
        context.must_use_complex_time_remapping = true;
        context
    }

    /// Context whose keyframes are already expressed in global frames.
    pub fn without_time_remapping(&self) -> Self {
        LayerAnimationContext {
            simple_time_remapping: SimpleTimeRemapping::IDENTITY,
            complex_time_remapping: ComplexTimeRemapping::default(),
            must_use_complex_time_remapping: false,
            ..self.clone()
        }
    }

    pub fn duration_frames(&self) -> f32 {
        self.end_frame - self.start_frame
    }

    /// Maps a local frame to its position on the animation's `[0, 1]` axis.
    /// Frames outside the play range map outside `[0, 1]`.
    pub fn progress_time(&self, frame: AnimationFrameTime) -> f32 {
        let global = self.simple_time_remapping.resolve(frame);
        let duration = self.duration_frames();
        if duration <= 0.0 {
            return 0.0;
        }
        (global - self.start_frame) / duration
    }

    /// The local frames covering the play range, earliest first.
    pub fn local_play_range(&self) -> Option<(AnimationFrameTime, AnimationFrameTime)> {
        let start = self.simple_time_remapping.inverse(self.start_frame)?;
        let end = self.simple_time_remapping.inverse(self.end_frame)?;
        Some((start.min(end), start.max(end)))
    }

    /// Every integer global frame of the animation.
    pub fn global_frames(&self) -> impl Iterator<Item = AnimationFrameTime> {
        let start = self.start_frame.floor() as i64;
        let end = self.end_frame.ceil() as i64;
        (start..=end).map(|frame| frame as f32)
    }

    pub fn animation_timing(&self) -> AnimationTiming {
        AnimationTiming {
            start_frame: self.start_frame,
            end_frame: self.end_frame,
            duration_seconds: if self.framerate > 0.0 {
                self.duration_frames() / self.framerate
            } else {
                0.0
            },
            speed: self.timing.speed,
            time_offset_seconds: self.timing.time_offset_seconds,
            repeat_count: self.timing.repeat_count,
            autoreverses: self.timing.autoreverses,
        }
    }

    /// Context string attached to compatibility issues.
    pub fn compatibility_context(&self) -> String {
        self.current_keypath.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> LayerAnimationContext {
        LayerAnimationContext::new(
            0.0,
            60.0,
            30.0,
            TimingConfiguration::default(),
            Arc::new(ValueProviderStore::default()),
        )
    }

    #[test]
    fn progress_follows_simple_remapping() {
        let child = context().with_simple_time_remapping(0.0, 2.0);
        assert_eq!(child.simple_time_remapping.resolve(10.0), 20.0);
        assert!((child.progress_time(10.0) - 20.0 / 60.0).abs() < 1e-6);
        assert!((child.progress_time(-15.0) + 0.5).abs() < 1e-6);
        assert_eq!(child.local_play_range(), Some((0.0, 30.0)));
    }

    #[test]
    fn complex_flag_propagates() {
        let track = Arc::new(KeyframeGroup::from_value(1.0));
        let remapped = context().with_complex_time_remapping(track);
        let grandchild = remapped
            .adding_keypath_component("Comp")
            .with_simple_time_remapping(5.0, 1.0);
        assert!(grandchild.must_use_complex_time_remapping);
        assert_eq!(grandchild.complex_time_remapping.steps().len(), 2);
        assert!(!grandchild.without_time_remapping().must_use_complex_time_remapping);
    }

    #[test]
    fn timing_uses_framerate() {
        let timing = context().animation_timing();
        assert_eq!(timing.duration_seconds, 2.0);
        assert_eq!(context().global_frames().count(), 61);
    }
}
