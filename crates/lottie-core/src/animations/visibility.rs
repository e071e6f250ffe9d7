use crate::backend::{
    AnimationBody, CalculationMode, KeyframeAnimation, LayerProperty, PropertyValue, TimedAnimation,
};
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::keyframes::{AnimationFrameTime, Keyframe, KeyframeGroup};
use crate::node::LayerNode;

impl LayerNode {
    /// Hides the node outside of `[in_frame, out_frame)`.
    pub(crate) fn add_visibility_animation(
        &mut self,
        in_frame: AnimationFrameTime,
        out_frame: AnimationFrameTime,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        if context.must_use_complex_time_remapping {
            let hidden = KeyframeGroup::new(vec![
                Keyframe::hold(true, 0.0),
                Keyframe::hold(false, in_frame),
                Keyframe::hold(true, out_frame),
            ]);
            return self.add_animation(&LayerProperty::hidden(), &hidden, |h| *h, context, tracker);
        }

        let shown_at = context.progress_time(in_frame).clamp(0.0, 1.0);
        let hidden_at = if context.simple_time_remapping.resolve(out_frame) == context.end_frame {
            1.0
        } else {
            context.progress_time(out_frame).clamp(0.0, 1.0)
        };

        self.add_timed_animation(TimedAnimation {
            key_path: LayerProperty::hidden().key_path.to_string(),
            timing: context.animation_timing(),
            body: AnimationBody::Keyframe(KeyframeAnimation {
                values: vec![
                    PropertyValue::Bool(true),
                    PropertyValue::Bool(false),
                    PropertyValue::Bool(true),
                ],
                path: None,
                key_times: vec![0.0, shown_at, hidden_at, 1.0],
                timing_curves: Vec::new(),
                calculation_mode: CalculationMode::Discrete,
            }),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::TimingConfiguration;
    use crate::compatibility::CompatibilityMode;
    use crate::value_providers::ValueProviderStore;

    fn context() -> LayerAnimationContext {
        LayerAnimationContext::new(
            0.0,
            100.0,
            30.0,
            TimingConfiguration::default(),
            Arc::new(ValueProviderStore::default()),
        )
    }

    fn key_times(node: &LayerNode) -> Vec<f32> {
        node.animation("hidden").unwrap().key_time_lists()[0].to_vec()
    }

    #[test]
    fn visibility_window_maps_to_progress() {
        let mut node = LayerNode::container("layer");
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        node.add_visibility_animation(20.0, 60.0, &context(), &mut tracker).unwrap();
        assert_eq!(key_times(&node), vec![0.0, 0.2, 0.6, 1.0]);
    }

    #[test]
    fn precomp_children_follow_the_remapping() {
        let mut node = LayerNode::container("layer");
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        let child = context().with_simple_time_remapping(10.0, 1.0);
        node.add_visibility_animation(0.0, 90.0, &child, &mut tracker).unwrap();
        // Out frame 90 lands on the end of the animation.
        assert_eq!(key_times(&node), vec![0.0, 0.1, 1.0, 1.0]);
    }

    #[test]
    fn complex_remapping_samples_every_frame() {
        let mut node = LayerNode::container("layer");
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        let track = Arc::new(KeyframeGroup::from_value(1.0));
        let remapped = context().with_complex_time_remapping(track);
        node.add_visibility_animation(0.0, 20.0, &remapped, &mut tracker).unwrap();
        match &node.animation("hidden").unwrap().body {
            AnimationBody::Keyframe(animation) => {
                // Child time is frozen at frame 30, past the out frame.
                assert!(animation.values.iter().all(|v| *v == PropertyValue::Bool(true)));
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}
