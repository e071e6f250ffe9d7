use glam::Vec2;

use crate::animatable::Interpolatable;
use crate::keyframes::{AnimationFrameTime, Keyframe, KeyframeGroup, KeyframeTiming};

/// Where a combined keyframe reads its component values from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombinedAt {
    /// The keyframe at this index of every animated input.
    Index(usize),
    /// The interpolated value of every input at this frame.
    Frame(AnimationFrameTime),
}

/// Type-erased timing view over a keyframe track, so tracks of different
/// value types can be combined.
pub trait KeyframeTimeline {
    fn keyframe_count(&self) -> usize;
    fn timing(&self, index: usize) -> Option<KeyframeTiming>;
    fn has_spatial_tangents(&self) -> bool;

    fn timings(&self) -> Vec<KeyframeTiming> {
        (0..self.keyframe_count())
            .filter_map(|index| self.timing(index))
            .collect()
    }
}

impl<T> KeyframeTimeline for KeyframeGroup<T> {
    fn keyframe_count(&self) -> usize {
        self.len()
    }

    fn timing(&self, index: usize) -> Option<KeyframeTiming> {
        self.keyframes().get(index).map(Keyframe::timing)
    }

    fn has_spatial_tangents(&self) -> bool {
        self.keyframes().iter().any(Keyframe::has_spatial_tangents)
    }
}

impl<T: Interpolatable> KeyframeGroup<T> {
    /// The component value used when building a combined keyframe. A static
    /// track contributes its only value everywhere.
    pub fn value_for(&self, at: CombinedAt) -> Option<T> {
        match at {
            CombinedAt::Index(_) if self.len() == 1 => self.first_value().cloned(),
            CombinedAt::Index(index) => self.keyframes().get(index).map(|kf| kf.value.clone()),
            CombinedAt::Frame(frame) => self.value_at(frame),
        }
    }
}

fn is_linear_easing(tangent: Option<Vec2>) -> bool {
    tangent.map_or(true, |t| t.x == t.y)
}

/// How a track interpolates between every pair of keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniformTiming {
    Linear,
    Hold,
}

fn uniform_timing(track: &dyn KeyframeTimeline) -> Option<UniformTiming> {
    let timings = track.timings();
    let spans = timings.len().saturating_sub(1);
    let leading = &timings[..spans];

    if leading.iter().all(|t| t.is_hold) {
        return Some(UniformTiming::Hold);
    }

    let linear = !track.has_spatial_tangents()
        && leading.iter().all(|t| !t.is_hold)
        && timings
            .iter()
            .all(|t| is_linear_easing(t.in_tangent) && is_linear_easing(t.out_tangent));
    linear.then_some(UniformTiming::Linear)
}

/// Whether every track has the same keyframe timings.
pub(crate) fn share_timing(groups: &[&dyn KeyframeTimeline]) -> bool {
    match groups.split_first() {
        Some((first, rest)) => {
            let reference = first.timings();
            rest.iter().all(|group| group.timings() == reference)
        }
        None => true,
    }
}

/// Namespace for combining independently keyframed tracks into one track.
pub struct Keyframes;

impl Keyframes {
    /// Combines tracks into one track without losing information, or returns
    /// `None` when that is not possible.
    ///
    /// Static tracks combine with anything. Animated tracks sharing one
    /// timing merge keyframe by keyframe. Animated tracks with different
    /// timings merge over the union of their keyframe times only when all of
    /// them interpolate linearly, or all of them hold.
    pub fn combined_if_possible<R>(
        groups: &[&dyn KeyframeTimeline],
        mut make_combined: impl FnMut(CombinedAt) -> Option<R>,
    ) -> Option<KeyframeGroup<R>> {
        if groups.is_empty() || groups.iter().any(|g| g.keyframe_count() == 0) {
            return None;
        }

        let animated: Vec<&dyn KeyframeTimeline> = groups
            .iter()
            .copied()
            .filter(|g| g.keyframe_count() > 1)
            .collect();

        if let Some(merged) = Self::merged_by_index(groups, &animated, &mut make_combined) {
            return Some(merged);
        }

        let mut modes = animated.iter().map(|g| uniform_timing(*g));
        let first_mode = modes.next().flatten()?;
        if !modes.all(|mode| mode == Some(first_mode)) {
            return None;
        }

        let mut times: Vec<AnimationFrameTime> = animated
            .iter()
            .flat_map(|g| g.timings())
            .map(|t| t.time)
            .collect();
        times.sort_by(f32::total_cmp);
        times.dedup();

        let keyframes = times
            .into_iter()
            .filter_map(|time| {
                make_combined(CombinedAt::Frame(time)).map(|value| match first_mode {
                    UniformTiming::Linear => Keyframe::new(value, time),
                    UniformTiming::Hold => Keyframe::hold(value, time),
                })
            })
            .collect();
        Some(KeyframeGroup::new(keyframes))
    }

    /// Combines tracks, resampling every integer frame when their timings
    /// cannot be merged keyframe by keyframe.
    pub fn combined<R>(
        groups: &[&dyn KeyframeTimeline],
        requires_manual_interpolation: bool,
        mut make_combined: impl FnMut(CombinedAt) -> Option<R>,
    ) -> KeyframeGroup<R> {
        let populated: Vec<&dyn KeyframeTimeline> = groups
            .iter()
            .copied()
            .filter(|g| g.keyframe_count() > 0)
            .collect();
        let animated: Vec<&dyn KeyframeTimeline> = populated
            .iter()
            .copied()
            .filter(|g| g.keyframe_count() > 1)
            .collect();

        if !requires_manual_interpolation {
            if let Some(merged) = Self::merged_by_index(&populated, &animated, &mut make_combined) {
                return merged;
            }
        }

        let times = animated.iter().flat_map(|g| g.timings()).map(|t| t.time);
        let (start, end) = times.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(t), hi.max(t))
        });
        if !start.is_finite() || !end.is_finite() {
            // Nothing animates; a single static value is enough.
            return Self::merged_by_index(&populated, &[], &mut make_combined).unwrap_or_default();
        }

        let mut keyframes = Vec::new();
        let mut frame = start.floor();
        let last = end.ceil();
        while frame <= last {
            if let Some(value) = make_combined(CombinedAt::Frame(frame)) {
                keyframes.push(Keyframe::new(value, frame));
            }
            frame += 1.0;
        }
        KeyframeGroup::new(keyframes)
    }

    fn merged_by_index<R>(
        groups: &[&dyn KeyframeTimeline],
        animated: &[&dyn KeyframeTimeline],
        make_combined: &mut impl FnMut(CombinedAt) -> Option<R>,
    ) -> Option<KeyframeGroup<R>> {
        if !share_timing(animated) {
            return None;
        }
        let base = animated.first().or_else(|| groups.first())?;
        let keyframes = base
            .timings()
            .iter()
            .enumerate()
            .filter_map(|(index, timing)| {
                make_combined(CombinedAt::Index(index)).map(|value| timing.keyframe(value))
            })
            .collect();
        Some(KeyframeGroup::new(keyframes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframes::Keyframe;

    fn track(points: &[(f32, f32)]) -> KeyframeGroup<f32> {
        KeyframeGroup::new(points.iter().map(|&(t, v)| Keyframe::new(v, t)).collect())
    }

    #[test]
    fn static_track_combines_with_animated_track() {
        let size = KeyframeGroup::new(vec![
            Keyframe::new(Vec2::new(100.0, 100.0), 0.0),
            Keyframe::new(Vec2::new(200.0, 100.0), 30.0),
        ]);
        let position = KeyframeGroup::from_value(Vec2::new(50.0, 50.0));

        let combined = Keyframes::combined_if_possible(&[&size, &position], |at| {
            Some((size.value_for(at)?, position.value_for(at)?))
        })
        .expect("static tracks always combine");

        let times: Vec<_> = combined.keyframes().iter().map(|kf| kf.time).collect();
        assert_eq!(times, vec![0.0, 30.0]);
        assert_eq!(combined.keyframes()[0].value.1, Vec2::new(50.0, 50.0));
        assert_eq!(combined.keyframes()[1].value.1, Vec2::new(50.0, 50.0));
        assert_eq!(combined.keyframes()[1].value.0, Vec2::new(200.0, 100.0));
    }

    #[test]
    fn identical_timings_keep_the_shared_time_set() {
        let a = track(&[(0.0, 1.0), (10.0, 2.0), (20.0, 3.0)]);
        let b = track(&[(0.0, 10.0), (10.0, 20.0), (20.0, 30.0)]);
        let combined =
            Keyframes::combined_if_possible(&[&a, &b], |at| Some(a.value_for(at)? + b.value_for(at)?))
                .unwrap();
        let pairs: Vec<_> = combined.keyframes().iter().map(|kf| (kf.time, kf.value)).collect();
        assert_eq!(pairs, vec![(0.0, 11.0), (10.0, 22.0), (20.0, 33.0)]);
    }

    #[test]
    fn linear_tracks_merge_over_time_union() {
        let a = track(&[(0.0, 0.0), (10.0, 10.0)]);
        let b = track(&[(0.0, 0.0), (5.0, 50.0), (10.0, 100.0)]);
        let combined =
            Keyframes::combined_if_possible(&[&a, &b], |at| Some((a.value_for(at)?, b.value_for(at)?)))
                .unwrap();
        let times: Vec<_> = combined.keyframes().iter().map(|kf| kf.time).collect();
        assert_eq!(times, vec![0.0, 5.0, 10.0]);
        assert_eq!(combined.keyframes()[1].value, (5.0, 50.0));
    }

    #[test]
    fn eased_tracks_with_different_timings_do_not_combine() {
        let a = track(&[(0.0, 0.0), (10.0, 10.0)]);
        let mut eased = Keyframe::new(0.0, 0.0);
        eased.out_tangent = Some(Vec2::new(0.4, 0.0));
        let b = KeyframeGroup::new(vec![eased, Keyframe::new(1.0, 20.0)]);
        assert!(Keyframes::combined_if_possible(&[&a, &b], |_| Some(())).is_none());
    }

    #[test]
    fn empty_track_prevents_combination() {
        let a = track(&[(0.0, 0.0), (10.0, 10.0)]);
        let empty = KeyframeGroup::<f32>::default();
        assert!(Keyframes::combined_if_possible(&[&a, &empty], |_| Some(())).is_none());
    }

    #[test]
    fn combined_resamples_each_frame() {
        let mut eased = Keyframe::new(0.0, 0.0);
        eased.out_tangent = Some(Vec2::new(0.4, 0.0));
        let a = KeyframeGroup::new(vec![eased, Keyframe::new(1.0, 2.5)]);
        let b = track(&[(1.0, 0.0), (3.0, 1.0)]);
        let combined = Keyframes::combined(&[&a, &b], false, |at| {
            Some(a.value_for(at)? + b.value_for(at)?)
        });
        let times: Vec<_> = combined.keyframes().iter().map(|kf| kf.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0]);
        // `a` has settled on 1.0 by frame 3 and `b` reaches 1.0 there.
        assert!((combined.keyframes()[3].value - 2.0).abs() < 1e-6);
        let halfway = a.value_at(2.0).unwrap_or_default() + 0.5;
        assert!((combined.keyframes()[2].value - halfway).abs() < 1e-6);
    }

    #[test]
    fn combined_merges_identical_timings_unless_forced() {
        let a = track(&[(0.0, 0.0), (4.0, 4.0)]);
        let merged = Keyframes::combined(&[&a], false, |at| a.value_for(at));
        assert_eq!(merged.len(), 2);
        let forced = Keyframes::combined(&[&a], true, |at| a.value_for(at));
        assert_eq!(forced.len(), 5);
    }
}
