use glam::{Vec2, Vec3};

use crate::compatibility::CompatibilityTracker;
use crate::error::CompileResult;

/// Frame number on a composition's time axis.
pub type AnimationFrameTime = f32;

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe<T> {
    pub value: T,
    pub time: AnimationFrameTime,
    /// Holds `value` until the next keyframe instead of interpolating.
    pub is_hold: bool,
    /// Easing control point arriving at this keyframe.
    pub in_tangent: Option<Vec2>,
    /// Easing control point leaving this keyframe.
    pub out_tangent: Option<Vec2>,
    pub spatial_in_tangent: Option<Vec3>,
    pub spatial_out_tangent: Option<Vec3>,
}

impl<T> Keyframe<T> {
    /// A linearly interpolated keyframe.
    pub fn new(value: T, time: AnimationFrameTime) -> Self {
        Keyframe {
            value,
            time,
            is_hold: false,
            in_tangent: None,
            out_tangent: None,
            spatial_in_tangent: None,
            spatial_out_tangent: None,
        }
    }

    pub fn hold(value: T, time: AnimationFrameTime) -> Self {
        Keyframe {
            is_hold: true,
            ..Keyframe::new(value, time)
        }
    }

    /// Copies this keyframe's timing onto a new value.
    pub fn with_value<U>(&self, value: U) -> Keyframe<U> {
        Keyframe {
            value,
            time: self.time,
            is_hold: self.is_hold,
            in_tangent: self.in_tangent,
            out_tangent: self.out_tangent,
            spatial_in_tangent: self.spatial_in_tangent,
            spatial_out_tangent: self.spatial_out_tangent,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Keyframe<U> {
        Keyframe {
            value: f(self.value),
            time: self.time,
            is_hold: self.is_hold,
            in_tangent: self.in_tangent,
            out_tangent: self.out_tangent,
            spatial_in_tangent: self.spatial_in_tangent,
            spatial_out_tangent: self.spatial_out_tangent,
        }
    }

    pub fn timing(&self) -> KeyframeTiming {
        KeyframeTiming {
            time: self.time,
            is_hold: self.is_hold,
            in_tangent: self.in_tangent,
            out_tangent: self.out_tangent,
        }
    }

    pub fn has_spatial_tangents(&self) -> bool {
        let non_zero = |t: Option<Vec3>| t.map_or(false, |t| t != Vec3::ZERO);
        non_zero(self.spatial_in_tangent) || non_zero(self.spatial_out_tangent)
    }
}

/// The timing half of a keyframe. Spatial tangents are deliberately left
/// out: two tracks whose timings match can share keyframe times even when
/// their spatial paths differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeTiming {
    pub time: AnimationFrameTime,
    pub is_hold: bool,
    pub in_tangent: Option<Vec2>,
    pub out_tangent: Option<Vec2>,
}

impl KeyframeTiming {
    pub fn keyframe<T>(&self, value: T) -> Keyframe<T> {
        Keyframe {
            value,
            time: self.time,
            is_hold: self.is_hold,
            in_tangent: self.in_tangent,
            out_tangent: self.out_tangent,
            spatial_in_tangent: None,
            spatial_out_tangent: None,
        }
    }
}

/// An ordered keyframe track.
///
/// Zero keyframes means the property is not animated, one keyframe is a
/// static value and two or more form an animated track.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeGroup<T> {
    keyframes: Vec<Keyframe<T>>,
}

impl<T> Default for KeyframeGroup<T> {
    fn default() -> Self {
        KeyframeGroup {
            keyframes: Vec::new(),
        }
    }
}

impl<T> KeyframeGroup<T> {
    /// Builds a track, ordering keyframes by time. Keyframes sharing a time
    /// keep their relative order.
    pub fn new(mut keyframes: Vec<Keyframe<T>>) -> Self {
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        KeyframeGroup { keyframes }
    }

    pub fn from_value(value: T) -> Self {
        KeyframeGroup {
            keyframes: vec![Keyframe::new(value, 0.0)],
        }
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    pub fn into_keyframes(self) -> Vec<Keyframe<T>> {
        self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn is_animated(&self) -> bool {
        self.keyframes.len() > 1
    }

    pub fn first_value(&self) -> Option<&T> {
        self.keyframes.first().map(|kf| &kf.value)
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> KeyframeGroup<U> {
        KeyframeGroup {
            keyframes: self
                .keyframes
                .iter()
                .map(|kf| kf.with_value(f(&kf.value)))
                .collect(),
        }
    }

    pub fn any_value(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.keyframes.iter().any(|kf| predicate(&kf.value))
    }

    pub fn all_values(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.keyframes.iter().all(|kf| predicate(&kf.value))
    }

    pub fn start_time(&self) -> Option<AnimationFrameTime> {
        self.keyframes.first().map(|kf| kf.time)
    }

    pub fn end_time(&self) -> Option<AnimationFrameTime> {
        self.keyframes.last().map(|kf| kf.time)
    }
}

impl<T: Clone> KeyframeGroup<T> {
    /// Splits the track into maximal runs that share one interpolation mode.
    ///
    /// The mode of the span between two keyframes is decided by the earlier
    /// keyframe's `is_hold`. A keyframe where the mode changes closes one
    /// segment and opens the next, so consecutive segments share their
    /// boundary time. Tracks with fewer than two keyframes yield no segments.
    pub fn segments_split_by_mode(&self) -> Vec<KeyframeSegment<T>> {
        let count = self.keyframes.len();
        if count < 2 {
            return Vec::new();
        }

        let mut segments = Vec::new();
        let mut start = 0;
        for index in 1..count - 1 {
            if self.keyframes[index].is_hold != self.keyframes[start].is_hold {
                segments.push(self.segment(start, index));
                start = index;
            }
        }
        segments.push(self.segment(start, count - 1));
        segments
    }

    fn segment(&self, start: usize, end: usize) -> KeyframeSegment<T> {
        let mode = SegmentMode::of(self.keyframes[start].is_hold);
        let keyframes = self.keyframes[start..=end]
            .iter()
            .map(|kf| Keyframe {
                is_hold: mode == SegmentMode::Discrete,
                ..kf.clone()
            })
            .collect();
        KeyframeSegment { mode, keyframes }
    }

    /// Returns the single value of a property that cannot be animated.
    ///
    /// An animated track is reported as a compatibility issue and rendered
    /// with its first value.
    pub fn exactly_one_keyframe(
        &self,
        tracker: &mut CompatibilityTracker,
        context: &str,
        description: &str,
    ) -> CompileResult<T>
    where
        T: Default,
    {
        match self.keyframes.as_slice() {
            [] => {
                tracker.log_issue(
                    format!("{description} has no keyframes; using a default value"),
                    context,
                )?;
                Ok(T::default())
            }
            [only] => Ok(only.value.clone()),
            [first, ..] => {
                tracker.log_issue(
                    format!(
                        "Animating {description} is not supported; \
                         rendering its first keyframe statically"
                    ),
                    context,
                )?;
                Ok(first.value.clone())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Interpolated,
    Discrete,
}

impl SegmentMode {
    pub fn of(is_hold: bool) -> Self {
        if is_hold {
            SegmentMode::Discrete
        } else {
            SegmentMode::Interpolated
        }
    }
}

/// A run of keyframes sharing one interpolation mode.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeSegment<T> {
    pub mode: SegmentMode,
    pub keyframes: Vec<Keyframe<T>>,
}

impl<T> KeyframeSegment<T> {
    pub fn start_time(&self) -> AnimationFrameTime {
        self.keyframes.first().map_or(0.0, |kf| kf.time)
    }

    pub fn end_time(&self) -> AnimationFrameTime {
        self.keyframes.last().map_or(0.0, |kf| kf.time)
    }
}
