use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::bezier::{BezierPath, CurveVertex};
use crate::keyframes::{AnimationFrameTime, Keyframe, KeyframeGroup};
use crate::model::TextDocument;

pub trait Interpolatable: Sized + Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Interpolates along the cubic curve described by spatial tangents.
    /// Values without a spatial interpretation ignore the tangents.
    fn lerp_spatial(
        &self,
        other: &Self,
        t: f32,
        _tan_out: Option<Vec3>,
        _tan_in: Option<Vec3>,
    ) -> Self {
        self.lerp(other, t)
    }
}

fn step<T: Clone>(from: &T, to: &T, t: f32) -> T {
    if t < 1.0 {
        from.clone()
    } else {
        to.clone()
    }
}

fn cubic_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let one_minus_t = 1.0 - t;
    let one_minus_t_sq = one_minus_t * one_minus_t;
    let t_sq = t * t;

    p0 * one_minus_t_sq * one_minus_t
        + p1 * 3.0 * one_minus_t_sq * t
        + p2 * 3.0 * one_minus_t * t_sq
        + p3 * t_sq * t
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for bool {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        step(self, other, t)
    }
}

impl Interpolatable for TextDocument {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        step(self, other, t)
    }
}

impl Interpolatable for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }

    fn lerp_spatial(
        &self,
        other: &Self,
        t: f32,
        tan_out: Option<Vec3>,
        tan_in: Option<Vec3>,
    ) -> Self {
        self.extend(0.0)
            .lerp_spatial(&other.extend(0.0), t, tan_out, tan_in)
            .truncate()
    }
}

impl Interpolatable for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }

    fn lerp_spatial(
        &self,
        other: &Self,
        t: f32,
        tan_out: Option<Vec3>,
        tan_in: Option<Vec3>,
    ) -> Self {
        let tan_out = tan_out.unwrap_or(Vec3::ZERO);
        let tan_in = tan_in.unwrap_or(Vec3::ZERO);
        if tan_out == Vec3::ZERO && tan_in == Vec3::ZERO {
            return self.lerp(other, t);
        }

        let p0 = *self;
        let p3 = *other;
        cubic_point(p0, p0 + tan_out, p3 + tan_in, p3, t)
    }
}

impl Interpolatable for Vec4 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec4::lerp(*self, *other, t)
    }
}

impl Interpolatable for Mat4 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let from = self.to_cols_array();
        let to = other.to_cols_array();
        let mut out = [0.0; 16];
        for (index, value) in out.iter_mut().enumerate() {
            *value = Interpolatable::lerp(&from[index], &to[index], t);
        }
        Mat4::from_cols_array(&out)
    }
}

// Gradient stops, dash patterns and combined contours. Lists whose lengths
// differ cannot be blended and switch at the end of the span.
impl<T: Interpolatable> Interpolatable for Vec<T> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        if self.len() != other.len() {
            return step(self, other, t);
        }
        self.iter().zip(other.iter()).map(|(a, b)| a.lerp(b, t)).collect()
    }
}

impl Interpolatable for CurveVertex {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        CurveVertex {
            point: self.point.lerp(other.point, t),
            in_tangent: self.in_tangent.lerp(other.in_tangent, t),
            out_tangent: self.out_tangent.lerp(other.out_tangent, t),
        }
    }
}

impl Interpolatable for BezierPath {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        if self.vertices.len() != other.vertices.len() || self.closed != other.closed {
            return step(self, other, t);
        }
        BezierPath {
            vertices: self.vertices.lerp(&other.vertices, t),
            closed: self.closed,
        }
    }
}

/// Cubic bezier easing through (0,0), `p1`, `p2`, (1,1).
pub fn solve_cubic_bezier(p1: Vec2, p2: Vec2, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    if p1.x == p1.y && p2.x == p2.y {
        return x;
    }

    // Newton-Raphson
    let mut t = x;
    for _ in 0..8 {
        let one_minus_t = 1.0 - t;
        let x_est = 3.0 * one_minus_t * one_minus_t * t * p1.x
            + 3.0 * one_minus_t * t * t * p2.x
            + t * t * t;

        let err = x_est - x;
        if err.abs() < 1e-4 {
            break;
        }

        let dx_dt = 3.0 * one_minus_t * one_minus_t * p1.x
            + 6.0 * one_minus_t * t * (p2.x - p1.x)
            + 3.0 * t * t * (1.0 - p2.x);

        if dx_dt.abs() < 1e-6 {
            break;
        }
        t -= err / dx_dt;
    }

    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * t * p1.y + 3.0 * one_minus_t * t * t * p2.y + t * t * t
}

/// Eased progress between two keyframes, or `None` for a hold span.
fn eased_progress<T>(from: &Keyframe<T>, to: &Keyframe<T>, frame: AnimationFrameTime) -> Option<f32> {
    if from.is_hold {
        return None;
    }
    let duration = to.time - from.time;
    if duration <= 0.0 {
        return None;
    }
    let linear = (frame - from.time) / duration;
    let p1 = from.out_tangent.unwrap_or(Vec2::ZERO);
    let p2 = to.in_tangent.unwrap_or(Vec2::ONE);
    Some(solve_cubic_bezier(p1, p2, linear))
}

impl<T: Interpolatable> KeyframeGroup<T> {
    /// Evaluates the track at `frame`. Frames outside the track hold the
    /// nearest keyframe's value.
    pub fn value_at(&self, frame: AnimationFrameTime) -> Option<T> {
        let keyframes = self.keyframes();
        let first = keyframes.first()?;

        // First keyframe strictly after `frame`.
        let idx = keyframes.partition_point(|kf| kf.time <= frame);
        if idx == 0 {
            return Some(first.value.clone());
        }
        if idx >= keyframes.len() {
            return keyframes.last().map(|kf| kf.value.clone());
        }

        let from = &keyframes[idx - 1];
        let to = &keyframes[idx];
        match eased_progress(from, to, frame) {
            Some(t) => Some(from.value.lerp_spatial(
                &to.value,
                t,
                from.spatial_out_tangent,
                to.spatial_in_tangent,
            )),
            None => Some(from.value.clone()),
        }
    }

    /// Resamples the track with one linear keyframe per integer frame,
    /// baking easing and spatial curves into the values. Hold spans stay
    /// discrete.
    pub fn manually_interpolated(&self) -> KeyframeGroup<T> {
        let keyframes = self.keyframes();
        if keyframes.len() < 2 {
            return self.clone();
        }

        let mut output = Vec::new();
        for pair in keyframes.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if from.is_hold {
                output.push(Keyframe::hold(from.value.clone(), from.time));
                continue;
            }
            output.push(Keyframe::new(from.value.clone(), from.time));
            let mut frame = from.time.floor() + 1.0;
            while frame < to.time {
                if let Some(value) = self.value_at(frame) {
                    output.push(Keyframe::new(value, frame));
                }
                frame += 1.0;
            }
        }
        if let Some(last) = keyframes.last() {
            output.push(Keyframe::new(last.value.clone(), last.time));
        }

        KeyframeGroup::new(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_track() -> KeyframeGroup<f32> {
        KeyframeGroup::new(vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(10.0, 10.0),
            Keyframe::new(30.0, 20.0),
        ])
    }

    #[test]
    fn test_value_at_binary_search() {
        let track = linear_track();

        assert_eq!(track.value_at(0.0), Some(0.0));
        assert_eq!(track.value_at(10.0), Some(10.0));
        assert_eq!(track.value_at(20.0), Some(30.0));
        assert_eq!(track.value_at(-5.0), Some(0.0));
        assert_eq!(track.value_at(25.0), Some(30.0));
        assert_eq!(track.value_at(5.0), Some(5.0));
        assert_eq!(track.value_at(15.0), Some(20.0));
        assert_eq!(KeyframeGroup::<f32>::default().value_at(3.0), None);
    }

    #[test]
    fn hold_keyframe_holds_until_next() {
        let track = KeyframeGroup::new(vec![Keyframe::hold(1.0, 0.0), Keyframe::new(5.0, 10.0)]);
        assert_eq!(track.value_at(9.99), Some(1.0));
        assert_eq!(track.value_at(10.0), Some(5.0));
    }

    #[test]
    fn easing_is_applied() {
        let mut from = Keyframe::new(0.0_f32, 0.0);
        from.out_tangent = Some(Vec2::new(0.42, 0.0));
        let mut to = Keyframe::new(100.0_f32, 10.0);
        to.in_tangent = Some(Vec2::new(0.58, 1.0));
        let track = KeyframeGroup::new(vec![from, to]);

        let early = track.value_at(2.0).unwrap();
        let middle = track.value_at(5.0).unwrap();
        assert!(early < 20.0, "ease-in should start slowly, got {early}");
        assert!((middle - 50.0).abs() < 1.0);
    }

    #[test]
    fn spatial_tangents_bend_position() {
        let mut from = Keyframe::new(Vec2::new(0.0, 0.0), 0.0);
        from.spatial_out_tangent = Some(Vec3::new(0.0, 40.0, 0.0));
        let mut to = Keyframe::new(Vec2::new(100.0, 0.0), 10.0);
        to.spatial_in_tangent = Some(Vec3::new(0.0, 40.0, 0.0));
        let track = KeyframeGroup::new(vec![from, to]);

        let middle = track.value_at(5.0).unwrap();
        assert!((middle.x - 50.0).abs() < 1e-3);
        assert!((middle.y - 30.0).abs() < 1e-3);
    }

    #[test]
    fn manual_interpolation_samples_integer_frames() {
        let track = KeyframeGroup::new(vec![
            Keyframe::new(0.0_f32, 0.5),
            Keyframe::hold(10.0, 3.0),
            Keyframe::new(20.0, 6.0),
        ]);
        let sampled = track.manually_interpolated();
        let times: Vec<_> = sampled.keyframes().iter().map(|kf| kf.time).collect();
        assert_eq!(times, vec![0.5, 1.0, 2.0, 3.0, 6.0]);
        assert!(sampled.keyframes()[3].is_hold);
        assert_eq!(sampled.value_at(4.5), Some(10.0));
    }

    #[test]
    fn mismatched_paths_step() {
        let a = BezierPath::default();
        let b = BezierPath::new(vec![CurveVertex::corner(Vec2::ONE)], false);
        assert_eq!(a.lerp(&b, 0.5), a);
        assert_eq!(a.lerp(&b, 1.0), b);
    }
}
