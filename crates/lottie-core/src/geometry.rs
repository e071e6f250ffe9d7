//! Bezier contours for the parametric shape items.
//!
//! Contours start at twelve o'clock (rectangles at the top of the right
//! edge) and run clockwise in y-down coordinates unless the item asks for
//! the reverse direction.

use std::f32::consts::PI;

use glam::Vec2;
use kurbo::Rect;

use crate::bezier::{BezierPath, CurveVertex};
use crate::model::PathDirection;

/// Cubic control distance that approximates a quarter circle.
pub const ELLIPSE_CONTROL_POINT: f32 = 0.5519;

const STAR_ROUNDNESS: f32 = 0.47829;
const POLYGON_ROUNDNESS: f32 = 0.25;
/// Point counts above this are clamped.
pub const MAX_POLYSTAR_POINTS: f32 = 1000.0;

/// A rectangle large enough that no content ever reaches its edges.
pub const VERY_LARGE_RECT: Rect = Rect::new(-100_000_000.0, -100_000_000.0, 100_000_000.0, 100_000_000.0);

fn directed(vertices: Vec<CurveVertex>, direction: PathDirection) -> BezierPath {
    let path = BezierPath::new(vertices, true);
    if direction == PathDirection::CounterClockwise {
        path.reversed()
    } else {
        path
    }
}

pub fn ellipse(center: Vec2, size: Vec2, direction: PathDirection) -> BezierPath {
    let half = size * 0.5;
    let cp = half * ELLIPSE_CONTROL_POINT;

    let top = Vec2::new(center.x, center.y - half.y);
    let right = Vec2::new(center.x + half.x, center.y);
    let bottom = Vec2::new(center.x, center.y + half.y);
    let left = Vec2::new(center.x - half.x, center.y);

    let vertices = vec![
        CurveVertex::relative(top, Vec2::new(-cp.x, 0.0), Vec2::new(cp.x, 0.0)),
        CurveVertex::relative(right, Vec2::new(0.0, -cp.y), Vec2::new(0.0, cp.y)),
        CurveVertex::relative(bottom, Vec2::new(cp.x, 0.0), Vec2::new(-cp.x, 0.0)),
        CurveVertex::relative(left, Vec2::new(0.0, cp.y), Vec2::new(0.0, -cp.y)),
    ];
    directed(vertices, direction)
}

/// A rectangle centred on `center`. The corner radius is clamped to half
/// of the shorter side.
pub fn rectangle(center: Vec2, size: Vec2, corner_radius: f32, direction: PathDirection) -> BezierPath {
    let half = size * 0.5;
    let radius = corner_radius.min(half.x).min(half.y);

    let vertices = if radius <= 0.0 {
        [
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
            Vec2::new(-half.x, -half.y),
        ]
        .into_iter()
        .map(|corner| CurveVertex::corner(center + corner))
        .collect()
    } else {
        let cp = radius * ELLIPSE_CONTROL_POINT;
        let at = |x: f32, y: f32, in_offset: Vec2, out_offset: Vec2| {
            CurveVertex::relative(center + Vec2::new(x, y), in_offset, out_offset)
        };
        vec![
            at(half.x, -half.y + radius, Vec2::new(0.0, -cp), Vec2::ZERO),
            at(half.x, half.y - radius, Vec2::ZERO, Vec2::new(0.0, cp)),
            at(half.x - radius, half.y, Vec2::new(cp, 0.0), Vec2::ZERO),
            at(-half.x + radius, half.y, Vec2::ZERO, Vec2::new(-cp, 0.0)),
            at(-half.x, half.y - radius, Vec2::new(0.0, cp), Vec2::ZERO),
            at(-half.x, -half.y + radius, Vec2::ZERO, Vec2::new(0.0, -cp)),
            at(-half.x + radius, -half.y, Vec2::new(-cp, 0.0), Vec2::ZERO),
            at(half.x - radius, -half.y, Vec2::ZERO, Vec2::new(cp, 0.0)),
        ]
    };
    directed(vertices, direction)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarParameters {
    pub center: Vec2,
    pub points: f32,
    pub outer_radius: f32,
    /// Percent.
    pub outer_roundness: f32,
    pub inner_radius: f32,
    pub inner_roundness: f32,
    /// Degrees.
    pub rotation: f32,
}

fn polystar_vertex(center: Vec2, radius: f32, angle: f32, roundness: f32, constant: f32) -> CurveVertex {
    let position = Vec2::new(angle.cos(), angle.sin()) * radius;
    let tangent = Vec2::new(angle.sin(), -angle.cos()) * (radius * roundness * 0.01 * constant);
    CurveVertex::relative(center + position, tangent, -tangent)
}

/// A star alternating outer and inner points. Fractional point counts are
/// rounded.
pub fn star(parameters: &StarParameters, direction: PathDirection) -> BezierPath {
    let points = parameters.points.round().clamp(0.0, MAX_POLYSTAR_POINTS) as usize;
    if points < 2 {
        return BezierPath::default();
    }
    let step = PI / points as f32;
    let start = (parameters.rotation - 90.0).to_radians();

    let vertices = (0..points * 2)
        .map(|index| {
            let (radius, roundness) = if index % 2 == 0 {
                (parameters.outer_radius, parameters.outer_roundness)
            } else {
                (parameters.inner_radius, parameters.inner_roundness)
            };
            polystar_vertex(
                parameters.center,
                radius,
                start + step * index as f32,
                roundness,
                STAR_ROUNDNESS,
            )
        })
        .collect();
    directed(vertices, direction)
}

/// A regular polygon through the outer points of `parameters`.
pub fn polygon(parameters: &StarParameters, direction: PathDirection) -> BezierPath {
    let points = parameters.points.round().clamp(0.0, MAX_POLYSTAR_POINTS) as usize;
    if points < 3 {
        return BezierPath::default();
    }
    let step = 2.0 * PI / points as f32;
    let start = (parameters.rotation - 90.0).to_radians();

    let vertices = (0..points)
        .map(|index| {
            polystar_vertex(
                parameters.center,
                parameters.outer_radius,
                start + step * index as f32,
                parameters.outer_roundness,
                POLYGON_ROUNDNESS,
            )
        })
        .collect();
    directed(vertices, direction)
}

pub fn rect_path(rect: Rect) -> BezierPath {
    let center = Vec2::new(rect.center().x as f32, rect.center().y as f32);
    let size = Vec2::new(rect.width() as f32, rect.height() as f32);
    rectangle(center, size, 0.0, PathDirection::Clockwise)
}
