use glam::Vec2;
use kurbo::{BezPath, Point};

/// A path vertex with absolute control points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurveVertex {
    pub point: Vec2,
    pub in_tangent: Vec2,
    pub out_tangent: Vec2,
}

impl CurveVertex {
    pub fn corner(point: Vec2) -> Self {
        CurveVertex {
            point,
            in_tangent: point,
            out_tangent: point,
        }
    }

    /// Builds a vertex from control offsets relative to `point`.
    pub fn relative(point: Vec2, in_offset: Vec2, out_offset: Vec2) -> Self {
        CurveVertex {
            point,
            in_tangent: point + in_offset,
            out_tangent: point + out_offset,
        }
    }

    fn swapped(self) -> Self {
        CurveVertex {
            point: self.point,
            in_tangent: self.out_tangent,
            out_tangent: self.in_tangent,
        }
    }

    fn translated(self, offset: Vec2) -> Self {
        CurveVertex {
            point: self.point + offset,
            in_tangent: self.in_tangent + offset,
            out_tangent: self.out_tangent + offset,
        }
    }
}

/// A single cubic bezier contour.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BezierPath {
    pub vertices: Vec<CurveVertex>,
    pub closed: bool,
}

impl BezierPath {
    pub fn new(vertices: Vec<CurveVertex>, closed: bool) -> Self {
        BezierPath { vertices, closed }
    }

    /// Converts the serialized form, whose tangents are offsets from each vertex.
    pub fn from_data(data: &lottie_data::model::BezierPath) -> Self {
        let vertices = data
            .v
            .iter()
            .enumerate()
            .map(|(index, v)| {
                let in_offset = data.i.get(index).copied().unwrap_or([0.0, 0.0]);
                let out_offset = data.o.get(index).copied().unwrap_or([0.0, 0.0]);
                CurveVertex::relative(
                    Vec2::from(*v),
                    Vec2::from(in_offset),
                    Vec2::from(out_offset),
                )
            })
            .collect();
        BezierPath {
            vertices,
            closed: data.c,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The same contour traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        BezierPath {
            vertices: self.vertices.iter().rev().map(|v| v.swapped()).collect(),
            closed: self.closed,
        }
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        BezierPath {
            vertices: self.vertices.iter().map(|v| v.translated(offset)).collect(),
            closed: self.closed,
        }
    }

    pub fn append_to(&self, path: &mut BezPath) {
        let Some(first) = self.vertices.first() else {
            return;
        };
        path.move_to(point(first.point));
        for pair in self.vertices.windows(2) {
            push_segment(path, &pair[0], &pair[1]);
        }
        if self.closed {
            if let Some(last) = self.vertices.last() {
                if self.vertices.len() > 1 {
                    push_segment(path, last, first);
                }
            }
            path.close_path();
        }
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        self.append_to(&mut path);
        path
    }
}

pub(crate) fn point(v: Vec2) -> Point {
    Point::new(v.x as f64, v.y as f64)
}

fn push_segment(path: &mut BezPath, from: &CurveVertex, to: &CurveVertex) {
    if from.out_tangent == from.point && to.in_tangent == to.point {
        path.line_to(point(to.point));
    } else {
        path.curve_to(
            point(from.out_tangent),
            point(to.in_tangent),
            point(to.point),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{PathEl, Shape};

    fn triangle() -> BezierPath {
        BezierPath::new(
            vec![
                CurveVertex::corner(Vec2::new(0.0, 0.0)),
                CurveVertex::corner(Vec2::new(10.0, 0.0)),
                CurveVertex::corner(Vec2::new(10.0, 10.0)),
            ],
            true,
        )
    }

    #[test]
    fn closed_contour_returns_to_start() {
        let path = triangle().to_bez_path();
        let elements: Vec<_> = path.elements().to_vec();
        assert_eq!(elements.len(), 5);
        assert!(matches!(elements[3], PathEl::LineTo(p) if p == Point::ZERO));
        assert!(matches!(elements[4], PathEl::ClosePath));
        assert!((path.area().abs() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn reversing_flips_winding() {
        let forward = triangle().to_bez_path().area();
        let backward = triangle().reversed().to_bez_path().area();
        assert!((forward + backward).abs() < 1e-6);
    }

    #[test]
    fn from_data_resolves_relative_tangents() {
        let data = lottie_data::model::BezierPath {
            c: false,
            v: vec![[0.0, 0.0], [10.0, 0.0]],
            i: vec![[0.0, 0.0], [-2.0, 0.0]],
            o: vec![[2.0, 5.0], [0.0, 0.0]],
        };
        let path = BezierPath::from_data(&data);
        assert_eq!(path.vertices[0].out_tangent, Vec2::new(2.0, 5.0));
        assert_eq!(path.vertices[1].in_tangent, Vec2::new(8.0, 0.0));
        assert!(matches!(
            path.to_bez_path().elements()[1],
            PathEl::CurveTo(..)
        ));
    }
}
