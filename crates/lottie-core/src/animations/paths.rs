use glam::Vec2;
use kurbo::BezPath;

use crate::animatable::Interpolatable;
use crate::backend::LayerProperty;
use crate::bezier::BezierPath;
use crate::combine::Keyframes;
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::geometry::{self, StarParameters};
use crate::keyframes::KeyframeGroup;
use crate::model::{Ellipse, Rectangle, ShapeItem, ShapeKind, Star, StarType};
use crate::node::LayerNode;

/// How many times a path is repeated end to end so that trim values past
/// 100% still land on the path.
pub type PathMultiplier = usize;

/// Appends `path` to itself `times` times.
pub(crate) fn repeated(path: &BezierPath, times: PathMultiplier) -> BezPath {
    let mut output = BezPath::new();
    for _ in 0..times.max(1) {
        path.append_to(&mut output);
    }
    output
}

impl LayerNode {
    /// Animates `path` from a path-drawing shape item.
    pub(crate) fn add_path_animations(
        &mut self,
        item: &ShapeItem,
        multiplier: PathMultiplier,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        match &item.kind {
            ShapeKind::Shape(custom) => self.add_animation(
                &LayerProperty::path(),
                &custom.path,
                |path| repeated(path, multiplier),
                context,
                tracker,
            ),
            ShapeKind::CombinedShape(combined) => self.add_animation(
                &LayerProperty::path(),
                &combined.shapes,
                |paths| {
                    let mut output = BezPath::new();
                    for path in paths {
                        for _ in 0..multiplier.max(1) {
                            path.append_to(&mut output);
                        }
                    }
                    output
                },
                context,
                tracker,
            ),
            ShapeKind::Ellipse(ellipse) => self.add_ellipse_animation(ellipse, multiplier, context, tracker),
            ShapeKind::Rectangle(rectangle) => {
                self.add_rectangle_animation(rectangle, multiplier, context, tracker)
            }
            ShapeKind::Star(star) => self.add_star_animation(star, multiplier, context, tracker),
            _ => tracker.log_issue(
                format!("Unexpected shape type {}", item.type_name()),
                context.compatibility_context(),
            ),
        }
    }

    fn add_ellipse_animation(
        &mut self,
        ellipse: &Ellipse,
        multiplier: PathMultiplier,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        let frames = Keyframes::combined(&[&ellipse.size, &ellipse.position], false, |at| {
            Some(EllipseFrame {
                size: ellipse.size.value_for(at)?,
                position: ellipse.position.value_for(at)?,
            })
        });
        let direction = ellipse.direction;
        self.add_animation(
            &LayerProperty::path(),
            &frames,
            |frame| repeated(&geometry::ellipse(frame.position, frame.size, direction), multiplier),
            context,
            tracker,
        )
    }

    fn add_rectangle_animation(
        &mut self,
        rectangle: &Rectangle,
        multiplier: PathMultiplier,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        let combined = Keyframes::combined_if_possible(
            &[&rectangle.size, &rectangle.position, &rectangle.corner_radius],
            |at| {
                Some(RectangleFrame {
                    size: rectangle.size.value_for(at)?,
                    position: rectangle.position.value_for(at)?,
                    corner_radius: rectangle.corner_radius.value_for(at)?,
                })
            },
        );
        let frames = match combined {
            Some(frames) => frames,
            None => {
                let keypath = context.compatibility_context();
                let position =
                    rectangle
                        .position
                        .exactly_one_keyframe(tracker, &keypath, "rectangle position")?;
                let corner_radius = rectangle.corner_radius.exactly_one_keyframe(
                    tracker,
                    &keypath,
                    "rectangle cornerRadius",
                )?;
                rectangle.size.map(|size| RectangleFrame {
                    size: *size,
                    position,
                    corner_radius,
                })
            }
        };

        let direction = rectangle.direction;
        self.add_animation(
            &LayerProperty::path(),
            &frames,
            |frame| {
                let path = geometry::rectangle(frame.position, frame.size, frame.corner_radius, direction);
                repeated(&path, multiplier)
            },
            context,
            tracker,
        )
    }

    fn add_star_animation(
        &mut self,
        star: &Star,
        multiplier: PathMultiplier,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        let no_value = KeyframeGroup::from_value(0.0);
        let inner_radius = star.inner_radius.as_ref().unwrap_or(&no_value);
        let inner_roundness = star.inner_roundness.as_ref().unwrap_or(&no_value);

        let combined = Keyframes::combined_if_possible(
            &[
                &star.position,
                &star.outer_radius,
                inner_radius,
                &star.outer_roundness,
                inner_roundness,
                &star.rotation,
                &star.points,
            ],
            |at| {
                Some(StarFrame {
                    position: star.position.value_for(at)?,
                    outer_radius: star.outer_radius.value_for(at)?,
                    inner_radius: inner_radius.value_for(at)?,
                    outer_roundness: star.outer_roundness.value_for(at)?,
                    inner_roundness: inner_roundness.value_for(at)?,
                    rotation: star.rotation.value_for(at)?,
                    points: star.points.value_for(at)?,
                })
            },
        );
        let frames = match combined {
            Some(frames) => frames,
            None => {
                let keypath = context.compatibility_context();
                let mut static_value = |group: &KeyframeGroup<f32>, description: &str| {
                    group.exactly_one_keyframe(tracker, &keypath, description)
                };
                let outer_radius = static_value(&star.outer_radius, "outerRadius")?;
                let inner_radius = static_value(inner_radius, "innerRadius")?;
                let outer_roundness = static_value(&star.outer_roundness, "outerRoundness")?;
                let inner_roundness = static_value(inner_roundness, "innerRoundness")?;
                let rotation = static_value(&star.rotation, "rotation")?;
                let points = static_value(&star.points, "points")?;
                star.position.map(|position| StarFrame {
                    position: *position,
                    outer_radius,
                    inner_radius,
                    outer_roundness,
                    inner_roundness,
                    rotation,
                    points,
                })
            }
        };

        if star.points.any_value(|points| points.round() > geometry::MAX_POLYSTAR_POINTS) {
            tracker.log_issue(
                format!(
                    "Stars and polygons are limited to {} points",
                    geometry::MAX_POLYSTAR_POINTS
                ),
                context.compatibility_context(),
            )?;
        }

        let (direction, star_type) = (star.direction, star.star_type);
        self.add_animation(
            &LayerProperty::path(),
            &frames,
            |frame| {
                let parameters = StarParameters {
                    center: frame.position,
                    points: frame.points,
                    outer_radius: frame.outer_radius,
                    outer_roundness: frame.outer_roundness,
                    inner_radius: frame.inner_radius,
                    inner_roundness: frame.inner_roundness,
                    rotation: frame.rotation,
                };
                let path = match star_type {
                    StarType::Star => geometry::star(&parameters, direction),
                    StarType::Polygon => geometry::polygon(&parameters, direction),
                };
                repeated(&path, multiplier)
            },
            context,
            tracker,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct EllipseFrame {
    size: Vec2,
    position: Vec2,
}

impl Interpolatable for EllipseFrame {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        EllipseFrame {
            size: self.size.lerp(other.size, t),
            position: self.position.lerp(other.position, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RectangleFrame {
    size: Vec2,
    position: Vec2,
    corner_radius: f32,
}

impl Interpolatable for RectangleFrame {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        RectangleFrame {
            size: self.size.lerp(other.size, t),
            position: self.position.lerp(other.position, t),
            corner_radius: Interpolatable::lerp(&self.corner_radius, &other.corner_radius, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StarFrame {
    position: Vec2,
    outer_radius: f32,
    inner_radius: f32,
    outer_roundness: f32,
    inner_roundness: f32,
    rotation: f32,
    points: f32,
}

impl Interpolatable for StarFrame {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| Interpolatable::lerp(&a, &b, t);
        StarFrame {
            position: self.position.lerp(other.position, t),
            outer_radius: mix(self.outer_radius, other.outer_radius),
            inner_radius: mix(self.inner_radius, other.inner_radius),
            outer_roundness: mix(self.outer_roundness, other.outer_roundness),
            inner_roundness: mix(self.inner_roundness, other.inner_roundness),
            rotation: mix(self.rotation, other.rotation),
            points: mix(self.points, other.points),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kurbo::{PathEl, Shape};

    use super::*;
    use crate::backend::{AnimationBody, PropertyValue, TimingConfiguration};
    use crate::compatibility::CompatibilityMode;
    use crate::keyframes::Keyframe;
    use crate::model::{CustomPath, PathDirection};
    use crate::value_providers::ValueProviderStore;

    fn context() -> LayerAnimationContext {
        LayerAnimationContext::new(
            0.0,
            30.0,
            30.0,
            TimingConfiguration::default(),
            Arc::new(ValueProviderStore::default()),
        )
    }

    fn rectangle(position: KeyframeGroup<Vec2>, size: KeyframeGroup<Vec2>) -> ShapeItem {
        ShapeItem::new(
            "Rectangle 1",
            ShapeKind::Rectangle(Rectangle {
                direction: PathDirection::Clockwise,
                position,
                size,
                corner_radius: KeyframeGroup::from_value(0.0),
            }),
        )
    }

    #[test]
    fn rectangle_with_static_position_combines_over_size_keyframes() {
        let item = rectangle(
            KeyframeGroup::from_value(Vec2::new(50.0, 50.0)),
            KeyframeGroup::new(vec![
                Keyframe::new(Vec2::new(100.0, 100.0), 0.0),
                Keyframe::new(Vec2::new(200.0, 100.0), 30.0),
            ]),
        );
        let mut node = LayerNode::container("shape");
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        node.add_path_animations(&item, 1, &context(), &mut tracker).unwrap();

        let animation = node.animation("path").unwrap();
        let AnimationBody::Keyframe(keyframes) = &animation.body else {
            panic!("expected a keyframe animation");
        };
        assert_eq!(keyframes.key_times, vec![0.0, 1.0]);
        let PropertyValue::Path(last) = &keyframes.values[1] else {
            panic!("expected a path");
        };
        let bounds = last.bounding_box();
        assert!((bounds.center().x - 50.0).abs() < 1e-3);
        assert!((bounds.width() - 200.0).abs() < 1e-3);
        assert!(tracker.issues().is_empty());
    }

    #[test]
    fn mismatched_rectangle_timing_falls_back_to_size() {
        let mut eased = Keyframe::new(Vec2::ZERO, 0.0);
        eased.out_tangent = Some(Vec2::new(0.5, 0.0));
        let item = rectangle(
            KeyframeGroup::new(vec![eased, Keyframe::new(Vec2::new(10.0, 0.0), 20.0)]),
            KeyframeGroup::new(vec![
                Keyframe::new(Vec2::splat(10.0), 0.0),
                Keyframe::new(Vec2::splat(20.0), 10.0),
            ]),
        );
        let mut node = LayerNode::container("shape");
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        node.add_path_animations(&item, 1, &context(), &mut tracker).unwrap();
        assert_eq!(tracker.issues().len(), 1);
        assert!(node.animation("path").is_some());
    }

    #[test]
    fn oversized_stars_are_reported() {
        let item = ShapeItem::new(
            "Polystar 1",
            ShapeKind::Star(Star {
                direction: PathDirection::Clockwise,
                position: KeyframeGroup::from_value(Vec2::ZERO),
                outer_radius: KeyframeGroup::from_value(10.0),
                outer_roundness: KeyframeGroup::from_value(0.0),
                inner_radius: None,
                inner_roundness: None,
                rotation: KeyframeGroup::from_value(0.0),
                points: KeyframeGroup::from_value(1e9),
                star_type: StarType::Polygon,
            }),
        );
        let mut node = LayerNode::container("shape");
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        node.add_path_animations(&item, 1, &context(), &mut tracker).unwrap();
        assert_eq!(tracker.issues().len(), 1);
        assert!(matches!(node.value("path"), Some(PropertyValue::Path(_))));
    }

    #[test]
    fn multiplier_repeats_the_path() {
        let square = geometry::rectangle(Vec2::ZERO, Vec2::splat(10.0), 0.0, PathDirection::Clockwise);
        let item = ShapeItem::new(
            "Path 1",
            ShapeKind::Shape(CustomPath {
                direction: PathDirection::Clockwise,
                path: KeyframeGroup::from_value(square),
            }),
        );
        let mut node = LayerNode::container("shape");
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        node.add_path_animations(&item, 3, &context(), &mut tracker).unwrap();
        let Some(PropertyValue::Path(path)) = node.value("path") else {
            panic!("expected a static path");
        };
        let moves = path.elements().iter().filter(|el| matches!(el, PathEl::MoveTo(_))).count();
        assert_eq!(moves, 3);
    }
}
