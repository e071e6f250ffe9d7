//! Partitions a group's shape items into units that render together.

use tracing::trace;

use crate::bezier::BezierPath;
use crate::combine::{share_timing, KeyframeTimeline, Keyframes};
use crate::context::LayerAnimationContext;
use crate::keyframes::KeyframeGroup;
use crate::model::{CombinedShape, ShapeItem, ShapeKind};

/// A shape item together with the names of the groups it was declared in.
/// Compiled nodes don't mirror the document's group nesting exactly, so
/// keypaths are rebuilt from this path.
#[derive(Debug, Clone)]
pub struct PositionedItem {
    pub item: ShapeItem,
    pub group_path: Vec<String>,
}

impl PositionedItem {
    pub fn new(item: ShapeItem, group_path: Vec<String>) -> Self {
        PositionedItem { item, group_path }
    }

    /// `context` extended with this item's keypath.
    pub fn context(&self, context: &LayerAnimationContext) -> LayerAnimationContext {
        let mut context = context.clone();
        for group in &self.group_path {
            context = context.adding_keypath_component(group);
        }
        context.adding_keypath_component(&self.item.name)
    }
}

/// Path-drawing items plus the modifiers that apply to them.
#[derive(Debug, Clone, Default)]
pub struct ShapeRenderGroup {
    pub path_items: Vec<PositionedItem>,
    pub other_items: Vec<PositionedItem>,
}

#[derive(Debug, Clone, Default)]
pub struct RenderGroups {
    pub valid: Vec<ShapeRenderGroup>,
    /// Items that ended up in no valid group, in their original order.
    pub unused: Vec<PositionedItem>,
}

#[derive(Debug, Clone, Default)]
struct IndexGroup {
    paths: Vec<usize>,
    others: Vec<usize>,
}

/// Splits `items` (front to back) into render groups.
///
/// A fill only applies to the paths declared before it, so each fill closes
/// the current group. `has_child_groups` tells whether unused items will be
/// inherited by nested groups, in which case a fill without paths of its own
/// doesn't borrow the previous group's paths.
pub fn shape_render_groups(items: &[PositionedItem], has_child_groups: bool) -> RenderGroups {
    let is_trim = |index: &usize| matches!(items[*index].item.kind, ShapeKind::Trim(_));

    let mut groups = vec![IndexGroup::default()];
    for (index, positioned) in items.iter().enumerate() {
        let item = &positioned.item;
        if item.draws_path() {
            if current(&groups).others.iter().any(is_trim) {
                groups.push(IndexGroup::default());
            }
            current_mut(&mut groups).paths.push(index);
        } else if item.is_fill() {
            current_mut(&mut groups).others.push(index);
            let last = groups.len() - 1;
            if groups[last].paths.is_empty() && !has_child_groups && last > 0 {
                groups[last].paths = groups[last - 1].paths.clone();
            }
            groups.push(IndexGroup::default());
        } else {
            for group in &mut groups {
                group.others.push(index);
            }
        }
    }

    let valid: Vec<IndexGroup> = groups
        .into_iter()
        .flat_map(|group| split_paints(group, items))
        .filter(|group| !group.paths.is_empty())
        .collect();

    let mut used = vec![false; items.len()];
    for group in &valid {
        for index in group.paths.iter().chain(&group.others) {
            used[*index] = true;
        }
    }

    let resolve = |indices: &[usize]| -> Vec<PositionedItem> {
        indices.iter().map(|i| items[*i].clone()).collect()
    };
    let result = RenderGroups {
        valid: valid
            .iter()
            .map(|group| ShapeRenderGroup {
                path_items: resolve(&group.paths),
                other_items: resolve(&group.others),
            })
            .collect(),
        unused: items
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(item, _)| item.clone())
            .collect(),
    };
    trace!(
        items = items.len(),
        groups = result.valid.len(),
        unused = result.unused.len(),
        "partitioned shape items"
    );
    result
}

fn current(groups: &[IndexGroup]) -> &IndexGroup {
    &groups[groups.len() - 1]
}

fn current_mut(groups: &mut [IndexGroup]) -> &mut IndexGroup {
    let last = groups.len() - 1;
    &mut groups[last]
}

/// A render unit draws at most one fill below at most one stroke, with a
/// single opacity. Anything else gets one unit per paint.
fn split_paints(group: IndexGroup, items: &[PositionedItem]) -> Vec<IndexGroup> {
    let item = |index: usize| &items[index].item;
    let (paints, modifiers): (Vec<usize>, Vec<usize>) = group
        .others
        .iter()
        .partition(|index| item(**index).is_fill() || item(**index).is_stroke());

    let fills = paints.iter().filter(|index| item(**index).is_fill()).count();
    let strokes = paints.len() - fills;
    let stroke_first = match (
        paints.iter().position(|index| item(*index).is_stroke()),
        paints.iter().position(|index| item(*index).is_fill()),
    ) {
        (Some(stroke), Some(fill)) => stroke < fill,
        _ => false,
    };
    let first_opacity = paints.first().and_then(|index| item(*index).paint_opacity());
    let same_opacity = paints
        .iter()
        .all(|index| item(*index).paint_opacity() == first_opacity);

    if fills <= 1 && strokes <= 1 && stroke_first && same_opacity {
        return vec![group];
    }

    paints
        .iter()
        .map(|paint| IndexGroup {
            paths: group.paths.clone(),
            others: std::iter::once(*paint).chain(modifiers.iter().copied()).collect(),
        })
        .collect()
}

/// Merges several bezier paths into one combined shape, so overlapping
/// paths fill with a single fill rule.
///
/// Returns `None` when the paths must be drawn separately: they aren't all
/// arbitrary beziers, a trim applies, or their timings differ and
/// `resample_mismatched` is off.
pub fn combined_shape_item(
    group: &ShapeRenderGroup,
    name: &str,
    resample_mismatched: bool,
) -> Option<PositionedItem> {
    if group.path_items.len() < 2 {
        return None;
    }
    if group
        .other_items
        .iter()
        .any(|other| matches!(other.item.kind, ShapeKind::Trim(_)))
    {
        return None;
    }

    let tracks: Vec<&KeyframeGroup<BezierPath>> = group
        .path_items
        .iter()
        .map(|positioned| match &positioned.item.kind {
            ShapeKind::Shape(custom) => Some(&custom.path),
            _ => None,
        })
        .collect::<Option<_>>()?;

    let timelines: Vec<&dyn KeyframeTimeline> = tracks
        .iter()
        .map(|track| *track as &dyn KeyframeTimeline)
        .collect();
    let animated: Vec<&dyn KeyframeTimeline> = timelines
        .iter()
        .copied()
        .filter(|timeline| timeline.keyframe_count() > 1)
        .collect();

    let requires_manual_interpolation = if share_timing(&animated) {
        false
    } else if resample_mismatched {
        true
    } else {
        return None;
    };

    let shapes = Keyframes::combined(&timelines, requires_manual_interpolation, |at| {
        tracks
            .iter()
            .map(|track| track.value_for(at))
            .collect::<Option<Vec<_>>>()
    });

    let first = &group.path_items[0];
    Some(PositionedItem::new(
        ShapeItem::new(name, ShapeKind::CombinedShape(CombinedShape { shapes })),
        first.group_path.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec4};

    use super::*;
    use crate::bezier::CurveVertex;
    use crate::keyframes::Keyframe;
    use crate::model::{CustomPath, Ellipse, Fill, PathDirection, Stroke, Trim, TrimType};
    use crate::node::{FillRule, LineCap, LineJoin};

    fn positioned(item: ShapeItem) -> PositionedItem {
        PositionedItem::new(item, Vec::new())
    }

    fn ellipse(name: &str) -> PositionedItem {
        positioned(ShapeItem::new(
            name,
            ShapeKind::Ellipse(Ellipse {
                direction: PathDirection::Clockwise,
                position: KeyframeGroup::from_value(Vec2::ZERO),
                size: KeyframeGroup::from_value(Vec2::splat(10.0)),
            }),
        ))
    }

    fn fill(name: &str, opacity: f32) -> PositionedItem {
        positioned(ShapeItem::new(
            name,
            ShapeKind::Fill(Fill {
                color: KeyframeGroup::from_value(Vec4::ONE),
                opacity: KeyframeGroup::from_value(opacity),
                fill_rule: FillRule::NonZero,
            }),
        ))
    }

    fn stroke(name: &str, opacity: f32) -> PositionedItem {
        positioned(ShapeItem::new(
            name,
            ShapeKind::Stroke(Stroke {
                color: KeyframeGroup::from_value(Vec4::ONE),
                opacity: KeyframeGroup::from_value(opacity),
                width: KeyframeGroup::from_value(1.0),
                line_cap: LineCap::Butt,
                line_join: LineJoin::Miter,
                miter_limit: 4.0,
                dash: Vec::new(),
            }),
        ))
    }

    fn trim(name: &str) -> PositionedItem {
        positioned(ShapeItem::new(
            name,
            ShapeKind::Trim(Trim {
                start: KeyframeGroup::from_value(0.0),
                end: KeyframeGroup::from_value(50.0),
                offset: KeyframeGroup::from_value(0.0),
                trim_type: TrimType::Simultaneously,
            }),
        ))
    }

    fn bezier(name: &str, keyframe_times: &[f32]) -> PositionedItem {
        let path = BezierPath::new(
            vec![
                CurveVertex::corner(Vec2::ZERO),
                CurveVertex::corner(Vec2::new(10.0, 0.0)),
                CurveVertex::corner(Vec2::new(10.0, 10.0)),
            ],
            true,
        );
        let keyframes = keyframe_times
            .iter()
            .map(|time| Keyframe::new(path.clone(), *time))
            .collect();
        positioned(ShapeItem::new(
            name,
            ShapeKind::Shape(CustomPath {
                direction: PathDirection::Clockwise,
                path: KeyframeGroup::new(keyframes),
            }),
        ))
    }

    fn names(items: &[PositionedItem]) -> Vec<&str> {
        items.iter().map(|p| p.item.name.as_str()).collect()
    }

    #[test]
    fn fills_close_their_group() {
        let items = vec![
            ellipse("0"),
            ellipse("1"),
            fill("2", 100.0),
            ellipse("3"),
            ellipse("4"),
            fill("5", 100.0),
            ellipse("6"),
        ];
        let groups = shape_render_groups(&items, false);
        assert_eq!(groups.valid.len(), 2);
        assert_eq!(names(&groups.valid[0].path_items), vec!["0", "1"]);
        assert_eq!(names(&groups.valid[0].other_items), vec!["2"]);
        assert_eq!(names(&groups.valid[1].path_items), vec!["3", "4"]);
        assert_eq!(names(&groups.valid[1].other_items), vec!["5"]);
        // The trailing path has no paint of its own.
        assert_eq!(names(&groups.unused), vec!["6"]);
    }

    #[test]
    fn modifiers_apply_to_every_open_group() {
        let items = vec![ellipse("a"), fill("fill", 100.0), ellipse("b"), stroke("stroke", 100.0)];
        let groups = shape_render_groups(&items, false);
        // The stroke also reaches the path before the fill, but sits below
        // that fill, so the first group splits in two.
        assert_eq!(groups.valid.len(), 3);
        assert_eq!(names(&groups.valid[0].other_items), vec!["fill"]);
        assert_eq!(names(&groups.valid[1].path_items), vec!["a"]);
        assert_eq!(names(&groups.valid[1].other_items), vec!["stroke"]);
        assert_eq!(names(&groups.valid[2].path_items), vec!["b"]);
        assert_eq!(names(&groups.valid[2].other_items), vec!["stroke"]);
        assert!(groups.unused.is_empty());
    }

    #[test]
    fn stroke_above_fill_with_equal_opacity_shares_a_unit() {
        let items = vec![ellipse("a"), stroke("stroke", 80.0), fill("fill", 80.0)];
        let groups = shape_render_groups(&items, false);
        assert_eq!(groups.valid.len(), 1);
        assert_eq!(names(&groups.valid[0].other_items), vec!["stroke", "fill"]);

        let items = vec![ellipse("a"), stroke("stroke", 50.0), fill("fill", 80.0)];
        let groups = shape_render_groups(&items, false);
        assert_eq!(groups.valid.len(), 2);
    }

    #[test]
    fn a_fill_without_paths_borrows_the_previous_paths() {
        let items = vec![ellipse("a"), fill("red", 100.0), fill("green", 100.0)];
        let groups = shape_render_groups(&items, false);
        assert_eq!(groups.valid.len(), 2);
        assert_eq!(names(&groups.valid[1].path_items), vec!["a"]);

        // With child groups, the second fill is left for them instead.
        let groups = shape_render_groups(&items, true);
        assert_eq!(groups.valid.len(), 1);
        assert_eq!(names(&groups.unused), vec!["green"]);
    }

    #[test]
    fn a_trim_splits_later_paths() {
        let items = vec![ellipse("a"), trim("trim"), ellipse("b"), stroke("stroke", 100.0)];
        let groups = shape_render_groups(&items, false);
        assert_eq!(groups.valid.len(), 2);
        assert_eq!(names(&groups.valid[0].path_items), vec!["a"]);
        assert_eq!(names(&groups.valid[0].other_items), vec!["stroke", "trim"]);
        assert_eq!(names(&groups.valid[1].other_items), vec!["stroke"]);
    }

    #[test]
    fn paths_with_shared_timing_combine() {
        let group = ShapeRenderGroup {
            path_items: vec![bezier("a", &[0.0, 10.0]), bezier("b", &[0.0, 10.0]), bezier("c", &[5.0])],
            other_items: vec![fill("fill", 100.0)],
        };
        let combined = combined_shape_item(&group, "Group", false).expect("combined");
        assert_eq!(combined.item.name, "Group");
        let ShapeKind::CombinedShape(shape) = &combined.item.kind else {
            panic!("expected a combined shape");
        };
        assert_eq!(shape.shapes.len(), 2);
        assert_eq!(shape.shapes.first_value().map(Vec::len), Some(3));
    }

    #[test]
    fn mismatched_timing_splits_unless_resampling() {
        let group = ShapeRenderGroup {
            path_items: vec![bezier("a", &[0.0, 10.0]), bezier("b", &[0.0, 4.0])],
            other_items: Vec::new(),
        };
        assert!(combined_shape_item(&group, "Group", false).is_none());
        let resampled = combined_shape_item(&group, "Group", true).expect("resampled");
        let ShapeKind::CombinedShape(shape) = &resampled.item.kind else {
            panic!("expected a combined shape");
        };
        assert_eq!(shape.shapes.len(), 11);

        let trimmed = ShapeRenderGroup {
            other_items: vec![trim("trim")],
            ..group
        };
        assert!(combined_shape_item(&trimmed, "Group", true).is_none());
    }
}
