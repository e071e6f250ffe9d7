use glam::{Mat4, Vec3, Vec4};

use crate::backend::LayerProperty;
use crate::combine::Keyframes;
use crate::compatibility::CompatibilityTracker;
use crate::context::LayerAnimationContext;
use crate::error::CompileResult;
use crate::keyframes::KeyframeGroup;
use crate::model::Transform;
use crate::node::LayerNode;

impl LayerNode {
    /// Animates the node's transform. Each component gets its own
    /// animation unless the transform skews or mirrors, which only a full
    /// matrix can express.
    pub(crate) fn add_transform_animations(
        &mut self,
        transform: &Transform,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        if transform.has_skew() || transform.has_negative_x_scale() {
            return self.add_combined_transform_animation(transform, context, tracker);
        }

        self.add_position_animations(transform, context, tracker)?;
        self.add_animation(
            &LayerProperty::anchor_point(),
            &transform.anchor,
            |anchor| anchor.truncate(),
            context,
            tracker,
        )?;
        self.add_animation(&LayerProperty::scale_x(), &transform.scale, |s| s.x / 100.0, context, tracker)?;
        self.add_animation(&LayerProperty::scale_y(), &transform.scale, |s| s.y / 100.0, context, tracker)?;
        self.add_animation(
            &LayerProperty::rotation_x(),
            &transform.rotation_x,
            |degrees| degrees.to_radians(),
            context,
            tracker,
        )?;
        self.add_animation(
            &LayerProperty::rotation_y(),
            &transform.rotation_y,
            |degrees| degrees.to_radians(),
            context,
            tracker,
        )?;
        self.add_animation(
            &LayerProperty::rotation_z(),
            &transform.rotation_z,
            |degrees| degrees.to_radians(),
            context,
            tracker,
        )
    }

    /// Opacity given in percent.
    pub(crate) fn add_opacity_animation(
        &mut self,
        opacity: &KeyframeGroup<f32>,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        self.add_animation(&LayerProperty::opacity(), opacity, |percent| percent / 100.0, context, tracker)
    }

    fn add_position_animations(
        &mut self,
        transform: &Transform,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        match (&transform.position, &transform.position_x, &transform.position_y) {
            (Some(position), _, _) => self.add_animation(
                &LayerProperty::translation(),
                position,
                |p| p.truncate(),
                context,
                tracker,
            ),
            (None, Some(x), Some(y)) => {
                self.add_animation(&LayerProperty::translation_x(), x, |x| *x, context, tracker)?;
                self.add_animation(&LayerProperty::translation_y(), y, |y| *y, context, tracker)
            }
            _ => tracker.log_issue(
                "Transform values must provide either position or positionX/positionY keyframes",
                context.compatibility_context(),
            ),
        }
    }

    fn add_combined_transform_animation(
        &mut self,
        transform: &Transform,
        context: &LayerAnimationContext,
        tracker: &mut CompatibilityTracker,
    ) -> CompileResult<()> {
        let unset = KeyframeGroup::default();
        let zero = KeyframeGroup::from_value(0.0);
        let position = transform
            .position
            .clone()
            .unwrap_or_else(|| KeyframeGroup::from_value(Vec3::ZERO));
        let position_x = transform.position_x.as_ref().unwrap_or(&unset);
        let position_y = transform.position_y.as_ref().unwrap_or(&unset);
        let skew = transform.skew.as_ref().unwrap_or(&zero);
        let skew_axis = transform.skew_axis.as_ref().unwrap_or(&zero);

        let requires_manual_interpolation = skew.is_animated()
            || skew_axis.is_animated()
            || context.must_use_complex_time_remapping;

        let combined = Keyframes::combined(
            &[
                &transform.anchor,
                &position,
                position_x,
                position_y,
                &transform.scale,
                &transform.rotation_x,
                &transform.rotation_y,
                &transform.rotation_z,
                skew,
                skew_axis,
            ],
            requires_manual_interpolation,
            |at| {
                let mut translation = position.value_for(at).unwrap_or(Vec3::ZERO);
                if let Some(x) = position_x.value_for(at) {
                    translation.x = x;
                }
                if let Some(y) = position_y.value_for(at) {
                    translation.y = y;
                }
                let components = TransformComponents {
                    anchor: transform.anchor.value_for(at)?,
                    position: translation,
                    scale: transform.scale.value_for(at)?,
                    rotation: Vec3::new(
                        transform.rotation_x.value_for(at)?,
                        transform.rotation_y.value_for(at)?,
                        transform.rotation_z.value_for(at)?,
                    ),
                    skew: skew.value_for(at)?,
                    skew_axis: skew_axis.value_for(at)?,
                };
                Some(components.matrix())
            },
        );

        self.add_animation(&LayerProperty::transform(), &combined, |m| *m, context, tracker)
    }
}

/// One instant of a transform in document units.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TransformComponents {
    anchor: Vec3,
    position: Vec3,
    /// Percent.
    scale: Vec3,
    /// Degrees around x, y and z.
    rotation: Vec3,
    /// Degrees.
    skew: f32,
    skew_axis: f32,
}

impl TransformComponents {
    /// `T * R * K * S * A`, where `K` shears along the skew axis and `A`
    /// moves the anchor to the origin.
    fn matrix(&self) -> Mat4 {
        let mat_t = Mat4::from_translation(self.position);
        let mat_r = Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians());
        let mat_k = skew_matrix(self.skew, self.skew_axis);
        let mat_s = Mat4::from_scale(self.scale / 100.0);
        let mat_a = Mat4::from_translation(-self.anchor);

        mat_t * mat_r * mat_k * mat_s * mat_a
    }
}

fn skew_matrix(skew: f32, axis: f32) -> Mat4 {
    if skew == 0.0 {
        return Mat4::IDENTITY;
    }
    let axis = axis.to_radians();
    let shear = Mat4::from_cols(
        Vec4::X,
        Vec4::new((-skew).to_radians().tan(), 1.0, 0.0, 0.0),
        Vec4::Z,
        Vec4::W,
    );
    Mat4::from_rotation_z(axis) * shear * Mat4::from_rotation_z(-axis)
}
