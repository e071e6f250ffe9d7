use crate::error::CompileResult;
use crate::keyframes::KeyframeGroup;
use crate::model::{LayerModel, TextDocument, TextJustification};
use crate::node::{LayerNode, NodeKind, TextAttributes};

use super::LayerBuilder;

impl LayerBuilder<'_> {
    /// A static text node. Text can't be animated, only replaced through
    /// the text provider.
    pub(super) fn text_node(
        &mut self,
        layer: &LayerModel,
        document: &KeyframeGroup<TextDocument>,
        has_animators: bool,
    ) -> CompileResult<LayerNode> {
        let context = self.layer_name.clone();
        let text = document.exactly_one_keyframe(self.tracker, &context, "text layer text")?;
        if has_animators {
            self.log_issue("Text animators are not supported")?;
        }

        let attributes = TextAttributes {
            text: self.providers.text.text_for(&layer.name, &text.text),
            font: self.providers.font.font_for(&text.font_family, text.font_size),
            font_size: text.font_size,
            fill_color: text.fill_color,
            stroke_color: text.stroke_color,
            stroke_width: text.stroke_width,
            tracking: text.font_size * text.tracking / 1000.0,
            line_height: text.line_height,
            justification: match text.justification {
                TextJustification::Left => 0,
                TextJustification::Right => 1,
                TextJustification::Center => 2,
            },
        };
        Ok(LayerNode::new(format!("{} (Text)", layer.name), NodeKind::Text(attributes)))
    }
}
