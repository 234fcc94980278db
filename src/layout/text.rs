use crate::config::LayoutConfig;
use crate::text_metrics::{FontSpec, TextMeasurer};

use super::TextBlock;

/// Greedy word packing: words join the current line while the measured
/// width stays within `max_width`; the first overflow starts a new line.
/// A single word wider than `max_width` keeps a line to itself.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font: &FontSpec<'_>,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut words = text.split(' ');
    let mut current = words.next().unwrap_or_default().to_string();
    let mut lines = Vec::new();

    for word in words {
        let candidate = format!("{current} {word}");
        if measurer.text_width(&candidate, font) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Sizes a node box around its label: at least the level's minimum size,
/// never wider than `max_node_width`, label wrapped inside the padding.
pub(super) fn measure_node_label(
    text: &str,
    level: usize,
    font_family: &str,
    config: &LayoutConfig,
    measurer: &dyn TextMeasurer,
) -> (TextBlock, f32, f32) {
    let font = FontSpec::bold(font_family, config.font_size(level));
    let line_height = config.line_height(level);
    let (min_width, min_height) = config.min_size(level);
    let padding = config.label_padding;

    let natural = measurer.text_width(text, &font);
    let width = (natural + padding)
        .min(config.max_node_width.max(min_width))
        .max(min_width);
    let lines = wrap_text(text, width - padding, &font, measurer);
    let label_width = lines
        .iter()
        .map(|line| measurer.text_width(line, &font))
        .fold(0.0, f32::max);
    let label_height = lines.len() as f32 * line_height;
    let height = (label_height + padding).max(min_height);

    (
        TextBlock {
            lines,
            width: label_width,
            height: label_height,
        },
        width,
        height,
    )
}
