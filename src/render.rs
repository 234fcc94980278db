use crate::config::{Config, RenderConfig};
use crate::layout::{Graph, Node, wrap_text};
use crate::text_metrics::{ApproximateMeasurer, FontSpec};
use anyhow::Result;
use std::path::Path;

const ERROR_COLOR: &str = "#C0392B";
const ERROR_FONT_SIZE: f32 = 18.0;
const CAPTION_MARGIN: f32 = 10.0;

/// Draws one frame: links under nodes, every node as a rounded box in its
/// own colour with its wrapped label, and the attribution caption.
pub fn render_svg(graph: &Graph, config: &Config) -> String {
    let theme = &config.theme;
    let width = graph.width;
    let height = graph.height;
    let mut svg = svg_open(width, height, &config.render.background);

    svg.push_str("<g class=\"links\">");
    for link in &graph.links {
        let (Some(source), Some(target)) = (graph.nodes.get(link.source), graph.nodes.get(link.target))
        else {
            continue;
        };
        svg.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            source.x, source.y, target.x, target.y, target.color, theme.link_width
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"nodes\">");
    for node in &graph.nodes {
        svg.push_str(&node_svg(node, config));
    }
    svg.push_str("</g>");

    svg.push_str(&caption_svg(width, height, config));
    svg.push_str("</svg>");
    svg
}

/// A canvas that shows only a failure message in place of the layout.
pub fn render_error_svg(message: &str, config: &Config) -> String {
    let (width, height) = (config.render.width, config.render.height);
    let mut svg = svg_open(width, height, &config.render.background);

    let font = FontSpec::bold(&config.theme.font_family, ERROR_FONT_SIZE);
    let line_height = ERROR_FONT_SIZE * 1.4;
    let lines = wrap_text(message, (width - 80.0).max(80.0), &font, &ApproximateMeasurer);
    let start_y = height / 2.0 - (lines.len() as f32 - 1.0) * line_height / 2.0;
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{start_y:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{ERROR_FONT_SIZE}\" font-weight=\"bold\" fill=\"{ERROR_COLOR}\">",
        width / 2.0,
        escape_xml(&config.theme.font_family),
    ));
    svg.push_str(&tspans(width / 2.0, &lines, line_height));
    svg.push_str("</text>");

    svg.push_str(&caption_svg(width, height, config));
    svg.push_str("</svg>");
    svg
}

fn svg_open(width: f32, height: f32, background: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\"><rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(background)
    )
}

fn node_svg(node: &Node, config: &Config) -> String {
    let theme = &config.theme;
    let font_size = config.layout.font_size(node.level);
    let line_height = config.layout.line_height(node.level);
    let details = node.details();

    let mut out = String::from("<g class=\"node\">");
    out.push_str(&format!(
        "<title>{}: {}</title>",
        escape_xml(&details.title),
        escape_xml(&details.description)
    ));
    out.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\"/>",
        node.x - node.width / 2.0,
        node.y - node.height / 2.0,
        node.width,
        node.height,
        node.color,
        r = theme.corner_radius,
    ));

    let lines = &node.label.lines;
    let start_y = node.y - (lines.len() as f32 - 1.0) * line_height / 2.0;
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{start_y:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{font_size}\" font-weight=\"bold\" fill=\"{}\">",
        node.x,
        escape_xml(&theme.font_family),
        theme.label_color,
    ));
    out.push_str(&tspans(node.x, lines, line_height));
    out.push_str("</text></g>");
    out
}

fn tspans(x: f32, lines: &[String], line_height: f32) -> String {
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { line_height };
        out.push_str(&format!(
            "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    out
}

fn caption_svg(width: f32, height: f32, config: &Config) -> String {
    let caption = config.render.caption.trim();
    if caption.is_empty() {
        return String::new();
    }
    let theme = &config.theme;
    format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        width - CAPTION_MARGIN,
        height - CAPTION_MARGIN,
        escape_xml(&theme.font_family),
        theme.caption_font_size,
        theme.caption_color,
        escape_xml(caption)
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid canvas size {}x{}", render_cfg.width, render_cfg.height))?;
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output needs the `png` feature")
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
