mod builder;
mod force;
mod text;
pub(crate) mod types;

pub use builder::build_graph;
pub use force::{
    Advance, RunStats, Simulation, Step, StopReason, accumulate_forces, advance, run_simulation,
};
pub use text::wrap_text;
pub use types::*;

use crate::config::Config;
use crate::error::Result;
use crate::ir::ConceptMap;
use crate::text_metrics::TextMeasurer;

/// Builds the graph on the configured canvas and runs the simulation to
/// completion, calling `on_frame` after every step.
pub fn compute_layout_with_frames(
    map: &ConceptMap,
    config: &Config,
    measurer: &dyn TextMeasurer,
    on_frame: impl FnMut(&Graph, &Step),
) -> Result<(Graph, RunStats)> {
    let canvas = (config.render.width, config.render.height);
    let mut graph = build_graph(map, &config.theme, &config.layout, canvas, measurer)?;
    let stats = run_simulation(&mut graph, &config.layout.force, on_frame);
    Ok((graph, stats))
}

pub fn compute_layout(
    map: &ConceptMap,
    config: &Config,
    measurer: &dyn TextMeasurer,
) -> Result<(Graph, RunStats)> {
    compute_layout_with_frames(map, config, measurer, |_, _| {})
}
