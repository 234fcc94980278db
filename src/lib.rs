#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod generate;
pub mod interaction;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod session;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, ForceConfig, LayoutConfig, RenderConfig, ServiceConfig};
pub use error::{Error, Result};
pub use generate::{GenerationRequest, HttpResponse, Transport, generate_concept_map};
pub use interaction::{DragController, node_at};
pub use ir::{ConceptMap, Subtopic, Topic};
pub use layout::{Graph, Link, Node, NodeDetails, RunStats, Simulation, Step, compute_layout};
pub use parser::parse_concept_map;
pub use session::{RunToken, Session, TickOutcome};
pub use theme::Theme;

/// Everything a one-shot render needs besides the response text.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub config: Config,
}

impl RenderOptions {
    pub fn classic() -> Self {
        Self::default()
    }

    pub fn modern() -> Self {
        let mut config = Config::default();
        config.theme = Theme::modern();
        config.render.background = config.theme.background.clone();
        Self { config }
    }

    /// Table-driven text widths instead of installed fonts.
    pub fn with_fast_text(mut self) -> Self {
        self.config.layout.fast_text_metrics = true;
        self
    }
}

/// Parses model text, runs the layout to rest and returns the SVG.
pub fn render_with_options(response_text: &str, options: RenderOptions) -> Result<String> {
    let map = parse_concept_map(response_text)?;
    let measurer = text_metrics::measurer_for(options.config.layout.fast_text_metrics);
    let (graph, _) = compute_layout(&map, &options.config, measurer)?;
    Ok(render::render_svg(&graph, &options.config))
}
