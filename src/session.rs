//! Host-facing driver that owns at most one live layout run.
//!
//! Every run is stamped with an epoch. Starting a new run or clearing bumps
//! the epoch, so a host callback still holding an older [`RunToken`] finds
//! its tick refused instead of stepping a graph it no longer owns.

use crate::config::Config;
use crate::error::Result;
use crate::generate::{HttpResponse, interpret_response};
use crate::interaction::DragController;
use crate::ir::ConceptMap;
use crate::layout::{Graph, NodeDetails, RunStats, Simulation, Step, build_graph};
use crate::parser::parse_concept_map;
use crate::render::{render_error_svg, render_svg};
use crate::text_metrics::{TextMeasurer, measurer_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken {
    epoch: u64,
}

impl RunToken {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The token belongs to a run that has since been replaced or cleared.
    Stale,
    Advanced(Step),
    /// Reported once, on the tick that ended the run.
    Finished(RunStats),
    /// The run ended on an earlier tick.
    Idle,
}

struct ActiveRun {
    graph: Graph,
    simulation: Simulation,
    drag: DragController,
    reported: bool,
}

pub struct Session {
    config: Config,
    measurer: Box<dyn TextMeasurer>,
    epoch: u64,
    active: Option<ActiveRun>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let measurer = measurer_for(config.layout.fast_text_metrics);
        Self::with_measurer(config, Box::new(measurer))
    }

    pub fn with_measurer(config: Config, measurer: Box<dyn TextMeasurer>) -> Self {
        Self {
            config,
            measurer,
            epoch: 0,
            active: None,
            last_error: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.active.as_ref().map(|run| &run.graph)
    }

    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Token of the live run, if there is one.
    pub fn token(&self) -> Option<RunToken> {
        self.active.as_ref().map(|_| RunToken { epoch: self.epoch })
    }

    pub fn is_finished(&self) -> bool {
        self.active
            .as_ref()
            .is_none_or(|run| run.simulation.is_finished())
    }

    /// Drops the live run and any error, invalidating outstanding tokens.
    pub fn clear(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.active = None;
        self.last_error = None;
        tracing::debug!(epoch = self.epoch, "session cleared");
    }

    /// Replaces whatever is showing with a fresh run over `map`.
    pub fn start(&mut self, map: &ConceptMap) -> Result<RunToken> {
        self.clear();
        let canvas = (self.config.render.width, self.config.render.height);
        let built = build_graph(
            map,
            &self.config.theme,
            &self.config.layout,
            canvas,
            self.measurer.as_ref(),
        );
        let graph = self.record(built)?;
        tracing::info!(
            epoch = self.epoch,
            nodes = graph.nodes.len(),
            "layout run started"
        );
        self.active = Some(ActiveRun {
            graph,
            simulation: Simulation::new(self.config.layout.force),
            drag: DragController::new(),
            reported: false,
        });
        Ok(RunToken { epoch: self.epoch })
    }

    /// Starts a run from a raw service reply. Failures replace the canvas
    /// with the error message.
    pub fn load_response(&mut self, response: &HttpResponse) -> Result<RunToken> {
        let map = self.discard_on_error(interpret_response(response))?;
        self.start(&map)
    }

    /// Starts a run from model text that should contain the JSON map.
    pub fn load_text(&mut self, text: &str) -> Result<RunToken> {
        let map = self.discard_on_error(parse_concept_map(text))?;
        self.start(&map)
    }

    /// Surfaces a failure that happened outside the session, such as a
    /// request that could not be built.
    pub fn fail(&mut self, error: &crate::Error) {
        self.clear();
        self.last_error = Some(error.to_string());
    }

    /// One simulation step for the run `token` refers to.
    pub fn tick(&mut self, token: RunToken) -> TickOutcome {
        if token.epoch != self.epoch {
            tracing::trace!(
                token = token.epoch,
                epoch = self.epoch,
                "ignoring tick from superseded run"
            );
            return TickOutcome::Stale;
        }
        let Some(run) = self.active.as_mut() else {
            return TickOutcome::Stale;
        };
        match run.simulation.step(&mut run.graph) {
            Some(step) if step.finished => {
                run.reported = true;
                TickOutcome::Finished(run.simulation.stats())
            }
            Some(step) => TickOutcome::Advanced(step),
            None if !run.reported => {
                run.reported = true;
                TickOutcome::Finished(run.simulation.stats())
            }
            None => TickOutcome::Idle,
        }
    }

    /// Ticks until the run ends; `None` if the token is stale.
    pub fn run_to_end(&mut self, token: RunToken) -> Option<RunStats> {
        loop {
            match self.tick(token) {
                TickOutcome::Stale => return None,
                TickOutcome::Advanced(_) => {}
                TickOutcome::Finished(stats) => return Some(stats),
                TickOutcome::Idle => return self.active.as_ref().map(|run| run.simulation.stats()),
            }
        }
    }

    pub fn drag_start(&mut self, x: f32, y: f32) -> Option<usize> {
        let run = self.active.as_mut()?;
        run.drag.press(&mut run.graph, (x, y))
    }

    pub fn drag_move(&mut self, x: f32, y: f32) -> bool {
        match self.active.as_mut() {
            Some(run) => run.drag.drag_to(&mut run.graph, (x, y)),
            None => false,
        }
    }

    pub fn drag_end(&mut self) -> Option<usize> {
        let run = self.active.as_mut()?;
        run.drag.end(&mut run.graph)
    }

    pub fn node_at(&self, x: f32, y: f32) -> Option<usize> {
        crate::interaction::node_at(self.graph()?, x, y)
    }

    pub fn details_at(&self, x: f32, y: f32) -> Option<NodeDetails> {
        crate::interaction::details_at(self.graph()?, x, y)
    }

    /// What the canvas should show right now: the live graph, the last
    /// error, or an empty canvas.
    pub fn render_svg(&self) -> String {
        if let Some(message) = &self.last_error {
            return render_error_svg(message, &self.config);
        }
        match self.graph() {
            Some(graph) => render_svg(graph, &self.config),
            None => render_svg(
                &Graph::empty(self.config.render.width, self.config.render.height),
                &self.config,
            ),
        }
    }

    /// A load that fails before building still takes the old run down.
    fn discard_on_error<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.clear();
        }
        self.record(result)
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::warn!(error = %err, "generation attempt failed");
            self.last_error = Some(err.to_string());
        }
        result
    }
}
