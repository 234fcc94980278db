use crate::config::ForceConfig;

use super::types::Graph;

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    pub total_velocity: f32,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// 1-based count of steps taken so far.
    pub iteration: usize,
    pub total_velocity: f32,
    /// True on the last step of the run.
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The run has not stopped yet.
    Running,
    Converged,
    IterationCap,
    /// Nothing to lay out: no nodes or no links.
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub iterations: usize,
    pub total_velocity: f32,
    pub reason: StopReason,
}

/// Velocity changes for every node, computed from one position snapshot.
/// Pinned nodes still push and pull their neighbours but receive nothing.
pub fn accumulate_forces(graph: &Graph, config: &ForceConfig) -> Vec<(f32, f32)> {
    let nodes = &graph.nodes;
    let mut deltas = vec![(0.0f32, 0.0f32); nodes.len()];

    // O(n^2); concept maps stay in the tens of nodes.
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let (a, b) = (&nodes[i], &nodes[j]);
            let mut dx = b.x - a.x;
            let mut dy = b.y - a.y;
            let raw = dx.hypot(dy);
            if raw == 0.0 {
                // Coincident: split them along the x axis.
                dx = 1.0;
                dy = 0.0;
            }
            let distance = raw.max(1.0);
            let force = config.repulsion / (distance * distance);
            let fx = dx / distance * force;
            let fy = dy / distance * force;
            if !a.is_pinned() {
                deltas[i].0 -= fx;
                deltas[i].1 -= fy;
            }
            if !b.is_pinned() {
                deltas[j].0 += fx;
                deltas[j].1 += fy;
            }
        }
    }

    for link in &graph.links {
        let source = &nodes[link.source];
        let target = &nodes[link.target];
        let dx = target.x - source.x;
        let dy = target.y - source.y;
        let distance = dx.hypot(dy).max(1.0);
        let force = (distance - config.ideal_link_length) * config.attraction;
        let fx = dx / distance * force;
        let fy = dy / distance * force;
        if !source.is_pinned() {
            deltas[link.source].0 += fx;
            deltas[link.source].1 += fy;
        }
        if !target.is_pinned() {
            deltas[link.target].0 -= fx;
            deltas[link.target].1 -= fy;
        }
    }

    deltas
}

/// Runs one step: accumulate every force, then damp, clamp and move every
/// free node, keeping each node's box inside the canvas.
///
/// A step never counts as converged while a node is held, so the run is
/// still going when the drag ends.
pub fn advance(graph: &mut Graph, config: &ForceConfig) -> Advance {
    let deltas = accumulate_forces(graph, config);
    let (canvas_w, canvas_h) = (graph.width, graph.height);
    let max_speed = config.max_speed.abs();
    let mut total_velocity = 0.0f32;

    for (node, (dvx, dvy)) in graph.nodes.iter_mut().zip(deltas) {
        if node.is_pinned() {
            continue;
        }
        node.vx = ((node.vx + dvx) * config.friction).clamp(-max_speed, max_speed);
        node.vy = ((node.vy + dvy) * config.friction).clamp(-max_speed, max_speed);
        node.x += node.vx;
        node.y += node.vy;

        // min-then-max: a box larger than the canvas pins to its half-size.
        let (half_w, half_h) = (node.width / 2.0, node.height / 2.0);
        node.x = node.x.min(canvas_w - half_w).max(half_w);
        node.y = node.y.min(canvas_h - half_h).max(half_h);

        total_velocity += node.vx.abs() + node.vy.abs();
    }

    let dragging = graph.nodes.iter().any(|node| node.held);
    Advance {
        total_velocity,
        converged: !dragging && total_velocity <= config.velocity_threshold,
    }
}

/// Step-at-a-time driver, so a host can interleave frames and input
/// between iterations.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: ForceConfig,
    iteration: usize,
    total_velocity: f32,
    stop: Option<StopReason>,
}

impl Simulation {
    pub fn new(config: ForceConfig) -> Self {
        Self {
            config,
            iteration: 0,
            total_velocity: 0.0,
            stop: None,
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn iterations(&self) -> usize {
        self.iteration
    }

    pub fn is_finished(&self) -> bool {
        self.stop.is_some()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Advances one iteration, or returns `None` once the run is over.
    pub fn step(&mut self, graph: &mut Graph) -> Option<Step> {
        if self.stop.is_some() {
            return None;
        }
        if self.iteration == 0 && (graph.nodes.is_empty() || graph.links.is_empty()) {
            self.finish(StopReason::Degenerate);
            return None;
        }
        if self.iteration >= self.config.max_iterations {
            self.finish(StopReason::IterationCap);
            return None;
        }

        let outcome = advance(graph, &self.config);
        self.iteration += 1;
        self.total_velocity = outcome.total_velocity;
        tracing::trace!(
            iteration = self.iteration,
            total_velocity = outcome.total_velocity,
            "simulation step"
        );

        if outcome.converged {
            self.finish(StopReason::Converged);
        } else if self.iteration >= self.config.max_iterations {
            self.finish(StopReason::IterationCap);
        }

        Some(Step {
            iteration: self.iteration,
            total_velocity: outcome.total_velocity,
            finished: self.stop.is_some(),
        })
    }

    /// Progress so far; `reason` stays `Running` until the run ends.
    pub fn stats(&self) -> RunStats {
        RunStats {
            iterations: self.iteration,
            total_velocity: self.total_velocity,
            reason: self.stop.unwrap_or(StopReason::Running),
        }
    }

    fn finish(&mut self, reason: StopReason) {
        self.stop = Some(reason);
        match reason {
            StopReason::IterationCap => tracing::warn!(
                iterations = self.iteration,
                total_velocity = self.total_velocity,
                "simulation hit the iteration cap before settling"
            ),
            _ => tracing::info!(
                iterations = self.iteration,
                total_velocity = self.total_velocity,
                ?reason,
                "simulation finished"
            ),
        }
    }
}

/// Headless driver: steps until the run ends, handing every frame to
/// `on_frame`.
pub fn run_simulation(
    graph: &mut Graph,
    config: &ForceConfig,
    mut on_frame: impl FnMut(&Graph, &Step),
) -> RunStats {
    let mut simulation = Simulation::new(*config);
    while let Some(step) = simulation.step(graph) {
        on_frame(graph, &step);
    }
    simulation.stats()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::{Link, Node, TextBlock};

    fn node(name: &str, x: f32, y: f32, fixed: bool) -> Node {
        Node {
            name: name.to_string(),
            level: if fixed { 0 } else { 1 },
            emoji: String::new(),
            description: String::new(),
            label: TextBlock {
                lines: vec![name.to_string()],
                width: 10.0,
                height: 10.0,
            },
            color: "#000".to_string(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fixed,
            held: false,
            width: 100.0,
            height: 50.0,
        }
    }

    fn graph(nodes: Vec<Node>, links: &[(usize, usize)]) -> Graph {
        Graph {
            nodes,
            links: links
                .iter()
                .map(|&(source, target)| Link { source, target })
                .collect(),
            width: 1200.0,
            height: 800.0,
        }
    }

    fn star() -> Graph {
        graph(
            vec![
                node("root", 600.0, 400.0, true),
                node("a", 800.0, 400.0, false),
                node("b", 400.0, 400.0, false),
                node("c", 600.0, 600.0, false),
            ],
            &[(0, 1), (0, 2), (0, 3)],
        )
    }

    #[test]
    fn coincident_nodes_get_finite_nonzero_force() {
        let g = graph(
            vec![node("a", 300.0, 300.0, false), node("b", 300.0, 300.0, false)],
            &[(0, 1)],
        );
        let deltas = accumulate_forces(&g, &ForceConfig::default());
        for (dx, dy) in &deltas {
            assert!(dx.is_finite() && dy.is_finite());
        }
        assert!(deltas[0].0 < 0.0 && deltas[1].0 > 0.0);

        let mut g = g;
        advance(&mut g, &ForceConfig::default());
        assert!(g.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
        assert!(g.nodes[0].x < g.nodes[1].x);
    }

    #[test]
    fn root_never_moves() {
        let mut g = star();
        let config = ForceConfig {
            max_iterations: 500,
            velocity_threshold: 0.0,
            ..Default::default()
        };
        let stats = run_simulation(&mut g, &config, |frame, _| {
            assert_eq!((frame.nodes[0].x, frame.nodes[0].y), (600.0, 400.0));
        });
        assert!(stats.iterations > 0 && stats.iterations <= 500);
        assert_eq!((g.nodes[0].vx, g.nodes[0].vy), (0.0, 0.0));
    }

    #[test]
    fn two_node_graph_settles_near_spring_equilibrium() {
        let config = ForceConfig::default();
        let mut g = graph(
            vec![node("root", 600.0, 400.0, true), node("child", 800.0, 400.0, false)],
            &[(0, 1)],
        );
        let stats = run_simulation(&mut g, &config, |_, _| {});
        assert_eq!(stats.reason, StopReason::Converged);
        assert!(stats.iterations < config.max_iterations);
        assert!(g.total_velocity() <= config.velocity_threshold);

        // spring pull balances the lone pair's repulsion
        let balance = |d: f32| (d - config.ideal_link_length) * config.attraction - config.repulsion / (d * d);
        let (mut lo, mut hi) = (config.ideal_link_length, 2.0 * config.ideal_link_length);
        for _ in 0..60 {
            let mid = (lo + hi) / 2.0;
            if balance(mid) < 0.0 { lo = mid } else { hi = mid }
        }
        let equilibrium = (lo + hi) / 2.0;
        let length = g.link_length(&g.links[0]);
        let upper = config.ideal_link_length
            + config.repulsion / (config.attraction * config.ideal_link_length.powi(2));
        assert!(length >= config.ideal_link_length && length <= upper, "length {length}");
        assert!((length - equilibrium).abs() < 20.0, "length {length} vs {equilibrium}");
    }

    #[test]
    fn empty_or_linkless_graph_takes_no_steps() {
        let mut empty = graph(Vec::new(), &[]);
        let stats = run_simulation(&mut empty, &ForceConfig::default(), |_, _| {
            panic!("no frames expected")
        });
        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.reason, StopReason::Degenerate);

        let mut lone = graph(vec![node("root", 10.0, 10.0, true)], &[]);
        let stats = run_simulation(&mut lone, &ForceConfig::default(), |_, _| {});
        assert_eq!(stats.iterations, 0);
    }

    #[test]
    fn forces_use_one_snapshot_regardless_of_node_order() {
        let config = ForceConfig::default();
        let mut forward = graph(
            vec![
                node("a", 500.0, 300.0, false),
                node("b", 560.0, 330.0, false),
                node("c", 540.0, 420.0, false),
            ],
            &[(0, 1), (1, 2)],
        );
        let mut reversed = graph(
            forward.nodes.iter().rev().cloned().collect(),
            &[(2, 1), (1, 0)],
        );
        advance(&mut forward, &config);
        advance(&mut reversed, &config);
        for node in &forward.nodes {
            let twin = &reversed.nodes[reversed.index_of(&node.name).unwrap()];
            assert!((node.x - twin.x).abs() < 1e-3 && (node.y - twin.y).abs() < 1e-3);
        }
    }

    #[test]
    fn speed_is_clamped() {
        let config = ForceConfig {
            repulsion: 1.0e9,
            ..Default::default()
        };
        let mut g = graph(
            vec![node("a", 600.0, 400.0, false), node("b", 610.0, 400.0, false)],
            &[(0, 1)],
        );
        advance(&mut g, &config);
        for n in &g.nodes {
            assert!(n.vx.abs() <= config.max_speed && n.vy.abs() <= config.max_speed);
        }
        assert_eq!(g.nodes[1].vx, config.max_speed);
    }

    #[test]
    fn boxes_stay_on_canvas() {
        let config = ForceConfig {
            repulsion: 1.0e8,
            ..Default::default()
        };
        let mut g = graph(
            vec![node("root", 600.0, 400.0, true), node("edge", 1140.0, 400.0, false)],
            &[(0, 1)],
        );
        for _ in 0..50 {
            advance(&mut g, &config);
        }
        assert_eq!(g.nodes[1].x, 1200.0 - 50.0);
    }

    #[test]
    fn oversized_box_clamps_to_its_half_size() {
        let mut g = graph(
            vec![node("root", 600.0, 400.0, true), node("wide", 700.0, 400.0, false)],
            &[(0, 1)],
        );
        g.nodes[1].width = 2000.0;
        advance(&mut g, &ForceConfig::default());
        assert_eq!(g.nodes[1].x, 1000.0);
    }

    #[test]
    fn held_node_stays_put_but_still_repels() {
        let config = ForceConfig::default();
        let mut g = star();
        g.nodes[1].held = true;
        let before = (g.nodes[1].x, g.nodes[1].y);
        let deltas = accumulate_forces(&g, &config);
        assert_eq!(deltas[1], (0.0, 0.0));
        assert!(deltas[2].0 < 0.0, "b should be pushed away from held a");
        advance(&mut g, &config);
        assert_eq!((g.nodes[1].x, g.nodes[1].y), before);
    }

    #[test]
    fn simulation_reports_cap() {
        let config = ForceConfig {
            max_iterations: 3,
            velocity_threshold: 0.0,
            ..Default::default()
        };
        let mut g = star();
        let mut sim = Simulation::new(config);
        let steps: Vec<Step> = std::iter::from_fn(|| sim.step(&mut g)).collect();
        assert_eq!(steps.len(), 3);
        assert!(steps[2].finished && !steps[1].finished);
        assert_eq!(sim.stop_reason(), Some(StopReason::IterationCap));
        assert!(sim.step(&mut g).is_none());
    }

    #[test]
    fn unfinished_run_reports_running() {
        let mut g = star();
        let mut sim = Simulation::new(ForceConfig::default());
        assert_eq!(sim.stats().reason, StopReason::Running);
        let step = sim.step(&mut g).unwrap();
        assert!(!step.finished);
        let stats = sim.stats();
        assert_eq!((stats.iterations, stats.reason), (1, StopReason::Running));
    }

    #[test]
    fn held_node_keeps_the_run_going() {
        // a lone child being dragged contributes no velocity at all
        let mut g = graph(
            vec![node("root", 600.0, 400.0, true), node("child", 650.0, 400.0, false)],
            &[(0, 1)],
        );
        g.nodes[1].held = true;
        let outcome = advance(&mut g, &ForceConfig::default());
        assert_eq!(outcome.total_velocity, 0.0);
        assert!(!outcome.converged);

        let config = ForceConfig {
            max_iterations: 40,
            ..Default::default()
        };
        let mut sim = Simulation::new(config);
        for _ in 0..10 {
            assert!(!sim.step(&mut g).unwrap().finished);
        }
        g.nodes[1].held = false;
        while sim.step(&mut g).is_some() {}
        assert!(g.nodes[1].x > 650.0, "released node should be pushed out");
    }
}
