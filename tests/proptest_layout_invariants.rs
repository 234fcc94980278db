//! Property-based invariant tests for the force layout.
//!
//! Random trees of 3 to 8 topics are built and simulated to rest on the
//! default 1200x800 canvas:
//!
//! 1. The root never moves.
//! 2. Every position stays finite and every box stays on the canvas.
//! 3. Trees of 3 or 4 topics settle with no two boxes overlapping.
//! 4. Larger trees may overlap, chains pressed against a wall worst of
//!    all, but every box pair keeps at least `MIN_SEPARATION` of the gap
//!    that would make it touch.
//! 5. The same input always settles to the same layout.
//! 6. Stepping through `Simulation` matches the headless driver.

use concept_map_renderer::config::Config;
use concept_map_renderer::ir::{ConceptMap, Topic};
use concept_map_renderer::layout::{Graph, Node, Simulation, build_graph, run_simulation};
use concept_map_renderer::text_metrics::ApproximateMeasurer;
use proptest::prelude::*;
use proptest::sample::Index;

/// Floor for `separation` on any settled tree of up to 8 topics. The
/// tightest case, an 8-topic chain, settles at about 0.49.
const MIN_SEPARATION: f32 = 0.4;

// ── Helpers ─────────────────────────────────────────────────────────────

fn tree_strategy() -> impl Strategy<Value = ConceptMap> {
    sized_tree_strategy(3, 8)
}

/// Topic `i` picks its parent among topics `0..i`, so every draw is a tree.
fn sized_tree_strategy(min_topics: usize, max_topics: usize) -> impl Strategy<Value = ConceptMap> {
    prop::collection::vec(any::<Index>(), min_topics - 1..=max_topics - 1).prop_map(|parents| {
        let mut map = ConceptMap::new(Topic::named("T0"));
        for (i, parent) in parents.iter().enumerate() {
            let child = i + 1;
            map = map.with_subtopic(&format!("T{child}"), &format!("T{}", parent.index(child)));
        }
        map
    })
}

fn build(map: &ConceptMap) -> (Graph, Config) {
    let config = Config::default();
    let canvas = (config.render.width, config.render.height);
    let graph = build_graph(map, &config.theme, &config.layout, canvas, &ApproximateMeasurer)
        .expect("generated trees always resolve");
    (graph, config)
}

/// How far apart two boxes sit along their better-separated axis, as a
/// multiple of the gap that would just make them touch. 1.0 or more means
/// no overlap.
fn separation(a: &Node, b: &Node) -> f32 {
    let x = (a.x - b.x).abs() / ((a.width + b.width) / 2.0);
    let y = (a.y - b.y).abs() / ((a.height + b.height) / 2.0);
    x.max(y)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn root_is_immovable(map in tree_strategy()) {
        let (mut graph, config) = build(&map);
        let start = (graph.nodes[0].x, graph.nodes[0].y);
        let mut moved = false;
        run_simulation(&mut graph, &config.layout.force, |frame, _| {
            moved |= (frame.nodes[0].x, frame.nodes[0].y) != start;
        });
        prop_assert!(!moved, "root left {:?}", start);
    }

    #[test]
    fn settled_layout_is_finite_and_on_canvas(map in tree_strategy()) {
        let (mut graph, config) = build(&map);
        let stats = run_simulation(&mut graph, &config.layout.force, |_, _| {});
        prop_assert!(stats.iterations <= config.layout.force.max_iterations);
        for node in &graph.nodes {
            prop_assert!(node.x.is_finite() && node.y.is_finite(), "{} is not finite", node.name);
            prop_assert!(node.x >= node.width / 2.0 && node.x <= graph.width - node.width / 2.0);
            prop_assert!(node.y >= node.height / 2.0 && node.y <= graph.height - node.height / 2.0);
        }
    }

    #[test]
    fn small_trees_settle_without_overlap(map in sized_tree_strategy(3, 4)) {
        let (mut graph, config) = build(&map);
        run_simulation(&mut graph, &config.layout.force, |_, _| {});
        for (i, a) in graph.nodes.iter().enumerate() {
            for b in &graph.nodes[i + 1..] {
                prop_assert!(
                    separation(a, b) >= 1.0,
                    "{} at ({}, {}) overlaps {} at ({}, {})",
                    a.name, a.x, a.y, b.name, b.x, b.y
                );
            }
        }
    }

    #[test]
    fn settled_overlap_stays_bounded(map in tree_strategy()) {
        let (mut graph, config) = build(&map);
        run_simulation(&mut graph, &config.layout.force, |_, _| {});
        for (i, a) in graph.nodes.iter().enumerate() {
            for b in &graph.nodes[i + 1..] {
                let ratio = separation(a, b);
                prop_assert!(
                    ratio >= MIN_SEPARATION,
                    "{} and {} only {} apart in box units",
                    a.name, b.name, ratio
                );
            }
        }
    }

    #[test]
    fn layout_is_deterministic(map in tree_strategy()) {
        let (mut first, config) = build(&map);
        let (mut second, _) = build(&map);
        run_simulation(&mut first, &config.layout.force, |_, _| {});
        run_simulation(&mut second, &config.layout.force, |_, _| {});
        prop_assert_eq!(first, second);
    }

    #[test]
    fn stepping_matches_headless_driver(map in tree_strategy()) {
        let (mut headless, config) = build(&map);
        let mut stepped = headless.clone();
        let stats = run_simulation(&mut headless, &config.layout.force, |_, _| {});

        let mut simulation = Simulation::new(config.layout.force);
        let mut steps = 0;
        while simulation.step(&mut stepped).is_some() {
            steps += 1;
        }
        prop_assert_eq!(steps, stats.iterations);
        prop_assert_eq!(simulation.stats(), stats);
        prop_assert_eq!(stepped, headless);
    }
}
