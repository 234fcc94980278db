use std::path::{Path, PathBuf};

use concept_map_renderer::generate::extract_candidate_text;
use concept_map_renderer::layout::compute_layout;
use concept_map_renderer::render::render_svg;
use concept_map_renderer::text_metrics::ApproximateMeasurer;
use concept_map_renderer::{ConceptMap, Config, Error, parse_concept_map};

fn fixture_path(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel)
}

fn load_fixture(rel: &str) -> Result<ConceptMap, Error> {
    let path = fixture_path(rel);
    assert!(path.exists(), "fixture missing: {rel}");
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    if input.contains("\"candidates\"") {
        parse_concept_map(&extract_candidate_text(&input)?)
    } else {
        parse_concept_map(&input)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[test]
fn render_all_fixtures() {
    let config = Config::default();

    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "basic.json",
        "deep.json",
        "envelope.json",
        "long_names.json",
        "wide.json",
        "wrapped.txt",
    ];

    for rel in candidates {
        let map = load_fixture(rel).unwrap_or_else(|err| panic!("{rel}: {err}"));
        let (graph, stats) = compute_layout(&map, &config, &ApproximateMeasurer)
            .unwrap_or_else(|err| panic!("{rel}: {err}"));

        assert_eq!(graph.nodes.len(), map.subtopics.len() + 1, "{rel}: node count");
        assert_eq!(graph.links.len(), map.subtopics.len(), "{rel}: link count");
        assert!(stats.iterations <= config.layout.force.max_iterations, "{rel}");

        let root = graph.root().expect("root node");
        assert_eq!((root.x, root.y), (600.0, 400.0), "{rel}: root moved");

        for node in &graph.nodes {
            assert!(node.x.is_finite() && node.y.is_finite(), "{rel}: {} not finite", node.name);
            assert!(
                node.x >= node.width / 2.0 - 1e-3 && node.x <= graph.width - node.width / 2.0 + 1e-3,
                "{rel}: {} outside canvas horizontally",
                node.name
            );
            assert!(
                node.y >= node.height / 2.0 - 1e-3 && node.y <= graph.height - node.height / 2.0 + 1e-3,
                "{rel}: {} outside canvas vertically",
                node.name
            );
            assert!(node.width <= config.layout.max_node_width.max(config.layout.root_min_width));
        }

        let svg = render_svg(&graph, &config);
        assert!(svg.contains("<svg"), "{rel}: missing <svg tag");
        assert!(svg.contains("</svg>"), "{rel}: missing </svg tag");
        for node in &graph.nodes {
            for line in &node.label.lines {
                assert!(svg.contains(&escape(line)), "{rel}: label line {line:?} not drawn");
            }
        }
    }
}

#[test]
fn levels_follow_the_hierarchy() {
    let map = load_fixture("deep.json").unwrap();
    let (graph, _) = compute_layout(&map, &Config::default(), &ApproximateMeasurer).unwrap();
    let level = |name: &str| graph.nodes[graph.index_of(name).unwrap()].level;
    assert_eq!(level("Computer"), 0);
    assert_eq!(level("Hardware"), 1);
    assert_eq!(level("CPU"), 2);
    assert_eq!(level("Cache"), 3);
    assert_eq!(level("Scheduler"), 3);
}

#[test]
fn colors_wrap_after_the_palette() {
    let config = Config::default();
    let map = load_fixture("wide.json").unwrap();
    let (graph, _) = compute_layout(&map, &config, &ApproximateMeasurer).unwrap();
    let palette = &config.theme.palette;
    assert!(graph.nodes.len() > palette.len());
    assert_eq!(graph.nodes[palette.len()].color, graph.nodes[0].color);
}

#[test]
fn rejected_fixtures_report_their_cause() {
    assert!(matches!(
        load_fixture("not_json.txt"),
        Err(Error::MalformedResponse { .. })
    ));
    assert!(matches!(
        load_fixture("missing_subtopics.json"),
        Err(Error::MalformedResponse { .. })
    ));

    let map = load_fixture("unresolved_parent.json").unwrap();
    match compute_layout(&map, &Config::default(), &ApproximateMeasurer) {
        Err(Error::UnresolvedParent { name, parent }) => {
            assert_eq!(name, "Spring tide");
            assert_eq!(parent, "Moon");
        }
        other => panic!("unexpected result {other:?}"),
    }
}
