use crate::layout::{Graph, RunStats, StopReason};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub run: RunDump,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDump {
    pub iterations: usize,
    pub total_velocity: f32,
    pub stop_reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub name: String,
    pub level: usize,
    pub emoji: String,
    pub color: String,
    pub fixed: bool,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label_lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub source: String,
    pub target: String,
    pub length: f32,
}

impl LayoutDump {
    pub fn from_graph(graph: &Graph, stats: &RunStats) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeDump {
                name: node.name.clone(),
                level: node.level,
                emoji: node.emoji.clone(),
                color: node.color.clone(),
                fixed: node.fixed,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                label_lines: node.label.lines.clone(),
            })
            .collect();

        let links = graph
            .links
            .iter()
            .map(|link| LinkDump {
                source: graph.nodes[link.source].name.clone(),
                target: graph.nodes[link.target].name.clone(),
                length: graph.link_length(link),
            })
            .collect();

        let stop_reason = match stats.reason {
            StopReason::Running => "running",
            StopReason::Converged => "converged",
            StopReason::IterationCap => "iterationCap",
            StopReason::Degenerate => "degenerate",
        };

        LayoutDump {
            width: graph.width,
            height: graph.height,
            run: RunDump {
                iterations: stats.iterations,
                total_velocity: stats.total_velocity,
                stop_reason: stop_reason.to_string(),
            },
            nodes,
            links,
        }
    }
}

pub fn write_layout_dump(path: &Path, graph: &Graph, stats: &RunStats) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_graph(graph, stats);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ir::{ConceptMap, Topic};
    use crate::layout::compute_layout;
    use crate::text_metrics::ApproximateMeasurer;

    #[test]
    fn dump_names_link_endpoints() {
        let map = ConceptMap::new(Topic::named("A")).with_subtopic("B", "A");
        let (graph, stats) = compute_layout(&map, &Config::default(), &ApproximateMeasurer).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        write_layout_dump(&path, &graph, &stats).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["links"][0]["source"], "A");
        assert_eq!(value["links"][0]["target"], "B");
        assert_eq!(value["nodes"][0]["fixed"], true);
        assert_eq!(value["run"]["stopReason"], "converged");
        assert!(value["nodes"][1]["labelLines"].is_array());
    }
}
