use std::collections::{HashMap, HashSet, VecDeque};
use std::f32::consts::TAU;

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::ir::{ConceptMap, Subtopic};
use crate::text_metrics::TextMeasurer;
use crate::theme::Theme;

use super::text::measure_node_label;
use super::types::{Graph, Link, Node, display_text};

struct NodeSeed<'a> {
    name: &'a str,
    emoji: &'a str,
    description: &'a str,
    level: usize,
    position: (f32, f32),
}

/// Turns the topic hierarchy into nodes and parent to child links.
///
/// Parents are expanded breadth-first from the root, so a child is only
/// created once its parent exists. Children are fanned out evenly around
/// their parent at `base_radius + parent_level * radius_step`. Any subtopic
/// left over when the queue drains names a parent that never materialised
/// and fails the whole build.
pub fn build_graph(
    map: &ConceptMap,
    theme: &Theme,
    config: &LayoutConfig,
    canvas: (f32, f32),
    measurer: &dyn TextMeasurer,
) -> Result<Graph> {
    let mut seen: HashSet<&str> = HashSet::from([map.main_topic.name.as_str()]);
    for sub in &map.subtopics {
        if !seen.insert(sub.name.as_str()) {
            return Err(Error::DuplicateTopic {
                name: sub.name.clone(),
            });
        }
    }

    let mut children_by_parent: HashMap<&str, Vec<&Subtopic>> = HashMap::new();
    for sub in &map.subtopics {
        children_by_parent
            .entry(sub.parent.as_str())
            .or_default()
            .push(sub);
    }

    let mut graph = Graph::empty(canvas.0, canvas.1);
    let mut color_index = 0usize;
    let mut make_node = |seed: NodeSeed<'_>, fixed: bool| {
        let text = display_text(seed.emoji, seed.name);
        let (label, width, height) =
            measure_node_label(&text, seed.level, &theme.font_family, config, measurer);
        let color = theme.palette_color(color_index);
        color_index += 1;
        Node {
            name: seed.name.to_string(),
            level: seed.level,
            emoji: seed.emoji.trim().to_string(),
            description: seed.description.to_string(),
            label,
            color,
            x: seed.position.0,
            y: seed.position.1,
            vx: 0.0,
            vy: 0.0,
            fixed,
            held: false,
            width,
            height,
        }
    };

    let root = &map.main_topic;
    graph.nodes.push(make_node(
        NodeSeed {
            name: &root.name,
            emoji: &root.emoji,
            description: &root.description,
            level: 0,
            position: (canvas.0 / 2.0, canvas.1 / 2.0),
        },
        true,
    ));

    let mut queue = VecDeque::from([0usize]);
    while let Some(parent_idx) = queue.pop_front() {
        let parent = &graph.nodes[parent_idx];
        let Some(children) = children_by_parent.remove(parent.name.as_str()) else {
            continue;
        };
        let (parent_x, parent_y, parent_level) = (parent.x, parent.y, parent.level);
        let radius = config.base_radius + parent_level as f32 * config.radius_step;
        let count = children.len() as f32;

        for (i, sub) in children.into_iter().enumerate() {
            let angle = TAU * i as f32 / count;
            let node = make_node(
                NodeSeed {
                    name: &sub.name,
                    emoji: &sub.emoji,
                    description: &sub.description,
                    level: parent_level + 1,
                    position: (
                        parent_x + angle.cos() * radius,
                        parent_y + angle.sin() * radius,
                    ),
                },
                false,
            );
            let child_idx = graph.nodes.len();
            graph.nodes.push(node);
            graph.links.push(Link {
                source: parent_idx,
                target: child_idx,
            });
            queue.push_back(child_idx);
        }
    }

    if let Some(orphan) = map
        .subtopics
        .iter()
        .find(|sub| children_by_parent.contains_key(sub.parent.as_str()))
    {
        return Err(Error::UnresolvedParent {
            name: orphan.name.clone(),
            parent: orphan.parent.clone(),
        });
    }

    tracing::debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "built concept graph"
    );
    Ok(graph)
}
