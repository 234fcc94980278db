//! Pointer handling for a live layout: hit-testing and node dragging.
//!
//! A held node is pinned for the simulation, so the pointer is the only
//! thing moving it. On release it rejoins the simulation from wherever it
//! was dropped.

use crate::layout::{Graph, NodeDetails};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Grab {
    node: usize,
    offset: (f32, f32),
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    grab: Option<Grab>,
}

/// Topmost node under the point. Nodes are drawn in index order, so the
/// highest index wins.
pub fn node_at(graph: &Graph, x: f32, y: f32) -> Option<usize> {
    graph.nodes.iter().rposition(|node| node.contains(x, y))
}

pub fn details_at(graph: &Graph, x: f32, y: f32) -> Option<NodeDetails> {
    node_at(graph, x, y).map(|index| graph.nodes[index].details())
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the node currently being dragged.
    pub fn active(&self) -> Option<usize> {
        self.grab.map(|grab| grab.node)
    }

    /// Grabs whatever node is under the pointer.
    pub fn press(&mut self, graph: &mut Graph, pointer: (f32, f32)) -> Option<usize> {
        let index = node_at(graph, pointer.0, pointer.1)?;
        self.begin(graph, index, pointer).then_some(index)
    }

    /// Starts dragging `index`. Fixed nodes and out-of-range indices are
    /// refused. Any previous grab is released first.
    pub fn begin(&mut self, graph: &mut Graph, index: usize, pointer: (f32, f32)) -> bool {
        self.end(graph);
        let Some(node) = graph.nodes.get_mut(index) else {
            return false;
        };
        if node.fixed {
            return false;
        }
        node.vx = 0.0;
        node.vy = 0.0;
        node.held = true;
        self.grab = Some(Grab {
            node: index,
            offset: (pointer.0 - node.x, pointer.1 - node.y),
        });
        tracing::debug!(node = %node.name, "drag started");
        true
    }

    /// Moves the held node so it keeps its offset from the pointer.
    pub fn drag_to(&mut self, graph: &mut Graph, pointer: (f32, f32)) -> bool {
        let Some(grab) = self.grab else {
            return false;
        };
        let Some(node) = graph.nodes.get_mut(grab.node) else {
            self.grab = None;
            return false;
        };
        node.x = pointer.0 - grab.offset.0;
        node.y = pointer.1 - grab.offset.1;
        true
    }

    /// Releases the held node, returning its index.
    pub fn end(&mut self, graph: &mut Graph) -> Option<usize> {
        let grab = self.grab.take()?;
        let node = graph.nodes.get_mut(grab.node)?;
        node.held = false;
        tracing::debug!(node = %node.name, x = node.x, y = node.y, "drag ended");
        Some(grab.node)
    }

    /// Forgets the grab without touching any graph, for when the graph it
    /// referred to has been replaced.
    pub fn reset(&mut self) {
        self.grab = None;
    }
}
