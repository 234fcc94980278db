use serde::Serialize;

pub const DEFAULT_EMOJI: &str = "📝";
pub const NO_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique within one graph.
    pub name: String,
    /// Depth below the root; the root is level 0.
    pub level: usize,
    pub emoji: String,
    pub description: String,
    pub label: TextBlock,
    pub color: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Never moved by the simulation.
    pub fixed: bool,
    /// Claimed by an active drag gesture; pinned until released.
    pub held: bool,
    pub width: f32,
    pub height: f32,
}

/// Parent to child edge, by node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
}

/// One layout run's worth of nodes and links plus the canvas they live on.
/// Structure is frozen after building; only positions and velocities move.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDetails {
    pub title: String,
    pub emoji: String,
    pub description: String,
}

impl Node {
    pub fn is_pinned(&self) -> bool {
        self.fixed || self.held
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    pub fn display_text(&self) -> String {
        display_text(&self.emoji, &self.name)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        (x - self.x).abs() <= self.width / 2.0 && (y - self.y).abs() <= self.height / 2.0
    }

    pub fn details(&self) -> NodeDetails {
        let description = if self.description.trim().is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            self.description.clone()
        };
        NodeDetails {
            title: self.name.clone(),
            emoji: self.emoji.clone(),
            description,
        }
    }
}

impl Graph {
    pub fn empty(width: f32, height: f32) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            width,
            height,
        }
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.iter().find(|node| node.is_root())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }

    pub fn link_length(&self, link: &Link) -> f32 {
        let source = &self.nodes[link.source];
        let target = &self.nodes[link.target];
        (target.x - source.x).hypot(target.y - source.y)
    }

    /// Sum of |vx| + |vy| over every node the simulation may move.
    pub fn total_velocity(&self) -> f32 {
        self.nodes
            .iter()
            .filter(|node| !node.is_pinned())
            .map(|node| node.vx.abs() + node.vy.abs())
            .sum()
    }
}

pub(crate) fn display_text(emoji: &str, name: &str) -> String {
    let emoji = if emoji.trim().is_empty() {
        DEFAULT_EMOJI
    } else {
        emoji.trim()
    };
    format!("{emoji} {name}")
}
