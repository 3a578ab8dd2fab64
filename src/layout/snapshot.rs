use eframe::egui::{Vec2, vec2};
use serde::Serialize;

use crate::graph::{NodeKind, NodeRole};

/// Immutable copy of the layout after one committed tick.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LayoutSnapshot {
    pub generation: u64,
    pub tick: u64,
    pub alpha: f32,
    pub settled: bool,
    pub nodes: Vec<NodeSnapshot>,
    pub links: Vec<LinkSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub kind: NodeKind,
    pub role: NodeRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub linked_profile: bool,
    pub radius: f32,
    pub x: f32,
    pub y: f32,
    pub pinned: bool,
}

impl NodeSnapshot {
    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkSnapshot {
    pub source: String,
    pub target: String,
    pub label: String,
    pub source_x: f32,
    pub source_y: f32,
    pub target_x: f32,
    pub target_y: f32,
    /// Display radius of the target node, for arrowhead placement.
    pub target_radius: f32,
}

impl LinkSnapshot {
    pub fn source_position(&self) -> Vec2 {
        vec2(self.source_x, self.source_y)
    }

    pub fn target_position(&self) -> Vec2 {
        vec2(self.target_x, self.target_y)
    }
}

impl LayoutSnapshot {
    pub fn node(&self, id: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|node| node.id == id)
    }
}
