mod compose;
mod selection;

use serde::Serialize;

pub use compose::compose;
pub use selection::SelectionController;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Profile,
    Entity,
}

/// Layout role of a node, resolved once per composition.
///
/// `Focus` is a selected profile. `Profile` is an unselected profile while something
/// is selected. Entities, and every node while nothing is selected, are `Background`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Focus,
    Profile,
    Background,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    /// Relation type that first introduced the node; `None` for baseline profiles.
    pub origin: Option<String>,
    pub role: NodeRole,
    pub linked_profile: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposedGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}
