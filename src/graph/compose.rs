use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::profile::Dataset;

use super::{ComposedGraph, GraphLink, GraphNode, NodeKind, NodeRole};

fn resolve_role(kind: NodeKind, id: &str, selected: &HashSet<&str>) -> NodeRole {
    if selected.is_empty() {
        return NodeRole::Background;
    }
    match kind {
        NodeKind::Profile if selected.contains(id) => NodeRole::Focus,
        NodeKind::Profile => NodeRole::Profile,
        NodeKind::Entity => NodeRole::Background,
    }
}

/// Builds the visible node and link set for the given selection.
///
/// Every profile is present as a node. Each selected profile, in selection order,
/// adds its related entities and one link per distinct related entity, labelled with
/// the relation types that connect them.
pub fn compose(dataset: &Dataset, selected: &[String]) -> ComposedGraph {
    let linked = dataset.linked_profiles();
    let mut nodes = dataset
        .profiles()
        .iter()
        .map(|profile| GraphNode {
            id: profile.name.clone(),
            kind: NodeKind::Profile,
            origin: None,
            role: NodeRole::Background,
            linked_profile: linked.contains(profile.name.as_str()),
        })
        .collect::<Vec<_>>();
    let mut index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), index))
        .collect::<HashMap<_, _>>();

    let mut links = Vec::new();
    let mut expanded = HashSet::new();
    for id in selected {
        if !expanded.insert(id.as_str()) {
            continue;
        }
        let Some(profile) = dataset.profile(id) else {
            debug!(id = %id, "selected id is not a profile, nothing to expand");
            continue;
        };

        let mut labels: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for relation in &profile.relations {
            for entity in &relation.entities {
                if !index_by_id.contains_key(entity) {
                    let kind = if dataset.is_profile(entity) {
                        NodeKind::Profile
                    } else {
                        NodeKind::Entity
                    };
                    index_by_id.insert(entity.clone(), nodes.len());
                    nodes.push(GraphNode {
                        id: entity.clone(),
                        kind,
                        origin: Some(relation.relation_type.clone()),
                        role: NodeRole::Background,
                        linked_profile: false,
                    });
                }

                let types = labels.entry(entity.as_str()).or_default();
                if !types.contains(&relation.relation_type.as_str()) {
                    types.push(relation.relation_type.as_str());
                }
            }
        }

        links.extend(labels.into_iter().map(|(entity, types)| GraphLink {
            source: profile.name.clone(),
            target: entity.to_owned(),
            label: types.join(", "),
        }));
    }

    let selected_profiles = expanded
        .into_iter()
        .filter(|id| dataset.is_profile(id))
        .collect::<HashSet<_>>();
    for node in &mut nodes {
        node.role = resolve_role(node.kind, &node.id, &selected_profiles);
    }

    debug!(
        selected = selected_profiles.len(),
        nodes = nodes.len(),
        links = links.len(),
        "composed graph"
    );

    ComposedGraph { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::parse_profiles;

    fn dataset(raw: &str) -> Dataset {
        Dataset::from_raw(&parse_profiles(raw).unwrap())
    }

    fn alice_and_bob() -> Dataset {
        dataset(
            r#"{"profile":[
                {"name":"Alice","relations":[
                    {"relation":"born_in","entities":["Paris"],"status":["confirmed"]}
                ]},
                {"name":"Bob","relations":[]}
            ]}"#,
        )
    }

    fn ids(graph: &ComposedGraph) -> Vec<(&str, NodeKind)> {
        graph
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.kind))
            .collect()
    }

    #[test]
    fn empty_selection_has_one_node_per_profile_and_no_links() {
        let graph = compose(&alice_and_bob(), &[]);
        assert_eq!(
            ids(&graph),
            vec![("Alice", NodeKind::Profile), ("Bob", NodeKind::Profile)]
        );
        assert!(graph.links.is_empty());
        assert!(
            graph
                .nodes
                .iter()
                .all(|node| node.role == NodeRole::Background && node.origin.is_none())
        );
    }

    #[test]
    fn single_selection_adds_entities_and_links() {
        let graph = compose(&alice_and_bob(), &["Alice".to_string()]);
        assert_eq!(
            ids(&graph),
            vec![
                ("Alice", NodeKind::Profile),
                ("Bob", NodeKind::Profile),
                ("Paris", NodeKind::Entity),
            ]
        );
        assert_eq!(graph.nodes[2].origin.as_deref(), Some("born_in"));
        assert_eq!(
            graph.links,
            vec![GraphLink {
                source: "Alice".into(),
                target: "Paris".into(),
                label: "born_in".into(),
            }]
        );
        assert_eq!(graph.nodes[0].role, NodeRole::Focus);
        assert_eq!(graph.nodes[1].role, NodeRole::Profile);
        assert_eq!(graph.nodes[2].role, NodeRole::Background);
    }

    #[test]
    fn link_labels_accumulate_relation_types_in_order() {
        let data = dataset(
            r#"{"profile":[{"name":"Alice","relations":[
                {"relation":"lives_in","entities":["Paris"],"status":[]},
                {"relation":"born_in","entities":["Paris","Rome"],"status":[]}
            ]}]}"#,
        );
        let graph = compose(&data, &["Alice".to_string()]);
        assert_eq!(graph.links.len(), 2);
        assert_eq!(graph.links[0].target, "Paris");
        assert_eq!(graph.links[0].label, "lives_in, born_in");
        assert_eq!(graph.links[1].label, "born_in");
        let paris = graph.nodes.iter().find(|node| node.id == "Paris").unwrap();
        assert_eq!(paris.origin.as_deref(), Some("lives_in"));
    }

    #[test]
    fn related_profiles_are_not_expanded_recursively() {
        let data = dataset(
            r#"{"profile":[
                {"name":"Alice","relations":[{"relation":"has_son","entities":["Carl"],"status":[]}]},
                {"name":"Carl","relations":[{"relation":"lives_in","entities":["Oslo"],"status":[]}]}
            ]}"#,
        );
        let graph = compose(&data, &["Alice".to_string()]);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.nodes[1].kind, NodeKind::Profile);
        assert!(graph.nodes[0].linked_profile);

        let both = compose(&data, &["Alice".to_string(), "Carl".to_string()]);
        assert_eq!(both.nodes.len(), 3);
        assert_eq!(both.links.len(), 2);
        assert_eq!(both.links[1].source, "Carl");
        assert_eq!(both.nodes[1].role, NodeRole::Focus);
    }

    #[test]
    fn unknown_selection_contributes_nothing() {
        let graph = compose(&alice_and_bob(), &["Nobody".to_string()]);
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.links.is_empty());
        assert!(
            graph
                .nodes
                .iter()
                .all(|node| node.role == NodeRole::Background)
        );
    }

    #[test]
    fn shared_entities_are_added_once() {
        let data = dataset(
            r#"{"profile":[
                {"name":"Alice","relations":[{"relation":"born_in","entities":["Paris"],"status":[]}]},
                {"name":"Bob","relations":[{"relation":"lives_in","entities":["Paris"],"status":[]}]}
            ]}"#,
        );
        let graph = compose(&data, &["Bob".to_string(), "Alice".to_string()]);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.nodes[2].origin.as_deref(), Some("lives_in"));
        assert_eq!(graph.links[0].source, "Bob");
        assert_eq!(graph.links[1].source, "Alice");
    }

    #[test]
    fn self_reference_keeps_its_link() {
        let data = dataset(
            r#"{"profile":[{"name":"Alice","relations":[
                {"relation":"alias","entities":["Alice"],"status":[]}
            ]}]}"#,
        );
        let graph = compose(&data, &["Alice".to_string()]);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(
            graph.links,
            vec![GraphLink {
                source: "Alice".to_string(),
                target: "Alice".to_string(),
                label: "alias".to_string(),
            }]
        );
    }

    #[test]
    fn every_link_endpoint_is_a_node() {
        let data = dataset(
            r#"{"profile":[
                {"name":"Alice","relations":[
                    {"relation":"alias","entities":["Alice","Al"],"status":[]},
                    {"relation":"knows","entities":["Bob"],"status":[]}
                ]},
                {"name":"Bob","relations":[{"relation":"knows","entities":["Alice"],"status":[]}]}
            ]}"#,
        );
        let graph = compose(&data, &["Alice".to_string(), "Bob".to_string()]);
        let node_ids = graph
            .nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        assert_eq!(node_ids.len(), graph.nodes.len());
        for link in &graph.links {
            assert!(node_ids.contains(link.source.as_str()));
            assert!(node_ids.contains(link.target.as_str()));
        }
        assert_eq!(graph.links.len(), 4);
    }
}
