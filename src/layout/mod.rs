mod config;
mod forces;
mod quadtree;
mod snapshot;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, info, warn};

use crate::graph::{ComposedGraph, GraphNode, NodeKind, NodeRole};
use crate::util::phyllotaxis;

pub use config::LayoutConfig;
use forces::{AnchorParams, LinkParams, ManyBodyParams};
pub use snapshot::{LayoutSnapshot, LinkSnapshot, NodeSnapshot};

/// Spiral index new children start at around a retained parent, keeping them
/// clear of the parent's own radius.
const CHILD_SPIRAL_OFFSET: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Settled,
    Stopped,
}

struct LayoutNode {
    node: GraphNode,
    position: Vec2,
    velocity: Vec2,
    pin: Option<Vec2>,
    radius: f32,
    collide_radius: f32,
    anchor: Vec2,
}

struct LayoutLink {
    source: usize,
    target: usize,
    label: String,
    bias: f32,
}

#[derive(Clone, Copy, Debug)]
struct RetainedNode {
    position: Vec2,
    pin: Option<Vec2>,
}

/// Positions and pins carried from a superseded engine into its replacement.
#[derive(Clone, Debug, Default)]
pub struct RetainedLayout {
    nodes: HashMap<String, RetainedNode>,
}

impl RetainedLayout {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    charges: Vec<f32>,
    predicted: Vec<Vec2>,
    radii: Vec<f32>,
    corrections: Vec<Vec2>,
}

/// Force-directed simulation over one composed graph.
///
/// The engine owns its node and link arrays for its whole lifetime; callers read
/// positions through [`ForceLayoutEngine::snapshot`] and move nodes only through
/// the pin API, between ticks.
pub struct ForceLayoutEngine {
    config: LayoutConfig,
    nodes: Vec<LayoutNode>,
    links: Vec<LayoutLink>,
    index_by_id: HashMap<String, usize>,
    focus_active: bool,
    alpha: f32,
    alpha_target: f32,
    state: EngineState,
    ticks: u64,
    scratch: PhysicsScratch,
}

impl ForceLayoutEngine {
    pub fn new(graph: ComposedGraph, config: LayoutConfig) -> Self {
        Self::with_retained(graph, config, &RetainedLayout::default())
    }

    pub fn with_retained(
        graph: ComposedGraph,
        config: LayoutConfig,
        retained: &RetainedLayout,
    ) -> Self {
        let config = config.sanitized();
        let ComposedGraph { nodes, links } = graph;

        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut degree = vec![0usize; nodes.len()];
        let mut parent_by_index: Vec<Option<usize>> = vec![None; nodes.len()];
        let mut layout_links = Vec::with_capacity(links.len());
        for link in links {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            else {
                warn!(source = %link.source, target = %link.target, "dropping link with unknown endpoint");
                continue;
            };
            // Self links are drawn but exert no force.
            if source != target {
                degree[source] += 1;
                degree[target] += 1;
                parent_by_index[target].get_or_insert(source);
            }
            layout_links.push(LayoutLink {
                source,
                target,
                label: link.label,
                bias: 0.0,
            });
        }
        for link in &mut layout_links {
            let source = degree[link.source] as f32;
            let target = degree[link.target] as f32;
            link.bias = if source + target > 0.0 {
                source / (source + target)
            } else {
                0.5
            };
        }

        let ids = nodes.iter().map(|node| node.id.clone()).collect::<Vec<_>>();
        let center = config.center();
        let mut children_placed = vec![0usize; nodes.len()];
        let mut layout_nodes = Vec::with_capacity(nodes.len());
        let mut retained_count = 0usize;
        for (index, node) in nodes.into_iter().enumerate() {
            let kept = retained.nodes.get(&node.id).copied();
            let parent_position = parent_by_index[index].and_then(|parent| {
                retained
                    .nodes
                    .get(&ids[parent])
                    .map(|parent_node| (parent, parent_node.position))
            });

            let position = match (kept, parent_position) {
                (Some(kept), _) => {
                    retained_count += 1;
                    kept.pin.unwrap_or(kept.position)
                }
                (None, Some((parent, parent_position))) => {
                    let slot = children_placed[parent];
                    children_placed[parent] += 1;
                    parent_position + phyllotaxis(slot + CHILD_SPIRAL_OFFSET)
                }
                (None, None) => center + phyllotaxis(index),
            };

            layout_nodes.push(LayoutNode {
                radius: config.node_radius(node.kind),
                collide_radius: config.collide_radius,
                node,
                position,
                velocity: Vec2::ZERO,
                pin: kept.and_then(|kept| kept.pin),
                anchor: position,
            });
        }

        let focus_active = layout_nodes
            .iter()
            .any(|node| node.node.role == NodeRole::Focus);
        let alpha_target = if layout_nodes.iter().any(|node| node.pin.is_some()) {
            config.drag_alpha_target
        } else {
            0.0
        };

        info!(
            nodes = layout_nodes.len(),
            links = layout_links.len(),
            retained = retained_count,
            focus_active,
            "layout engine started"
        );

        Self {
            config,
            nodes: layout_nodes,
            links: layout_links,
            index_by_id,
            focus_active,
            alpha: 1.0,
            alpha_target,
            state: EngineState::Running,
            ticks: 0,
            scratch: PhysicsScratch::default(),
        }
    }

    /// Advances the simulation by one step; returns `false` when nothing moved
    /// because the engine is settled or stopped.
    pub fn tick(&mut self) -> bool {
        if self.state != EngineState::Running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;
        let config = self.config;

        forces::apply_links(
            &mut self.nodes,
            &self.links,
            LinkParams {
                distance: config.link_distance,
                strength: config.link_strength,
            },
            alpha,
        );

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.charges.clear();
        for node in &self.nodes {
            scratch.positions.push(node.position);
            scratch.charges.push(config.charge.charge(node.node.role));
        }
        forces::apply_many_body(
            &mut self.nodes,
            &scratch.positions,
            &scratch.charges,
            ManyBodyParams {
                theta_sq: config.theta * config.theta,
                distance_min: config.distance_min,
            },
            alpha,
        );

        forces::apply_center(&mut self.nodes, config.center());

        forces::apply_collisions(
            &mut self.nodes,
            &mut scratch.predicted,
            &mut scratch.radii,
            &mut scratch.corrections,
            config.collide_strength,
        );

        if self.focus_active {
            forces::apply_anchors(
                &mut self.nodes,
                AnchorParams {
                    center: config.center(),
                    ring_radius: config.ring_radius(),
                    focus_strength: config.focus_anchor_strength,
                    strength: config.anchor_strength,
                    radial_strength: config.radial_strength,
                },
                alpha,
            );
        }

        self.integrate();
        self.ticks += 1;

        if self.alpha < self.config.alpha_min {
            self.state = EngineState::Settled;
            info!(ticks = self.ticks, "layout settled");
        }
        true
    }

    fn integrate(&mut self) {
        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            if let Some(pin) = node.pin {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            node.velocity *= retain;
            let next = node.position + node.velocity;
            if node.velocity.is_finite() && next.is_finite() {
                node.position = next;
            } else {
                warn!(id = %node.node.id, "discarding non-finite velocity");
                node.velocity = Vec2::ZERO;
            }
        }
    }

    /// Runs ticks until the engine settles or `max_ticks` have elapsed.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && self.tick() {
            ran += 1;
        }
        ran
    }

    fn restart(&mut self) {
        if self.state == EngineState::Settled {
            debug!(ticks = self.ticks, "layout restarted");
            self.state = EngineState::Running;
        }
    }

    /// Raises alpha and resumes ticking after the engine settled.
    pub fn reheat(&mut self, alpha: f32) {
        if self.state == EngineState::Stopped {
            return;
        }
        self.alpha = alpha.clamp(self.config.alpha_min, 1.0);
        self.restart();
    }

    /// Cancels the simulation for good; later ticks and pins are no-ops.
    pub fn stop(&mut self) {
        if self.state != EngineState::Stopped {
            debug!(ticks = self.ticks, "layout engine stopped");
            self.state = EngineState::Stopped;
        }
    }

    pub fn pin(&mut self, id: &str, x: f32, y: f32) -> bool {
        let point = vec2(x, y);
        if self.state == EngineState::Stopped || !point.is_finite() {
            return false;
        }
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        let node = &mut self.nodes[index];
        node.pin = Some(point);
        node.position = point;
        node.velocity = Vec2::ZERO;
        self.alpha_target = self.config.drag_alpha_target;
        self.restart();
        true
    }

    pub fn move_pin(&mut self, id: &str, x: f32, y: f32) -> bool {
        let point = vec2(x, y);
        if self.state == EngineState::Stopped || !point.is_finite() {
            return false;
        }
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        let node = &mut self.nodes[index];
        if node.pin.is_none() {
            return false;
        }
        node.pin = Some(point);
        node.position = point;
        true
    }

    /// Frees a pinned node where it stands, at rest.
    pub fn unpin(&mut self, id: &str) -> bool {
        if self.state == EngineState::Stopped {
            return false;
        }
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        let node = &mut self.nodes[index];
        if node.pin.take().is_none() {
            return false;
        }
        node.velocity = Vec2::ZERO;
        if self.nodes.iter().all(|node| node.pin.is_none()) {
            self.alpha_target = 0.0;
        }
        true
    }

    /// Swaps the force parameters while keeping every node where it is.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config.sanitized();
        for node in &mut self.nodes {
            node.radius = self.config.node_radius(node.node.kind);
            node.collide_radius = self.config.collide_radius;
        }
        if self.nodes.iter().any(|node| node.pin.is_some()) {
            self.alpha_target = self.config.drag_alpha_target;
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.nodes[index].position)
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.index_by_id
            .get(id)
            .is_some_and(|&index| self.nodes[index].pin.is_some())
    }

    /// Topmost node whose display radius contains `point`.
    pub fn node_at(&self, point: Vec2) -> Option<(&str, NodeKind)> {
        self.nodes
            .iter()
            .rev()
            .find(|node| (node.position - point).length() <= node.radius)
            .map(|node| (node.node.id.as_str(), node.node.kind))
    }

    pub fn retained_layout(&self) -> RetainedLayout {
        RetainedLayout {
            nodes: self
                .nodes
                .iter()
                .map(|node| {
                    (
                        node.node.id.clone(),
                        RetainedNode {
                            position: node.position,
                            pin: node.pin,
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeSnapshot {
                id: node.node.id.clone(),
                kind: node.node.kind,
                role: node.node.role,
                origin: node.node.origin.clone(),
                linked_profile: node.node.linked_profile,
                radius: node.radius,
                x: node.position.x,
                y: node.position.y,
                pinned: node.pin.is_some(),
            })
            .collect();

        let links = self
            .links
            .iter()
            .map(|link| {
                let source = &self.nodes[link.source];
                let target = &self.nodes[link.target];
                LinkSnapshot {
                    source: source.node.id.clone(),
                    target: target.node.id.clone(),
                    label: link.label.clone(),
                    source_x: source.position.x,
                    source_y: source.position.y,
                    target_x: target.position.x,
                    target_y: target.position.y,
                    target_radius: target.radius,
                }
            })
            .collect();

        LayoutSnapshot {
            generation: 0,
            tick: self.ticks,
            alpha: self.alpha,
            settled: self.state == EngineState::Settled,
            nodes,
            links,
        }
    }
}
