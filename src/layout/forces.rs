use eframe::egui::Vec2;

use crate::graph::NodeRole;
use crate::util::pair_direction;

use super::quadtree::QuadNode;
use super::{LayoutLink, LayoutNode};

/// Separation below which two points are treated as coincident.
pub(super) const DEGENERATE_DISTANCE: f32 = 0.0001;

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) distance: f32,
    pub(super) strength: f32,
}

#[derive(Clone, Copy)]
pub(super) struct ManyBodyParams {
    pub(super) theta_sq: f32,
    pub(super) distance_min: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) max_distance_sq: f32,
}

#[derive(Clone, Copy)]
pub(super) struct AnchorParams {
    pub(super) center: Vec2,
    pub(super) ring_radius: f32,
    pub(super) focus_strength: f32,
    pub(super) strength: f32,
    pub(super) radial_strength: f32,
}

/// Spring toward the target link length, split between the endpoints by degree.
///
/// Coincident endpoints have no direction and are skipped for this tick.
pub(super) fn apply_links(
    nodes: &mut [LayoutNode],
    links: &[LayoutLink],
    params: LinkParams,
    alpha: f32,
) {
    let node_count = nodes.len();
    for link in links {
        let (source, target) = (link.source, link.target);
        if source >= node_count || target >= node_count || source == target {
            continue;
        }

        let delta = (nodes[target].position + nodes[target].velocity)
            - (nodes[source].position + nodes[source].velocity);
        let distance = delta.length();
        if !(distance > DEGENERATE_DISTANCE) {
            continue;
        }

        let scale = (distance - params.distance) / distance * alpha * params.strength;
        let correction = delta * scale;
        nodes[target].velocity -= correction * link.bias;
        nodes[source].velocity += correction * (1.0 - link.bias);
    }
}

fn clamp_distance_sq(distance_sq: f32, distance_min: f32) -> f32 {
    if distance_sq < distance_min * distance_min {
        distance_min * distance_sq.sqrt()
    } else {
        distance_sq
    }
}

fn pair_repulsion(
    index: usize,
    other: usize,
    delta: Vec2,
    other_charge: f32,
    distance_min: f32,
) -> Vec2 {
    let distance_sq = delta.length_sq();
    if distance_sq <= DEGENERATE_DISTANCE * DEGENERATE_DISTANCE {
        return pair_direction(index, other) * (other_charge / distance_min);
    }
    delta * (other_charge / clamp_distance_sq(distance_sq, distance_min))
}

fn accumulate_repulsion(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    params: ManyBodyParams,
    force: &mut Vec2,
) {
    if node.charge == 0.0 {
        return;
    }

    let point = positions[index];
    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            *force += pair_repulsion(
                index,
                other,
                positions[other] - point,
                charges[other],
                params.distance_min,
            );
        }
        return;
    }

    let delta = node.center - point;
    let distance_sq = delta.length_sq();
    let width = node.bounds.side_length();
    if !node.bounds.contains(point) && width * width < params.theta_sq * distance_sq {
        *force += delta * (node.charge / clamp_distance_sq(distance_sq, params.distance_min));
        return;
    }

    for child in node.children() {
        accumulate_repulsion(child, index, positions, charges, params, force);
    }
}

/// Barnes-Hut many-body force; negative charges push nodes apart.
pub(super) fn apply_many_body(
    nodes: &mut [LayoutNode],
    positions: &[Vec2],
    charges: &[f32],
    params: ManyBodyParams,
    alpha: f32,
) {
    let Some(tree) = QuadNode::build(positions, charges) else {
        return;
    };

    for (index, node) in nodes.iter_mut().enumerate() {
        let mut force = Vec2::ZERO;
        accumulate_repulsion(&tree, index, positions, charges, params, &mut force);
        node.velocity += force * alpha;
    }
}

fn collide_pair(
    from: usize,
    to: usize,
    predicted: &[Vec2],
    radii: &[f32],
    strength: f32,
    corrections: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let delta = predicted[from] - predicted[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }

    let distance = distance_sq.sqrt();
    let push = if distance > DEGENERATE_DISTANCE {
        delta * ((reach - distance) / distance * strength)
    } else {
        pair_direction(to, from) * (reach * strength)
    };

    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let total = from_sq + to_sq;
    if total <= 0.0 {
        return;
    }
    corrections[from] += push * (to_sq / total);
    corrections[to] -= push * (from_sq / total);
}

fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    predicted: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    collide_pair(from, to, predicted, radii, params.strength, corrections);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, predicted, radii, params.strength, corrections);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (first, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(
                child_a,
                child_a,
                true,
                predicted,
                radii,
                params,
                corrections,
            );
            for child_b in &children[first + 1..] {
                accumulate_collision_pairs(
                    child_a,
                    child_b,
                    false,
                    predicted,
                    radii,
                    params,
                    corrections,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, predicted, radii, params, corrections);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, predicted, radii, params, corrections);
        }
    }
}

/// Pushes overlapping nodes apart by adjusting their velocities.
///
/// Overlap is measured on the positions the nodes are about to move to.
pub(super) fn apply_collisions(
    nodes: &mut [LayoutNode],
    predicted: &mut Vec<Vec2>,
    radii: &mut Vec<f32>,
    corrections: &mut Vec<Vec2>,
    strength: f32,
) {
    predicted.clear();
    radii.clear();
    let mut max_radius = 0.0_f32;
    for node in nodes.iter() {
        predicted.push(node.position + node.velocity);
        radii.push(node.collide_radius);
        max_radius = max_radius.max(node.collide_radius);
    }
    if max_radius <= 0.0 || strength <= 0.0 {
        return;
    }

    let Some(tree) = QuadNode::build(predicted, &[]) else {
        return;
    };

    corrections.clear();
    corrections.resize(nodes.len(), Vec2::ZERO);
    let max_distance = max_radius * 2.0;
    accumulate_collision_pairs(
        &tree,
        &tree,
        true,
        predicted,
        radii,
        CollisionParams {
            strength,
            max_distance_sq: max_distance * max_distance,
        },
        corrections,
    );

    for (node, correction) in nodes.iter_mut().zip(corrections.iter()) {
        node.velocity += *correction;
    }
}

/// Translates free nodes so that the mean position sits on the canvas center.
pub(super) fn apply_center(nodes: &mut [LayoutNode], center: Vec2) {
    if nodes.is_empty() {
        return;
    }

    let mut sum = Vec2::ZERO;
    for node in nodes.iter() {
        sum += node.position;
    }
    let shift = sum / nodes.len() as f32 - center;
    if !shift.is_finite() || shift.length_sq() <= f32::EPSILON {
        return;
    }

    for node in nodes.iter_mut().filter(|node| node.pin.is_none()) {
        node.position -= shift;
    }
}

/// Selection-driven pulls: focus nodes toward the center, the rest toward their
/// starting spot along x/y and toward the outer ring radially.
pub(super) fn apply_anchors(nodes: &mut [LayoutNode], params: AnchorParams, alpha: f32) {
    for node in nodes.iter_mut() {
        let focus = node.node.role == NodeRole::Focus;
        let (target, strength, target_radius) = if focus {
            (params.center, params.focus_strength, 0.0)
        } else {
            (node.anchor, params.strength, params.ring_radius)
        };

        node.velocity += (target - node.position) * (strength * alpha);

        let offset = node.position - params.center;
        let radius = offset.length();
        if radius <= DEGENERATE_DISTANCE {
            continue;
        }
        let scale = (target_radius - radius) * params.radial_strength * alpha / radius;
        node.velocity += offset * scale;
    }
}
