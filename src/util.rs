use std::f32::consts::{PI, TAU};

use eframe::egui::{Vec2, vec2};

const INITIAL_RADIUS: f32 = 10.0;

/// Deterministic unit vector from node `from` toward node `to`, used when the two
/// share a position and the real direction is undefined.
///
/// Swapping the arguments negates the result, so both nodes of a pair are pushed
/// apart along the same axis.
pub fn pair_direction(from: usize, to: usize) -> Vec2 {
    let (low, high) = if from <= to { (from, to) } else { (to, from) };
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214 + 0.11) * TAU;
    let direction = vec2(angle.cos(), angle.sin());
    if from <= to { direction } else { -direction }
}

/// Sunflower spiral offset for the `index`-th node; no two indices coincide.
pub fn phyllotaxis(index: usize) -> Vec2 {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    let radius = INITIAL_RADIUS * (index as f32 + 0.5).sqrt();
    let angle = index as f32 * golden_angle;
    vec2(radius * angle.cos(), radius * angle.sin())
}
