use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use crate::graph::{NodeKind, NodeRole};

/// Many-body charge per node role; negative values repel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeTable {
    pub focus: f32,
    pub profile: f32,
    pub background: f32,
}

impl Default for ChargeTable {
    fn default() -> Self {
        Self {
            focus: -200.0,
            profile: -100.0,
            background: -30.0,
        }
    }
}

impl ChargeTable {
    pub fn charge(&self, role: NodeRole) -> f32 {
        match role {
            NodeRole::Focus => self.focus,
            NodeRole::Profile => self.profile,
            NodeRole::Background => self.background,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f32,
    pub height: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub charge: ChargeTable,
    pub theta: f32,
    pub distance_min: f32,
    pub collide_radius: f32,
    pub collide_strength: f32,
    pub profile_radius: f32,
    pub entity_radius: f32,
    pub focus_anchor_strength: f32,
    pub anchor_strength: f32,
    pub radial_strength: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub drag_alpha_target: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            width: 1600.0,
            height: 1600.0,
            link_distance: 400.0,
            link_strength: 0.5,
            charge: ChargeTable::default(),
            theta: 0.9,
            distance_min: 1.0,
            collide_radius: 30.0,
            collide_strength: 0.5,
            profile_radius: 25.0,
            entity_radius: 20.0,
            focus_anchor_strength: 0.03,
            anchor_strength: 0.01,
            radial_strength: 0.05,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
        }
    }
}

impl LayoutConfig {
    /// Reads a partial JSON override; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid layout config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("invalid layout config JSON")?;
        Ok(config.sanitized())
    }

    /// Clamps every parameter into a range the simulation stays stable in.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };

        self.width = finite_or(self.width, defaults.width).max(1.0);
        self.height = finite_or(self.height, defaults.height).max(1.0);
        self.link_distance = finite_or(self.link_distance, defaults.link_distance).max(0.0);
        self.link_strength = finite_or(self.link_strength, defaults.link_strength).clamp(0.0, 2.0);
        self.charge.focus = finite_or(self.charge.focus, defaults.charge.focus);
        self.charge.profile = finite_or(self.charge.profile, defaults.charge.profile);
        self.charge.background = finite_or(self.charge.background, defaults.charge.background);
        self.theta = finite_or(self.theta, defaults.theta).clamp(0.0, 2.0);
        self.distance_min = finite_or(self.distance_min, defaults.distance_min).max(0.01);
        self.collide_radius = finite_or(self.collide_radius, defaults.collide_radius).max(0.0);
        self.collide_strength =
            finite_or(self.collide_strength, defaults.collide_strength).clamp(0.0, 1.0);
        self.profile_radius = finite_or(self.profile_radius, defaults.profile_radius).max(1.0);
        self.entity_radius = finite_or(self.entity_radius, defaults.entity_radius).max(1.0);
        self.focus_anchor_strength =
            finite_or(self.focus_anchor_strength, defaults.focus_anchor_strength).clamp(0.0, 1.0);
        self.anchor_strength =
            finite_or(self.anchor_strength, defaults.anchor_strength).clamp(0.0, 1.0);
        self.radial_strength =
            finite_or(self.radial_strength, defaults.radial_strength).clamp(0.0, 1.0);
        self.alpha_min = finite_or(self.alpha_min, defaults.alpha_min).clamp(0.0, 1.0);
        self.alpha_decay = finite_or(self.alpha_decay, defaults.alpha_decay).clamp(0.0, 1.0);
        self.velocity_decay =
            finite_or(self.velocity_decay, defaults.velocity_decay).clamp(0.0, 1.0);
        self.drag_alpha_target =
            finite_or(self.drag_alpha_target, defaults.drag_alpha_target).clamp(0.0, 1.0);
        self
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    /// Radius of the ring unselected nodes drift toward while a selection exists.
    pub fn ring_radius(&self) -> f32 {
        self.width.max(self.height) * 0.5
    }

    pub fn node_radius(&self, kind: NodeKind) -> f32 {
        match kind {
            NodeKind::Profile => self.profile_radius,
            NodeKind::Entity => self.entity_radius,
        }
    }
}
