use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Shape, Stroke, Ui, Vec2, vec2};

use crate::graph::{NodeKind, NodeRole};
use crate::layout::LayoutSnapshot;

use super::super::ViewModel;
use super::super::render_utils::{
    FOCUS_RING, LINK_COLOR, LINKED_GLOW, circle_visible, draw_background, node_fill,
    segment_visible, world_to_screen,
};

const ARROW_GAP: f32 = 8.0;
const ARROW_SIZE: f32 = 7.0;

impl ViewModel {
    /// Keeps only the newest snapshot the session has published.
    pub(in crate::app) fn drain_snapshots(&mut self) {
        if let Some(newest) = self.snapshots.try_iter().last() {
            self.latest = newest;
        }
    }

    fn draw_links(&self, painter: &egui::Painter, rect: Rect, snapshot: &LayoutSnapshot) {
        let canvas_center = self.session.config().center();
        let zoom_sqrt = self.zoom.sqrt();
        let label_font = FontId::proportional((10.0 * zoom_sqrt).clamp(7.0, 16.0));

        for link in &snapshot.links {
            let start = world_to_screen(rect, self.pan, self.zoom, canvas_center, link.source_position());
            let end = world_to_screen(rect, self.pan, self.zoom, canvas_center, link.target_position());
            if !segment_visible(rect, start, end, 4.0) {
                continue;
            }

            painter.line_segment(
                [start, end],
                Stroke::new((1.5 * zoom_sqrt).clamp(0.6, 3.0), LINK_COLOR),
            );

            let delta = end - start;
            let distance = delta.length();
            if distance <= f32::EPSILON {
                continue;
            }
            let direction = delta / distance;
            let tip = end - direction * ((link.target_radius + ARROW_GAP) * self.zoom);
            let size = ARROW_SIZE * zoom_sqrt;
            let normal = vec2(-direction.y, direction.x);
            painter.add(Shape::convex_polygon(
                vec![
                    tip,
                    tip - direction * (size * 1.6) + normal * size,
                    tip - direction * (size * 1.6) - normal * size,
                ],
                Color32::from_gray(102),
                Stroke::NONE,
            ));

            if self.show_link_labels {
                let middle = start + delta * 0.5 + vec2(0.0, 15.0 * zoom_sqrt);
                painter.text(
                    middle,
                    Align2::CENTER_CENTER,
                    &link.label,
                    label_font.clone(),
                    Color32::from_gray(60),
                );
            }
        }
    }

    fn draw_nodes(
        &self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        snapshot: &LayoutSnapshot,
        hovered: Option<&str>,
    ) -> bool {
        let canvas_center = self.session.config().center();
        let time = ui.input(|input| input.time) as f32;
        let pulse = 0.5 + 0.5 * (time * std::f32::consts::TAU).sin();
        let label_font = FontId::proportional((10.0 * self.zoom.sqrt()).clamp(8.0, 16.0));
        let mut animating = false;

        for node in &snapshot.nodes {
            let position = world_to_screen(rect, self.pan, self.zoom, canvas_center, node.position());
            let radius = (node.radius * self.zoom).max(2.0);
            if !circle_visible(rect, position, radius + 20.0) {
                continue;
            }

            if node.linked_profile {
                animating = true;
                painter.circle_stroke(
                    position,
                    radius + 2.0,
                    Stroke::new(
                        1.0 + pulse * 6.0 * self.zoom.sqrt(),
                        LINKED_GLOW.gamma_multiply(0.25 + pulse * 0.5),
                    ),
                );
            }

            let is_hovered = hovered == Some(node.id.as_str());
            painter.circle_filled(position, radius, node_fill(node.kind, node.role, is_hovered));

            let outline = if node.role == NodeRole::Focus {
                Stroke::new(3.0, FOCUS_RING)
            } else if node.pinned {
                Stroke::new(2.0, Color32::from_gray(40))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 160))
            };
            painter.circle_stroke(position, radius, outline);

            painter.text(
                position + vec2(0.0, radius + 10.0 * self.zoom.sqrt()),
                Align2::CENTER_CENTER,
                &node.id,
                label_font.clone(),
                Color32::BLACK,
            );
        }

        animating
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.handle_node_drag(rect, &response);

        let moving = self.live_physics && self.session.tick();
        if moving || self.dragging.is_some() || response.dragged() {
            ui.ctx().request_repaint();
        }

        self.drain_snapshots();
        let snapshot = Arc::clone(&self.latest);

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered = pointer
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| self.node_under(rect, pointer));
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        self.draw_links(&painter, rect, &snapshot);
        let animating = self.draw_nodes(
            ui,
            &painter,
            rect,
            &snapshot,
            hovered.as_ref().map(|(id, _)| id.as_str()),
        );
        if animating {
            ui.ctx().request_repaint();
        }

        if let Some((id, kind)) = &hovered {
            let detail = snapshot
                .node(id)
                .and_then(|node| node.origin.as_deref())
                .map(|origin| format!("  |  via {origin}"))
                .unwrap_or_default();
            let kind_label = match kind {
                NodeKind::Profile => "profile",
                NodeKind::Entity => "entity",
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{id}  |  {kind_label}{detail}"),
                FontId::proportional(13.0),
                Color32::from_gray(30),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some((id, kind)) = hovered
        {
            self.apply_node_click(&id, kind);
        }
    }

    pub(in crate::app) fn reset_view(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 0.5;
    }
}
