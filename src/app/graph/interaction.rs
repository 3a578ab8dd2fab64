use eframe::egui::{self, Pos2, Rect, Ui};

use crate::graph::NodeKind;

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let canvas_center = self.session.config().center();
        let world_before = screen_to_world(rect, self.pan, self.zoom, canvas_center, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - ((world_before - canvas_center) * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Node under `pointer`, hit-tested against the engine's current positions.
    pub(in crate::app) fn node_under(&self, rect: Rect, pointer: Pos2) -> Option<(String, NodeKind)> {
        let world = screen_to_world(
            rect,
            self.pan,
            self.zoom,
            self.session.config().center(),
            pointer,
        );
        self.session
            .engine()
            .node_at(world)
            .map(|(id, kind)| (id.to_owned(), kind))
    }

    /// Primary-button drags pin the grabbed node to the pointer until release.
    pub(in crate::app) fn handle_node_drag(&mut self, rect: Rect, response: &egui::Response) {
        let canvas_center = self.session.config().center();

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some((id, _kind)) = self.node_under(rect, pointer)
        {
            let world = screen_to_world(rect, self.pan, self.zoom, canvas_center, pointer);
            if self.session.drag_start(&id, world.x, world.y) {
                self.dragging = Some(id);
            }
        }

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(id) = &self.dragging
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let world = screen_to_world(rect, self.pan, self.zoom, canvas_center, pointer);
            self.session.drag_move(id, world.x, world.y);
        }

        if response.drag_stopped()
            && let Some(id) = self.dragging.take()
        {
            self.session.drag_end(&id);
        }
    }

    /// A drag in progress survives the recomposition; its pin is carried into
    /// the new engine and released there on drag stop.
    pub(in crate::app) fn apply_node_click(&mut self, id: &str, kind: NodeKind) {
        self.session.click(id, kind);
    }
}
