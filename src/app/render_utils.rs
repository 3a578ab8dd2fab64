use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::graph::{NodeKind, NodeRole};

pub(super) const PROFILE_FILL: Color32 = Color32::from_rgb(255, 165, 0);
pub(super) const ENTITY_FILL: Color32 = Color32::from_rgb(105, 179, 162);
pub(super) const FOCUS_RING: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const LINKED_GLOW: Color32 = Color32::from_rgb(255, 60, 40);
pub(super) const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(92, 92, 92, 153);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn node_fill(kind: NodeKind, role: NodeRole, hovered: bool) -> Color32 {
    let base = match kind {
        NodeKind::Profile => PROFILE_FILL,
        NodeKind::Entity => ENTITY_FILL,
    };
    let base = if role == NodeRole::Focus {
        blend_color(base, FOCUS_RING, 0.35)
    } else {
        base
    };
    if hovered {
        blend_color(base, Color32::WHITE, 0.25)
    } else {
        base
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(246, 246, 242));

    let step = (80.0 * zoom.clamp(0.4, 2.0)).max(24.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(180, 184, 190, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// Conservative segment culling: keeps any segment whose bounding box touches
/// the padded viewport.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end).intersects(rect.expand(padding))
}

/// `canvas_center` is the layout point drawn at the middle of the viewport.
pub(super) fn world_to_screen(
    rect: Rect,
    pan: Vec2,
    zoom: f32,
    canvas_center: Vec2,
    world: Vec2,
) -> Pos2 {
    rect.center() + pan + (world - canvas_center) * zoom
}

pub(super) fn screen_to_world(
    rect: Rect,
    pan: Vec2,
    zoom: f32,
    canvas_center: Vec2,
    screen: Pos2,
) -> Vec2 {
    ((screen - rect.center() - pan) / zoom) + canvas_center
}
