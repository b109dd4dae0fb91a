//! Painter view of a scene's world.

use eframe::egui::{self, Color32, Pos2, Rect, Stroke};
use glam::Vec2;
use physlab::scenes::{CANVAS_HEIGHT, CANVAS_WIDTH};
use physlab::{Color, SceneController, Shape, Style};

pub const BACKGROUND: Color32 = Color32::from_rgb(20, 20, 26);
const CANVAS: Color32 = Color32::from_rgb(17, 17, 17);
const TRAIL: Color32 = Color32::from_rgb(255, 215, 0);
const GRAB_LINE: Color32 = Color32::from_rgb(200, 200, 200);

fn color32(color: Color) -> Color32 {
    let [r, g, b, a] = color.0;
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn outline(style: Style, scale: f32) -> Stroke {
    match style.stroke {
        Some(color) => Stroke::new(style.line_width * scale, color32(color)),
        None => Stroke::NONE,
    }
}

/// World to screen mapping: uniform scale, canvas centred in the panel.
struct View {
    origin: Pos2,
    scale: f32,
    offset_x: f32,
}

impl View {
    fn to_screen(&self, p: Vec2) -> Pos2 {
        self.origin + egui::vec2(p.x - self.offset_x, p.y) * self.scale
    }

    fn to_world(&self, p: Pos2) -> Vec2 {
        let local = (p - self.origin) / self.scale;
        Vec2::new(local.x + self.offset_x, local.y)
    }
}

/// Feed pointer drags on the canvas to the controller's grab.
fn drive_pointer(response: &egui::Response, view: &View, controller: &mut SceneController) {
    let pointer = response.interact_pointer_pos().map(|p| view.to_world(p));
    if response.drag_started() {
        if let Some(point) = pointer {
            controller.grab(point);
        }
    } else if response.dragged() {
        if let Some(point) = pointer {
            controller.drag_to(point);
        }
    }
    if response.drag_stopped() {
        controller.release();
    }
}

/// Draw bodies, constraints and the trail of `controller`'s world.
///
/// With `follow` set, the view scrolls horizontally to keep the first scene
/// body in the middle. Draggable scenes take pointer drags on the canvas.
pub fn paint_scene(ui: &mut egui::Ui, controller: &mut SceneController, follow: bool) {
    let sense = if controller.scene().is_draggable() {
        egui::Sense::drag()
    } else {
        egui::Sense::hover()
    };
    let (response, painter) = ui.allocate_painter(ui.available_size(), sense);
    let rect = response.rect;
    let scale = (rect.width() / CANVAS_WIDTH).min(rect.height() / CANVAS_HEIGHT);
    let size = egui::vec2(CANVAS_WIDTH, CANVAS_HEIGHT) * scale;
    let origin = rect.center() - size / 2.0;

    let offset_x = if follow {
        let world = controller.world();
        controller
            .scene_entities()
            .iter()
            .find_map(|&id| world.body(id).filter(|b| !b.is_static()))
            .map_or(0.0, |b| b.position().x - CANVAS_WIDTH / 2.0)
    } else {
        0.0
    };
    let view = View {
        origin,
        scale,
        offset_x,
    };
    drive_pointer(&response, &view, controller);
    let world = controller.world();

    let canvas = Rect::from_min_size(origin, size);
    painter.rect_filled(canvas, 0.0, CANVAS);
    let painter = painter.with_clip_rect(canvas);

    if let Some(trail) = controller.trail() {
        for segment in trail.segments(controller.clock().elapsed_secs()) {
            painter.line_segment(
                [view.to_screen(segment.from), view.to_screen(segment.to)],
                Stroke::new(2.0 * scale, TRAIL.gamma_multiply(segment.alpha)),
            );
        }
    }

    for body in world.bodies() {
        let style = body.style();
        let fill = color32(style.fill);
        match body.shape() {
            Shape::Circle { radius } => {
                let center = view.to_screen(body.position());
                painter.circle(center, radius * scale, fill, outline(style, scale));
                // Spoke so rolling is visible
                if !body.is_static() {
                    let tip = body.position() + Vec2::from_angle(body.angle()) * *radius;
                    painter.line_segment(
                        [center, view.to_screen(tip)],
                        Stroke::new(1.0, Color32::from_black_alpha(90)),
                    );
                }
            }
            _ => {
                let Some(vertices) = body.world_vertices() else {
                    continue;
                };
                let points: Vec<Pos2> = vertices.iter().map(|&v| view.to_screen(v)).collect();
                painter.add(egui::Shape::convex_polygon(points, fill, outline(style, scale)));
            }
        }
    }

    for constraint in world.constraints() {
        let (a, b) = constraint.endpoints();
        let style = constraint.style();
        let color = color32(style.stroke.unwrap_or(style.fill));
        painter.line_segment(
            [
                view.to_screen(world.endpoint_position(a)),
                view.to_screen(world.endpoint_position(b)),
            ],
            Stroke::new(style.line_width * scale, color),
        );
    }

    if let Some(grab) = controller.grabbed() {
        if let Some(body) = world.body(grab.body) {
            let held = body.position() + Vec2::from_angle(body.angle()).rotate(grab.offset);
            painter.line_segment(
                [view.to_screen(held), view.to_screen(grab.target)],
                Stroke::new(1.5, GRAB_LINE),
            );
            painter.circle_filled(view.to_screen(grab.target), 3.0, GRAB_LINE);
        }
    }
}
