use eframe::egui;
use rasterpad::canvas::Canvas;
use rasterpad::controller::{Controller, Preview, Tool};
use rasterpad::geometry::Point;
use rasterpad::model::{Handle, Rgba, Shape};
use rasterpad::scene::Scene;

use super::CanvasTexture;

const HANDLE_COLOR: egui::Color32 = egui::Color32::from_rgb(90, 160, 255);
const MOVE_HANDLE_COLOR: egui::Color32 = egui::Color32::from_rgb(219, 112, 147);

pub(super) fn tool_button(ui: &mut egui::Ui, tool: Tool, selected: Tool) -> bool {
    ui.selectable_label(selected == tool, tool.label()).clicked()
}

fn to_color32(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// Preset swatches plus a picker. Returns the new color when one was chosen.
pub(super) fn color_row(ui: &mut egui::Ui, current: Rgba) -> Option<Rgba> {
    let mut picked = None;
    ui.horizontal(|ui| {
        let presets = [
            Rgba::BLACK,
            Rgba::rgb(200, 40, 40),
            Rgba::rgb(40, 140, 60),
            Rgba::rgb(40, 90, 200),
            Rgba::rgb(200, 140, 40),
            Rgba::rgb(130, 60, 180),
        ];
        for c in presets {
            if ui
                .add_sized([18.0, 18.0], egui::Button::new("").fill(to_color32(c)))
                .clicked()
            {
                picked = Some(c);
            }
        }
        let mut arr = [current.r, current.g, current.b, current.a];
        if ui.color_edit_button_srgba_unmultiplied(&mut arr).changed() {
            picked = Some(Rgba::new(arr[0], arr[1], arr[2], arr[3]));
        }
    });
    picked
}

/// Keeps the GPU texture in step with the canvas. Uploads happen between
/// draw scopes only. A replaced canvas has a new generation, so it never
/// reuses the old upload even when revisions coincide.
pub(super) fn sync_texture(
    ctx: &egui::Context,
    slot: &mut Option<CanvasTexture>,
    canvas: &Canvas,
) -> egui::TextureId {
    let frame = (canvas.generation(), canvas.revision());
    if let Some(tex) = slot.as_mut() {
        if tex.frame != frame {
            tex.handle.set(color_image(canvas), egui::TextureOptions::NEAREST);
            tex.frame = frame;
        }
        return tex.handle.id();
    }
    let handle = ctx.load_texture("canvas", color_image(canvas), egui::TextureOptions::NEAREST);
    let id = handle.id();
    *slot = Some(CanvasTexture { handle, frame });
    id
}

fn color_image(canvas: &Canvas) -> egui::ColorImage {
    let size = [canvas.width() as usize, canvas.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, &canvas.to_rgba())
}

fn screen(origin: egui::Pos2, p: Point) -> egui::Pos2 {
    origin + egui::vec2(p.x as f32, p.y as f32)
}

fn draw_shape_outline(painter: &egui::Painter, origin: egui::Pos2, shape: &Shape) {
    let stroke = egui::Stroke::new(
        shape.style().thickness.get() as f32,
        to_color32(shape.style().color),
    );
    match shape {
        Shape::Line(l) => {
            painter.line_segment([screen(origin, l.p1), screen(origin, l.p2)], stroke);
        }
        Shape::Circle(c) => {
            painter.circle_stroke(screen(origin, c.center), c.radius as f32, stroke);
        }
        Shape::Rectangle(r) => {
            let rect = egui::Rect::from_two_pos(screen(origin, r.p1), screen(origin, r.p2));
            painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Middle);
        }
        Shape::Polygon(poly) => {
            let pts: Vec<egui::Pos2> = poly.vertices.iter().map(|v| screen(origin, *v)).collect();
            painter.add(egui::Shape::closed_line(pts, stroke));
        }
    }
}

pub(super) fn draw_preview(painter: &egui::Painter, origin: egui::Pos2, controller: &Controller) {
    match controller.preview() {
        Some(Preview::Shape(shape)) => draw_shape_outline(painter, origin, &shape),
        Some(Preview::Polyline {
            vertices,
            cursor,
            style,
        }) => {
            let stroke = egui::Stroke::new(style.thickness.get() as f32, to_color32(style.color));
            let mut pts: Vec<egui::Pos2> = vertices.iter().map(|v| screen(origin, *v)).collect();
            pts.push(screen(origin, cursor));
            painter.add(egui::Shape::line(pts, stroke));
            for v in vertices {
                painter.circle_filled(screen(origin, *v), 3.0, HANDLE_COLOR);
            }
        }
        None => {}
    }
}

/// Square markers on every handle of the selected shape.
pub(super) fn draw_handles(
    painter: &egui::Painter,
    origin: egui::Pos2,
    scene: &Scene,
    controller: &Controller,
) {
    let Some(shape) = controller.selection().and_then(|id| scene.get(id)) else {
        return;
    };
    if let Shape::Circle(c) = shape {
        let s = egui::Stroke::new(1.0, HANDLE_COLOR);
        painter.circle_stroke(screen(origin, c.center), c.radius as f32, s);
    }
    for (handle, at) in shape.handles() {
        let color = if handle.is_translate() {
            MOVE_HANDLE_COLOR
        } else {
            HANDLE_COLOR
        };
        let r = egui::Rect::from_center_size(screen(origin, at), egui::vec2(7.0, 7.0));
        if matches!(handle, Handle::CircleRadius) {
            painter.rect_stroke(r, 0.0, egui::Stroke::new(1.5, color), egui::StrokeKind::Middle);
        } else {
            painter.rect_filled(r, 0.0, color);
        }
    }
}
