use eframe::egui;
use rasterpad::controller::Tool;
use rasterpad::geometry::{Point, point};
use rasterpad::model::{Fill, Shape, Thickness};

use super::RasterApp;
use super::render::{color_row, draw_handles, draw_preview, sync_texture, tool_button};

#[derive(Default)]
struct KeyCommands {
    open: bool,
    save: bool,
    new_canvas: bool,
    cancel: bool,
    delete: bool,
    tool: Option<Tool>,
}

impl RasterApp {
    fn sync_thickness_text(&mut self) {
        let thickness = self
            .controller
            .selection()
            .and_then(|id| self.scene.get(id))
            .map(|s| s.style().thickness)
            .unwrap_or(self.controller.editor().thickness);
        self.thickness_text = format!("{}", thickness.get());
    }

    fn thickness_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("<<").clicked() {
                self.controller
                    .step_thickness(&mut self.scene, -Thickness::STEP);
                self.sync_thickness_text();
            }
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.thickness_text).desired_width(40.0),
            );
            if response.lost_focus() {
                let text = self.thickness_text.clone();
                self.controller.set_thickness_text(&mut self.scene, &text);
                self.sync_thickness_text();
            }
            if ui.button(">>").clicked() {
                self.controller
                    .step_thickness(&mut self.scene, Thickness::STEP);
                self.sync_thickness_text();
            }
        });
    }

    fn fill_controls(&mut self, ui: &mut egui::Ui) {
        let mut fill = self.selected_fill().unwrap_or(self.controller.editor().fill);
        let mut changed = ui.checkbox(&mut fill.enabled, "Fill").changed();
        if let Some(c) = color_row(ui, fill.color) {
            fill.color = c;
            changed = true;
        }
        if changed {
            self.controller.set_fill(&mut self.scene, fill);
        }
    }

    fn selected_fill(&self) -> Option<Fill> {
        match self.controller.selection().and_then(|id| self.scene.get(id)) {
            Some(Shape::Polygon(poly)) => Some(poly.fill),
            _ => None,
        }
    }

    fn selected_is_polygon(&self) -> bool {
        self.selected_fill().is_some()
    }

    fn context_menu_ui(&mut self, ui: &mut egui::Ui) {
        if self.context_target.is_none() {
            if ui.button("Clear image").clicked() {
                self.clear_image();
                ui.close();
            }
            return;
        }
        if ui.button("Delete").clicked() {
            self.delete_selected();
            ui.close();
            return;
        }
        ui.separator();
        ui.label("Thickness");
        self.thickness_row(ui);
        ui.label("Color");
        let current = self
            .controller
            .selection()
            .and_then(|id| self.scene.get(id))
            .map(|s| s.style().color)
            .unwrap_or(self.controller.editor().color);
        if let Some(c) = color_row(ui, current) {
            self.controller.set_color(&mut self.scene, c);
        }
        if self.selected_is_polygon() {
            ui.separator();
            self.fill_controls(ui);
            if ui.button("Load fill texture...").clicked() {
                ui.close();
                self.load_texture_dialog();
            }
            if ui.button("Remove texture").clicked() {
                self.clear_texture();
                ui.close();
            }
        }
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let size = egui::vec2(
            self.scene.canvas().width() as f32,
            self.scene.canvas().height() as f32,
        );
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        let origin = rect.min;
        let to_canvas = |pos: egui::Pos2| -> Point {
            point((pos.x - origin.x) as f64, (pos.y - origin.y) as f64)
        };

        let (pointer, press_origin, moving) = ctx.input(|i| {
            (
                i.pointer.interact_pos(),
                i.pointer.press_origin(),
                i.pointer.is_moving(),
            )
        });
        let primary = egui::PointerButton::Primary;
        let clicked = response.clicked_by(primary);

        if response.drag_started_by(primary) || clicked {
            if let Some(pos) = press_origin.or(pointer) {
                self.controller.pointer_down(&mut self.scene, to_canvas(pos));
                self.pointer_captured = true;
                self.sync_thickness_text();
            }
        }
        if let Some(pos) = pointer {
            if moving && (self.pointer_captured || response.hovered()) {
                self.controller.pointer_move(&mut self.scene, to_canvas(pos));
            }
        }
        if self.pointer_captured && (response.drag_stopped_by(primary) || clicked) {
            if let Some(pos) = pointer {
                self.controller.pointer_up(&mut self.scene, to_canvas(pos));
            }
            self.pointer_captured = false;
        }

        if response.secondary_clicked() {
            if let Some(pos) = pointer {
                self.context_target = self.controller.right_click(&self.scene, to_canvas(pos));
                self.sync_thickness_text();
            }
        }
        response.context_menu(|ui| self.context_menu_ui(ui));

        let texture_id = sync_texture(ctx, &mut self.texture, self.scene.canvas());
        let painter = ui.painter_at(rect);
        painter.image(
            texture_id,
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
        draw_preview(&painter, origin, &self.controller);
        draw_handles(&painter, origin, &self.scene, &self.controller);
    }
}

impl eframe::App for RasterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let wants_keyboard = ctx.wants_keyboard_input();
        let keys = ctx.input_mut(|i| {
            let mut keys = KeyCommands {
                open: i.consume_key(egui::Modifiers::COMMAND, egui::Key::O),
                save: i.consume_key(egui::Modifiers::COMMAND, egui::Key::S),
                new_canvas: i.consume_key(egui::Modifiers::COMMAND, egui::Key::N),
                ..KeyCommands::default()
            };
            if !wants_keyboard {
                keys.cancel = i.key_pressed(egui::Key::Escape);
                keys.delete =
                    i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace);
                let digits = [
                    egui::Key::Num1,
                    egui::Key::Num2,
                    egui::Key::Num3,
                    egui::Key::Num4,
                    egui::Key::Num5,
                ];
                keys.tool = digits
                    .iter()
                    .position(|k| i.key_pressed(*k))
                    .map(|idx| Tool::ALL[idx]);
            }
            keys
        });
        if keys.open {
            self.open_dialog();
        }
        if keys.save {
            self.save();
        }
        if keys.new_canvas {
            self.new_canvas();
        }
        if keys.cancel {
            self.controller.cancel();
        }
        if keys.delete {
            self.delete_selected();
        }
        if let Some(tool) = keys.tool {
            self.controller.set_tool(tool);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Size:");
                        ui.add(
                            egui::DragValue::new(&mut self.new_canvas_size[0])
                                .range(1..=rasterpad::persist::MAX_DIMENSION),
                        );
                        ui.label("x");
                        ui.add(
                            egui::DragValue::new(&mut self.new_canvas_size[1])
                                .range(1..=rasterpad::persist::MAX_DIMENSION),
                        );
                    });
                    if ui.button("New canvas (⌘N)").clicked() {
                        self.new_canvas();
                        ui.close();
                    }
                    if ui.button("Resize canvas").clicked() {
                        self.resize_canvas();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Open... (⌘O)").clicked() {
                        ui.close();
                        self.open_dialog();
                    }
                    if ui.button("Save (⌘S)").clicked() {
                        ui.close();
                        self.save();
                    }
                    if ui.button("Save As...").clicked() {
                        ui.close();
                        self.save_as_dialog();
                    }
                    ui.separator();
                    if ui.button("Clear image").clicked() {
                        self.clear_image();
                        ui.close();
                    }
                });
                ui.menu_button("Tools", |ui| {
                    for tool in Tool::ALL {
                        if tool_button(ui, tool, self.controller.editor().tool) {
                            self.controller.set_tool(tool);
                            ui.close();
                        }
                    }
                });
            });
        });

        egui::SidePanel::left("tool_panel")
            .resizable(false)
            .min_width(180.0)
            .show(ctx, |ui| {
                ui.heading("Tools");
                ui.horizontal_wrapped(|ui| {
                    for tool in Tool::ALL {
                        if tool_button(ui, tool, self.controller.editor().tool) {
                            self.controller.set_tool(tool);
                        }
                    }
                });
                ui.separator();
                ui.label("Stroke");
                if let Some(c) = color_row(ui, self.controller.editor().color) {
                    self.controller.set_color(&mut self.scene, c);
                }
                self.thickness_row(ui);
                ui.separator();
                self.fill_controls(ui);
                ui.add_enabled_ui(self.selected_is_polygon(), |ui| {
                    if ui.button("Load fill texture...").clicked() {
                        self.load_texture_dialog();
                    }
                });
                ui.separator();
                let mut tolerance = self.controller.editor().tolerance;
                let response =
                    ui.add(egui::Slider::new(&mut tolerance, 1.0..=20.0).text("Hit radius"));
                if response.changed() {
                    self.controller.set_tolerance(tolerance);
                    self.settings.hit_tolerance = tolerance;
                }
                if response.drag_stopped() {
                    self.persist_settings();
                }
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status.as_deref().unwrap_or("Ready"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    for (kind, n) in self.scene.counts().iter().rev() {
                        ui.label(format!("{}s: {n}", kind.label()));
                        ui.separator();
                    }
                    ui.label(format!(
                        "{}x{}",
                        self.scene.canvas().width(),
                        self.scene.canvas().height()
                    ));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                self.canvas_ui(ui, ctx);
            });
        });

        self.controller.sync(&self.scene);
    }
}
