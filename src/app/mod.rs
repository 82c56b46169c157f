use eframe::egui;
use rasterpad::controller::Controller;
use rasterpad::model::ShapeId;
use rasterpad::scene::Scene;
use rasterpad::settings::EditorSettings;
use std::path::PathBuf;

mod actions;
mod render;
mod update;

/// GPU copy of the canvas, re-uploaded when the frame it was taken from
/// (canvas generation and revision) is no longer current.
struct CanvasTexture {
    handle: egui::TextureHandle,
    frame: (u64, u64),
}

pub struct RasterApp {
    scene: Scene,
    controller: Controller,
    settings: EditorSettings,
    settings_path: PathBuf,
    file_path: Option<PathBuf>,
    status: Option<String>,
    texture: Option<CanvasTexture>,
    pointer_captured: bool,
    context_target: Option<ShapeId>,
    thickness_text: String,
    new_canvas_size: [u32; 2],
}

impl RasterApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        settings: EditorSettings,
        settings_path: PathBuf,
    ) -> Self {
        let scene = Scene::with_background(
            settings.canvas_width,
            settings.canvas_height,
            settings.background_color(),
        );
        let controller = Controller::new(settings.editor_state());
        let thickness_text = format!("{}", controller.editor().thickness.get());
        let mut app = Self {
            scene,
            controller,
            new_canvas_size: [settings.canvas_width, settings.canvas_height],
            settings,
            settings_path,
            file_path: None,
            status: None,
            texture: None,
            pointer_captured: false,
            context_target: None,
            thickness_text,
        };
        if let Some(path) = app.settings.last_file.clone() {
            if path.exists() {
                app.open_path(path);
            }
        }
        app
    }
}
