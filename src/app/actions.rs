use rasterpad::controller::Controller;
use rasterpad::persist;
use rasterpad::scene::Scene;
use rasterpad::settings;
use rasterpad::texture::Texture;
use std::path::PathBuf;

use super::RasterApp;

impl RasterApp {
    fn reset_interaction(&mut self) {
        self.controller = Controller::new(self.controller.editor().clone());
        self.context_target = None;
        self.pointer_captured = false;
    }

    fn replace_scene(&mut self, scene: Scene) {
        self.scene = scene;
        self.new_canvas_size = [self.scene.canvas().width(), self.scene.canvas().height()];
        self.reset_interaction();
    }

    pub(super) fn new_canvas(&mut self) {
        let [w, h] = self.new_canvas_size;
        let (w, h) = (
            w.clamp(1, persist::MAX_DIMENSION),
            h.clamp(1, persist::MAX_DIMENSION),
        );
        self.replace_scene(Scene::with_background(w, h, self.settings.background_color()));
        self.file_path = None;
        self.status = Some(format!("New {w}x{h} canvas"));
    }

    pub(super) fn resize_canvas(&mut self) {
        let [w, h] = self.new_canvas_size;
        let (w, h) = (
            w.clamp(1, persist::MAX_DIMENSION),
            h.clamp(1, persist::MAX_DIMENSION),
        );
        self.scene.resize(w, h);
        self.status = Some(format!("Resized to {w}x{h}"));
    }

    pub(super) fn clear_image(&mut self) {
        self.scene.clear();
        self.reset_interaction();
        self.status = Some("Cleared".to_string());
    }

    pub(super) fn delete_selected(&mut self) {
        if let Some(shape) = self.controller.delete_selected(&mut self.scene) {
            self.status = Some(format!("Deleted {}", shape.kind().label()));
        }
        self.context_target = None;
    }

    pub(super) fn open_path(&mut self, path: PathBuf) {
        match persist::load_from_file(&path, self.settings.background_color()) {
            Ok(scene) => {
                self.replace_scene(scene);
                self.status = Some(format!("Loaded {}", path.display()));
                self.remember_file(path);
            }
            Err(e) => {
                tracing::error!(error = ?e, "open failed");
                self.status = Some(format!("Open failed: {e:#}"));
            }
        }
    }

    pub(super) fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            self.open_path(path);
        }
    }

    pub(super) fn save(&mut self) {
        match self.file_path.clone() {
            Some(path) => self.save_to(path),
            None => self.save_as_dialog(),
        }
    }

    pub(super) fn save_as_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("canvas.json")
            .add_filter("JSON", &["json"])
            .save_file()
        {
            self.save_to(path);
        }
    }

    fn save_to(&mut self, path: PathBuf) {
        match persist::save_to_file(&self.scene, &path) {
            Ok(()) => {
                self.status = Some(format!("Saved {}", path.display()));
                self.remember_file(path);
            }
            Err(e) => {
                tracing::error!(error = ?e, "save failed");
                self.status = Some(format!("Save failed: {e:#}"));
            }
        }
    }

    pub(super) fn load_texture_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .pick_file()
        else {
            return;
        };
        let texture = std::fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| Texture::from_png(&bytes).map_err(|e| e.to_string()));
        match texture {
            Ok(texture) => {
                if self.controller.set_texture(&mut self.scene, Some(texture)) {
                    self.status = Some(format!("Texture {}", path.display()));
                } else {
                    self.status = Some("Select a polygon first".to_string());
                }
            }
            Err(e) => self.status = Some(format!("Texture load failed: {e}")),
        }
    }

    pub(super) fn clear_texture(&mut self) {
        self.controller.set_texture(&mut self.scene, None);
    }

    fn remember_file(&mut self, path: PathBuf) {
        self.file_path = Some(path.clone());
        self.settings.last_file = Some(path);
        self.persist_settings();
    }

    pub(super) fn persist_settings(&mut self) {
        let editor = self.controller.editor();
        self.settings.stroke_color = editor.color.to_argb_hex();
        self.settings.thickness = editor.thickness.get();
        if let Err(e) = settings::save_settings(&self.settings_path, &self.settings) {
            tracing::warn!(error = ?e, "settings not saved");
            self.status = Some(format!("Settings save failed: {e:#}"));
        }
    }
}
