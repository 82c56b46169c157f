mod app;

use rasterpad::{logging, settings};

fn main() -> eframe::Result<()> {
    let settings_path = settings::default_path();
    let settings = settings::load_or_default(&settings_path);
    logging::init(settings.debug_logging);
    tracing::info!(path = %settings_path.display(), "starting");

    let size = [
        (settings.canvas_width as f32 + 240.0).max(640.0),
        (settings.canvas_height as f32 + 120.0).max(480.0),
    ];
    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size(size),
        ..Default::default()
    };
    eframe::run_native(
        "Rasterpad",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::RasterApp::new(cc, settings, settings_path)))),
    )
}
