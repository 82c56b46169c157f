use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::controller::{EditorState, Tool};
use crate::model::{Fill, Rgba, Thickness};

/// Persistent editor preferences.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// `#AARRGGBB`.
    pub background: String,
    pub stroke_color: String,
    pub thickness: f64,
    pub hit_tolerance: f64,
    pub debug_logging: bool,
    pub last_file: Option<PathBuf>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            canvas_width: 400,
            canvas_height: 400,
            background: Rgba::WHITE.to_argb_hex(),
            stroke_color: Rgba::BLACK.to_argb_hex(),
            thickness: 3.0,
            hit_tolerance: 8.0,
            debug_logging: false,
            last_file: None,
        }
    }
}

impl EditorSettings {
    pub fn background_color(&self) -> Rgba {
        parse_or(&self.background, Rgba::WHITE)
    }

    pub fn stroke_color(&self) -> Rgba {
        parse_or(&self.stroke_color, Rgba::BLACK)
    }

    pub fn editor_state(&self) -> EditorState {
        EditorState {
            tool: Tool::Line,
            color: self.stroke_color(),
            thickness: Thickness::new(self.thickness),
            fill: Fill::default(),
            tolerance: self.hit_tolerance.max(0.0),
        }
    }
}

fn parse_or(value: &str, fallback: Rgba) -> Rgba {
    Rgba::parse_hex(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "bad color in settings");
        fallback
    })
}

/// `$HOME/.config/rasterpad.toml`, or `./rasterpad.toml` without a home.
pub fn default_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".config").join("rasterpad.toml"),
        None => PathBuf::from("rasterpad.toml"),
    }
}

/// Reads settings as toml or JSON, trying the extension's format first.
pub fn load_settings(path: &Path) -> Option<EditorSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    let is_toml = path.extension().is_some_and(|e| e == "toml");
    let parsed = if is_toml {
        toml::from_str::<EditorSettings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<EditorSettings>(&s).ok())
    } else {
        serde_json::from_str::<EditorSettings>(&s)
            .ok()
            .or_else(|| toml::from_str::<EditorSettings>(&s).ok())
    };
    if parsed.is_none() {
        tracing::warn!(path = %path.display(), "unreadable settings, using defaults");
    }
    parsed
}

pub fn load_or_default(path: &Path) -> EditorSettings {
    load_settings(path).unwrap_or_default()
}

pub fn save_settings(path: &Path, settings: &EditorSettings) -> anyhow::Result<()> {
    use anyhow::Context as _;

    let text = if path.extension().is_some_and(|e| e == "toml") {
        toml::to_string_pretty(settings).context("encoding settings as toml")?
    } else {
        serde_json::to_string_pretty(settings).context("encoding settings as json")?
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("rasterpad.toml");
        let settings = EditorSettings {
            canvas_width: 640,
            thickness: 7.0,
            last_file: Some(PathBuf::from("/tmp/a.json")),
            ..EditorSettings::default()
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), Some(settings));
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rasterpad.toml");
        std::fs::write(&path, "hit_tolerance = 4.0\n").unwrap();
        let settings = load_or_default(&path);
        assert_eq!(settings.hit_tolerance, 4.0);
        assert_eq!(settings.canvas_width, 400);
    }

    #[test]
    fn json_content_is_accepted_in_a_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rasterpad.toml");
        std::fs::write(&path, r#"{"canvas_height": 123}"#).unwrap();
        assert_eq!(load_or_default(&path).canvas_height, 123);
    }

    #[test]
    fn missing_or_broken_files_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_or_default(&dir.path().join("absent.toml")),
            EditorSettings::default()
        );
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "canvas_width = [").unwrap();
        assert_eq!(load_or_default(&broken), EditorSettings::default());
    }

    #[test]
    fn editor_state_uses_clamped_values() {
        let settings = EditorSettings {
            thickness: 50.0,
            stroke_color: "nonsense".into(),
            ..EditorSettings::default()
        };
        let editor = settings.editor_state();
        assert_eq!(editor.thickness.get(), 21.0);
        assert_eq!(editor.color, Rgba::BLACK);
    }
}
