use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::geometry::{Point, point};
use crate::model::{Circle, ColorParseError, Fill, Line, Polygon, Rectangle, Rgba, Shape, Style};
use crate::scene::Scene;
use crate::texture::{Texture, TextureError};

/// Largest canvas side accepted from a project file.
pub const MAX_DIMENSION: u32 = 16384;

/// Largest coordinate or radius magnitude accepted from a project file.
pub const MAX_COORDINATE: f64 = 1_000_000.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ProjectData {
    #[serde(alias = "BitmapWidth")]
    bitmap_width: u32,
    #[serde(alias = "BitmapHeight")]
    bitmap_height: u32,
    #[serde(alias = "Lines")]
    lines: Vec<LineDto>,
    #[serde(alias = "Circles")]
    circles: Vec<CircleDto>,
    // Older projects predate rectangles.
    #[serde(alias = "Rectangles", default)]
    rectangles: Vec<RectangleDto>,
    #[serde(alias = "Polygons")]
    polygons: Vec<PolygonDto>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct LineDto {
    #[serde(alias = "X1")]
    x1: f64,
    #[serde(alias = "Y1")]
    y1: f64,
    #[serde(alias = "X2")]
    x2: f64,
    #[serde(alias = "Y2")]
    y2: f64,
    #[serde(alias = "Thickness")]
    thickness: f64,
    #[serde(alias = "Color")]
    color: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct CircleDto {
    #[serde(alias = "CenterX")]
    center_x: f64,
    #[serde(alias = "CenterY")]
    center_y: f64,
    #[serde(alias = "Radius")]
    radius: f64,
    #[serde(alias = "Thickness")]
    thickness: f64,
    #[serde(alias = "Color")]
    color: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct RectangleDto {
    #[serde(alias = "X1")]
    x1: f64,
    #[serde(alias = "Y1")]
    y1: f64,
    #[serde(alias = "X2")]
    x2: f64,
    #[serde(alias = "Y2")]
    y2: f64,
    #[serde(alias = "Thickness")]
    thickness: f64,
    #[serde(alias = "Color")]
    color: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct PolygonDto {
    #[serde(alias = "IsFillColor", default)]
    is_fill_color: bool,
    #[serde(alias = "Vertices")]
    vertices: Vec<VertexDto>,
    #[serde(alias = "Thickness")]
    thickness: f64,
    #[serde(alias = "Color")]
    color: String,
    #[serde(alias = "FillColor", default)]
    fill_color: Option<String>,
    #[serde(alias = "BitmapSource", default)]
    bitmap_source: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
struct VertexDto {
    #[serde(alias = "X")]
    x: f64,
    #[serde(alias = "Y")]
    y: f64,
}

#[derive(Debug)]
pub enum DeserializationError {
    Malformed(serde_json::Error),
    InvalidColor(ColorParseError),
    InvalidBitmap(TextureError),
    InvalidDimensions { width: u32, height: u32 },
    OutOfRange { field: &'static str, value: f64 },
}

impl std::fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeserializationError::Malformed(e) => write!(f, "malformed project file: {e}"),
            DeserializationError::InvalidColor(e) => write!(f, "{e}"),
            DeserializationError::InvalidBitmap(e) => write!(f, "invalid polygon bitmap: {e}"),
            DeserializationError::InvalidDimensions { width, height } => write!(
                f,
                "invalid canvas size {width}x{height}, expected 1..={MAX_DIMENSION}"
            ),
            DeserializationError::OutOfRange { field, value } => write!(
                f,
                "{field} {value} out of range, expected magnitude <= {MAX_COORDINATE}"
            ),
        }
    }
}

impl std::error::Error for DeserializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeserializationError::Malformed(e) => Some(e),
            DeserializationError::InvalidColor(e) => Some(e),
            DeserializationError::InvalidBitmap(e) => Some(e),
            DeserializationError::InvalidDimensions { .. }
            | DeserializationError::OutOfRange { .. } => None,
        }
    }
}

impl From<serde_json::Error> for DeserializationError {
    fn from(e: serde_json::Error) -> Self {
        DeserializationError::Malformed(e)
    }
}

impl From<ColorParseError> for DeserializationError {
    fn from(e: ColorParseError) -> Self {
        DeserializationError::InvalidColor(e)
    }
}

impl From<TextureError> for DeserializationError {
    fn from(e: TextureError) -> Self {
        DeserializationError::InvalidBitmap(e)
    }
}

fn style_from(color: &str, thickness: f64) -> Result<Style, ColorParseError> {
    Ok(Style::new(Rgba::parse_hex(color)?, thickness))
}

fn coord(field: &'static str, value: f64) -> Result<f64, DeserializationError> {
    if value.abs() <= MAX_COORDINATE {
        Ok(value)
    } else {
        Err(DeserializationError::OutOfRange { field, value })
    }
}

fn point_from(x: f64, y: f64) -> Result<Point, DeserializationError> {
    Ok(point(coord("x", x)?, coord("y", y)?))
}

fn vertex(p: Point) -> VertexDto {
    VertexDto { x: p.x, y: p.y }
}

fn project_data(scene: &Scene) -> ProjectData {
    let mut data = ProjectData {
        bitmap_width: scene.canvas().width(),
        bitmap_height: scene.canvas().height(),
        lines: Vec::new(),
        circles: Vec::new(),
        rectangles: Vec::new(),
        polygons: Vec::new(),
    };
    for (id, shape) in scene.shapes() {
        let thickness = shape.style().thickness.get();
        let color = shape.style().color.to_argb_hex();
        match shape {
            Shape::Line(l) => data.lines.push(LineDto {
                x1: l.p1.x,
                y1: l.p1.y,
                x2: l.p2.x,
                y2: l.p2.y,
                thickness,
                color,
            }),
            Shape::Circle(c) => data.circles.push(CircleDto {
                center_x: c.center.x,
                center_y: c.center.y,
                radius: c.radius,
                thickness,
                color,
            }),
            Shape::Rectangle(r) => data.rectangles.push(RectangleDto {
                x1: r.p1.x,
                y1: r.p1.y,
                x2: r.p2.x,
                y2: r.p2.y,
                thickness,
                color,
            }),
            Shape::Polygon(p) => {
                let bitmap_source = match p.texture.as_ref().map(Texture::to_base64_png) {
                    Some(Ok(encoded)) => Some(encoded),
                    Some(Err(e)) => {
                        tracing::warn!(?id, error = %e, "dropping polygon texture on save");
                        None
                    }
                    None => None,
                };
                data.polygons.push(PolygonDto {
                    is_fill_color: p.fill.enabled,
                    vertices: p.vertices.iter().copied().map(vertex).collect(),
                    thickness,
                    color,
                    fill_color: Some(p.fill.color.to_argb_hex()),
                    bitmap_source,
                });
            }
        }
    }
    data
}

/// Pretty-printed JSON project document.
pub fn serialize(scene: &Scene) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&project_data(scene))
}

/// Rebuilds a scene on a fresh white canvas of the stored size.
pub fn deserialize(json: &str) -> Result<Scene, DeserializationError> {
    deserialize_with_background(json, Rgba::WHITE)
}

/// Like [`deserialize`], compositing onto `background`. Project files do
/// not carry a background of their own.
pub fn deserialize_with_background(
    json: &str,
    background: Rgba,
) -> Result<Scene, DeserializationError> {
    let data: ProjectData = serde_json::from_str(json)?;
    let (width, height) = (data.bitmap_width, data.bitmap_height);
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(DeserializationError::InvalidDimensions { width, height });
    }

    let mut shapes = Vec::new();
    for l in data.lines {
        shapes.push(Shape::Line(Line {
            p1: point_from(l.x1, l.y1)?,
            p2: point_from(l.x2, l.y2)?,
            style: style_from(&l.color, l.thickness)?,
        }));
    }
    for c in data.circles {
        let mut circle = Circle {
            center: point_from(c.center_x, c.center_y)?,
            radius: 0.0,
            style: style_from(&c.color, c.thickness)?,
        };
        circle.set_radius(coord("radius", c.radius)?);
        shapes.push(Shape::Circle(circle));
    }
    for r in data.rectangles {
        shapes.push(Shape::Rectangle(Rectangle {
            p1: point_from(r.x1, r.y1)?,
            p2: point_from(r.x2, r.y2)?,
            style: style_from(&r.color, r.thickness)?,
        }));
    }
    for p in data.polygons {
        let fill_color = match &p.fill_color {
            Some(c) => Rgba::parse_hex(c)?,
            None => Fill::default().color,
        };
        let texture = match p.bitmap_source.as_deref().map(str::trim) {
            Some(src) if !src.is_empty() => Some(Texture::from_base64_png(src)?),
            _ => None,
        };
        let vertices = p
            .vertices
            .iter()
            .map(|v| point_from(v.x, v.y))
            .collect::<Result<Vec<_>, _>>()?;
        shapes.push(Shape::Polygon(Polygon {
            vertices,
            style: style_from(&p.color, p.thickness)?,
            fill: Fill {
                enabled: p.is_fill_color,
                color: fill_color,
            },
            texture,
        }));
    }

    let mut scene = Scene::with_background(width, height, background);
    scene.extend(shapes);
    Ok(scene)
}

pub fn save_to_file(scene: &Scene, path: &Path) -> anyhow::Result<()> {
    let json = serialize(scene).context("encoding project")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), shapes = scene.len(), "saved project");
    Ok(())
}

pub fn load_from_file(path: &Path, background: Rgba) -> anyhow::Result<Scene> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let scene = deserialize_with_background(&json, background)
        .with_context(|| format!("loading {}", path.display()))?;
    tracing::info!(path = %path.display(), shapes = scene.len(), "loaded project");
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeKind;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new(120, 80);
        scene.add(Shape::Line(Line {
            p1: point(1.5, 2.0),
            p2: point(100.0, 70.25),
            style: Style::new(Rgba::new(10, 20, 30, 128), 5.0),
        }));
        scene.add(Shape::Circle(Circle {
            center: point(60.0, 40.0),
            radius: 25.0,
            style: Style::new(Rgba::rgb(0, 255, 0), 1.0),
        }));
        scene.add(Shape::Rectangle(Rectangle {
            p1: point(5.0, 5.0),
            p2: point(30.0, 20.0),
            style: Style::new(Rgba::BLACK, 3.0),
        }));
        scene.add(Shape::Polygon(Polygon {
            vertices: vec![point(70.0, 10.0), point(110.0, 10.0), point(90.0, 50.0)],
            style: Style::new(Rgba::rgb(0, 0, 255), 7.0),
            fill: Fill {
                enabled: true,
                color: Rgba::rgb(250, 200, 0),
            },
            texture: Some(Texture::solid(3, 2, Rgba::rgb(9, 8, 7)).unwrap()),
        }));
        scene
    }

    #[test]
    fn round_trip_preserves_shapes_and_pixels() {
        let scene = sample_scene();
        let json = serialize(&scene).unwrap();
        let back = deserialize(&json).unwrap();

        assert_eq!(back.counts(), scene.counts());
        let before: Vec<&Shape> = scene.shapes().map(|(_, s)| s).collect();
        let after: Vec<&Shape> = back.shapes().map(|(_, s)| s).collect();
        assert_eq!(before, after);
        assert_eq!(back.canvas().as_bgra(), scene.canvas().as_bgra());
    }

    #[test]
    fn writes_camel_case_keys_and_argb_colors() {
        let json = serialize(&sample_scene()).unwrap();
        assert!(json.contains("\"bitmapWidth\": 120"));
        assert!(json.contains("\"centerX\""));
        assert!(json.contains("\"isFillColor\": true"));
        assert!(json.contains("\"#800A141E\""));
        assert!(json.contains("\"bitmapSource\""));
    }

    #[test]
    fn reads_pascal_case_documents() {
        let json = r##"{
            "BitmapWidth": 40, "BitmapHeight": 30,
            "Lines": [{"X1": 0, "Y1": 20, "X2": 10, "Y2": 20, "Thickness": 1, "Color": "#FFFF0000"}],
            "Circles": [],
            "Polygons": [{"Vertices": [{"X": 1, "Y": 1}, {"X": 9, "Y": 1}, {"X": 5, "Y": 8}],
                          "Thickness": 3, "Color": "#FF000000"}]
        }"##;
        let scene = deserialize(json).unwrap();
        assert_eq!(scene.canvas().width(), 40);
        assert_eq!(scene.counts()[0], (ShapeKind::Line, 1));
        assert_eq!(scene.counts()[3], (ShapeKind::Polygon, 1));
        assert_eq!(scene.canvas().pixel(5, 20), Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn thickness_is_clamped_on_load() {
        let json = r##"{"bitmapWidth": 10, "bitmapHeight": 10, "circles": [], "polygons": [],
            "lines": [{"x1": 0, "y1": 0, "x2": 1, "y2": 1, "thickness": 99, "color": "#FF000000"},
                      {"x1": 0, "y1": 0, "x2": 1, "y2": 1, "thickness": -3, "color": "#FF000000"}]}"##;
        let scene = deserialize(json).unwrap();
        let t: Vec<f64> = scene
            .shapes()
            .map(|(_, s)| s.style().thickness.get())
            .collect();
        assert_eq!(t, vec![21.0, 1.0]);
    }

    #[test]
    fn rejects_invalid_documents() {
        assert!(matches!(
            deserialize("{not json"),
            Err(DeserializationError::Malformed(_))
        ));
        assert!(matches!(
            deserialize(r#"{"bitmapWidth": 10, "bitmapHeight": 10, "lines": []}"#),
            Err(DeserializationError::Malformed(_))
        ));
        let bad_color = r#"{"bitmapWidth": 10, "bitmapHeight": 10, "circles": [], "polygons": [],
            "lines": [{"x1": 0, "y1": 0, "x2": 1, "y2": 1, "thickness": 1, "color": "red"}]}"#;
        assert!(matches!(
            deserialize(bad_color),
            Err(DeserializationError::InvalidColor(_))
        ));
        let bad_bitmap = r##"{"bitmapWidth": 10, "bitmapHeight": 10, "lines": [], "circles": [],
            "polygons": [{"vertices": [], "thickness": 1, "color": "#FF000000",
                          "bitmapSource": "%%%"}]}"##;
        assert!(matches!(
            deserialize(bad_bitmap),
            Err(DeserializationError::InvalidBitmap(_))
        ));
        assert!(matches!(
            deserialize(r#"{"bitmapWidth": 0, "bitmapHeight": 10, "lines": [], "circles": [], "polygons": []}"#),
            Err(DeserializationError::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn rejects_coordinates_beyond_the_limit() {
        let huge_radius = r##"{"bitmapWidth": 10, "bitmapHeight": 10, "lines": [], "polygons": [],
            "circles": [{"centerX": 5, "centerY": 5, "radius": 1e10, "thickness": 1, "color": "#FF000000"}]}"##;
        assert!(matches!(
            deserialize(huge_radius),
            Err(DeserializationError::OutOfRange { field: "radius", .. })
        ));
        let far_center = r##"{"bitmapWidth": 10, "bitmapHeight": 10, "lines": [], "polygons": [],
            "circles": [{"centerX": 2147483000, "centerY": 5, "radius": 5000, "thickness": 1, "color": "#FF000000"}]}"##;
        assert!(matches!(
            deserialize(far_center),
            Err(DeserializationError::OutOfRange { field: "x", .. })
        ));
        let far_vertex = r##"{"bitmapWidth": 10, "bitmapHeight": 10, "lines": [], "circles": [],
            "polygons": [{"vertices": [{"x": 0, "y": -2e6}], "thickness": 1, "color": "#FF000000"}]}"##;
        assert!(matches!(
            deserialize(far_vertex),
            Err(DeserializationError::OutOfRange { field: "y", .. })
        ));
    }

    #[test]
    fn shapes_reaching_far_off_canvas_load() {
        let json = r##"{"bitmapWidth": 10, "bitmapHeight": 10, "polygons": [],
            "lines": [{"x1": -1e6, "y1": 5, "x2": 1e6, "y2": 5, "thickness": 1, "color": "#FFFF0000"}],
            "circles": [{"centerX": 1e6, "centerY": -1e6, "radius": 1e6, "thickness": 21, "color": "#FF000000"}]}"##;
        let scene = deserialize(json).unwrap();
        assert_eq!(scene.len(), 2);
        for x in 0..10 {
            assert_eq!(scene.canvas().pixel(x, 5), Some(Rgba::rgb(255, 0, 0)));
        }
        assert_eq!(scene.canvas().pixel(0, 0), Some(Rgba::WHITE));
    }

    #[test]
    fn loads_onto_the_requested_background() {
        let json = serialize(&Scene::new(4, 4)).unwrap();
        let grey = Rgba::rgb(90, 90, 90);
        let scene = deserialize_with_background(&json, grey).unwrap();
        assert_eq!(scene.background(), grey);
        assert_eq!(scene.canvas().pixel(2, 2), Some(grey));
    }
}
