use serde::{Deserialize, Serialize};

use crate::geometry::{Point, centroid, distance_point_to_circle, distance_point_to_segment, point};
use crate::texture::Texture;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#AARRGGBB`, uppercase.
    pub fn to_argb_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }

    /// Accepts `#AARRGGBB` and `#RRGGBB`.
    pub fn parse_hex(value: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError {
            value: value.to_string(),
        };
        let hex = value.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        match hex.len() {
            8 => Ok(Self::new(channel(2)?, channel(4)?, channel(6)?, channel(0)?)),
            6 => Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            _ => Err(err()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorParseError {
    pub value: String,
}

impl std::fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid color {:?}, expected #AARRGGBB", self.value)
    }
}

impl std::error::Error for ColorParseError {}

/// Stroke width in pixels, always within `[MIN, MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Thickness(f64);

impl Thickness {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 21.0;
    pub const STEP: f64 = 2.0;

    pub fn new(value: f64) -> Self {
        if value.is_nan() || value <= 0.0 {
            Self(Self::MIN)
        } else {
            Self(value.clamp(Self::MIN, Self::MAX))
        }
    }

    /// Non-numeric input falls back to the minimum instead of failing.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(v) => Self::new(v),
            Err(_) => {
                tracing::warn!(input = text, "non-numeric thickness, using default");
                Self(Self::MIN)
            }
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn half(self) -> i32 {
        (self.0 / 2.0).floor() as i32
    }

    pub fn step(self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }
}

impl Default for Thickness {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub color: Rgba,
    pub thickness: Thickness,
}

impl Style {
    pub fn new(color: Rgba, thickness: f64) -> Self {
        Self {
            color,
            thickness: Thickness::new(thickness),
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            thickness: Thickness::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
    pub style: Style,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
    pub style: Style,
}

impl Circle {
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
    }
}

/// Axis-aligned rectangle spanned by two opposite corners.
#[derive(Clone, Debug, PartialEq)]
pub struct Rectangle {
    pub p1: Point,
    pub p2: Point,
    pub style: Style,
}

impl Rectangle {
    /// Corners in walk order starting at `p1`.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.p1,
            point(self.p2.x, self.p1.y),
            self.p2,
            point(self.p1.x, self.p2.y),
        ]
    }

    pub fn to_polygon(&self) -> Polygon {
        let left = self.p1.x.min(self.p2.x);
        let right = self.p1.x.max(self.p2.x);
        let top = self.p1.y.min(self.p2.y);
        let bottom = self.p1.y.max(self.p2.y);
        Polygon {
            vertices: vec![
                point(left, top),
                point(right, top),
                point(right, bottom),
                point(left, bottom),
            ],
            style: self.style,
            fill: Fill::default(),
            texture: None,
        }
    }

    fn move_corner(&mut self, index: usize, to: Point) {
        match index {
            0 => self.p1 = to,
            1 => {
                self.p2.x = to.x;
                self.p1.y = to.y;
            }
            2 => self.p2 = to,
            3 => {
                self.p1.x = to.x;
                self.p2.y = to.y;
            }
            _ => {}
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fill {
    pub enabled: bool,
    pub color: Rgba,
}

impl Default for Fill {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgba::WHITE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Polygon {
    pub vertices: Vec<Point>,
    pub style: Style,
    pub fill: Fill,
    pub texture: Option<Texture>,
}

impl Polygon {
    /// Edges in vertex order, closing back to the first vertex once there
    /// are at least three.
    pub fn edges(&self) -> Vec<(Point, Point)> {
        let n = self.vertices.len();
        match n {
            0 => Vec::new(),
            1 => vec![(self.vertices[0], self.vertices[0])],
            2 => vec![(self.vertices[0], self.vertices[1])],
            _ => (0..n)
                .map(|i| (self.vertices[i], self.vertices[(i + 1) % n]))
                .collect(),
        }
    }

    pub fn is_filled(&self) -> bool {
        self.fill.enabled || self.texture.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Circle,
    Rectangle,
    Polygon,
}

impl ShapeKind {
    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Circle => "Circle",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Polygon => "Polygon",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u64);

/// An editable point of a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    LineStart,
    LineEnd,
    CircleCenter,
    CircleRadius,
    RectCorner(usize),
    RectCenter,
    PolygonVertex(usize),
    PolygonCenter,
}

impl Handle {
    /// Handles that move the whole shape rather than reshaping it.
    pub fn is_translate(self) -> bool {
        matches!(
            self,
            Handle::CircleCenter | Handle::RectCenter | Handle::PolygonCenter
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Line(Line),
    Circle(Circle),
    Rectangle(Rectangle),
    Polygon(Polygon),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Line(_) => ShapeKind::Line,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    pub fn style(&self) -> &Style {
        match self {
            Shape::Line(s) => &s.style,
            Shape::Circle(s) => &s.style,
            Shape::Rectangle(s) => &s.style,
            Shape::Polygon(s) => &s.style,
        }
    }

    pub fn style_mut(&mut self) -> &mut Style {
        match self {
            Shape::Line(s) => &mut s.style,
            Shape::Circle(s) => &mut s.style,
            Shape::Rectangle(s) => &mut s.style,
            Shape::Polygon(s) => &mut s.style,
        }
    }

    /// Handle positions, for drawing markers.
    pub fn handles(&self) -> Vec<(Handle, Point)> {
        match self {
            Shape::Line(l) => vec![(Handle::LineStart, l.p1), (Handle::LineEnd, l.p2)],
            Shape::Circle(c) => vec![
                (Handle::CircleCenter, c.center),
                (Handle::CircleRadius, c.center.translated(c.radius, 0.0)),
            ],
            Shape::Rectangle(r) => {
                let mut out: Vec<(Handle, Point)> = r
                    .corners()
                    .into_iter()
                    .enumerate()
                    .map(|(i, p)| (Handle::RectCorner(i), p))
                    .collect();
                if let Some(c) = centroid(&r.corners()) {
                    out.push((Handle::RectCenter, c));
                }
                out
            }
            Shape::Polygon(poly) => {
                let mut out: Vec<(Handle, Point)> = poly
                    .vertices
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (Handle::PolygonVertex(i), *p))
                    .collect();
                if let Some(c) = centroid(&poly.vertices) {
                    out.push((Handle::PolygonCenter, c));
                }
                out
            }
        }
    }

    /// Distance from `p` to every grabbable handle. The circle's radius
    /// handle is the whole outline.
    pub fn handle_distances(&self, p: Point) -> Vec<(Handle, f64)> {
        match self {
            Shape::Circle(c) => vec![
                (Handle::CircleCenter, p.distance(c.center)),
                (
                    Handle::CircleRadius,
                    distance_point_to_circle(p, c.center, c.radius),
                ),
            ],
            _ => self
                .handles()
                .into_iter()
                .map(|(h, at)| (h, p.distance(at)))
                .collect(),
        }
    }

    /// Distance from `p` to the stroked outline.
    pub fn body_distance(&self, p: Point) -> f64 {
        match self {
            Shape::Line(l) => distance_point_to_segment(p, l.p1, l.p2),
            Shape::Circle(c) => distance_point_to_circle(p, c.center, c.radius),
            Shape::Rectangle(r) => {
                let corners = r.corners();
                (0..4)
                    .map(|i| distance_point_to_segment(p, corners[i], corners[(i + 1) % 4]))
                    .fold(f64::INFINITY, f64::min)
            }
            Shape::Polygon(poly) => poly
                .edges()
                .into_iter()
                .map(|(a, b)| distance_point_to_segment(p, a, b))
                .fold(f64::INFINITY, f64::min),
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Shape::Line(l) => {
                l.p1 = l.p1.translated(dx, dy);
                l.p2 = l.p2.translated(dx, dy);
            }
            Shape::Circle(c) => c.center = c.center.translated(dx, dy),
            Shape::Rectangle(r) => {
                r.p1 = r.p1.translated(dx, dy);
                r.p2 = r.p2.translated(dx, dy);
            }
            Shape::Polygon(poly) => {
                for v in &mut poly.vertices {
                    *v = v.translated(dx, dy);
                }
            }
        }
    }

    /// Drags `handle` from `from` to `to`. Reshaping handles jump to `to`,
    /// translate handles move the shape by the pointer delta.
    pub fn move_handle(&mut self, handle: Handle, from: Point, to: Point) {
        if handle.is_translate() {
            self.translate(to.x - from.x, to.y - from.y);
            return;
        }
        match (self, handle) {
            (Shape::Line(l), Handle::LineStart) => l.p1 = to,
            (Shape::Line(l), Handle::LineEnd) => l.p2 = to,
            (Shape::Circle(c), Handle::CircleRadius) => c.set_radius(to.distance(c.center)),
            (Shape::Rectangle(r), Handle::RectCorner(i)) => r.move_corner(i, to),
            (Shape::Polygon(poly), Handle::PolygonVertex(i)) => {
                if let Some(v) = poly.vertices.get_mut(i) {
                    *v = to;
                }
            }
            (shape, handle) => {
                tracing::warn!(kind = ?shape.kind(), ?handle, "handle does not belong to shape");
            }
        }
    }
}

/// Shape committed by the drawing tools from a press/release pair.
pub fn shape_from_drag(kind: ShapeKind, start: Point, end: Point, style: Style) -> Option<Shape> {
    match kind {
        ShapeKind::Line => Some(Shape::Line(Line {
            p1: start,
            p2: end,
            style,
        })),
        ShapeKind::Circle => {
            let mut circle = Circle {
                center: start,
                radius: 0.0,
                style,
            };
            circle.set_radius(start.distance(end));
            Some(Shape::Circle(circle))
        }
        ShapeKind::Rectangle => Some(Shape::Rectangle(Rectangle {
            p1: start,
            p2: end,
            style,
        })),
        ShapeKind::Polygon => None,
    }
}
