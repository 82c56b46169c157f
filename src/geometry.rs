use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

use crate::model::Rgba;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

pub fn point(x: f64, y: f64) -> Point {
    Point { x, y }
}

impl Point {
    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    pub fn translated(self, dx: f64, dy: f64) -> Point {
        point(self.x + dx, self.y + dy)
    }

    /// Nearest pixel, halves rounded away from zero.
    pub fn round_to_pixel(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl Vector {
    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    pub fn dot(self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        point(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

pub fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let ab_len2 = ab.length_sq();
    if ab_len2 <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (ap.dot(ab) / ab_len2).clamp(0.0, 1.0);
    let projection = a + ab * t;
    p.distance(projection)
}

/// Distance to the outline of the circle, not its interior.
pub fn distance_point_to_circle(p: Point, center: Point, radius: f64) -> f64 {
    (p.distance(center) - radius).abs()
}

pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f64;
    Some(point(sx / n, sy / n))
}

/// `ratio * a + (1 - ratio) * b` per channel, truncated toward zero.
pub fn blend(a: Rgba, b: Rgba, ratio: f64) -> Rgba {
    let ratio = ratio.clamp(0.0, 1.0);
    let mix = |ca: u8, cb: u8| -> u8 {
        (ca as f64 * ratio + cb as f64 * (1.0 - ratio)).clamp(0.0, 255.0) as u8
    };
    Rgba {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
        a: mix(a.a, b.a),
    }
}
