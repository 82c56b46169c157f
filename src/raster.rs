use crate::canvas::Canvas;
use crate::geometry::Point;
use crate::model::{Circle, Line, Polygon, Rectangle, Rgba, Shape, Thickness};
use crate::texture::Texture;

/// Scan conversion of a shape into pixel writes.
pub trait Rasterize {
    fn rasterize(&self, canvas: &mut Canvas);
}

impl Rasterize for Line {
    fn rasterize(&self, canvas: &mut Canvas) {
        draw_thick_line(
            canvas,
            self.p1.round_to_pixel(),
            self.p2.round_to_pixel(),
            self.style.thickness,
            self.style.color,
        );
    }
}

impl Rasterize for Circle {
    fn rasterize(&self, canvas: &mut Canvas) {
        draw_circle(
            canvas,
            self.center.round_to_pixel(),
            self.radius.round() as i32,
            self.style.thickness,
            self.style.color,
        );
    }
}

impl Rasterize for Rectangle {
    fn rasterize(&self, canvas: &mut Canvas) {
        self.to_polygon().rasterize(canvas);
    }
}

impl Rasterize for Polygon {
    fn rasterize(&self, canvas: &mut Canvas) {
        if self.vertices.len() >= 3 {
            if let Some(texture) = &self.texture {
                fill_polygon(canvas, &self.vertices, FillSource::Texture(texture));
            } else if self.fill.enabled {
                fill_polygon(canvas, &self.vertices, FillSource::Solid(self.fill.color));
            }
        }
        for (a, b) in self.edges() {
            draw_thick_line(
                canvas,
                a.round_to_pixel(),
                b.round_to_pixel(),
                self.style.thickness,
                self.style.color,
            );
        }
    }
}

impl Rasterize for Shape {
    fn rasterize(&self, canvas: &mut Canvas) {
        match self {
            Shape::Line(s) => s.rasterize(canvas),
            Shape::Circle(s) => s.rasterize(canvas),
            Shape::Rectangle(s) => s.rasterize(canvas),
            Shape::Polygon(s) => s.rasterize(canvas),
        }
    }
}

/// Where fill spans take their colors from.
#[derive(Clone, Copy, Debug)]
pub enum FillSource<'a> {
    Solid(Rgba),
    Texture(&'a Texture),
}

impl FillSource<'_> {
    fn color_at(&self, x: i32, y: i32) -> Rgba {
        match self {
            FillSource::Solid(c) => *c,
            FillSource::Texture(t) => t.sample(x, y),
        }
    }
}

/// Paints a `(2*half+1)` square centred on `(cx, cy)`, clipped to the canvas.
fn plot_block(canvas: &mut Canvas, cx: i64, cy: i64, half: i64, color: Rgba) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    if cx + half < 0 || cy + half < 0 || cx - half >= w || cy - half >= h {
        return;
    }
    for ty in (cy - half).max(0)..=(cy + half).min(h - 1) {
        for tx in (cx - half).max(0)..=(cx + half).min(w - 1) {
            canvas.set_pixel(tx as i32, ty as i32, color);
        }
    }
}

/// Liang-Barsky clip of `a -> b` against the canvas grown by `margin`.
/// Endpoints already inside are returned untouched so visible lines keep
/// their exact pixels.
fn clip_to_canvas(
    canvas: &Canvas,
    a: (i64, i64),
    b: (i64, i64),
    margin: i64,
) -> Option<((i64, i64), (i64, i64))> {
    let (lo_x, lo_y) = (-margin, -margin);
    let hi_x = canvas.width() as i64 - 1 + margin;
    let hi_y = canvas.height() as i64 - 1 + margin;
    let inside = |(x, y): (i64, i64)| x >= lo_x && x <= hi_x && y >= lo_y && y <= hi_y;
    if inside(a) && inside(b) {
        return Some((a, b));
    }

    let (x0, y0) = (a.0 as f64, a.1 as f64);
    let (dx, dy) = ((b.0 - a.0) as f64, (b.1 - a.1) as f64);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, x0 - lo_x as f64),
        (dx, hi_x as f64 - x0),
        (-dy, y0 - lo_y as f64),
        (dy, hi_y as f64 - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
        }
    }
    if t0 > t1 {
        return None;
    }
    let at = |t: f64| ((x0 + t * dx).round() as i64, (y0 + t * dy).round() as i64);
    let from = if inside(a) { a } else { at(t0) };
    let to = if inside(b) { b } else { at(t1) };
    Some((from, to))
}

/// Symmetric midpoint line: two cursors walk from both endpoints toward the
/// middle sharing one decision variable. Each cursor position is widened
/// to a square block of side `2*floor(t/2)+1`. Segments leaving the canvas
/// are clipped first so the walk never exceeds the visible span.
pub fn draw_thick_line(
    canvas: &mut Canvas,
    from: (i32, i32),
    to: (i32, i32),
    thickness: Thickness,
    color: Rgba,
) {
    let half = thickness.half() as i64;
    let from = (from.0 as i64, from.1 as i64);
    let to = (to.0 as i64, to.1 as i64);
    let Some(((x1, y1), (x2, y2))) = clip_to_canvas(canvas, from, to, half + 1) else {
        return;
    };
    let dx = (x2 - x1).abs();
    let dy = (y2 - y1).abs();
    let sx = if x1 < x2 { 1 } else { -1 };
    let sy = if y1 < y2 { 1 } else { -1 };
    let steep = dy > dx;
    let (major, minor) = if steep { (dy, dx) } else { (dx, dy) };

    let mut d = 2 * minor - major;
    let d_e = 2 * minor;
    let d_ne = 2 * (minor - major);

    let (mut xl, mut yl) = (x1, y1);
    let (mut xr, mut yr) = (x2, y2);

    for _ in 0..=major / 2 {
        plot_block(canvas, xl, yl, half, color);
        // With an even step count both cursors meet on the middle column.
        let met = if steep { yl == yr } else { xl == xr };
        if !met {
            plot_block(canvas, xr, yr, half, color);
        }

        if d < 0 {
            d += d_e;
        } else {
            d += d_ne;
            if steep {
                xl += sx;
                xr -= sx;
            } else {
                yl += sy;
                yr -= sy;
            }
        }
        if steep {
            yl += sy;
            yr -= sy;
        } else {
            xl += sx;
            xr -= sx;
        }
    }
}

/// Midpoint circle outline with 8-way symmetry. Circles whose ring cannot
/// reach the canvas are skipped without walking the octant.
pub fn draw_circle(
    canvas: &mut Canvas,
    center: (i32, i32),
    radius: i32,
    thickness: Thickness,
    color: Rgba,
) {
    let half = thickness.half() as i64;
    let (xc, yc) = (center.0 as i64, center.1 as i64);
    let radius = radius.max(0) as i64;
    if !ring_touches_canvas(canvas, (xc, yc), radius, half) {
        return;
    }

    let mut plot8 = |x: i64, y: i64| {
        for (px, py) in [
            (xc + y, yc - x),
            (xc + x, yc - y),
            (xc - x, yc - y),
            (xc - y, yc - x),
            (xc - y, yc + x),
            (xc - x, yc + y),
            (xc + x, yc + y),
            (xc + y, yc + x),
        ] {
            plot_block(canvas, px, py, half, color);
        }
    };

    let mut x = 0;
    let mut y = radius;
    let mut d = 1 - radius;
    let mut d_e = 3;
    let mut d_se = 5 - 2 * radius;
    plot8(x, y);
    while y > x {
        if d < 0 {
            d += d_e;
            d_e += 2;
            d_se += 2;
        } else {
            d += d_se;
            d_e += 2;
            d_se += 4;
            y -= 1;
        }
        x += 1;
        plot8(x, y);
    }
}

/// False when the ring lies wholly outside the canvas or the canvas sits
/// wholly inside the ring's hole.
fn ring_touches_canvas(canvas: &Canvas, (xc, yc): (i64, i64), radius: i64, half: i64) -> bool {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    if w == 0 || h == 0 {
        return false;
    }
    let reach = radius + half + 1;
    if xc + reach < 0 || yc + reach < 0 || xc - reach >= w || yc - reach >= h {
        return false;
    }
    let near_x = (xc - xc.clamp(0, w - 1)) as f64;
    let near_y = (yc - yc.clamp(0, h - 1)) as f64;
    if near_x.hypot(near_y) > reach as f64 {
        return false;
    }
    let far_x = xc.abs().max((xc - (w - 1)).abs()) as f64;
    let far_y = yc.abs().max((yc - (h - 1)).abs()) as f64;
    let hole = (radius - half - 1) as f64;
    hole <= 0.0 || far_x.hypot(far_y) >= hole
}

/// Scanline fill sampled at pixel centres. An edge takes part in a row when
/// `y_min <= row + 0.5 < y_max`, so shared vertices are counted once and
/// horizontal edges never.
pub fn fill_polygon(canvas: &mut Canvas, vertices: &[Point], source: FillSource<'_>) {
    let n = vertices.len();
    if n < 3 || canvas.width() == 0 || canvas.height() == 0 {
        return;
    }
    let (min_y, max_y) = vertices
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v.y), hi.max(v.y))
        });
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }
    let last_row = canvas.height() as i32 - 1;
    let last_col = canvas.width() as i32 - 1;
    let row_start = ((min_y - 0.5).ceil().max(0.0) as i32).min(last_row + 1);
    let row_end = ((max_y - 0.5).floor().min(last_row as f64)) as i32;

    let mut crossings: Vec<f64> = Vec::with_capacity(n);
    for row in row_start..=row_end {
        let scan = row as f64 + 0.5;
        crossings.clear();
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            if a.y == b.y {
                continue;
            }
            let (lo, hi) = if a.y < b.y { (a.y, b.y) } else { (b.y, a.y) };
            if lo <= scan && scan < hi {
                crossings.push(a.x + (scan - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            let start = ((pair[0] - 0.5).ceil().max(0.0)) as i32;
            let end = ((pair[1] - 0.5).floor().min(last_col as f64)) as i32;
            for x in start..=end {
                canvas.set_pixel(x, row, source.color_at(x, row));
            }
        }
    }
}
