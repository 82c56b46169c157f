use crate::canvas::Canvas;
use crate::geometry::Point;
use crate::model::{Handle, Rgba, Shape, ShapeId, ShapeKind, Style};
use crate::raster::Rasterize;

/// What changed in the scene. Every mutation emits one and bumps
/// [`Scene::revision`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneChange {
    Added(ShapeId, ShapeKind),
    Removed(ShapeId),
    Updated(ShapeId),
    Cleared,
    Resized { width: u32, height: u32 },
    Background(Rgba),
}

#[derive(Clone, Debug)]
struct Entry {
    id: ShapeId,
    shape: Shape,
}

/// Ordered shape collections plus the canvas they are rasterized into.
///
/// Paint order is lines, circles, rectangles, then polygons, each kind in
/// insertion order. The canvas always reflects that order, and hit tests
/// prefer whatever is painted last.
#[derive(Clone, Debug)]
pub struct Scene {
    canvas: Canvas,
    background: Rgba,
    layers: [Vec<Entry>; 4],
    next_id: u64,
    revision: u64,
}

fn layer_of(kind: ShapeKind) -> usize {
    match kind {
        ShapeKind::Line => 0,
        ShapeKind::Circle => 1,
        ShapeKind::Rectangle => 2,
        ShapeKind::Polygon => 3,
    }
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, Rgba::WHITE)
    }

    pub fn with_background(width: u32, height: u32, background: Rgba) -> Self {
        Self {
            canvas: Canvas::new(width, height, background),
            background,
            layers: Default::default(),
            next_id: 1,
            revision: 0,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// Shape count per kind, in paint order.
    pub fn counts(&self) -> [(ShapeKind, usize); 4] {
        [
            (ShapeKind::Line, self.layers[0].len()),
            (ShapeKind::Circle, self.layers[1].len()),
            (ShapeKind::Rectangle, self.layers[2].len()),
            (ShapeKind::Polygon, self.layers[3].len()),
        ]
    }

    pub fn shapes(&self) -> impl DoubleEndedIterator<Item = (ShapeId, &Shape)> + '_ {
        self.layers
            .iter()
            .flat_map(|layer| layer.iter().map(|e| (e.id, &e.shape)))
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.get(id).is_some()
    }

    /// Appends `shape`. When nothing of a later-painted kind exists the
    /// shape is painted on top incrementally, otherwise the canvas is
    /// recomposited so it matches [`Scene::redraw_all`].
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let layer = layer_of(shape.kind());
        let covered = self.layers[layer + 1..].iter().any(|l| !l.is_empty());
        let id = self.push(shape);
        if covered {
            self.redraw_all();
        } else if let Some(entry) = self.layers[layer].last() {
            let mut draw = self.canvas.begin_draw();
            entry.shape.rasterize(&mut draw);
        }
        id
    }

    /// Appends every shape, then recomposites once. Used for bulk loads.
    pub fn extend<I>(&mut self, shapes: I)
    where
        I: IntoIterator<Item = Shape>,
    {
        for shape in shapes {
            self.push(shape);
        }
        self.redraw_all();
    }

    fn push(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        let kind = shape.kind();
        self.layers[layer_of(kind)].push(Entry { id, shape });
        self.emit(SceneChange::Added(id, kind));
        id
    }

    /// Removes by identity. The canvas still shows the shape until
    /// [`Scene::redraw_all`] runs.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let (layer, index) = self.locate(id)?;
        let entry = self.layers[layer].remove(index);
        self.emit(SceneChange::Removed(id));
        Some(entry.shape)
    }

    /// Mutates a shape in place and recomposites. A closure that swaps the
    /// shape for another kind moves it to the end of that kind's layer.
    pub fn update<F>(&mut self, id: ShapeId, f: F) -> bool
    where
        F: FnOnce(&mut Shape),
    {
        let Some((layer, index)) = self.locate(id) else {
            return false;
        };
        f(&mut self.layers[layer][index].shape);
        let new_layer = layer_of(self.layers[layer][index].shape.kind());
        if new_layer != layer {
            let entry = self.layers[layer].remove(index);
            self.layers[new_layer].push(entry);
        }
        self.emit(SceneChange::Updated(id));
        self.redraw_all();
        true
    }

    pub fn set_style(&mut self, id: ShapeId, style: Style) -> bool {
        self.update(id, |shape| *shape.style_mut() = style)
    }

    /// Clears to the background and paints every shape in paint order.
    pub fn redraw_all(&mut self) {
        let mut draw = self.canvas.begin_draw();
        draw.clear(self.background);
        for layer in &self.layers {
            for entry in layer {
                entry.shape.rasterize(&mut draw);
            }
        }
    }

    /// Drops every shape.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
        self.emit(SceneChange::Cleared);
        self.redraw_all();
    }

    /// Swaps in a new buffer of the given size and redraws into it.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas = Canvas::new(width, height, self.background);
        self.emit(SceneChange::Resized { width, height });
        self.redraw_all();
    }

    pub fn set_background(&mut self, color: Rgba) {
        self.background = color;
        self.emit(SceneChange::Background(color));
        self.redraw_all();
    }

    /// Nearest handle within `tolerance`. Equal distances go to the shape
    /// painted later.
    pub fn find_handle_at(&self, p: Point, tolerance: f64) -> Option<(ShapeId, Handle)> {
        let mut best: Option<(ShapeId, Handle, f64)> = None;
        for (id, shape) in self.shapes() {
            for (handle, d) in shape.handle_distances(p) {
                if d > tolerance {
                    continue;
                }
                if best.is_none_or(|(_, _, bd)| d <= bd) {
                    best = Some((id, handle, d));
                }
            }
        }
        best.map(|(id, handle, _)| (id, handle))
    }

    /// Top-most shape whose outline passes within `tolerance` of `p`.
    pub fn find_shape_at(&self, p: Point, tolerance: f64) -> Option<ShapeId> {
        self.shapes()
            .rev()
            .find(|(_, shape)| shape.body_distance(p) <= tolerance)
            .map(|(id, _)| id)
    }

    fn locate(&self, id: ShapeId) -> Option<(usize, usize)> {
        self.layers.iter().enumerate().find_map(|(layer, entries)| {
            entries
                .iter()
                .position(|e| e.id == id)
                .map(|index| (layer, index))
        })
    }

    fn emit(&mut self, change: SceneChange) {
        self.revision += 1;
        tracing::debug!(?change, revision = self.revision, "scene changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point;
    use crate::model::{Circle, Fill, Line, Polygon, Rectangle};

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Shape {
        Shape::Line(Line {
            p1: point(x1, y1),
            p2: point(x2, y2),
            style: Style::new(Rgba::rgb(255, 0, 0), 3.0),
        })
    }

    fn circle(x: f64, y: f64, r: f64) -> Shape {
        Shape::Circle(Circle {
            center: point(x, y),
            radius: r,
            style: Style::new(Rgba::rgb(0, 128, 0), 1.0),
        })
    }

    fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Shape {
        Shape::Rectangle(Rectangle {
            p1: point(x1, y1),
            p2: point(x2, y2),
            style: Style::new(Rgba::rgb(0, 0, 255), 5.0),
        })
    }

    #[test]
    fn ids_are_monotonic_across_kinds() {
        let mut scene = Scene::new(50, 50);
        let a = scene.add(circle(10.0, 10.0, 5.0));
        let b = scene.add(line(0.0, 0.0, 5.0, 5.0));
        let c = scene.add(circle(20.0, 20.0, 5.0));
        assert!(a < b && b < c);
        assert_eq!(scene.len(), 3);
        assert_eq!(scene.counts()[1], (ShapeKind::Circle, 2));
    }

    #[test]
    fn shapes_iterate_in_paint_order() {
        let mut scene = Scene::new(50, 50);
        scene.add(rect(1.0, 1.0, 4.0, 4.0));
        scene.add(circle(10.0, 10.0, 5.0));
        scene.add(line(0.0, 0.0, 5.0, 5.0));
        let kinds: Vec<ShapeKind> = scene.shapes().map(|(_, s)| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![ShapeKind::Line, ShapeKind::Circle, ShapeKind::Rectangle]
        );
    }

    #[test]
    fn redraw_is_idempotent() {
        let mut scene = Scene::new(64, 64);
        scene.add(line(2.0, 2.0, 60.0, 40.0));
        scene.add(circle(32.0, 32.0, 12.0));
        scene.add(rect(5.0, 50.0, 30.0, 60.0));
        scene.redraw_all();
        let first = scene.canvas().as_bgra().to_vec();
        scene.redraw_all();
        assert_eq!(scene.canvas().as_bgra(), first.as_slice());
    }

    #[test]
    fn removing_the_middle_shape_matches_a_fresh_scene() {
        let mut scene = Scene::new(64, 64);
        scene.add(line(0.0, 10.0, 63.0, 10.0));
        let middle = scene.add(line(0.0, 20.0, 63.0, 30.0));
        scene.add(line(10.0, 0.0, 10.0, 63.0));
        assert!(scene.remove(middle).is_some());
        scene.redraw_all();

        let mut fresh = Scene::new(64, 64);
        fresh.add(line(0.0, 10.0, 63.0, 10.0));
        fresh.add(line(10.0, 0.0, 10.0, 63.0));
        fresh.redraw_all();

        assert_eq!(scene.canvas().as_bgra(), fresh.canvas().as_bgra());
        assert!(scene.remove(middle).is_none());
    }

    #[test]
    fn every_mutation_bumps_revision() {
        let mut scene = Scene::new(20, 20);
        let r0 = scene.revision();
        let id = scene.add(line(0.0, 0.0, 5.0, 0.0));
        let r1 = scene.revision();
        assert!(r1 > r0);
        scene.set_style(id, Style::new(Rgba::BLACK, 9.0));
        let r2 = scene.revision();
        assert!(r2 > r1);
        scene.set_background(Rgba::BLACK);
        assert!(scene.revision() > r2);
        assert_eq!(scene.get(id).map(|s| s.style().thickness.get()), Some(9.0));
    }

    #[test]
    fn update_recomposites_the_canvas() {
        let mut scene = Scene::new(20, 20);
        let id = scene.add(line(0.0, 0.0, 10.0, 0.0));
        assert_ne!(scene.canvas().pixel(5, 0), Some(Rgba::WHITE));
        scene.update(id, |s| s.translate(0.0, 10.0));
        assert_eq!(scene.canvas().pixel(5, 0), Some(Rgba::WHITE));
        assert_ne!(scene.canvas().pixel(5, 10), Some(Rgba::WHITE));
        assert!(!scene.update(ShapeId(999), |_| {}));
    }

    #[test]
    fn resize_keeps_shapes_and_redraws() {
        let mut scene = Scene::new(10, 10);
        scene.add(line(0.0, 15.0, 20.0, 15.0));
        assert_eq!(scene.canvas().pixel(5, 15), None);
        scene.resize(30, 30);
        assert_eq!(scene.canvas().width(), 30);
        assert_ne!(scene.canvas().pixel(5, 15), Some(Rgba::WHITE));
    }

    #[test]
    fn clear_empties_the_scene() {
        let mut scene = Scene::new(10, 10);
        scene.add(line(0.0, 5.0, 9.0, 5.0));
        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.canvas().pixel(4, 5), Some(Rgba::WHITE));
    }

    #[test]
    fn circle_outline_grabs_the_radius_handle() {
        let mut scene = Scene::new(100, 100);
        let id = scene.add(circle(50.0, 50.0, 20.0));
        assert_eq!(
            scene.find_handle_at(point(50.0, 30.0), 8.0),
            Some((id, Handle::CircleRadius))
        );
        assert_eq!(
            scene.find_handle_at(point(52.0, 51.0), 8.0),
            Some((id, Handle::CircleCenter))
        );
        assert_eq!(scene.find_handle_at(point(50.0, 40.0), 8.0), None);
    }

    #[test]
    fn handle_hits_respect_tolerance() {
        let mut scene = Scene::new(100, 100);
        let id = scene.add(line(10.0, 10.0, 80.0, 10.0));
        assert_eq!(
            scene.find_handle_at(point(14.0, 14.0), 8.0),
            Some((id, Handle::LineStart))
        );
        assert_eq!(
            scene.find_handle_at(point(80.0, 18.0), 8.0),
            Some((id, Handle::LineEnd))
        );
        assert_eq!(scene.find_handle_at(point(80.0, 18.5), 8.0), None);
        assert_eq!(scene.find_handle_at(point(45.0, 10.0), 8.0), None);
    }

    #[test]
    fn nearest_handle_wins_and_ties_go_to_the_top() {
        let mut scene = Scene::new(100, 100);
        let low = scene.add(line(10.0, 10.0, 50.0, 50.0));
        let high = scene.add(line(10.0, 10.0, 90.0, 10.0));
        assert_eq!(
            scene.find_handle_at(point(11.0, 11.0), 8.0),
            Some((high, Handle::LineStart))
        );
        assert_eq!(
            scene.find_handle_at(point(49.0, 49.0), 8.0),
            Some((low, Handle::LineEnd))
        );
    }

    #[test]
    fn body_hits_prefer_the_top_most_shape() {
        let mut scene = Scene::new(100, 100);
        let line_id = scene.add(line(0.0, 50.0, 99.0, 50.0));
        let poly_id = scene.add(Shape::Polygon(Polygon {
            vertices: vec![point(40.0, 50.0), point(60.0, 50.0), point(50.0, 80.0)],
            ..Polygon::default()
        }));
        assert_eq!(scene.find_shape_at(point(50.0, 52.0), 4.0), Some(poly_id));
        assert_eq!(scene.find_shape_at(point(10.0, 52.0), 4.0), Some(line_id));
        assert_eq!(scene.find_shape_at(point(10.0, 90.0), 4.0), None);
    }

    #[test]
    fn incremental_add_matches_a_full_redraw() {
        let mut scene = Scene::new(40, 40);
        let poly_id = scene.add(Shape::Polygon(Polygon {
            vertices: vec![
                point(5.0, 5.0),
                point(35.0, 5.0),
                point(35.0, 35.0),
                point(5.0, 35.0),
            ],
            fill: Fill {
                enabled: true,
                color: Rgba::rgb(0, 200, 0),
            },
            ..Polygon::default()
        }));
        scene.add(line(0.0, 20.0, 39.0, 20.0));
        let after_add = scene.canvas().as_bgra().to_vec();
        assert_eq!(scene.canvas().pixel(20, 20), Some(Rgba::rgb(0, 200, 0)));

        scene.redraw_all();
        assert_eq!(scene.canvas().as_bgra(), after_add.as_slice());
        assert_eq!(scene.find_shape_at(point(20.0, 20.0), 20.0), Some(poly_id));
    }

    #[test]
    fn extend_paints_the_same_as_adding_one_by_one() {
        let shapes = vec![
            rect(2.0, 2.0, 30.0, 30.0),
            line(0.0, 0.0, 31.0, 31.0),
            circle(16.0, 16.0, 9.0),
        ];
        let mut bulk = Scene::new(32, 32);
        bulk.extend(shapes.clone());
        let mut single = Scene::new(32, 32);
        for shape in shapes {
            single.add(shape);
        }
        assert_eq!(bulk.len(), 3);
        assert_eq!(bulk.canvas().as_bgra(), single.canvas().as_bgra());
    }

    #[test]
    fn rectangle_and_polygon_handles_respect_tolerance() {
        let mut scene = Scene::new(100, 100);
        let rect_id = scene.add(rect(20.0, 20.0, 60.0, 40.0));
        let poly_id = scene.add(Shape::Polygon(Polygon {
            vertices: vec![point(10.0, 60.0), point(50.0, 60.0), point(30.0, 90.0)],
            ..Polygon::default()
        }));

        let cases = [
            (point(26.0, 20.0), Some((rect_id, Handle::RectCorner(0)))),
            (point(28.0, 20.0), Some((rect_id, Handle::RectCorner(0)))),
            (point(28.5, 20.0), None),
            (point(60.0, 46.0), Some((rect_id, Handle::RectCorner(2)))),
            (point(40.0, 37.0), Some((rect_id, Handle::RectCenter))),
            (point(40.0, 38.5), None),
            (point(10.0, 67.0), Some((poly_id, Handle::PolygonVertex(0)))),
            (point(10.0, 68.5), None),
            (point(30.0, 83.5), Some((poly_id, Handle::PolygonVertex(2)))),
            (point(30.0, 75.0), Some((poly_id, Handle::PolygonCenter))),
            (point(30.0, 78.5), None),
        ];
        for (p, expected) in cases {
            assert_eq!(scene.find_handle_at(p, 8.0), expected, "{p:?}");
        }
    }
}
