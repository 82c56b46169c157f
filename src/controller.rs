use crate::geometry::Point;
use crate::model::{
    Fill, Handle, Polygon, Rgba, Shape, ShapeId, ShapeKind, Style, Thickness, shape_from_drag,
};
use crate::scene::Scene;
use crate::texture::Texture;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tool {
    #[default]
    Select,
    Line,
    Circle,
    Rectangle,
    Polygon,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Select,
        Tool::Line,
        Tool::Circle,
        Tool::Rectangle,
        Tool::Polygon,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Line => "Line",
            Tool::Circle => "Circle",
            Tool::Rectangle => "Rectangle",
            Tool::Polygon => "Polygon",
        }
    }

    /// Kind of shape this tool draws, `None` for the select tool.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            Tool::Select => None,
            Tool::Line => Some(ShapeKind::Line),
            Tool::Circle => Some(ShapeKind::Circle),
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Polygon => Some(ShapeKind::Polygon),
        }
    }
}

/// Active tool and the style new shapes are drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorState {
    pub tool: Tool,
    pub color: Rgba,
    pub thickness: Thickness,
    pub fill: Fill,
    /// Hit radius in pixels.
    pub tolerance: f64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            color: Rgba::BLACK,
            thickness: Thickness::new(3.0),
            fill: Fill::default(),
            tolerance: 8.0,
        }
    }
}

impl EditorState {
    pub fn style(&self) -> Style {
        Style {
            color: self.color,
            thickness: self.thickness,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionState {
    Idle,
    Drawing {
        start: Point,
        current: Point,
    },
    DrawingPolygon {
        vertices: Vec<Point>,
        current: Point,
    },
    Selected {
        shape: ShapeId,
        handle: Option<Handle>,
    },
    Dragging {
        shape: ShapeId,
        handle: Handle,
        last: Point,
    },
}

impl InteractionState {
    fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Drawing { .. } => "drawing",
            InteractionState::DrawingPolygon { .. } => "drawing-polygon",
            InteractionState::Selected { .. } => "selected",
            InteractionState::Dragging { .. } => "dragging",
        }
    }
}

/// Uncommitted geometry for the host to paint as an overlay.
#[derive(Clone, Debug, PartialEq)]
pub enum Preview<'a> {
    Shape(Shape),
    Polyline {
        vertices: &'a [Point],
        cursor: Point,
        style: Style,
    },
}

/// Pointer state machine. The scene is borrowed per event; the controller
/// only keeps ids.
#[derive(Clone, Debug)]
pub struct Controller {
    editor: EditorState,
    state: InteractionState,
}

impl Controller {
    pub fn new(editor: EditorState) -> Self {
        Self {
            editor,
            state: InteractionState::Idle,
        }
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selection(&self) -> Option<ShapeId> {
        match self.state {
            InteractionState::Selected { shape, .. } | InteractionState::Dragging { shape, .. } => {
                Some(shape)
            }
            _ => None,
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if self.editor.tool != tool {
            self.editor.tool = tool;
            self.cancel();
        }
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.editor.tolerance = tolerance.max(0.0);
    }

    /// Drops the selection if it no longer exists in `scene`.
    pub fn sync(&mut self, scene: &Scene) {
        if let Some(id) = self.selection() {
            if !scene.contains(id) {
                self.transition(InteractionState::Idle);
            }
        }
    }

    pub fn pointer_down(&mut self, scene: &mut Scene, p: Point) {
        let tolerance = self.editor.tolerance;
        if let InteractionState::DrawingPolygon { vertices, .. } = &mut self.state {
            let snapped = vertices.iter().position(|v| v.distance(p) <= tolerance);
            let closed = match snapped {
                Some(0) if vertices.len() >= 3 => Some(std::mem::take(vertices)),
                // Closing needs a third vertex first.
                Some(0) => None,
                Some(i) => {
                    let v = vertices[i];
                    vertices.push(v);
                    None
                }
                None => {
                    vertices.push(p);
                    None
                }
            };
            if let Some(vertices) = closed {
                self.commit_polygon(scene, vertices);
            }
            return;
        }

        if let Some((shape, handle)) = scene.find_handle_at(p, tolerance) {
            self.transition(InteractionState::Dragging {
                shape,
                handle,
                last: p,
            });
            return;
        }

        let next = match self.editor.tool.shape_kind() {
            None => match scene.find_shape_at(p, tolerance) {
                Some(shape) => InteractionState::Selected {
                    shape,
                    handle: None,
                },
                None => InteractionState::Idle,
            },
            Some(ShapeKind::Polygon) => InteractionState::DrawingPolygon {
                vertices: vec![p],
                current: p,
            },
            Some(_) => InteractionState::Drawing {
                start: p,
                current: p,
            },
        };
        self.transition(next);
    }

    pub fn pointer_move(&mut self, scene: &mut Scene, p: Point) {
        match &mut self.state {
            InteractionState::Drawing { current, .. }
            | InteractionState::DrawingPolygon { current, .. } => *current = p,
            InteractionState::Dragging {
                shape,
                handle,
                last,
            } => {
                let (id, handle, from) = (*shape, *handle, *last);
                *last = p;
                if !scene.update(id, |s| s.move_handle(handle, from, p)) {
                    self.transition(InteractionState::Idle);
                }
            }
            _ => {}
        }
    }

    pub fn pointer_up(&mut self, scene: &mut Scene, p: Point) {
        match self.state {
            InteractionState::Drawing { start, .. } => {
                let kind = self.editor.tool.shape_kind();
                let style = self.editor.style();
                if let Some(shape) = kind.and_then(|k| shape_from_drag(k, start, p, style)) {
                    let id = scene.add(shape);
                    tracing::debug!(?id, "committed shape");
                }
                self.transition(InteractionState::Idle);
            }
            InteractionState::Dragging {
                shape,
                handle,
                last,
            } => {
                if last != p {
                    scene.update(shape, |s| s.move_handle(handle, last, p));
                }
                let next = if scene.contains(shape) {
                    InteractionState::Selected {
                        shape,
                        handle: Some(handle),
                    }
                } else {
                    InteractionState::Idle
                };
                self.transition(next);
            }
            _ => {}
        }
    }

    /// Selects the top-most shape under `p` for a context menu.
    pub fn right_click(&mut self, scene: &Scene, p: Point) -> Option<ShapeId> {
        if matches!(
            self.state,
            InteractionState::Drawing { .. } | InteractionState::DrawingPolygon { .. }
        ) {
            return None;
        }
        let hit = scene.find_shape_at(p, self.editor.tolerance);
        let next = match hit {
            Some(shape) => InteractionState::Selected {
                shape,
                handle: None,
            },
            None => InteractionState::Idle,
        };
        self.transition(next);
        hit
    }

    /// Abandons any in-progress drawing. A drag ends in place.
    pub fn cancel(&mut self) {
        let next = match self.state {
            InteractionState::Dragging { shape, handle, .. } => InteractionState::Selected {
                shape,
                handle: Some(handle),
            },
            InteractionState::Selected { .. } => return,
            _ => InteractionState::Idle,
        };
        self.transition(next);
    }

    pub fn delete_selected(&mut self, scene: &mut Scene) -> Option<Shape> {
        let id = self.selection()?;
        let removed = scene.remove(id);
        scene.redraw_all();
        self.transition(InteractionState::Idle);
        removed
    }

    pub fn set_color(&mut self, scene: &mut Scene, color: Rgba) {
        self.editor.color = color;
        if let Some(id) = self.selection() {
            scene.update(id, |s| s.style_mut().color = color);
        }
    }

    pub fn set_thickness(&mut self, scene: &mut Scene, thickness: f64) {
        self.apply_thickness(scene, Thickness::new(thickness));
    }

    /// Steps from the selected shape's thickness when there is one.
    pub fn step_thickness(&mut self, scene: &mut Scene, delta: f64) {
        let base = self
            .selection()
            .and_then(|id| scene.get(id))
            .map(|s| s.style().thickness)
            .unwrap_or(self.editor.thickness);
        self.apply_thickness(scene, base.step(delta));
    }

    pub fn set_thickness_text(&mut self, scene: &mut Scene, text: &str) {
        self.apply_thickness(scene, Thickness::parse(text));
    }

    pub fn set_fill(&mut self, scene: &mut Scene, fill: Fill) {
        self.editor.fill = fill;
        if let Some(id) = self.selected_polygon(scene) {
            scene.update(id, |s| {
                if let Shape::Polygon(poly) = s {
                    poly.fill = fill;
                }
            });
        }
    }

    /// Sets or clears the selected polygon's texture. Returns `false` when
    /// no polygon is selected.
    pub fn set_texture(&mut self, scene: &mut Scene, texture: Option<Texture>) -> bool {
        let Some(id) = self.selected_polygon(scene) else {
            return false;
        };
        scene.update(id, |s| {
            if let Shape::Polygon(poly) = s {
                poly.texture = texture;
            }
        })
    }

    pub fn preview(&self) -> Option<Preview<'_>> {
        match &self.state {
            InteractionState::Drawing { start, current } => self
                .editor
                .tool
                .shape_kind()
                .and_then(|k| shape_from_drag(k, *start, *current, self.editor.style()))
                .map(Preview::Shape),
            InteractionState::DrawingPolygon { vertices, current } => Some(Preview::Polyline {
                vertices,
                cursor: *current,
                style: self.editor.style(),
            }),
            _ => None,
        }
    }

    fn apply_thickness(&mut self, scene: &mut Scene, thickness: Thickness) {
        self.editor.thickness = thickness;
        if let Some(id) = self.selection() {
            scene.update(id, |s| s.style_mut().thickness = thickness);
        }
    }

    fn selected_polygon(&self, scene: &Scene) -> Option<ShapeId> {
        let id = self.selection()?;
        matches!(scene.get(id), Some(Shape::Polygon(_))).then_some(id)
    }

    fn commit_polygon(&mut self, scene: &mut Scene, vertices: Vec<Point>) {
        let polygon = Polygon {
            vertices,
            style: self.editor.style(),
            fill: self.editor.fill,
            texture: None,
        };
        let id = scene.add(Shape::Polygon(polygon));
        tracing::debug!(?id, "committed polygon");
        self.transition(InteractionState::Idle);
    }

    fn transition(&mut self, next: InteractionState) {
        if self.state.name() != next.name() {
            tracing::debug!(from = self.state.name(), to = next.name(), "controller state");
        }
        self.state = next;
    }
}
