use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::Rgba;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Fixed-size BGRA pixel buffer. Never resized in place.
///
/// Equality compares size and pixels only.
#[derive(Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    bgra: Vec<u8>,
    generation: u64,
    revision: u64,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        let mut canvas = Self {
            width,
            height,
            bgra: vec![0; width as usize * height as usize * 4],
            generation: next_generation(),
            revision: 0,
        };
        canvas.clear(background);
        canvas
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bumped every time a draw scope ends.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Unique per buffer, clones included. Together with `revision()` it
    /// identifies one exact frame across canvas replacements.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Opens a write scope. The display layer should only read the buffer
    /// between scopes, i.e. when `revision()` is stable.
    pub fn begin_draw(&mut self) -> DrawGuard<'_> {
        DrawGuard { canvas: self }
    }

    pub fn clear(&mut self, color: Rgba) {
        for px in self.bgra.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.b, color.g, color.r, color.a]);
        }
    }

    /// Writes outside the buffer are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        self.bgra[idx] = color.b;
        self.bgra[idx + 1] = color.g;
        self.bgra[idx + 2] = color.r;
        self.bgra[idx + 3] = color.a;
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let idx = self.index(x, y)?;
        Some(Rgba::new(
            self.bgra[idx + 2],
            self.bgra[idx + 1],
            self.bgra[idx],
            self.bgra[idx + 3],
        ))
    }

    /// Raw BGRA bytes, row-major, stride `width * 4`.
    pub fn as_bgra(&self) -> &[u8] {
        &self.bgra
    }

    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bgra.len());
        for px in self.bgra.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
        out
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

impl Clone for Canvas {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            bgra: self.bgra.clone(),
            generation: next_generation(),
            revision: self.revision,
        }
    }
}

impl PartialEq for Canvas {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.bgra == other.bgra
    }
}

impl Eq for Canvas {}

pub struct DrawGuard<'a> {
    canvas: &'a mut Canvas,
}

impl Deref for DrawGuard<'_> {
    type Target = Canvas;

    fn deref(&self) -> &Canvas {
        self.canvas
    }
}

impl DerefMut for DrawGuard<'_> {
    fn deref_mut(&mut self) -> &mut Canvas {
        self.canvas
    }
}

impl Drop for DrawGuard<'_> {
    fn drop(&mut self) {
        self.canvas.revision = self.canvas.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_pixels_as_bgra() {
        let mut canvas = Canvas::new(2, 1, Rgba::WHITE);
        canvas.set_pixel(1, 0, Rgba::new(10, 20, 30, 40));
        assert_eq!(canvas.as_bgra(), &[255, 255, 255, 255, 30, 20, 10, 40]);
        assert_eq!(canvas.pixel(1, 0), Some(Rgba::new(10, 20, 30, 40)));
        assert_eq!(&canvas.to_rgba()[4..], &[10, 20, 30, 40]);
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut canvas = Canvas::new(3, 3, Rgba::WHITE);
        let before = canvas.clone();
        for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (i32::MAX, i32::MIN)] {
            canvas.set_pixel(x, y, Rgba::BLACK);
        }
        assert_eq!(canvas, before);
        assert_eq!(canvas.pixel(3, 0), None);
    }

    #[test]
    fn clear_overwrites_everything() {
        let mut canvas = Canvas::new(4, 4, Rgba::WHITE);
        canvas.set_pixel(2, 2, Rgba::BLACK);
        canvas.clear(Rgba::rgb(1, 2, 3));
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(canvas.pixel(x, y), Some(Rgba::rgb(1, 2, 3)));
            }
        }
    }

    #[test]
    fn draw_scope_bumps_revision() {
        let mut canvas = Canvas::new(1, 1, Rgba::WHITE);
        assert_eq!(canvas.revision(), 0);
        {
            let mut draw = canvas.begin_draw();
            draw.set_pixel(0, 0, Rgba::BLACK);
        }
        assert_eq!(canvas.revision(), 1);
    }

    #[test]
    fn zero_sized_canvas_ignores_writes() {
        let mut canvas = Canvas::new(0, 0, Rgba::WHITE);
        canvas.set_pixel(0, 0, Rgba::BLACK);
        assert!(canvas.as_bgra().is_empty());
    }

    #[test]
    fn every_buffer_gets_its_own_generation() {
        let first = Canvas::new(4, 4, Rgba::WHITE);
        let second = Canvas::new(4, 4, Rgba::WHITE);
        let copy = first.clone();
        assert_eq!(first.revision(), second.revision());
        assert_ne!(first.generation(), second.generation());
        assert_ne!(first.generation(), copy.generation());
        assert_eq!(first, copy);
    }
}
