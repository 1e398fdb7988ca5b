//! Capabilities consumed from the outside world: drawing and glyph outlines.
//!
//! The scene never talks to a graphics API. It hands each visible primitive's
//! loops, transform and colour to a [`Renderer`], and asks a [`GlyphSource`]
//! for character outlines when laying out text.

use crate::geometry::{Point, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Filled,
    Stroked,
}

/// Draws point loops.
pub trait Renderer {
    fn draw(&mut self, loops: &[Vec<Point>], transform: &Transform, color: [f32; 4], mode: FillMode);
}

/// Outline of one character at a given size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    pub loops: Vec<Vec<Point>>,
    pub advance: f32,
}

/// Produces glyph outlines. Called from worker threads during text layout.
pub trait GlyphSource: Send + Sync {
    fn contours(&self, ch: char, size: f32, font: &str) -> Glyph;
}

/// A glyph source that draws every visible character as a box outline.
/// Useful for previews and tests where no font is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxGlyphs;

impl GlyphSource for BoxGlyphs {
    fn contours(&self, ch: char, size: f32, _font: &str) -> Glyph {
        if ch.is_whitespace() {
            return Glyph {
                loops: Vec::new(),
                advance: size * 0.5,
            };
        }
        let w = size * 0.6;
        Glyph {
            loops: vec![vec![
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, size),
                Point::new(0.0, size),
            ]],
            advance: size * 0.7,
        }
    }
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub loops: Vec<Vec<Point>>,
    pub transform: Transform,
    pub color: [f32; 4],
    pub mode: FillMode,
}

/// A renderer that keeps every draw call of the current frame and logs a
/// one-line summary of each at debug level.
#[derive(Debug, Default)]
pub struct TraceRenderer {
    pub calls: Vec<DrawCall>,
}

impl TraceRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous frame.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Total vertex count across all calls of the frame.
    pub fn vertex_count(&self) -> usize {
        self.calls
            .iter()
            .flat_map(|c| c.loops.iter())
            .map(Vec::len)
            .sum()
    }
}

impl Renderer for TraceRenderer {
    fn draw(&mut self, loops: &[Vec<Point>], transform: &Transform, color: [f32; 4], mode: FillMode) {
        log::debug!(
            "draw {:?} loops={} at ({:.3}, {:.3}) color={:?}",
            mode,
            loops.len(),
            transform.x,
            transform.y,
            color
        );
        self.calls.push(DrawCall {
            loops: loops.to_vec(),
            transform: *transform,
            color,
            mode,
        });
    }
}
