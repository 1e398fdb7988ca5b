//! Host primitives: the drawable instances scripts construct and animate.

use rayon::prelude::*;

use crate::animation::{Animatable, Easing, Property, PropertyAnimation, ShapeAnimation, ShapeCommit};
use crate::geometry::{circle_boundary, join_subpaths, rect_boundary, split_subpaths, Point, Transform};
use crate::render::{FillMode, Glyph, GlyphSource};

/// Identifies a primitive owned by a scene. Never reused within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u64);

/// The kind of a primitive; doubles as the type tag for method dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Rect,
    Circle,
    Polygon,
    Line,
    Text,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 5] = [
        PrimitiveKind::Rect,
        PrimitiveKind::Circle,
        PrimitiveKind::Polygon,
        PrimitiveKind::Line,
        PrimitiveKind::Text,
    ];

    /// Script-facing type name.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Rect => "rect",
            PrimitiveKind::Circle => "circle",
            PrimitiveKind::Polygon => "polygon",
            PrimitiveKind::Line => "line",
            PrimitiveKind::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

impl Align {
    pub const NAMES: &'static [&'static str] = &["left", "center", "right"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" => Some(Align::Right),
            _ => None,
        }
    }
}

/// Construction parameters that survive on the primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { width: f32, height: f32 },
    Circle { radius: f32, segments: u32 },
    Polygon,
    Line { from: [f32; 3], to: [f32; 3] },
    Text { content: String, size: f32, font: String, align: Align },
}

impl Shape {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Shape::Rect { .. } => PrimitiveKind::Rect,
            Shape::Circle { .. } => PrimitiveKind::Circle,
            Shape::Polygon => PrimitiveKind::Polygon,
            Shape::Line { .. } => PrimitiveKind::Line,
            Shape::Text { .. } => PrimitiveKind::Text,
        }
    }
}

/// A drawable instance: outline, placement, colour and its running animations.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub shape: Shape,
    pub transform: Transform,
    pub color: [f32; 4],
    pub boundary: Vec<Point>,
    pub filled: bool,
    /// Whether each loop closes back onto its first point.
    pub closed: bool,
    pub reveal: f32,
    pub velocity: [f32; 2],
    tweens: Vec<PropertyAnimation>,
    shape_tween: Option<ShapeAnimation>,
}

impl Primitive {
    pub fn new(shape: Shape, boundary: Vec<Point>, filled: bool) -> Self {
        let closed = !matches!(shape, Shape::Line { .. });
        Self {
            shape,
            transform: Transform::default(),
            color: [1.0, 1.0, 1.0, 1.0],
            boundary,
            filled,
            closed,
            reveal: 1.0,
            velocity: [0.0, 0.0],
            tweens: Vec::new(),
            shape_tween: None,
        }
    }

    pub fn rect(width: f32, height: f32, filled: bool) -> Self {
        Self::new(Shape::Rect { width, height }, rect_boundary(width, height), filled)
    }

    pub fn circle(radius: f32, segments: u32, filled: bool) -> Self {
        Self::new(
            Shape::Circle { radius, segments },
            circle_boundary(radius, segments as usize),
            filled,
        )
    }

    pub fn polygon(points: Vec<Point>, filled: bool) -> Self {
        Self::new(Shape::Polygon, points, filled)
    }

    pub fn line(from: [f32; 3], to: [f32; 3]) -> Self {
        let boundary = vec![Point::new(from[0], from[1]), Point::new(to[0], to[1])];
        Self::new(Shape::Line { from, to }, boundary, false)
    }

    /// Lay out `content` with outlines from `glyphs`. Glyphs are fetched in
    /// parallel, one output slot per character, then placed left to right.
    pub fn text(
        glyphs: &dyn GlyphSource,
        content: &str,
        size: f32,
        font: &str,
        align: Align,
    ) -> Self {
        let chars: Vec<char> = content.chars().collect();
        let outlines: Vec<Glyph> = chars
            .par_iter()
            .map(|&ch| glyphs.contours(ch, size, font))
            .collect();

        let width: f32 = outlines.iter().map(|g| g.advance).sum();
        let mut pen = match align {
            Align::Left => 0.0,
            Align::Center => -width * 0.5,
            Align::Right => -width,
        };
        let baseline = -size * 0.5;

        let mut loops = Vec::new();
        for glyph in &outlines {
            for loop_ in &glyph.loops {
                loops.push(
                    loop_
                        .iter()
                        .map(|p| Point::new(p.x + pen, p.y + baseline))
                        .collect::<Vec<_>>(),
                );
            }
            pen += glyph.advance;
        }

        let shape = Shape::Text {
            content: content.to_string(),
            size,
            font: font.to_string(),
            align,
        };
        Self::new(shape, join_subpaths(&loops), true)
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.shape.kind()
    }

    pub fn fill_mode(&self) -> FillMode {
        if self.filled {
            FillMode::Filled
        } else {
            FillMode::Stroked
        }
    }

    /// Start a tween of `property` from its current value.
    pub fn start_tween(&mut self, property: Property, to: f64, duration: f64, easing: Easing) {
        let tween = PropertyAnimation::begin(self, property, to, duration, easing);
        self.tweens.push(tween);
    }

    /// Start a shape tween, discarding any that is already running.
    pub fn start_shape_tween(&mut self, animation: ShapeAnimation) {
        if self.shape_tween.replace(animation).is_some() {
            log::debug!("shape tween replaced before completion");
        }
    }

    pub fn tweens(&self) -> &[PropertyAnimation] {
        &self.tweens
    }

    pub fn is_tweening(&self, property: Property) -> bool {
        self.tweens.iter().any(|t| t.property == property)
    }

    pub fn shape_tween(&self) -> Option<&ShapeAnimation> {
        self.shape_tween.as_ref()
    }

    /// Advance velocity, tweens and the shape tween by `dt` seconds.
    ///
    /// Returns the commit of a shape tween that finished during this step.
    pub fn advance(&mut self, dt: f64, bounds: [f32; 2]) -> Option<ShapeCommit> {
        self.integrate_velocity(dt as f32, bounds);

        let mut tweens = std::mem::take(&mut self.tweens);
        tweens.retain_mut(|tween| !tween.advance(self, dt));
        // Tweens started while advancing (none today) would land in self.tweens.
        tweens.append(&mut self.tweens);
        self.tweens = tweens;

        let finished = match self.shape_tween.as_mut() {
            Some(animation) => {
                let (points, done) = animation.advance(dt);
                self.boundary = points.to_vec();
                done
            }
            None => false,
        };
        if !finished {
            return None;
        }
        let commit = self.shape_tween.take()?.commit;
        self.boundary = commit.boundary.clone();
        self.filled = commit.filled;
        Some(commit)
    }

    /// Trivial bounce: reflect the velocity component that carried the
    /// primitive past the bounds and clamp it back inside.
    fn integrate_velocity(&mut self, dt: f32, bounds: [f32; 2]) {
        if self.velocity == [0.0, 0.0] {
            return;
        }
        let t = &mut self.transform;
        t.x += self.velocity[0] * dt;
        t.y += self.velocity[1] * dt;
        if t.x.abs() > bounds[0] {
            t.x = t.x.clamp(-bounds[0], bounds[0]);
            self.velocity[0] = -self.velocity[0];
        }
        if t.y.abs() > bounds[1] {
            t.y = t.y.clamp(-bounds[1], bounds[1]);
            self.velocity[1] = -self.velocity[1];
        }
    }

    /// Loops to draw, truncated by the reveal fraction.
    pub fn visible_loops(&self) -> Vec<Vec<Point>> {
        let loops = split_subpaths(&self.boundary);
        if self.reveal >= 1.0 {
            return loops;
        }
        let reveal = self.reveal.max(0.0);
        loops
            .into_iter()
            .map(|mut loop_| {
                let keep = (loop_.len() as f32 * reveal).ceil() as usize;
                loop_.truncate(keep);
                loop_
            })
            .filter(|loop_| !loop_.is_empty())
            .collect()
    }
}

impl Animatable for Primitive {
    fn get(&self, property: Property) -> f64 {
        f64::from(match property {
            Property::X => self.transform.x,
            Property::Y => self.transform.y,
            Property::ScaleX => self.transform.scale_x,
            Property::ScaleY => self.transform.scale_y,
            Property::Rotation => self.transform.rotation,
            Property::Red => self.color[0],
            Property::Green => self.color[1],
            Property::Blue => self.color[2],
            Property::Alpha => self.color[3],
            Property::Reveal => self.reveal,
        })
    }

    fn set(&mut self, property: Property, value: f64) {
        let value = value as f32;
        match property {
            Property::X => self.transform.x = value,
            Property::Y => self.transform.y = value,
            Property::ScaleX => self.transform.scale_x = value,
            Property::ScaleY => self.transform.scale_y = value,
            Property::Rotation => self.transform.rotation = value,
            Property::Red => self.color[0] = value,
            Property::Green => self.color[1] = value,
            Property::Blue => self.color[2] = value,
            Property::Alpha => self.color[3] = value,
            Property::Reveal => self.reveal = value,
        }
    }
}
