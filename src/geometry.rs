//! Points, transforms and boundary construction.
//!
//! A boundary is a flat `Vec<Point>` holding one or more point loops. Loops
//! are delimited by [`Point::SEPARATOR`], whose coordinates are NaN; a
//! separator is never a renderable vertex.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Sub-path separator.
    pub const SEPARATOR: Point = Point {
        x: f32::NAN,
        y: f32::NAN,
    };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_separator(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }

    /// `self * (1 - t) + other * t`; exact at both ends.
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point {
            x: self.x * (1.0 - t) + other.x * t,
            y: self.y * (1.0 - t) + other.y * t,
        }
    }
}

/// Placement of a primitive: translation, per-axis scale and rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

impl Transform {
    /// Map a local point into scene space: scale, then rotate, then translate.
    pub fn apply(&self, p: Point) -> Point {
        if p.is_separator() {
            return p;
        }
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let sx = p.x * self.scale_x;
        let sy = p.y * self.scale_y;
        Point {
            x: sx * cos - sy * sin + self.x,
            y: sx * sin + sy * cos + self.y,
        }
    }
}

/// Split a boundary into its loops. Empty loops (adjacent separators) are dropped.
pub fn split_subpaths(points: &[Point]) -> Vec<Vec<Point>> {
    points
        .split(|p| p.is_separator())
        .filter(|loop_| !loop_.is_empty())
        .map(|loop_| loop_.to_vec())
        .collect()
}

/// Flatten loops into a boundary with separators between them.
pub fn join_subpaths(loops: &[Vec<Point>]) -> Vec<Point> {
    let mut out = Vec::with_capacity(loops.iter().map(|l| l.len() + 1).sum());
    for (i, loop_) in loops.iter().enumerate() {
        if i > 0 {
            out.push(Point::SEPARATOR);
        }
        out.extend_from_slice(loop_);
    }
    out
}

/// Number of loops in a boundary.
pub fn subpath_count(points: &[Point]) -> usize {
    split_subpaths(points).len()
}

/// Centre of the axis-aligned bounding box of all non-separator points.
pub fn bounds_center(points: &[Point]) -> Point {
    let mut min = Point::new(f32::INFINITY, f32::INFINITY);
    let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points.iter().filter(|p| !p.is_separator()) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    if min.x > max.x {
        return Point::new(0.0, 0.0);
    }
    Point::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5)
}

/// Translate a boundary so its bounding box is centred on the origin.
pub fn centered(points: &[Point]) -> Vec<Point> {
    let c = bounds_center(points);
    points
        .iter()
        .map(|p| {
            if p.is_separator() {
                *p
            } else {
                Point::new(p.x - c.x, p.y - c.y)
            }
        })
        .collect()
}

pub fn rect_boundary(width: f32, height: f32) -> Vec<Point> {
    let hw = width * 0.5;
    let hh = height * 0.5;
    vec![
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ]
}

pub fn circle_boundary(radius: f32, segments: usize) -> Vec<Point> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let a = TAU * i as f32 / segments as f32;
            Point::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn separator_is_detected() {
        assert!(Point::SEPARATOR.is_separator());
        assert!(!Point::new(0.0, 0.0).is_separator());
    }

    #[test]
    fn lerp_is_exact_at_ends() {
        let a = Point::new(0.3, -0.7);
        let b = Point::new(1.0, 0.1);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn split_and_join() {
        let boundary = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::SEPARATOR,
            Point::SEPARATOR,
            Point::new(2.0, 2.0),
        ];
        let loops = split_subpaths(&boundary);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[1], vec![Point::new(2.0, 2.0)]);
        let joined = join_subpaths(&loops);
        assert_eq!(joined.len(), 4);
        assert!(joined[2].is_separator());
    }

    #[test]
    fn centered_moves_bbox_to_origin() {
        let pts = vec![Point::new(1.0, 1.0), Point::new(3.0, 5.0)];
        let c = centered(&pts);
        assert_approx_eq!(c[0].x, -1.0);
        assert_approx_eq!(c[0].y, -2.0);
        assert_approx_eq!(c[1].x, 1.0);
        assert_approx_eq!(c[1].y, 2.0);
    }

    #[test]
    fn transform_rotates_then_translates() {
        let t = Transform {
            x: 1.0,
            rotation: 90.0,
            ..Transform::default()
        };
        let p = t.apply(Point::new(1.0, 0.0));
        assert_approx_eq!(p.x, 1.0, 1e-6);
        assert_approx_eq!(p.y, 1.0, 1e-6);
    }

    #[test]
    fn rect_is_centered() {
        let r = rect_boundary(0.6, 0.4);
        assert_eq!(r.len(), 4);
        let c = bounds_center(&r);
        assert_approx_eq!(c.x, 0.0);
        assert_approx_eq!(c.y, 0.0);
    }

    #[test]
    fn circle_has_requested_segments() {
        assert_eq!(circle_boundary(1.0, 32).len(), 32);
        assert_eq!(circle_boundary(1.0, 1).len(), 3);
    }
}
