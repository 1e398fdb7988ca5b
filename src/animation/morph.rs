//! Shape tweens and point-count reconciliation between arbitrary boundaries.
//!
//! Two boundaries can only be blended vertex-by-vertex once they have the same
//! number of loops and each paired loop has the same number of points.
//! [`reconcile`] gets them there:
//!
//! 1. split both boundaries into loops at separators;
//! 2. pad the side with fewer loops with single-point loops;
//! 3. size each loop pair from the larger total point budget, proportionally
//!    to each loop's share of its own boundary, never below
//!    [`MIN_SUBPATH_POINTS`];
//! 4. resample every loop to its pair size, keeping the first and last points exact.

use super::easing::Easing;
use crate::geometry::{centered, join_subpaths, split_subpaths, Point};
use crate::scene::primitive::PrimitiveId;

/// Smallest number of points any reconciled loop gets. Keeps corners and
/// straight edges of coarse shapes intact while they bend into the other shape.
pub const MIN_SUBPATH_POINTS: usize = 12;

/// Resample one loop to `count` points.
///
/// The first and last points are kept exactly; interior points walk the
/// source at a step of `(len - 1) / (count - 1)` and blend the two points
/// they fall between.
pub fn resample(points: &[Point], count: usize) -> Vec<Point> {
    if count == 0 {
        return Vec::new();
    }
    if points.len() == count {
        return points.to_vec();
    }
    let Some(&first) = points.first() else {
        return vec![Point::new(0.0, 0.0); count];
    };
    if points.len() == 1 || count == 1 {
        return vec![first; count];
    }

    let last_index = points.len() - 1;
    let step = last_index as f64 / (count - 1) as f64;
    let mut out = Vec::with_capacity(count);
    out.push(first);
    for i in 1..count - 1 {
        let pos = i as f64 * step;
        let idx = (pos.floor() as usize).min(last_index - 1);
        let frac = (pos - idx as f64) as f32;
        out.push(points[idx].lerp(points[idx + 1], frac));
    }
    out.push(points[last_index]);
    out
}

/// Append the first point of every loop to its end so resampling walks the
/// closing edge too. Loops that are already closed are left alone.
pub fn close_loops(boundary: &[Point]) -> Vec<Point> {
    let loops: Vec<Vec<Point>> = split_subpaths(boundary)
        .into_iter()
        .map(|mut loop_| {
            if loop_.len() > 2 && loop_.first() != loop_.last() {
                loop_.push(loop_[0]);
            }
            loop_
        })
        .collect();
    join_subpaths(&loops)
}

/// Bring two boundaries to equal loop count and equal per-loop point count.
pub fn reconcile(start: &[Point], target: &[Point]) -> (Vec<Point>, Vec<Point>) {
    let mut a = split_subpaths(start);
    let mut b = split_subpaths(target);
    if a.is_empty() && b.is_empty() {
        return (Vec::new(), Vec::new());
    }

    pad_loops(&mut a, b.len());
    pad_loops(&mut b, a.len());

    let total_a: usize = a.iter().map(Vec::len).sum();
    let total_b: usize = b.iter().map(Vec::len).sum();
    let budget = total_a.max(total_b);

    let share = |len: usize, total: usize| -> usize {
        (budget as f64 * len as f64 / total as f64).round() as usize
    };

    let mut out_a = Vec::with_capacity(a.len());
    let mut out_b = Vec::with_capacity(b.len());
    for (loop_a, loop_b) in a.iter().zip(&b) {
        let count = MIN_SUBPATH_POINTS
            .max(share(loop_a.len(), total_a))
            .max(share(loop_b.len(), total_b));
        out_a.push(resample(loop_a, count));
        out_b.push(resample(loop_b, count));
    }

    (join_subpaths(&out_a), join_subpaths(&out_b))
}

/// Grow `loops` to `count` entries with single-point loops sitting at the
/// start of the last real loop (or the origin for an empty boundary).
fn pad_loops(loops: &mut Vec<Vec<Point>>, count: usize) {
    let anchor = loops
        .last()
        .and_then(|l| l.first().copied())
        .unwrap_or(Point::new(0.0, 0.0));
    while loops.len() < count {
        loops.push(vec![anchor]);
    }
}

/// Buffers for one vertex-by-vertex blend between two reconciled boundaries.
///
/// The start and target buffers are fixed for the life of the job; only the
/// output is recomputed.
#[derive(Debug, Clone)]
pub struct MorphJob {
    start: Box<[Point]>,
    target: Box<[Point]>,
    output: Vec<Point>,
}

impl MorphJob {
    /// Both buffers must have equal length; the longer one is truncated otherwise.
    pub fn new(start: Vec<Point>, target: Vec<Point>) -> Self {
        let n = start.len().min(target.len());
        debug_assert_eq!(start.len(), target.len(), "morph buffers must match");
        let mut start = start;
        let mut target = target;
        start.truncate(n);
        target.truncate(n);
        Self {
            output: start.clone(),
            start: start.into_boxed_slice(),
            target: target.into_boxed_slice(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.output.len()
    }

    /// Blend at progress `t`. A separator on either side yields a separator.
    pub fn evaluate(&mut self, t: f32) -> &[Point] {
        for ((out, a), b) in self.output.iter_mut().zip(&*self.start).zip(&*self.target) {
            *out = if a.is_separator() || b.is_separator() {
                Point::SEPARATOR
            } else {
                a.lerp(*b, t)
            };
        }
        &self.output
    }

    pub fn output(&self) -> &[Point] {
        &self.output
    }
}

/// What a finished shape tween leaves behind.
#[derive(Debug, Clone)]
pub struct ShapeCommit {
    pub boundary: Vec<Point>,
    pub filled: bool,
    /// For a full morph-replace, the primitive that takes the source's place.
    pub replace_with: Option<PrimitiveId>,
}

/// A tween of a primitive's whole boundary towards another boundary.
#[derive(Debug, Clone)]
pub struct ShapeAnimation {
    job: MorphJob,
    pub duration: f64,
    pub elapsed: f64,
    pub easing: Easing,
    pub commit: ShapeCommit,
}

impl ShapeAnimation {
    /// Centre both boundaries, reconcile them and prepare the blend.
    pub fn new(
        start: &[Point],
        target: &[Point],
        duration: f64,
        easing: Easing,
        commit: ShapeCommit,
    ) -> Self {
        let (a, b) = reconcile(&centered(start), &centered(target));
        Self {
            job: MorphJob::new(a, b),
            duration,
            elapsed: 0.0,
            easing,
            commit,
        }
    }

    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Advance by `dt`. Returns the blended boundary and whether the tween finished.
    pub fn advance(&mut self, dt: f64) -> (&[Point], bool) {
        self.elapsed += dt;
        let t = self.progress();
        let eased = self.easing.apply(t) as f32;
        (self.job.evaluate(eased), t >= 1.0)
    }

    pub fn vertex_count(&self) -> usize {
        self.job.vertex_count()
    }
}
