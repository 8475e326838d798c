//! Nearest-two-point segment projection weights.
//!
//! For every target point the two nearest source points `a` and `b` are found
//! by distance alone, the target is projected onto the infinite line through
//! them, and the projection's distances to `a` and `b` become two linear
//! interpolation weights. Source connectivity is never consulted, so source
//! points are expected in an order where index neighbours are also spatial
//! neighbours (a polyline or boundary ordering).
//!
//! The denominator is clamped as `l = max(length, bc)`. `bc` only exceeds
//! `length` when the projection falls before `a` or more than one segment
//! length past `b`, so the clamp is one-sided: before `a` the weights collapse
//! to `(1, 0)`, past `b` they stop summing to one. The asymmetry is kept as-is
//! and reported through [`WeightDiagnostics`].

use serde::{Deserialize, Serialize};

use super::core::{Point3, Tolerance, project_onto_line};
use super::diagnostics::{ProjectionSide, WeightDiagnostics};
use super::error::{TransferError, TransferResult};
use super::metrics::{TimingBucket, TransferMetrics};
use super::point_set::PointSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Orientation of a weight matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingDirection {
    /// Targets are rows: `target_count x source_count`.
    ///
    /// Maps a source field onto the target points, e.g. structural
    /// displacements onto an aerodynamic mesh (`Up = W * Us`).
    Forward,
    /// Sources are rows: `source_count x target_count`.
    ///
    /// Maps a target field back onto the source points, e.g. aerodynamic
    /// forces onto structural nodes (`Fs = W * Fp`).
    Reverse,
}

impl MappingDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// Options for weight construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightOptions {
    /// Segments at most this long count as degenerate.
    ///
    /// Defaults to [`Tolerance::EXACT`], so only coincident points are
    /// rejected and meshes of any physical scale are accepted.
    pub tolerance: Tolerance,
    /// Padding around the source bounding box when counting outlying targets.
    pub bounds_padding: f64,
    /// Emit a `log::warn!` when targets project off their segment.
    pub warn_on_extrapolation: bool,
}

impl Default for WeightOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::EXACT,
            bounds_padding: 0.0,
            warn_on_extrapolation: true,
        }
    }
}

impl WeightOptions {
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_bounds_padding(mut self, padding: f64) -> Self {
        self.bounds_padding = padding;
        self
    }
}

/// Dense, row-major interpolation matrix between two point sets.
///
/// Each target point owns at most two nonzero entries, placed at the indices
/// of its two nearest source points. Forward matrices hold them in the
/// target's row, reverse matrices in the target's column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightMatrix {
    rows: usize,
    columns: usize,
    direction: MappingDirection,
    values: Vec<f64>,
}

impl WeightMatrix {
    fn zeros(source_count: usize, target_count: usize, direction: MappingDirection) -> Self {
        let (rows, columns) = match direction {
            MappingDirection::Forward => (target_count, source_count),
            MappingDirection::Reverse => (source_count, target_count),
        };
        Self {
            rows,
            columns,
            direction,
            values: vec![0.0; rows * columns],
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    #[must_use]
    pub fn direction(&self) -> MappingDirection {
        self.direction
    }

    #[must_use]
    pub fn source_count(&self) -> usize {
        match self.direction {
            MappingDirection::Forward => self.columns,
            MappingDirection::Reverse => self.rows,
        }
    }

    #[must_use]
    pub fn target_count(&self) -> usize {
        match self.direction {
            MappingDirection::Forward => self.rows,
            MappingDirection::Reverse => self.columns,
        }
    }

    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row < self.rows && column < self.columns {
            Some(self.values[row * self.columns + column])
        } else {
            None
        }
    }

    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.rows).then(|| &self.values[row * self.columns..(row + 1) * self.columns])
    }

    #[must_use]
    pub fn column(&self, column: usize) -> Option<Vec<f64>> {
        (column < self.columns).then(|| {
            self.values
                .iter()
                .skip(column)
                .step_by(self.columns)
                .copied()
                .collect()
        })
    }

    /// Row-major values.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Nonzero `(source_index, weight)` pairs for one target point.
    #[must_use]
    pub fn target_weights(&self, target: usize) -> Vec<(usize, f64)> {
        let lane = match self.direction {
            MappingDirection::Forward => self.row(target).map(<[f64]>::to_vec),
            MappingDirection::Reverse => self.column(target),
        };
        lane.unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter(|(_, w)| *w != 0.0)
            .collect()
    }

    /// Transposed copy with the opposite direction.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut values = vec![0.0; self.values.len()];
        for r in 0..self.rows {
            for c in 0..self.columns {
                values[c * self.rows + r] = self.values[r * self.columns + c];
            }
        }
        Self {
            rows: self.columns,
            columns: self.rows,
            direction: self.direction.flipped(),
            values,
        }
    }

    /// Whether `self` equals `other` transposed, entry by entry within `tol`.
    ///
    /// Forward and reverse weights are built independently; conservative
    /// load/displacement coupling needs them to be transposes of each other,
    /// which only holds when both were built over the same point pairing.
    #[must_use]
    pub fn is_transpose_of(&self, other: &Self, tol: Tolerance) -> bool {
        if self.rows != other.columns || self.columns != other.rows {
            return false;
        }
        (0..self.rows).all(|r| {
            (0..self.columns).all(|c| {
                tol.approx_eq_f64(
                    self.values[r * self.columns + c],
                    other.values[c * other.columns + r],
                )
            })
        })
    }

    fn set(&mut self, row: usize, column: usize, value: f64) {
        self.values[row * self.columns + column] = value;
    }
}

/// Interpolation weights of one target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentWeights {
    /// Nearest source index.
    pub a: usize,
    /// Second-nearest source index.
    pub b: usize,
    pub weight_a: f64,
    pub weight_b: f64,
    pub side: ProjectionSide,
    /// Perpendicular distance from the target to the line through `a` and `b`.
    pub offset: f64,
}

/// Indices of the two source points nearest to `p`, nearest first.
///
/// Ties keep the lower index first. Returns `None` for fewer than two sources.
#[must_use]
pub fn nearest_two(source: &[Point3], p: Point3) -> Option<(usize, usize)> {
    if source.len() < 2 {
        return None;
    }
    let d0 = p.distance_squared_to(source[0]);
    let d1 = p.distance_squared_to(source[1]);
    let (mut best, mut second) = if d1 < d0 {
        ((1, d1), (0, d0))
    } else {
        ((0, d0), (1, d1))
    };
    for (idx, q) in source.iter().enumerate().skip(2) {
        let d = p.distance_squared_to(*q);
        if d < best.1 {
            second = best;
            best = (idx, d);
        } else if d < second.1 {
            second = (idx, d);
        }
    }
    Some((best.0, second.0))
}

/// Project `p` onto the line through `source[a]` and `source[b]` and derive
/// the two weights.
///
/// `a` and `b` must index into `source`; they come from [`nearest_two`].
pub(crate) fn segment_weights(
    source: &[Point3],
    target_index: usize,
    p: Point3,
    (a, b): (usize, usize),
    tol: Tolerance,
) -> TransferResult<SegmentWeights> {
    let pa = source[a];
    let pb = source[b];

    let length = pa.distance_to(pb);
    log::trace!("target {target_index}: segment ({a}, {b}) length {length:e}");
    if tol.is_zero_length(length) {
        return Err(TransferError::DegenerateSegment {
            target_index,
            source_a: a,
            source_b: b,
        });
    }

    let norm = (pb - pa) / length;
    let (t, c) = project_onto_line(pa, norm, p);

    let ac = c.distance_to(pa);
    let bc = c.distance_to(pb);
    let l = length.max(bc);

    let side = if t < 0.0 {
        ProjectionSide::BeyondA
    } else if t > length {
        ProjectionSide::BeyondB
    } else {
        ProjectionSide::Interior
    };

    Ok(SegmentWeights {
        a,
        b,
        weight_a: (l - ac) / length,
        weight_b: (l - bc) / length,
        side,
        offset: p.distance_to(c),
    })
}

/// Build the weight matrix mapping between `source` and `target`.
pub fn build_weights(
    source: &PointSet,
    target: &PointSet,
    direction: MappingDirection,
) -> TransferResult<WeightMatrix> {
    build_weights_with_options(source, target, direction, &WeightOptions::default())
        .map(|(weights, _)| weights)
}

/// Displacement-style map: one row per target point.
pub fn forward_weights(source: &PointSet, target: &PointSet) -> TransferResult<WeightMatrix> {
    build_weights(source, target, MappingDirection::Forward)
}

/// Force-style map: one row per source point.
pub fn reverse_weights(source: &PointSet, target: &PointSet) -> TransferResult<WeightMatrix> {
    build_weights(source, target, MappingDirection::Reverse)
}

/// Build weights and report where the targets landed.
///
/// Construction is all-or-nothing: the first failing target (lowest index)
/// aborts the call.
pub fn build_weights_with_options(
    source: &PointSet,
    target: &PointSet,
    direction: MappingDirection,
    options: &WeightOptions,
) -> TransferResult<(WeightMatrix, WeightDiagnostics)> {
    if source.len() < 2 {
        return Err(TransferError::InsufficientPoints {
            count: source.len(),
        });
    }
    log::debug!(
        "building {direction:?} weights: {} source points, {} target points",
        source.len(),
        target.len()
    );

    let mut metrics = TransferMetrics::default();
    metrics.begin();

    let pairs = metrics.time(TimingBucket::NearestSearch, || {
        nearest_pairs(source.points(), target.points())
    });

    let (weights, mut diagnostics) = metrics.time(TimingBucket::WeightAssembly, || {
        assemble(source, target, &pairs, direction, options)
    })?;

    diagnostics.timing = metrics.end();
    diagnostics.finish();

    if options.warn_on_extrapolation && diagnostics.extrapolated_count() > 0 {
        log::warn!(
            "{direction:?} weights: {} of {} targets project off their segment ({})",
            diagnostics.extrapolated_count(),
            diagnostics.target_count,
            diagnostics.summary()
        );
    }
    log::debug!("{direction:?} weights built: {}", diagnostics.summary());

    Ok((weights, diagnostics))
}

fn assemble(
    source: &PointSet,
    target: &PointSet,
    pairs: &[Option<(usize, usize)>],
    direction: MappingDirection,
    options: &WeightOptions,
) -> TransferResult<(WeightMatrix, WeightDiagnostics)> {
    let segments = project_targets(source.points(), target.points(), pairs, options.tolerance)?;

    let bounds = source
        .bounds()
        .map(|b| b.expand_by(options.bounds_padding + options.tolerance.eps));

    let mut weights = WeightMatrix::zeros(source.len(), target.len(), direction);
    let mut diagnostics = WeightDiagnostics::new(source.len());

    for (i, (seg, p)) in segments.iter().zip(target.points()).enumerate() {
        match direction {
            MappingDirection::Forward => {
                weights.set(i, seg.a, seg.weight_a);
                weights.set(i, seg.b, seg.weight_b);
            }
            MappingDirection::Reverse => {
                weights.set(seg.a, i, seg.weight_a);
                weights.set(seg.b, i, seg.weight_b);
            }
        }
        let inside = bounds.is_some_and(|b| b.contains_point(*p));
        diagnostics.record(seg.side, seg.offset, seg.weight_a + seg.weight_b, inside);
    }

    Ok((weights, diagnostics))
}

fn project_one(
    source: &[Point3],
    index: usize,
    p: Point3,
    pair: Option<(usize, usize)>,
    tol: Tolerance,
) -> TransferResult<SegmentWeights> {
    let pair = pair.ok_or(TransferError::InsufficientPoints {
        count: source.len(),
    })?;
    segment_weights(source, index, p, pair, tol)
}

#[cfg(feature = "parallel")]
fn nearest_pairs(source: &[Point3], target: &[Point3]) -> Vec<Option<(usize, usize)>> {
    target.par_iter().map(|&p| nearest_two(source, p)).collect()
}

#[cfg(not(feature = "parallel"))]
fn nearest_pairs(source: &[Point3], target: &[Point3]) -> Vec<Option<(usize, usize)>> {
    target.iter().map(|&p| nearest_two(source, p)).collect()
}

// Results are gathered per target before the first error is taken so the
// reported failure is the lowest target index in both builds.
#[cfg(feature = "parallel")]
fn project_targets(
    source: &[Point3],
    target: &[Point3],
    pairs: &[Option<(usize, usize)>],
    tol: Tolerance,
) -> TransferResult<Vec<SegmentWeights>> {
    let results: Vec<TransferResult<SegmentWeights>> = target
        .par_iter()
        .zip(pairs.par_iter())
        .enumerate()
        .map(|(i, (&p, &pair))| project_one(source, i, p, pair, tol))
        .collect();
    results.into_iter().collect()
}

#[cfg(not(feature = "parallel"))]
fn project_targets(
    source: &[Point3],
    target: &[Point3],
    pairs: &[Option<(usize, usize)>],
    tol: Tolerance,
) -> TransferResult<Vec<SegmentWeights>> {
    target
        .iter()
        .zip(pairs)
        .enumerate()
        .map(|(i, (&p, &pair))| project_one(source, i, p, pair, tol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(rows: &[[f64; 3]]) -> Vec<Point3> {
        rows.iter().copied().map(Point3::from_array).collect()
    }

    #[test]
    fn nearest_two_orders_by_distance() {
        let source = points(&[[5.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(nearest_two(&source, Point3::new(0.9, 0.0, 0.0)), Some((2, 1)));
        assert_eq!(nearest_two(&source, Point3::new(4.0, 0.0, 0.0)), Some((0, 2)));
    }

    #[test]
    fn nearest_two_breaks_ties_by_index() {
        let source = points(&[
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
        ]);
        assert_eq!(nearest_two(&source, Point3::ORIGIN), Some((0, 1)));

        let source = points(&[[3.0, 0.0, 0.0], [1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]);
        assert_eq!(nearest_two(&source, Point3::ORIGIN), Some((1, 2)));
    }

    #[test]
    fn nearest_two_needs_two_points() {
        assert_eq!(nearest_two(&points(&[[0.0; 3]]), Point3::ORIGIN), None);
        assert_eq!(nearest_two(&[], Point3::ORIGIN), None);
    }

    #[test]
    fn interior_projection_interpolates_linearly() {
        let source = points(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let p = Point3::new(0.5, 1.0, 0.0);
        let seg = segment_weights(&source, 0, p, (0, 1), Tolerance::EXACT).unwrap();
        assert_eq!(seg.side, ProjectionSide::Interior);
        assert!((seg.weight_a - 0.75).abs() < 1e-12);
        assert!((seg.weight_b - 0.25).abs() < 1e-12);
        assert!((seg.offset - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clamp_is_asymmetric() {
        let source = points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let tol = Tolerance::EXACT;

        // t = 3: ac = 3, bc = 2, l = max(1, 2) = 2.
        let past_b =
            segment_weights(&source, 0, Point3::new(3.0, 0.0, 0.0), (0, 1), tol).unwrap();
        assert_eq!(past_b.side, ProjectionSide::BeyondB);
        assert!((past_b.weight_a + 1.0).abs() < 1e-12);
        assert!(past_b.weight_b.abs() < 1e-12);

        // t = -0.5: ac = 0.5, bc = 1.5, l = 1.5.
        let before_a =
            segment_weights(&source, 0, Point3::new(-0.5, 0.0, 0.0), (0, 1), tol).unwrap();
        assert_eq!(before_a.side, ProjectionSide::BeyondA);
        assert!((before_a.weight_a - 1.0).abs() < 1e-12);
        assert!(before_a.weight_b.abs() < 1e-12);
    }

    #[test]
    fn coincident_pair_is_degenerate() {
        let source = points(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);
        let err =
            segment_weights(&source, 4, Point3::ORIGIN, (0, 1), Tolerance::EXACT).unwrap_err();
        assert_eq!(
            err,
            TransferError::DegenerateSegment {
                target_index: 4,
                source_a: 0,
                source_b: 1,
            }
        );
    }

    #[test]
    fn transpose_flips_direction_and_shape() {
        let source =
            PointSet::from_rows(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]).unwrap();
        let target = PointSet::from_rows(&[[0.25, 0.0, 0.0]]).unwrap();
        let fwd = forward_weights(&source, &target).unwrap();
        let t = fwd.transpose();

        assert_eq!(fwd.shape(), (1, 3));
        assert_eq!(t.shape(), (3, 1));
        assert_eq!(t.direction(), MappingDirection::Reverse);
        assert_eq!(t.get(1, 0), fwd.get(0, 1));
        assert!(t.is_transpose_of(&fwd, Tolerance::DEFAULT));
        assert!(!fwd.is_transpose_of(&fwd, Tolerance::DEFAULT));
        assert_eq!(t.target_weights(0), fwd.target_weights(0));
    }

    #[test]
    fn out_of_range_access_returns_none() {
        let source = PointSet::from_rows(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]).unwrap();
        let target = PointSet::from_rows(&[[0.5, 0.0, 0.0]]).unwrap();
        let w = forward_weights(&source, &target).unwrap();
        assert!(w.get(1, 0).is_none());
        assert!(w.row(1).is_none());
        assert!(w.column(2).is_none());
        assert!(w.target_weights(3).is_empty());
    }
}
