//! Diagnostics for weight matrix construction.
//!
//! Diagnostics are collected while the weights are built and returned next to
//! the matrix by [`build_weights_with_options`](super::build_weights_with_options).
//! They describe where each target point landed relative to its segment:
//!
//! - **interior**: the projection falls between the two nearest source points,
//!   the two weights are plain linear interpolation and sum to one.
//! - **beyond a**: the projection falls before the nearest point, typically a
//!   target past the end of the source polyline. The `max(length, bc)` clamp
//!   is active and the weights collapse onto the nearest point.
//! - **beyond b**: the projection overshoots the second-nearest point. With a
//!   strict nearest pair this cannot happen geometrically; it is counted so
//!   rounding artefacts on near-ties stay visible. No clamp covers this side.
//!
//! # Example
//!
//! ```ignore
//! use mesh_transfer::transfer::{build_weights_with_options, MappingDirection, WeightOptions};
//!
//! let (weights, diagnostics) = build_weights_with_options(
//!     &source, &target, MappingDirection::Forward, &WeightOptions::default())?;
//! if !diagnostics.is_clean() {
//!     log::warn!("{}", diagnostics.summary());
//! }
//! ```

use std::fmt;

use super::core::Tolerance;

/// Where a target point projects relative to its two nearest source points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionSide {
    /// Between `a` and `b` (inclusive).
    Interior,
    /// Past `b`; weights no longer sum to one.
    BeyondB,
    /// Before `a`; the clamp pins the weights to `(1, 0)`.
    BeyondA,
}

/// Summary of a weight matrix build.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WeightDiagnostics {
    /// Number of target points (weighted rows or columns).
    pub target_count: usize,

    /// Number of source points.
    pub source_count: usize,

    /// Targets whose projection lies on their segment.
    pub interior_count: usize,

    /// Targets projecting past the second-nearest point.
    ///
    /// The clamp does not cover this side; a non-zero count means some
    /// weight pairs do not sum to one.
    pub beyond_b_count: usize,

    /// Targets projecting before the nearest point (weights pinned to it).
    pub beyond_a_count: usize,

    /// Targets lying outside the source bounding box (padded by tolerance).
    pub outside_bounds_count: usize,

    /// Largest perpendicular distance from a target to its segment line.
    pub max_offset: f64,

    /// Smallest and largest per-target weight sum, `None` for an empty target set.
    pub weight_sum_range: Option<(f64, f64)>,

    /// Optional timing breakdown, populated with the `transfer_metrics` feature.
    pub timing: Option<super::metrics::TransferTimingReport>,

    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl WeightDiagnostics {
    #[must_use]
    pub fn new(source_count: usize) -> Self {
        Self {
            source_count,
            ..Self::default()
        }
    }

    /// Record one target point.
    pub fn record(
        &mut self,
        side: ProjectionSide,
        offset: f64,
        weight_sum: f64,
        inside_bounds: bool,
    ) {
        self.target_count += 1;
        match side {
            ProjectionSide::Interior => self.interior_count += 1,
            ProjectionSide::BeyondB => self.beyond_b_count += 1,
            ProjectionSide::BeyondA => self.beyond_a_count += 1,
        }
        if !inside_bounds {
            self.outside_bounds_count += 1;
        }
        self.max_offset = self.max_offset.max(offset);
        self.weight_sum_range = Some(match self.weight_sum_range {
            Some((lo, hi)) => (lo.min(weight_sum), hi.max(weight_sum)),
            None => (weight_sum, weight_sum),
        });
    }

    /// Number of targets whose projection left their segment.
    #[must_use]
    pub fn extrapolated_count(&self) -> usize {
        self.beyond_a_count + self.beyond_b_count
    }

    /// Returns `true` when every target's weights sum to one within `tol`.
    #[must_use]
    pub fn is_partition_of_unity(&self, tol: Tolerance) -> bool {
        match self.weight_sum_range {
            Some((lo, hi)) => tol.approx_eq_f64(lo, 1.0) && tol.approx_eq_f64(hi, 1.0),
            None => true,
        }
    }

    /// Returns `true` if every target projected inside its segment and no warnings were raised.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.extrapolated_count() == 0 && self.outside_bounds_count == 0 && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Fill warnings from the collected counts.
    pub(crate) fn finish(&mut self) {
        if self.beyond_b_count > 0 {
            self.add_warning(format!(
                "{} target points project past the far end of their segment (unclamped side)",
                self.beyond_b_count
            ));
        }
        if self.beyond_a_count > 0 {
            self.add_warning(format!(
                "{} target points project before the near end of their segment and were pinned to it",
                self.beyond_a_count
            ));
        }
        if self.outside_bounds_count > 0 {
            self.add_warning(format!(
                "{} target points lie outside the source mesh bounds",
                self.outside_bounds_count
            ));
        }
    }

    /// Merges another diagnostics struct into this one.
    ///
    /// Counts are summed, ranges widened and warnings appended. `timing` from
    /// `other` is ignored.
    pub fn merge(&mut self, other: &WeightDiagnostics) {
        self.target_count += other.target_count;
        self.source_count += other.source_count;
        self.interior_count += other.interior_count;
        self.beyond_b_count += other.beyond_b_count;
        self.beyond_a_count += other.beyond_a_count;
        self.outside_bounds_count += other.outside_bounds_count;
        self.max_offset = self.max_offset.max(other.max_offset);
        self.weight_sum_range = match (self.weight_sum_range, other.weight_sum_range) {
            (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => Some((a_lo.min(b_lo), a_hi.max(b_hi))),
            (range, None) | (None, range) => range,
        };
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"S:{sources} T:{targets} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("S:{} T:{}", self.source_count, self.target_count)];

        if self.beyond_b_count > 0 {
            parts.push(format!("beyond-b:{}", self.beyond_b_count));
        }
        if self.beyond_a_count > 0 {
            parts.push(format!("beyond-a:{}", self.beyond_a_count));
        }
        if self.outside_bounds_count > 0 {
            parts.push(format!("outside:{}", self.outside_bounds_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for WeightDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Weight Diagnostics:")?;
        writeln!(f, "  Sources: {}", self.source_count)?;
        writeln!(f, "  Targets: {}", self.target_count)?;
        writeln!(
            f,
            "  Projections: {} interior, {} beyond b, {} beyond a",
            self.interior_count, self.beyond_b_count, self.beyond_a_count
        )?;
        writeln!(f, "  Max offset: {:.6e}", self.max_offset)?;
        if let Some((lo, hi)) = self.weight_sum_range {
            writeln!(f, "  Weight sums: [{lo:.6}, {hi:.6}]")?;
        }
        if let Some(timing) = &self.timing {
            writeln!(f, "  Time: {:.3} ms", timing.total_ms())?;
        }
        for warning in &self.warnings {
            writeln!(f, "  Warning: {warning}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tracks_sides_and_sums() {
        let mut diag = WeightDiagnostics::new(4);
        diag.record(ProjectionSide::Interior, 0.0, 1.0, true);
        diag.record(ProjectionSide::BeyondB, 0.25, 0.5, false);
        diag.record(ProjectionSide::BeyondA, 0.1, 1.0, true);
        diag.finish();

        assert_eq!(diag.target_count, 3);
        assert_eq!(diag.extrapolated_count(), 2);
        assert_eq!(diag.outside_bounds_count, 1);
        assert_eq!(diag.max_offset, 0.25);
        assert_eq!(diag.weight_sum_range, Some((0.5, 1.0)));
        assert!(!diag.is_partition_of_unity(Tolerance::DEFAULT));
        assert!(!diag.is_clean());
        assert_eq!(diag.warnings.len(), 3);
        assert_eq!(diag.summary(), "S:4 T:3 beyond-b:1 beyond-a:1 outside:1");
    }

    #[test]
    fn empty_diagnostics_are_clean() {
        let mut diag = WeightDiagnostics::new(2);
        diag.finish();
        assert!(diag.is_clean());
        assert!(diag.is_partition_of_unity(Tolerance::DEFAULT));
        assert_eq!(diag.summary(), "S:2 T:0");
    }

    #[test]
    fn merge_widens_ranges() {
        let mut a = WeightDiagnostics::new(2);
        a.record(ProjectionSide::Interior, 0.0, 1.0, true);
        let mut b = WeightDiagnostics::new(3);
        b.record(ProjectionSide::BeyondB, 0.5, 1.5, true);
        b.add_warning("b");

        a.merge(&b);
        assert_eq!(a.source_count, 5);
        assert_eq!(a.target_count, 2);
        assert_eq!(a.weight_sum_range, Some((1.0, 1.5)));
        assert_eq!(a.max_offset, 0.5);
        assert_eq!(a.warnings, vec!["b".to_string()]);
    }
}
