//! Point sets and per-point vector fields.
//!
//! Both types are row-major with the point as the leading dimension, which is
//! the `(count, 3)` layout host frameworks hand over when they reshape their
//! flattened arrays.

use serde::{Deserialize, Serialize};

use super::error::{TransferError, TransferResult};
use super::{BBox, Point3};

/// Ordered, immutable set of mesh nodes.
///
/// Index order matters: weight construction assumes index-adjacent source
/// points are also geometrically adjacent (a polyline or boundary ordering).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    points: Vec<Point3>,
}

impl PointSet {
    /// Build a point set, rejecting non-finite coordinates.
    pub fn new(points: Vec<Point3>) -> TransferResult<Self> {
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(TransferError::NonFinitePoint { index });
        }
        Ok(Self { points })
    }

    pub fn from_rows(rows: &[[f64; 3]]) -> TransferResult<Self> {
        Self::new(rows.iter().copied().map(Point3::from_array).collect())
    }

    /// Build a point set from `[x0, y0, z0, x1, y1, z1, ...]`.
    pub fn from_flat(coords: &[f64]) -> TransferResult<Self> {
        if coords.len() % 3 != 0 {
            return Err(TransferError::FlatLength { len: coords.len() });
        }
        Self::new(
            coords
                .chunks_exact(3)
                .map(|c| Point3::new(c[0], c[1], c[2]))
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        BBox::from_points(&self.points)
    }

    #[must_use]
    pub fn to_flat(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| p.to_array()).collect()
    }
}

impl std::ops::Index<usize> for PointSet {
    type Output = Point3;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

/// One 3-component value per point (displacements, forces).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorField {
    values: Vec<[f64; 3]>,
}

impl VectorField {
    #[must_use]
    pub fn new(values: Vec<[f64; 3]>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn zeros(count: usize) -> Self {
        Self {
            values: vec![[0.0; 3]; count],
        }
    }

    /// Build a field from `[v0x, v0y, v0z, v1x, ...]`.
    pub fn from_flat(values: &[f64]) -> TransferResult<Self> {
        if values.len() % 3 != 0 {
            return Err(TransferError::FlatLength { len: values.len() });
        }
        Ok(Self {
            values: values
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        })
    }

    /// Number of points the field is defined over.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[[f64; 3]] {
        &self.values
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<[f64; 3]> {
        self.values
    }

    #[must_use]
    pub fn to_flat(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// Sum of all vectors; the resultant of a nodal force field.
    #[must_use]
    pub fn resultant(&self) -> [f64; 3] {
        self.values.iter().fold([0.0; 3], |acc, v| {
            [acc[0] + v[0], acc[1] + v[1], acc[2] + v[2]]
        })
    }
}

impl From<Vec<[f64; 3]>> for VectorField {
    fn from(values: Vec<[f64; 3]>) -> Self {
        Self::new(values)
    }
}
