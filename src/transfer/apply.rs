//! Applying weight matrices to vector fields.

use super::error::{TransferError, TransferResult};
use super::metrics::{TimingBucket, TransferMetrics};
use super::point_set::VectorField;
use super::weights::WeightMatrix;

/// `weights * field`, treating the field as a `(count, 3)` matrix.
///
/// The field must be defined over as many points as the matrix has columns.
pub fn apply_transfer(weights: &WeightMatrix, field: &VectorField) -> TransferResult<VectorField> {
    if weights.columns() != field.len() {
        return Err(TransferError::ShapeMismatch {
            expected: weights.columns(),
            found: field.len(),
        });
    }
    log::debug!(
        "applying {:?} weights {}x{} to field of {} points",
        weights.direction(),
        weights.rows(),
        weights.columns(),
        field.len()
    );

    let mut metrics = TransferMetrics::default();
    metrics.begin();
    let rows = metrics.time(TimingBucket::Apply, || multiply(weights, field.rows()));
    if let Some(report) = metrics.end() {
        log::debug!("transfer product took {} ns", report.apply_ns);
    }

    Ok(VectorField::new(rows))
}

/// Apply one weight matrix to a batch of fields, e.g. one per evaluation node.
///
/// Every field is checked before any product is formed.
pub fn apply_transfer_batched(
    weights: &WeightMatrix,
    fields: &[VectorField],
) -> TransferResult<Vec<VectorField>> {
    if let Some((batch_index, field)) = fields
        .iter()
        .enumerate()
        .find(|(_, f)| f.len() != weights.columns())
    {
        return Err(TransferError::BatchShapeMismatch {
            batch_index,
            expected: weights.columns(),
            found: field.len(),
        });
    }
    fields.iter().map(|f| apply_transfer(weights, f)).collect()
}

// Every entry contributes, zero weights included, so NaN or infinite field
// values reach the output.
fn product_row(weights: &[f64], field: &[[f64; 3]]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (&w, v) in weights.iter().zip(field) {
        out[0] += w * v[0];
        out[1] += w * v[1];
        out[2] += w * v[2];
    }
    out
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        fn multiply(weights: &WeightMatrix, field: &[[f64; 3]]) -> Vec<[f64; 3]> {
            use rayon::prelude::*;

            let columns = weights.columns();
            if columns == 0 {
                return vec![[0.0; 3]; weights.rows()];
            }
            weights
                .as_slice()
                .par_chunks_exact(columns)
                .map(|row| product_row(row, field))
                .collect()
        }
    } else {
        fn multiply(weights: &WeightMatrix, field: &[[f64; 3]]) -> Vec<[f64; 3]> {
            let columns = weights.columns();
            if columns == 0 {
                return vec![[0.0; 3]; weights.rows()];
            }
            weights
                .as_slice()
                .chunks_exact(columns)
                .map(|row| product_row(row, field))
                .collect()
        }
    }
}
