mod apply;
mod core;
mod coupling;
mod diagnostics;
mod error;
mod metrics;
mod point_set;
mod weights;

pub use apply::{apply_transfer, apply_transfer_batched};
pub use self::core::{BBox, Point3, Tolerance, Vec3, project_onto_line};
pub use coupling::{CoupledSurface, SurfaceCoupling, SurfaceShape};
pub use diagnostics::{ProjectionSide, WeightDiagnostics};
pub use error::{TransferError, TransferResult};
pub use metrics::{TimingBucket, TransferMetrics, TransferTimingReport};
pub use point_set::{PointSet, VectorField};
pub use weights::{
    MappingDirection, WeightMatrix, WeightOptions, build_weights, build_weights_with_options,
    forward_weights, nearest_two, reverse_weights,
};

#[cfg(test)]
mod tests;
