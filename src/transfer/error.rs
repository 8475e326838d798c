/// Errors raised while building weight matrices or applying them to fields.
///
/// All variants are precondition violations. None of them is recoverable
/// inside the call that raised it; the caller decides whether to abort the
/// coupled run or fall back to a different mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransferError {
    #[error("source mesh requires at least 2 points, got {count}")]
    InsufficientPoints { count: usize },

    #[error(
        "nearest source points {source_a} and {source_b} coincide for target point {target_index}"
    )]
    DegenerateSegment {
        target_index: usize,
        source_a: usize,
        source_b: usize,
    },

    #[error("weight matrix expects a field with {expected} points, got {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("field {batch_index} in batch has {found} points, weight matrix expects {expected}")]
    BatchShapeMismatch {
        batch_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("point {index} has non-finite coordinates")]
    NonFinitePoint { index: usize },

    #[error("flat coordinate array length {len} is not a multiple of 3")]
    FlatLength { len: usize },

    #[error("surface `{name}` is not registered")]
    UnknownSurface { name: String },

    #[error("surface `{name}` is already registered")]
    DuplicateSurface { name: String },

    #[error("surface `{name}` grid {nx}x{ny} does not fit a mesh of {point_count} points")]
    SurfaceShape {
        name: String,
        nx: usize,
        ny: usize,
        point_count: usize,
    },

    #[error("surface `{name}` expects fields for {expected} evaluation nodes, got {found}")]
    EvaluationNodeCount {
        name: String,
        expected: usize,
        found: usize,
    },
}

pub type TransferResult<T> = Result<T, TransferError>;
