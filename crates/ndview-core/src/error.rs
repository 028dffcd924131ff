/// Everything that can go wrong while selecting, transforming or extracting
/// through a [`crate::View`].
///
/// All failures are synchronous and non-retryable; a rejected operation
/// leaves the view's descriptor state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("Dimension {dim} out of bounds for rank {rank}.")]
    InvalidDimension { dim: usize, rank: usize },
    #[error("Invalid selection on dimension {dim}: {reason}.")]
    InvalidSelection { dim: usize, reason: String },
    #[error("Invalid permutation {order:?}: not a bijection on [0, {rank}).")]
    InvalidPermutation { order: Vec<usize>, rank: usize },
    #[error("Shift amount {amount} outside (-{rank}, {rank}).")]
    InvalidShift { amount: isize, rank: usize },
    #[error("Dimension {dim} is indexed; stride accessors do not apply.")]
    DimensionModeConflict { dim: usize },
    #[error("Length mismatch: expected {expected}, got {actual}.")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Source and destination buffers alias.")]
    Aliasing,
}

impl ViewError {
    pub(crate) fn invalid_selection(dim: usize, reason: impl Into<String>) -> Self {
        ViewError::InvalidSelection {
            dim,
            reason: reason.into(),
        }
    }
}
