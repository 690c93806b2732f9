/// Errors raised when constructing core types from raw buffers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid image buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid tensor shape {got:?} (expected (3, rows, cols) with rows, cols > 0)")]
    InvalidTensorShape { got: Vec<usize> },
}
