//! Error types for primr

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using primr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in primr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Buffer too small for the requested element count
    #[error("Buffer '{buffer}' holds {got} elements, operation needs {needed}")]
    BufferTooSmall {
        /// The buffer name
        buffer: &'static str,
        /// Elements needed by the operation
        needed: usize,
        /// Elements the buffer can hold
        got: usize,
    },

    /// Element count exceeds what an operation supports
    #[error("Input length {len} exceeds the maximum of {max} for operation '{op}'")]
    InputTooLarge {
        /// The rejected length
        len: usize,
        /// Maximum supported length
        max: usize,
        /// The operation name
        op: &'static str,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<crate::device::WgpuError> for Error {
    fn from(e: crate::device::WgpuError) -> Self {
        Error::Backend(e.to_string())
    }
}
