//! # Pool Error Types
//!
//! All errors that can occur while allocating from an arena or loading its
//! configuration.
//!
//! Absence is not an error: lookups that find nothing return `Option` or
//! `bool`. Only conditions the caller has to react to surface here.

use thiserror::Error;

/// Errors that can occur in the arena and its containers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// An arena was requested with a region capacity of zero bytes.
    #[error("arena region capacity must be greater than zero")]
    ZeroCapacity,

    /// The system could not supply the bytes for a new region.
    #[error("out of memory: could not reserve a region of {requested} bytes")]
    OutOfMemory {
        /// Size of the region that could not be reserved.
        requested: usize,
    },

    /// The element type cannot be placed in arena blocks.
    ///
    /// Zero-sized types and types aligned above the region alignment are
    /// rejected.
    #[error("unsupported element layout: size {size}, align {align}")]
    UnsupportedLayout {
        /// `size_of` the rejected type.
        size: usize,
        /// `align_of` the rejected type.
        align: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(String),
}

/// Result type for arena operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PoolError::OutOfMemory { requested: 4096 };
        assert_eq!(
            err.to_string(),
            "out of memory: could not reserve a region of 4096 bytes"
        );

        let err = PoolError::UnsupportedLayout { size: 0, align: 1 };
        assert_eq!(err.to_string(), "unsupported element layout: size 0, align 1");
    }
}
