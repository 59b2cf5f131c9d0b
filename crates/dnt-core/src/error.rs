//! Unified error types for the DNT ecosystem
//!
//! This module provides a common error type [`DntError`] that can represent
//! errors from any part of the system. Domain-specific error types can be
//! converted to `DntError` for uniform error handling at API boundaries.
//!
//! # Example
//!
//! ```ignore
//! use dnt_core::{DntError, DntResult};
//!
//! fn translate(path: &str) -> DntResult<()> {
//!     let store = read_model(path)?;
//!     run_repairs(&store)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all DNT operations.
///
/// This enum provides a common error representation for the DNT ecosystem,
/// allowing errors from I/O, parsing, topology, and validation to be handled
/// uniformly.
#[derive(Error, Debug)]
pub enum DntError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Named entity lookup failure
    #[error("Not found: {0}")]
    NotFound(String),

    /// Two entities declared the same name
    #[error("Duplicate name: {0}")]
    Duplicate(String),

    /// Network structure errors
    #[error("Network error: {0}")]
    Network(String),

    /// The store mutated since the network was built
    #[error("Stale graph: store epoch {store_epoch} is ahead of build epoch {build_epoch}")]
    StaleGraph { build_epoch: u64, store_epoch: u64 },

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using DntError.
pub type DntResult<T> = Result<T, DntError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for DntError {
    fn from(err: anyhow::Error) -> Self {
        DntError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for DntError {
    fn from(s: String) -> Self {
        DntError::Other(s)
    }
}

impl From<&str> for DntError {
    fn from(s: &str) -> Self {
        DntError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DntError::NotFound("node_650".into());
        assert!(err.to_string().contains("Not found"));
        assert!(err.to_string().contains("node_650"));
    }

    #[test]
    fn test_stale_graph_display() {
        let err = DntError::StaleGraph {
            build_epoch: 3,
            store_epoch: 5,
        };
        let text = err.to_string();
        assert!(text.contains("epoch 5"));
        assert!(text.contains("epoch 3"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let dnt_err: DntError = io_err.into();
        assert!(matches!(dnt_err, DntError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> DntResult<()> {
            Err(DntError::Validation("bad phase token".into()))
        }

        fn outer() -> DntResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
