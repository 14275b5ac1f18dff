//! # Errors
//!
//! Configuration mistakes and drawing-surface failures. Degenerate geometry is
//! not an error anywhere in this crate; it is reported as `None`.

use thiserror::Error;

/// A drawing surface refused an operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("surface rejected `{op}`: {reason}")]
pub struct SurfaceError {
    /// Name of the rejected operation (e.g. `fill_shape`).
    pub op: &'static str,
    pub reason: String,
}

impl SurfaceError {
    pub fn new(op: &'static str, reason: impl Into<String>) -> Self {
        Self {
            op,
            reason: reason.into(),
        }
    }
}

/// Result of a single drawing-surface call.
pub type SurfaceResult = Result<(), SurfaceError>;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("renderer already open, cannot open twice")]
    AlreadyOpen,
    #[error("renderer is not open")]
    NotOpen,
    #[error("element id cannot be empty")]
    EmptyElementId,
    #[error("unknown element `{0}`")]
    UnknownElement(String),
    #[error("element id `{0}` is already in use")]
    DuplicateElement(String),
    #[error("unknown style group")]
    UnknownStyleGroup,
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
