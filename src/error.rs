//! Error types produced by this crate.
//!
//! Errors raised by tracked operations are never wrapped: `wait` hands them
//! back as they came. The only error this crate creates itself is
//! [`HandlerError`], describing a registered error handler that failed.

use thiserror::Error;

/// A registered error handler did not complete normally.
///
/// Dispatch never raises this; it is reported through
/// [`DispatchOutcome::Failed`](crate::dispatch::DispatchOutcome::Failed) and logged.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler for {kind} failed: {source}")]
    Failed {
        /// Type name of the dispatched error.
        kind: &'static str,
        /// What the handler returned.
        #[source]
        source: anyhow::Error,
    },

    /// The handler panicked.
    #[error("handler for {kind} panicked: {message}")]
    Panicked {
        /// Type name of the dispatched error.
        kind: &'static str,
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl HandlerError {
    /// Type name of the error whose handler failed.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::Failed { kind, .. } | HandlerError::Panicked { kind, .. } => *kind,
        }
    }

    /// Short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }
}
