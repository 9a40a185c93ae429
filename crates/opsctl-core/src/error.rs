//! Unified error handling for the invocation engine.
//!
//! Local problems (bad parameters, bad selectors, bad catalogs) are
//! reported before any network traffic. Remote problems come back from the
//! invoker as an [`InvokeFault`] and are wrapped with operation context so
//! callers never see a raw transport error.

use thiserror::Error;

/// Engine error type.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Parameter set does not satisfy the operation descriptor.
    #[error("validation error: {0}")]
    Validation(String),

    /// The selector expression could not be parsed or resolved.
    #[error("invalid selector '{expression}': {message}")]
    Selector { expression: String, message: String },

    /// A catalog file is malformed or internally inconsistent.
    #[error("catalog error in {origin}: {message}")]
    Catalog { origin: String, message: String },

    /// The remote service rejected or failed the call.
    #[error("{operation} failed: {message}")]
    Service {
        operation: String,
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// The call never reached the service.
    #[error("connection error calling {operation}: {message}")]
    Connection { operation: String, message: String },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// True for errors raised before any network call was attempted.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::Selector { .. } | CoreError::Catalog { .. }
        )
    }

    /// True if the remote service answered with a failure.
    #[must_use]
    pub fn is_service(&self) -> bool {
        matches!(self, CoreError::Service { .. })
    }

    /// True if the call failed at the transport layer.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, CoreError::Connection { .. })
    }

    /// HTTP status of a service failure, if the service reported one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Service { status, .. } => *status,
            _ => None,
        }
    }
}

/// Failure reported by a [`crate::ServiceInvoker`], before the adapter
/// attaches operation context.
#[derive(Error, Debug)]
pub enum InvokeFault {
    /// The service answered and the answer was a failure.
    #[error("service error: {message}")]
    Service {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a service answer.
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        /// Set when the failure looks like a DNS / name-resolution problem,
        /// which gets a clearer diagnostic than a generic connect error.
        name_resolution: bool,
    },
}
