//! Error types for Gatehouse

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatehouseError {
    #[error("bad parameter {field}: {message}")]
    BadParameter { field: String, message: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("{field} mismatch: {message}")]
    Mismatch { field: String, message: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<GatehouseError>,
    },
}

/// Coarse grouping of errors as presented to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something malformed.
    BadInput,
    /// The referenced token, session, CA or key does not exist (or expired).
    NotFound,
    /// The request was well formed but is not allowed.
    NotAuthorized,
    /// Something failed on the server side.
    Internal,
}

impl GatehouseError {
    pub fn bad_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        GatehouseError::BadParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        GatehouseError::Mismatch {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Innermost error, skipping any context wrappers.
    pub fn root(&self) -> &GatehouseError {
        match self {
            GatehouseError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self.root() {
            GatehouseError::BadParameter { .. } | GatehouseError::Validation(_) => {
                ErrorClass::BadInput
            }
            GatehouseError::NotFound(_) => ErrorClass::NotFound,
            GatehouseError::AlreadyExists(_)
            | GatehouseError::Mismatch { .. }
            | GatehouseError::Unauthorized(_)
            | GatehouseError::AccessDenied(_) => ErrorClass::NotAuthorized,
            _ => ErrorClass::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), GatehouseError::NotFound(_))
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self.root(), GatehouseError::AccessDenied(_))
    }
}

/// Attach operation context to an error while keeping its kind intact.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> crate::Result<T>;

    fn with_context<F, S>(self, f: F) -> crate::Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for crate::Result<T> {
    fn context(self, context: impl Into<String>) -> crate::Result<T> {
        self.map_err(|e| GatehouseError::Context {
            context: context.into(),
            source: Box::new(e),
        })
    }

    fn with_context<F, S>(self, f: F) -> crate::Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| GatehouseError::Context {
            context: f().into(),
            source: Box::new(e),
        })
    }
}
