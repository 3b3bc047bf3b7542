//! # vgkit Common
//!
//! Common utilities, error types, and logging configuration for the vgkit
//! SVG engine.
//!
//! ## Features
//!
//! - Unified error type with backtrace support
//! - Logging configuration and setup
//! - Result extension traits

use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for vgkit.
#[derive(Error, Debug)]
pub enum VgKitError {
    /// Geometry errors (path data, transforms, numeric machinery).
    #[error("Geometry error: {message}")]
    Geometry {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// DOM errors (node tree, attribute resolution).
    #[error("DOM error: {message}")]
    Dom {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Paint errors (fill/stroke value resolution).
    #[error("Paint error: {message}")]
    Paint {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rendering errors.
    #[error("Render error: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        backtrace: Option<backtrace::Backtrace>,
    },
}

impl VgKitError {
    /// Create a geometry error.
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
            source: None,
        }
    }

    /// Create a geometry error with source.
    pub fn geometry_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Geometry {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a DOM error.
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
            source: None,
        }
    }

    /// Create a DOM error with source.
    pub fn dom_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Dom {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a paint error.
    pub fn paint(message: impl Into<String>) -> Self {
        Self::Paint {
            message: message.into(),
            source: None,
        }
    }

    /// Create a render error.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error with backtrace.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: Some(backtrace::Backtrace::new()),
        }
    }

    /// Get the error category for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            VgKitError::Geometry { .. } => "geometry",
            VgKitError::Dom { .. } => "dom",
            VgKitError::Paint { .. } => "paint",
            VgKitError::Render { .. } => "render",
            VgKitError::NotFound(_) => "not_found",
            VgKitError::InvalidArgument(_) => "invalid_argument",
            VgKitError::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for vgkit operations.
pub type Result<T> = std::result::Result<T, VgKitError>;

/// Extension trait for Result.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| VgKitError::Internal {
            message: format!("{}: {}", message.into(), e),
            backtrace: Some(backtrace::Backtrace::new()),
        })
    }
}

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to a NotFound error.
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| VgKitError::NotFound(resource.into()))
    }
}
