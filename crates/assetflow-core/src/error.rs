//! Error handling for assetflow
//!
//! Provides error types for all layers of the pipeline:
//! - Load errors (per-resource failures inside the loader)
//! - Manifest errors (invalid group/resource declarations)
//! - Pipeline errors (sequencer lifecycle misuse)
//!
//! Event bus errors live next to the bus in [`crate::event_bus`] and are
//! folded into the unified [`Error`] here.

use thiserror::Error;

use crate::event_bus::EventBusError;

/// Load error type
///
/// Represents the failure of a single resource. The loader recovers from
/// every variant by reporting a counted completion, so these never abort a
/// group.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Source has no trailing `.<extension>`
    #[error("Cannot resolve extension of '{source_path}' for resource '{name}'")]
    UnresolvedExtension {
        /// The resource name.
        name: String,
        /// The source that was inspected.
        source_path: String,
    },

    /// No registered handler accepts the extension
    #[error("No handler registered for extension '{extension}' (resource '{name}')")]
    NoHandler {
        /// The resource name.
        name: String,
        /// The extracted extension.
        extension: String,
    },

    /// Image bytes could not be decoded
    #[error("Failed to decode '{name}': {reason}")]
    Decode {
        /// The resource name.
        name: String,
        /// The decoder message.
        reason: String,
    },

    /// Model could not be parsed
    #[error("Failed to load model '{name}': {reason}")]
    ModelLoad {
        /// The resource name.
        name: String,
        /// The decoder message.
        reason: String,
    },

    /// File could not be read
    #[error("I/O error reading {path}: {reason}")]
    Io {
        /// The resolved path.
        path: String,
        /// The reason the read failed.
        reason: String,
    },
}

impl LoadError {
    /// Name of the resource the error belongs to, if it carries one.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            LoadError::UnresolvedExtension { name, .. }
            | LoadError::NoHandler { name, .. }
            | LoadError::Decode { name, .. }
            | LoadError::ModelLoad { name, .. } => Some(name),
            LoadError::Io { .. } => None,
        }
    }

    /// Whether the resource never reached a handler.
    pub fn is_dispatch_failure(&self) -> bool {
        matches!(
            self,
            LoadError::UnresolvedExtension { .. } | LoadError::NoHandler { .. }
        )
    }
}

/// Manifest error type
///
/// Represents problems with a group/resource manifest detected before any
/// loading starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// Two resources share a name
    #[error("Duplicate resource name '{name}' (groups '{first_group}' and '{second_group}')")]
    DuplicateResource {
        /// The repeated name.
        name: String,
        /// Group holding the first occurrence.
        first_group: String,
        /// Group holding the repeat.
        second_group: String,
    },

    /// A resource has an empty name
    #[error("Resource with empty name in group '{group}'")]
    EmptyResourceName {
        /// The group holding the resource.
        group: String,
    },

    /// A group has an empty name
    #[error("Group {index} has an empty name")]
    EmptyGroupName {
        /// Zero-based group position.
        index: usize,
    },

    /// Manifest content could not be parsed
    #[error("Invalid manifest format: {reason}")]
    InvalidFormat {
        /// The parser message.
        reason: String,
    },

    /// Manifest file extension is not supported
    #[error("Unsupported manifest format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

/// Pipeline error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Every group was already loaded
    #[error("Pipeline {id} already completed")]
    AlreadyComplete {
        /// The pipeline id.
        id: String,
    },
}

/// Main error type for assetflow
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Load error
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Pipeline error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Event bus error
    #[error(transparent)]
    EventBus(#[from] EventBusError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a load error
    pub fn is_load_error(&self) -> bool {
        matches!(self, Error::Load(_))
    }

    /// Check if this is a manifest error
    pub fn is_manifest_error(&self) -> bool {
        matches!(self, Error::Manifest(_))
    }

    /// Check if the pipeline was already complete
    pub fn is_already_complete(&self) -> bool {
        matches!(self, Error::Pipeline(PipelineError::AlreadyComplete { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
