//! Error types for configuration loading and resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the configuration pipeline.
///
/// Import resolution failures are recoverable at the resolution sites (the
/// directive resolver and the object materializer log them and degrade);
/// `UnresolvedImport` only surfaces as an `Err` from a resolver itself.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The resolved configuration file path does not exist.
    #[error("configuration file {0} does not exist")]
    FileNotFound(PathBuf),

    /// The file extension has no registered parser/writer.
    #[error("unknown configuration file type {0:?}")]
    UnknownFormat(String),

    /// Underlying I/O failure while reading or writing a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file content could not be parsed by its format backend.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The top level of a configuration file is not a mapping.
    #[error("top level of {0} is not a mapping")]
    InvalidRoot(PathBuf),

    /// A qualified name is not known to the import capability.
    #[error("unable to resolve import {0:?}")]
    UnresolvedImport(String),

    /// An object specification's params is neither a mapping nor a sequence.
    #[error("params for class {class:?} must be a mapping or a sequence")]
    MalformedParams { class: String },

    /// A dotted override path cannot be applied to the current tree.
    #[error("cannot apply override {path:?}: {reason}")]
    OverridePath { path: String, reason: String },

    /// Indexer-style lookup found no attribute with the requested name.
    #[error("no attribute named {0:?}")]
    KeyNotFound(String),

    /// A raw attribute did not deserialize into the requested type.
    #[error("attribute {name:?} does not deserialize: {message}")]
    Deserialize { name: String, message: String },
}
