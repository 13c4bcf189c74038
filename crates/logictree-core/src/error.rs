//! Error types for logic tree operations

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for logic tree construction and evaluation.
///
/// Every variant renders as a single diagnostic line naming the file the
/// problem was found in.
#[derive(Debug, Error)]
pub enum LogicTreeError {
    /// Input is unreadable, is not well-formed XML, or violates the schema.
    #[error("basepath {basepath:?}, filename {filename:?}: {message}")]
    Parsing {
        basepath: PathBuf,
        filename: String,
        message: String,
    },

    /// Input parses but is semantically invalid.
    #[error("basepath {basepath:?}, filename {filename:?}, line {line}: {message}")]
    Validation {
        basepath: PathBuf,
        filename: String,
        line: u64,
        message: String,
    },

    /// Flat GSIM tree structure not supported by the cartesian product model.
    #[error("Invalid logic tree: {0}")]
    InvalidLogicTree(String),

    /// A branch-id path that is not a root-to-leaf walk of the tree.
    #[error("Invalid logic tree path: {0}")]
    InvalidPath(String),
}

impl LogicTreeError {
    /// Returns the human-readable cause without the file prefix.
    pub fn message(&self) -> &str {
        match self {
            LogicTreeError::Parsing { message, .. } => message,
            LogicTreeError::Validation { message, .. } => message,
            LogicTreeError::InvalidLogicTree(message) => message,
            LogicTreeError::InvalidPath(message) => message,
        }
    }

    /// Returns true for schema or syntax problems.
    pub fn is_parsing(&self) -> bool {
        matches!(self, LogicTreeError::Parsing { .. })
    }

    /// Returns true for semantic validation problems.
    pub fn is_validation(&self) -> bool {
        matches!(self, LogicTreeError::Validation { .. })
    }
}

/// Result type alias for logic tree operations
pub type Result<T> = std::result::Result<T, LogicTreeError>;
