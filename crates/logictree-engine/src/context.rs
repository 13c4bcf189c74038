//! File identity attached to every construction error.

use std::path::{Path, PathBuf};

use logictree_core::{LogicTreeError, Result};

use crate::document::Element;

/// Base path and file name of the document being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    basepath: PathBuf,
    filename: String,
}

impl ErrorContext {
    pub fn new(basepath: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            basepath: basepath.into(),
            filename: filename.into(),
        }
    }

    pub fn basepath(&self) -> &Path {
        &self.basepath
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Same base path, different file. Used for referenced source models.
    pub fn for_file(&self, filename: impl Into<String>) -> Self {
        Self::new(self.basepath.clone(), filename)
    }

    pub fn parsing(&self, message: impl Into<String>) -> LogicTreeError {
        LogicTreeError::Parsing {
            basepath: self.basepath.clone(),
            filename: self.filename.clone(),
            message: message.into(),
        }
    }

    /// Validation error located at `node`.
    pub fn validation(&self, node: &Element, message: impl Into<String>) -> LogicTreeError {
        self.validation_at(node.line(), message)
    }

    /// Unsupported tree structure, prefixed with the file name.
    pub fn invalid(&self, message: impl std::fmt::Display) -> LogicTreeError {
        LogicTreeError::InvalidLogicTree(format!("{}: {message}", self.filename))
    }

    pub fn validation_at(&self, line: u64, message: impl Into<String>) -> LogicTreeError {
        LogicTreeError::Validation {
            basepath: self.basepath.clone(),
            filename: self.filename.clone(),
            line,
            message: message.into(),
        }
    }
}

/// Reads the logic tree file at `path`, reporting failures against `ctx`.
pub(crate) fn read_input(ctx: &ErrorContext, path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ctx.parsing(e.to_string()))
}
