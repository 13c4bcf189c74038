//! Shared test fixtures for logictree crates.
//!
//! This crate provides document builders and collaborator stand-ins for
//! testing. It depends only on `logictree-core` so the engine can use it as a
//! dev-dependency.
//!
//! - [`document`] - logic tree document builders
//! - [`source_model`] - source model documents and test sources
//! - [`gsim`] - a populated ground-motion-model registry
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! logictree-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use logictree_test::{BranchSetXml, LogicTreeXml, source_model_xml, TestSource};
//! ```

pub mod document;
pub mod gsim;
pub mod source_model;

// Re-export commonly used fixtures at crate root for convenience
pub use document::{BranchSetXml, LogicTreeXml};
pub use gsim::{registry, GSIM_NAMES};
pub use source_model::{source_model_xml, TestSource};
