//! Logic Tree Engine
//!
//! This crate builds and evaluates logic trees:
//! - Document reading and schema validation
//! - The generic tree builder and its per-kind hooks
//! - Source model, GMPE and flat GSIM trees
//! - Lazy path enumeration and seeded sampling

pub mod builder;
pub mod context;
pub mod document;
pub mod flat_gsim;
pub mod gmpe;
pub mod paths;
pub mod schema;
pub mod source_model;
pub mod tree;

pub use builder::{attach_to_open_ends, build, BuildOptions, LogicTreeKind};
pub use context::ErrorContext;
pub use document::{parse_document, Element};
pub use flat_gsim::{FlatBranch, FlatRealizations, GsimLogicTree};
pub use gmpe::{GmpeLogicTree, TrtToGsim};
pub use paths::{EnumeratePaths, Paths, SamplePaths, TreePath};
pub use schema::{schema, Schema, SchemaViolation};
pub use source_model::{
    scan_source_model, FileSystemLoader, SourceModelData, SourceModelLoader,
    SourceModelLogicTree,
};
pub use tree::LogicTree;
