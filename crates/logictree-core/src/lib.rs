//! Logic Tree Core - Core types and traits for logic trees
//!
//! This crate provides the fundamental abstractions shared by every tree kind:
//! - Branch and branchset nodes with exact decimal weights
//! - Uncertainty types and branchset filters
//! - Collaborator traits for seismic sources and their magnitude-frequency
//!   distributions
//! - The ground-motion-model registry
//! - The realization record produced by enumeration and sampling

pub mod branch;
pub mod error;
pub mod gsim;
pub mod realization;
pub mod source;
pub mod uncertainty;
pub mod weight;

#[cfg(test)]
mod tests;

pub use branch::{Branch, BranchRef, BranchSet, BranchSetId};
pub use error::{LogicTreeError, Result};
pub use gsim::{GroundMotionModel, GsimHandle, GsimRegistry, NamedGsim};
pub use realization::Realization;
pub use source::{
    GutenbergRichterMfd, MfdModification, SeismicSource, SourceType, TruncatedGrMfd,
};
pub use uncertainty::{FilterKind, Filters, RawFilters, UncertaintyType, UncertaintyValue};
pub use weight::Weight;
