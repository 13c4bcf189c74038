//! Logic trees for seismic hazard: build, validate, enumerate and sample.
//!
//! # Example
//!
//! ```rust
//! use logictree::prelude::*;
//!
//! let registry = GsimRegistry::from_names(["BooreAtkinson2008", "ChiouYoungs2008"]);
//! let xml = r#"<nrml xmlns="http://openquake.org/xmlns/nrml/0.4">
//!   <logicTree logicTreeID="lt1">
//!     <logicTreeBranchingLevel branchingLevelID="bl1">
//!       <logicTreeBranchSet branchSetID="bs1" uncertaintyType="gmpeModel"
//!                           applyToTectonicRegionType="Active Shallow Crust">
//!         <logicTreeBranch branchID="b1">
//!           <uncertaintyModel>BooreAtkinson2008</uncertaintyModel>
//!           <uncertaintyWeight>0.7</uncertaintyWeight>
//!         </logicTreeBranch>
//!         <logicTreeBranch branchID="b2">
//!           <uncertaintyModel>ChiouYoungs2008</uncertaintyModel>
//!           <uncertaintyWeight>0.3</uncertaintyWeight>
//!         </logicTreeBranch>
//!       </logicTreeBranchSet>
//!     </logicTreeBranchingLevel>
//!   </logicTree>
//! </nrml>"#;
//!
//! let lt = GmpeLogicTree::new(
//!     ["Active Shallow Crust"],
//!     &registry,
//!     xml,
//!     ".",
//!     "gmpe_logic_tree.xml",
//!     BuildOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(lt.tree().num_paths(), 2);
//!
//! let realizations: Vec<_> = lt
//!     .realizations(RealizationMode::Enumerate)
//!     .collect::<Result<_>>()
//!     .unwrap();
//! assert_eq!(realizations[1].lt_path, vec!["b2"]);
//! ```

// Core types
pub use logictree_core::{
    weight, Branch, BranchRef, BranchSet, BranchSetId, FilterKind, Filters, GroundMotionModel,
    GsimHandle, GsimRegistry, GutenbergRichterMfd, LogicTreeError, MfdModification, NamedGsim,
    RawFilters, Realization, Result, SeismicSource, SourceType, TruncatedGrMfd, UncertaintyType,
    UncertaintyValue, Weight,
};

// Configuration
pub use logictree_config::{ConfigError, LogicTreeConfig, RealizationMode};

// Trees and their evaluation
pub use logictree_engine::{
    EnumeratePaths, FileSystemLoader, FlatBranch, FlatRealizations, GmpeLogicTree,
    GsimLogicTree, LogicTree, Paths, SamplePaths, SourceModelData, SourceModelLoader,
    SourceModelLogicTree, TreePath, TrtToGsim,
};

// Building blocks for custom tree kinds
pub use logictree_engine::{
    attach_to_open_ends, build, builder, BuildOptions, Element, ErrorContext, LogicTreeKind,
};

#[cfg(feature = "console")]
pub use logictree_console as console;

pub mod prelude {
    pub use super::{
        BuildOptions, GmpeLogicTree, GsimLogicTree, GsimRegistry, LogicTreeConfig,
        LogicTreeError, RealizationMode, Result, SeismicSource, SourceModelLogicTree,
        SourceType, Weight,
    };
}
