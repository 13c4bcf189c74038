//! Ground-motion-model logic tree.
//!
//! One branchset per branching level, each choosing the model for exactly
//! one tectonic region type. Region types outside the known set are skipped,
//! which lets a regional run ignore parts of a global tree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use logictree_config::{LogicTreeConfig, RealizationMode};
use logictree_core::{
    BranchSet, FilterKind, Filters, GsimHandle, GsimRegistry, LogicTreeError, RawFilters,
    Realization, Result, UncertaintyType, UncertaintyValue,
};

use crate::builder::{build, BuildOptions, LogicTreeKind};
use crate::context::{read_input, ErrorContext};
use crate::document::Element;
use crate::paths::TreePath;
use crate::tree::LogicTree;

/// Region type to model, for one realization.
pub type TrtToGsim = BTreeMap<String, GsimHandle>;

/// A built GMPE logic tree.
#[derive(Debug, Clone)]
pub struct GmpeLogicTree {
    tree: LogicTree,
    tectonic_region_types: BTreeSet<String>,
    ctx: ErrorContext,
}

impl GmpeLogicTree {
    /// Builds a tree covering the `known` region types, resolving model
    /// names through `registry`.
    pub fn new<I, S>(
        known: I,
        registry: &GsimRegistry,
        content: &str,
        basepath: impl Into<PathBuf>,
        filename: impl Into<String>,
        options: BuildOptions,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ctx = ErrorContext::new(basepath, filename);
        let mut kind = GmpeKind {
            known: known.into_iter().map(Into::into).collect(),
            defined: BTreeSet::new(),
            registry,
        };
        let tree = build(&mut kind, content, &ctx, options)?;
        Ok(Self {
            tree,
            tectonic_region_types: kind.known,
            ctx,
        })
    }

    /// Reads the configured GMPE logic tree file.
    ///
    /// When the configuration restricts region types, only those of `known`
    /// that are also listed there are kept.
    pub fn from_config<I, S>(
        config: &LogicTreeConfig,
        known: I,
        registry: &GsimRegistry,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let file = config
            .gsim_logic_tree_file
            .as_deref()
            .ok_or_else(|| LogicTreeError::Parsing {
                basepath: config.base_path.clone(),
                filename: String::new(),
                message: "no gsim logic tree file configured".to_string(),
            })?;
        let ctx = ErrorContext::new(&config.base_path, file.to_string_lossy());
        let content = read_input(&ctx, &config.resolve(file))?;
        let known: Vec<String> = known
            .into_iter()
            .map(Into::into)
            .filter(|trt| {
                config
                    .tectonic_region_types
                    .as_ref()
                    .map_or(true, |subset| subset.contains(trt))
            })
            .collect();
        let options = BuildOptions::new().with_validation(config.validate);
        Self::new(
            known,
            registry,
            &content,
            config.base_path.clone(),
            ctx.filename(),
            options,
        )
    }

    pub fn tree(&self) -> &LogicTree {
        &self.tree
    }

    pub fn filename(&self) -> &str {
        self.ctx.filename()
    }

    /// The known region types this tree was built for.
    pub fn tectonic_region_types(&self) -> &BTreeSet<String> {
        &self.tectonic_region_types
    }

    /// Maps each region type on the path to the model chosen for it.
    pub fn make_trt_to_gsim<S: AsRef<str>>(&self, branch_ids: &[S]) -> Result<TrtToGsim> {
        trt_to_gsim(&self.tree.walk(branch_ids)?)
    }

    /// Realizations whose value is the region type to model mapping.
    pub fn realizations(
        &self,
        mode: RealizationMode,
    ) -> impl Iterator<Item = Result<Realization<TrtToGsim>>> + '_ {
        self.tree.paths(mode).map(|path| {
            let value = trt_to_gsim(&path)?;
            Ok(Realization::new(value, path.weight(), path.branch_ids()))
        })
    }
}

fn trt_to_gsim(path: &TreePath<'_>) -> Result<TrtToGsim> {
    let mut mapping = BTreeMap::new();
    for (branchset, branch) in path.steps() {
        let trt = branchset.filters().tectonic_region_type.as_ref().ok_or_else(|| {
            LogicTreeError::InvalidPath(format!(
                "branchset {:?} has no tectonic region type",
                branchset.branchset_id()
            ))
        })?;
        let gsim = branch.value().as_gsim().ok_or_else(|| {
            LogicTreeError::InvalidPath(format!(
                "branch {:?} does not hold a ground motion model",
                branch.branch_id()
            ))
        })?;
        mapping.insert(trt.clone(), gsim.clone());
    }
    Ok(mapping)
}

struct GmpeKind<'r> {
    known: BTreeSet<String>,
    defined: BTreeSet<String>,
    registry: &'r GsimRegistry,
}

impl GmpeKind<'_> {
    fn unknown_gsim(&self, ctx: &ErrorContext, node: &Element, name: &str) -> LogicTreeError {
        ctx.validation(
            node,
            format!(
                "unknown ground motion model {:?}; available models are: {}",
                name,
                self.registry.names().join(", ")
            ),
        )
    }
}

impl LogicTreeKind for GmpeKind<'_> {
    const KIND: &'static str = "gmpe";

    fn skip_branchset(&self, node: &Element) -> bool {
        node.attr(FilterKind::TectonicRegionType.attribute())
            .is_some_and(|trt| !self.known.contains(trt))
    }

    fn validate_filters(
        &mut self,
        ctx: &ErrorContext,
        node: &Element,
        _uncertainty_type: UncertaintyType,
        filters: &RawFilters,
    ) -> Result<()> {
        let trt = match filters.get(&FilterKind::TectonicRegionType) {
            Some(trt) if filters.len() == 1 => trt,
            _ => {
                return Err(ctx.validation(
                    node,
                    "branch sets in gmpe logic tree must define only \"applyToTectonicRegionType\" filter",
                ))
            }
        };
        if !self.known.contains(trt) {
            return Err(ctx.validation(
                node,
                format!("source models don't define sources of tectonic region type {trt:?}"),
            ));
        }
        if !self.defined.insert(trt.clone()) {
            return Err(ctx.validation(
                node,
                format!("gmpe uncertainty for tectonic region type {trt:?} has already been defined"),
            ));
        }
        Ok(())
    }

    fn parse_filters(
        &self,
        _ctx: &ErrorContext,
        _node: &Element,
        _uncertainty_type: UncertaintyType,
        filters: RawFilters,
    ) -> Result<Filters> {
        let mut parsed = Filters::new();
        if let Some(trt) = filters.get(&FilterKind::TectonicRegionType) {
            parsed = parsed.with_tectonic_region_type(trt.as_str());
        }
        Ok(parsed)
    }

    fn validate_branchset(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        _depth: usize,
        number: usize,
        branchset: &BranchSet,
    ) -> Result<()> {
        if branchset.uncertainty_type() != UncertaintyType::GmpeModel {
            return Err(ctx.validation(
                node,
                "only uncertainties of type \"gmpeModel\" are allowed in gmpe logic tree",
            ));
        }
        if number != 0 {
            return Err(ctx.validation(
                node,
                "only one branchset on each branching level is allowed in gmpe logic tree",
            ));
        }
        Ok(())
    }

    fn validate_uncertainty_value(
        &mut self,
        ctx: &ErrorContext,
        node: &Element,
        _branchset: &BranchSet,
        value: &str,
    ) -> Result<()> {
        match self.registry.get(value) {
            Some(_) => Ok(()),
            None => Err(self.unknown_gsim(ctx, node, value)),
        }
    }

    fn parse_uncertainty_value(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        _branchset: &BranchSet,
        value: &str,
    ) -> Result<UncertaintyValue> {
        self.registry
            .get(value)
            .map(UncertaintyValue::Gsim)
            .ok_or_else(|| self.unknown_gsim(ctx, node, value))
    }

    fn validate_tree(&self, ctx: &ErrorContext, node: &Element, _tree: &LogicTree) -> Result<()> {
        let missing: Vec<&str> = self
            .known
            .difference(&self.defined)
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ctx.validation(
                node,
                format!(
                    "the following tectonic region types are defined in source model logic tree but not in gmpe logic tree: {missing:?}"
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "gmpe_tests.rs"]
mod tests;
