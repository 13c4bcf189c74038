//! Source model logic tree.
//!
//! The first branching level chooses a source model file; later levels
//! perturb Gutenberg-Richter parameters of the sources in it. While the tree
//! is validated, every referenced source model is scanned so that branchset
//! filters can be checked against sources that actually exist.

mod scan;


pub use scan::{scan_source_model, FileSystemLoader, SourceModelData, SourceModelLoader};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use logictree_config::{LogicTreeConfig, RealizationMode};
use logictree_core::{
    BranchRef, BranchSet, BranchSetId, FilterKind, Filters, LogicTreeError, RawFilters,
    Realization, Result, SeismicSource, SourceType, UncertaintyType, UncertaintyValue,
};

use crate::builder::{attach_to_open_ends, build, BuildOptions, LogicTreeKind};
use crate::context::{read_input, ErrorContext};
use crate::document::Element;
use crate::tree::LogicTree;

/// A built source model logic tree with the data scanned from its source
/// models.
#[derive(Debug, Clone)]
pub struct SourceModelLogicTree {
    tree: LogicTree,
    data: SourceModelData,
    ctx: ErrorContext,
}

impl SourceModelLogicTree {
    /// Builds a tree whose source models are files under `basepath`.
    pub fn new(
        content: &str,
        basepath: impl Into<PathBuf>,
        filename: impl Into<String>,
        options: BuildOptions,
    ) -> Result<Self> {
        let basepath = basepath.into();
        let loader = FileSystemLoader::new(basepath.clone());
        Self::with_loader(content, basepath, filename, &loader, options)
    }

    /// Builds a tree whose source models are opened through `loader`.
    pub fn with_loader(
        content: &str,
        basepath: impl Into<PathBuf>,
        filename: impl Into<String>,
        loader: &dyn SourceModelLoader,
        options: BuildOptions,
    ) -> Result<Self> {
        let ctx = ErrorContext::new(basepath, filename);
        let mut kind = SourceModelKind {
            loader,
            data: SourceModelData::new(),
        };
        let tree = build(&mut kind, content, &ctx, options)?;
        Ok(Self {
            tree,
            data: kind.data,
            ctx,
        })
    }

    /// Reads the configured source model logic tree file.
    pub fn from_config(config: &LogicTreeConfig) -> Result<Self> {
        let file = config
            .source_model_logic_tree_file
            .as_deref()
            .ok_or_else(|| LogicTreeError::Parsing {
                basepath: config.base_path.clone(),
                filename: String::new(),
                message: "no source model logic tree file configured".to_string(),
            })?;
        let ctx = ErrorContext::new(&config.base_path, file.to_string_lossy());
        let content = read_input(&ctx, &config.resolve(file))?;
        let options = BuildOptions::new().with_validation(config.validate);
        Self::new(&content, config.base_path.clone(), ctx.filename(), options)
    }

    pub fn tree(&self) -> &LogicTree {
        &self.tree
    }

    pub fn basepath(&self) -> &Path {
        self.ctx.basepath()
    }

    pub fn filename(&self) -> &str {
        self.ctx.filename()
    }

    /// Ids of all sources in the scanned source models.
    pub fn source_ids(&self) -> &BTreeSet<String> {
        &self.data.source_ids
    }

    pub fn source_types(&self) -> &BTreeSet<SourceType> {
        &self.data.source_types
    }

    /// Region types of the scanned sources, the known set for the paired
    /// GMPE logic tree.
    pub fn tectonic_region_types(&self) -> &BTreeSet<String> {
        &self.data.tectonic_region_types
    }

    /// Returns a closure applying, in path order, the uncertainty of every
    /// branch on `branch_ids` except the source model choice.
    pub fn make_apply_uncertainties<S: AsRef<str>>(
        &self,
        branch_ids: &[S],
    ) -> Result<impl Fn(&mut dyn SeismicSource) + '_> {
        let path = self.tree.walk(branch_ids)?;
        let steps: Vec<(&BranchSet, &UncertaintyValue)> = path
            .steps()
            .iter()
            .filter(|(branchset, _)| branchset.uncertainty_type().is_gutenberg_richter())
            .map(|&(branchset, branch)| (branchset, branch.value()))
            .collect();
        Ok(move |source: &mut dyn SeismicSource| {
            for (branchset, value) in &steps {
                branchset.apply_uncertainty(value, &mut *source);
            }
        })
    }

    /// Realizations whose value is the chosen source model file name.
    pub fn realizations(
        &self,
        mode: RealizationMode,
    ) -> impl Iterator<Item = Realization<String>> + '_ {
        self.tree.paths(mode).map(|path| {
            let name = path
                .root_branch()
                .and_then(|branch| branch.value().as_source_model())
                .unwrap_or_default()
                .to_string();
            Realization::new(name, path.weight(), path.branch_ids())
        })
    }
}

struct SourceModelKind<'l> {
    loader: &'l dyn SourceModelLoader,
    data: SourceModelData,
}

impl SourceModelKind<'_> {
    fn collect_source_model_data(&mut self, ctx: &ErrorContext, name: &str) -> Result<()> {
        let model_ctx = ctx.for_file(name);
        let input = self
            .loader
            .open(name)
            .map_err(|e| model_ctx.parsing(e.to_string()))?;
        let found =
            scan_source_model(input, &mut self.data).map_err(|msg| model_ctx.parsing(msg))?;
        debug!(
            event = "source_model_scanned",
            source_model = name,
            sources = found as u64,
        );
        Ok(())
    }
}

// Plain decimal: optional sign, then digits with at most one dot and at
// least one digit after it.
fn is_plain_float(text: &str) -> bool {
    let unsigned = text.strip_prefix(|c| c == '+' || c == '-').unwrap_or(text);
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match unsigned.split_once('.') {
        None => !unsigned.is_empty() && all_digits(unsigned),
        Some((int, frac)) => !frac.is_empty() && all_digits(int) && all_digits(frac),
    }
}

fn parse_float(ctx: &ErrorContext, node: &Element, text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| ctx.validation(node, format!("expected a float, found {text:?}")))
}

impl LogicTreeKind for SourceModelKind<'_> {
    const KIND: &'static str = "source_model";

    fn validate_filters(
        &mut self,
        ctx: &ErrorContext,
        node: &Element,
        uncertainty_type: UncertaintyType,
        filters: &RawFilters,
    ) -> Result<()> {
        if uncertainty_type == UncertaintyType::SourceModel && !filters.is_empty() {
            return Err(ctx.validation(
                node,
                "filters are not allowed on source model uncertainty",
            ));
        }
        if filters.len() > 1 {
            return Err(ctx.validation(node, "only one filter is allowed per branchset"));
        }

        if let Some(trt) = filters.get(&FilterKind::TectonicRegionType) {
            if !self.data.tectonic_region_types.contains(trt) {
                return Err(ctx.validation(
                    node,
                    format!("source models don't define sources of tectonic region type {trt:?}"),
                ));
            }
        }
        if let Some(source_type) = filters.get(&FilterKind::SourceType) {
            let known = source_type
                .parse::<SourceType>()
                .is_ok_and(|st| self.data.source_types.contains(&st));
            if !known {
                return Err(ctx.validation(
                    node,
                    format!("source models don't define sources of type {source_type:?}"),
                ));
            }
        }
        if let Some(ids) = filters.get(&FilterKind::Sources) {
            for source_id in ids.split_whitespace() {
                if !self.data.source_ids.contains(source_id) {
                    return Err(ctx.validation(
                        node,
                        format!("source with id {source_id:?} is not defined in source models"),
                    ));
                }
            }
        }

        if uncertainty_type.is_absolute() {
            let single_source = filters.len() == 1
                && filters
                    .get(&FilterKind::Sources)
                    .is_some_and(|ids| ids.split_whitespace().count() == 1);
            if !single_source {
                return Err(ctx.validation(
                    node,
                    format!(
                        "uncertainty of type {:?} must define 'applyToSources' with only one source id",
                        uncertainty_type.as_str()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn parse_filters(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        _uncertainty_type: UncertaintyType,
        filters: RawFilters,
    ) -> Result<Filters> {
        let mut parsed = Filters::new();
        for (kind, value) in filters {
            parsed = match kind {
                FilterKind::TectonicRegionType => parsed.with_tectonic_region_type(value),
                FilterKind::SourceType => {
                    let source_type = value
                        .parse::<SourceType>()
                        .map_err(|msg| ctx.validation(node, msg))?;
                    parsed.with_source_type(source_type)
                }
                FilterKind::Sources => parsed.with_sources(value.split_whitespace()),
            };
        }
        Ok(parsed)
    }

    fn validate_branchset(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        depth: usize,
        number: usize,
        branchset: &BranchSet,
    ) -> Result<()> {
        let uncertainty_type = branchset.uncertainty_type();
        if depth == 0 {
            if number > 0 {
                return Err(ctx.validation(
                    node,
                    "there must be only one branch set on first branching level",
                ));
            }
            if uncertainty_type != UncertaintyType::SourceModel {
                return Err(ctx.validation(
                    node,
                    "first branchset must define an uncertainty of type \"sourceModel\"",
                ));
            }
        } else if uncertainty_type == UncertaintyType::SourceModel {
            return Err(ctx.validation(
                node,
                "uncertainty of type \"sourceModel\" can be defined on first branchset only",
            ));
        } else if uncertainty_type == UncertaintyType::GmpeModel {
            return Err(ctx.validation(
                node,
                "uncertainty of type \"gmpeModel\" is not allowed in source model logic tree",
            ));
        }
        Ok(())
    }

    fn validate_uncertainty_value(
        &mut self,
        ctx: &ErrorContext,
        node: &Element,
        branchset: &BranchSet,
        value: &str,
    ) -> Result<()> {
        match branchset.uncertainty_type() {
            UncertaintyType::SourceModel => self.collect_source_model_data(ctx, value),
            UncertaintyType::AbGrAbsolute => {
                let pair: Vec<&str> = value.split_whitespace().collect();
                if pair.len() == 2 && pair.iter().all(|v| is_plain_float(v)) {
                    Ok(())
                } else {
                    Err(ctx.validation(node, "expected a pair of floats separated by space"))
                }
            }
            _ => {
                if is_plain_float(value) {
                    Ok(())
                } else {
                    Err(ctx.validation(node, "expected single float value"))
                }
            }
        }
    }

    fn parse_uncertainty_value(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        branchset: &BranchSet,
        value: &str,
    ) -> Result<UncertaintyValue> {
        match branchset.uncertainty_type() {
            UncertaintyType::SourceModel => Ok(UncertaintyValue::SourceModel(value.to_string())),
            UncertaintyType::AbGrAbsolute => {
                let pair: Vec<&str> = value.split_whitespace().collect();
                match pair.as_slice() {
                    [a, b] => Ok(UncertaintyValue::FloatPair(
                        parse_float(ctx, node, a)?,
                        parse_float(ctx, node, b)?,
                    )),
                    _ => Err(ctx.validation(node, "expected a pair of floats separated by space")),
                }
            }
            _ => Ok(UncertaintyValue::Float(parse_float(ctx, node, value)?)),
        }
    }

    fn apply_branchset(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        tree: &mut LogicTree,
        open_ends: &[BranchRef],
        branchset: BranchSetId,
    ) -> Result<()> {
        let targets: Vec<&str> = node
            .attr("applyToBranches")
            .map(|ids| ids.split_whitespace().collect())
            .unwrap_or_default();
        if targets.is_empty() {
            attach_to_open_ends(tree, open_ends, branchset);
            return Ok(());
        }

        for branch_id in targets {
            let at = tree.branch_ref(branch_id).ok_or_else(|| {
                ctx.validation(node, format!("branch {branch_id:?} is not yet defined"))
            })?;
            if !tree.branch_at(at).is_leaf() {
                return Err(ctx.validation(
                    node,
                    format!("branch {branch_id:?} already has child branchset"),
                ));
            }
            if !open_ends.contains(&at) {
                return Err(ctx.validation(
                    node,
                    "applyToBranches must reference only branches from previous branching level",
                ));
            }
            tree.attach(at, branchset);
        }
        Ok(())
    }
}
