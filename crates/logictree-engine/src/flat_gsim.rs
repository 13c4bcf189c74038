//! Flat GSIM logic tree.
//!
//! A simplified reading of a GMPE logic tree for callers that only need the
//! model choices per tectonic region type. Branchsets are assumed
//! independent, so the realizations are the cartesian product of the
//! per-region branch lists; nothing is nested and no path is ever walked.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::info;

use logictree_core::{weight, FilterKind, Realization, Result, UncertaintyType, Weight};

use crate::context::{read_input, ErrorContext};
use crate::document::{parse_document, Element};
use crate::schema::schema;

/// One branch of a kept branchset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBranch {
    pub branchset_id: String,
    pub branch_id: String,
    pub tectonic_region_type: String,
    pub gsim: String,
    pub weight: Weight,
}

/// Branches grouped by region type, in order of first appearance.
#[derive(Debug, Clone)]
pub struct GsimLogicTree {
    filename: String,
    filter_keys: Vec<String>,
    branches: Vec<FlatBranch>,
    groups: Vec<Vec<usize>>,
}

impl GsimLogicTree {
    /// Parses `content`, keeping the branchsets whose region type is one of
    /// `filter_keys`.
    pub fn new<I, S>(content: &str, filename: impl Into<String>, filter_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ctx = ErrorContext::new(PathBuf::new(), filename);
        Self::parse(content, &ctx, filter_keys)
    }

    /// Reads and parses the file at `path`.
    pub fn from_file<I, S>(path: impl AsRef<Path>, filter_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = path.as_ref();
        let basepath = path.parent().unwrap_or_else(|| Path::new(""));
        let file = path.file_name().map(Path::new).unwrap_or(path);
        let ctx = ErrorContext::new(basepath, file.to_string_lossy());
        let content = read_input(&ctx, path)?;
        Self::parse(&content, &ctx, filter_keys)
    }

    fn parse<I, S>(content: &str, ctx: &ErrorContext, filter_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter_keys: Vec<String> = filter_keys.into_iter().map(Into::into).collect();
        filter_keys.sort();
        let distinct = filter_keys.len();
        filter_keys.dedup();
        if filter_keys.len() != distinct {
            return Err(ctx.invalid(format_args!(
                "The given tectonic region types are not distinct: {}",
                filter_keys.join(",")
            )));
        }

        let root = parse_document(content).map_err(|msg| ctx.parsing(msg))?;
        schema()
            .validate(&root)
            .map_err(|violation| ctx.parsing(violation.to_string()))?;
        let tree_node = root
            .child("logicTree")
            .ok_or_else(|| ctx.parsing("missing <logicTree> element"))?;

        let mut branches = Vec::new();
        let mut seen = BTreeSet::new();
        let mut duplicated = Vec::new();
        for level in tree_node.children_named("logicTreeBranchingLevel") {
            let branchsets: Vec<&Element> = level.children_named("logicTreeBranchSet").collect();
            if branchsets.len() > 1 {
                return Err(ctx.invalid(format_args!(
                    "Branching level {} has multiple branchsets",
                    level.attr("branchingLevelID").unwrap_or_default()
                )));
            }
            for branchset in branchsets {
                if branchset.attr("uncertaintyType") != Some(UncertaintyType::GmpeModel.as_str()) {
                    return Err(ctx.invalid(
                        "only uncertainties of type \"gmpeModel\" are allowed in gmpe logic tree",
                    ));
                }
                let trt = branchset
                    .attr(FilterKind::TectonicRegionType.attribute())
                    .unwrap_or_default();
                // duplicates count across the whole document, kept or not
                if !trt.is_empty() && !seen.insert(trt.to_string()) {
                    duplicated.push(trt.to_string());
                }
                if !filter_keys.iter().any(|key| key == trt) {
                    continue;
                }
                parse_branches(branchset, trt, ctx, &mut branches)?;
            }
        }

        if !duplicated.is_empty() {
            return Err(ctx.invalid(format_args!(
                "Found duplicated applyToTectonicRegionType={duplicated:?}"
            )));
        }
        if !filter_keys.is_empty() && branches.is_empty() {
            return Err(ctx.invalid(format_args!(
                "Could not find branches with attribute \"applyToTectonicRegionType\" in {filter_keys:?}"
            )));
        }

        let mut order: Vec<&str> = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (index, branch) in branches.iter().enumerate() {
            let trt = branch.tectonic_region_type.as_str();
            match order.iter().position(|&seen| seen == trt) {
                Some(group) => groups[group].push(index),
                None => {
                    order.push(trt);
                    groups.push(vec![index]);
                }
            }
        }

        let tree = Self {
            filename: ctx.filename().to_string(),
            filter_keys,
            branches,
            groups,
        };
        info!(
            event = "build_end",
            kind = "flat_gsim",
            filename = ctx.filename(),
            branchsets = tree.groups.len() as u64,
            branches = tree.branches.len() as u64,
            depth = tree.groups.len() as u64,
        );
        Ok(tree)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Region types this tree was filtered on, sorted.
    pub fn filter_keys(&self) -> &[String] {
        &self.filter_keys
    }

    /// All kept branches in document order.
    pub fn branches(&self) -> &[FlatBranch] {
        &self.branches
    }

    /// Number of branches per branchset id.
    pub fn num_branches(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for branch in &self.branches {
            *counts.entry(branch.branchset_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of realizations, assuming independent branchsets.
    ///
    /// Saturates at `u128::MAX`.
    pub fn num_paths(&self) -> u128 {
        self.groups
            .iter()
            .fold(1u128, |acc, group| acc.saturating_mul(group.len() as u128))
    }

    /// Lazy cartesian product; the last region type varies fastest.
    pub fn iter(&self) -> FlatRealizations<'_> {
        FlatRealizations {
            tree: self,
            cursor: Some(vec![0; self.groups.len()]),
        }
    }
}

fn parse_branches(
    branchset: &Element,
    trt: &str,
    ctx: &ErrorContext,
    branches: &mut Vec<FlatBranch>,
) -> Result<()> {
    let branchset_id = branchset.attr("branchSetID").unwrap_or_default();
    let mut weights = Vec::new();
    for node in branchset.children_named("logicTreeBranch") {
        let text = node.child("uncertaintyWeight").map(Element::text).unwrap_or_default();
        let weight = weight::parse_weight(text)
            .map_err(|e| ctx.invalid(format_args!("branchset {branchset_id:?}: {e}")))?;
        weights.push(weight);
        branches.push(FlatBranch {
            branchset_id: branchset_id.to_string(),
            branch_id: node.attr("branchID").unwrap_or_default().to_string(),
            tectonic_region_type: trt.to_string(),
            gsim: node
                .child("uncertaintyModel")
                .map(|model| model.text().trim().to_string())
                .unwrap_or_default(),
            weight,
        });
    }
    if !weight::sums_to_one(&weights) {
        return Err(ctx.invalid(format_args!(
            "branchset {branchset_id:?} weights don't sum up to 1.0"
        )));
    }
    Ok(())
}

/// Iterator over the realizations of a [`GsimLogicTree`].
#[derive(Debug, Clone)]
pub struct FlatRealizations<'a> {
    tree: &'a GsimLogicTree,
    cursor: Option<Vec<usize>>,
}

impl Iterator for FlatRealizations<'_> {
    type Item = Realization<BTreeMap<String, String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let groups = &self.tree.groups;
        let branches = &self.tree.branches;

        let picked: Vec<&FlatBranch> = groups
            .iter()
            .zip(cursor.iter())
            .map(|(group, &pick)| &branches[group[pick]])
            .collect();
        let value = picked
            .iter()
            .map(|branch| (branch.tectonic_region_type.clone(), branch.gsim.clone()))
            .collect();
        let lt_path = picked.iter().map(|branch| branch.branch_id.clone()).collect();
        let weight = weight::product(picked.iter().map(|branch| branch.weight));

        // odometer step
        let mut exhausted = true;
        for position in (0..groups.len()).rev() {
            cursor[position] += 1;
            if cursor[position] < groups[position].len() {
                exhausted = false;
                break;
            }
            cursor[position] = 0;
        }
        if exhausted {
            self.cursor = None;
        }
        Some(Realization::new(value, Some(weight), lt_path))
    }
}

impl<'a> IntoIterator for &'a GsimLogicTree {
    type Item = Realization<BTreeMap<String, String>>;
    type IntoIter = FlatRealizations<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logictree_core::LogicTreeError;
    use logictree_test::{BranchSetXml, LogicTreeXml};
    use rust_decimal::Decimal;

    const ACTIVE: &str = "Active Shallow Crust";
    const STABLE: &str = "Stable Continental";
    const SUBDUCTION: &str = "Subduction Interface";

    fn three_region_tree() -> String {
        LogicTreeXml::new()
            .level([BranchSetXml::new("bs1", "gmpeModel")
                .attr("applyToTectonicRegionType", ACTIVE)
                .branch("b11", "BooreAtkinson2008", "0.5")
                .branch("b12", "ChiouYoungs2008", "0.5")])
            .level([BranchSetXml::new("bs2", "gmpeModel")
                .attr("applyToTectonicRegionType", STABLE)
                .branch("b21", "ToroEtAl2002", "0.4")
                .branch("b22", "AkkarBommer2010", "0.3")
                .branch("b23", "SadighEtAl1997", "0.3")])
            .level([BranchSetXml::new("bs3", "gmpeModel")
                .attr("applyToTectonicRegionType", SUBDUCTION)
                .branch("b31", "SadighEtAl1997", "1.0")])
            .to_xml()
    }

    #[test]
    fn test_path_count_is_product() {
        let tree = GsimLogicTree::new(&three_region_tree(), "gmpe.xml", [ACTIVE, STABLE, SUBDUCTION])
            .unwrap();
        assert_eq!(tree.num_paths(), 6);
        assert_eq!(tree.iter().count(), 6);
        assert_eq!(tree.num_branches()["bs2"], 3);
    }

    #[test]
    fn test_iteration_order_and_weights() {
        let tree = GsimLogicTree::new(&three_region_tree(), "gmpe.xml", [ACTIVE, STABLE]).unwrap();
        let realizations: Vec<_> = tree.iter().collect();

        assert_eq!(realizations.len(), 6);
        assert_eq!(realizations[0].lt_path, vec!["b11", "b21"]);
        assert_eq!(realizations[1].lt_path, vec!["b11", "b22"]);
        assert_eq!(realizations[3].lt_path, vec!["b12", "b21"]);
        assert_eq!(realizations[0].value[ACTIVE], "BooreAtkinson2008");
        assert_eq!(realizations[0].value[STABLE], "ToroEtAl2002");
        assert!(!realizations[0].value.contains_key(SUBDUCTION));
        assert_eq!(realizations[0].weight, Some(Decimal::new(20, 2)));

        let total: Decimal = realizations.iter().filter_map(|r| r.weight).sum();
        assert_eq!(total, Decimal::ONE);
    }

    #[test]
    fn test_no_filter_keys_yields_one_empty_realization() {
        let tree = GsimLogicTree::new(&three_region_tree(), "gmpe.xml", Vec::<String>::new()).unwrap();
        assert_eq!(tree.num_paths(), 1);
        let realizations: Vec<_> = (&tree).into_iter().collect();
        assert_eq!(realizations.len(), 1);
        assert!(realizations[0].value.is_empty());
        assert_eq!(realizations[0].weight, Some(Decimal::ONE));
    }

    #[test]
    fn test_multiple_branchsets_in_level() {
        let xml = LogicTreeXml::new()
            .level([
                BranchSetXml::new("bs1", "gmpeModel")
                    .attr("applyToTectonicRegionType", ACTIVE)
                    .branch("b1", "BooreAtkinson2008", "1.0"),
                BranchSetXml::new("bs2", "gmpeModel")
                    .attr("applyToTectonicRegionType", STABLE)
                    .branch("b2", "ToroEtAl2002", "1.0"),
            ])
            .to_xml();
        let err = GsimLogicTree::new(&xml, "gmpe.xml", [ACTIVE]).unwrap_err();
        assert!(matches!(err, LogicTreeError::InvalidLogicTree(_)));
        assert_eq!(err.message(), "gmpe.xml: Branching level bl1 has multiple branchsets");
    }

    #[test]
    fn test_non_gmpe_uncertainty() {
        let xml = LogicTreeXml::new()
            .level([BranchSetXml::new("bs1", "sourceModel").branch("b1", "sm.xml", "1.0")])
            .to_xml();
        let err = GsimLogicTree::new(&xml, "gmpe.xml", [ACTIVE]).unwrap_err();
        assert!(err.message().contains("gmpeModel"));
    }

    #[test]
    fn test_duplicated_region_type() {
        let xml = LogicTreeXml::new()
            .level([BranchSetXml::new("bs1", "gmpeModel")
                .attr("applyToTectonicRegionType", ACTIVE)
                .branch("b1", "BooreAtkinson2008", "1.0")])
            .level([BranchSetXml::new("bs2", "gmpeModel")
                .attr("applyToTectonicRegionType", ACTIVE)
                .branch("b2", "ChiouYoungs2008", "1.0")])
            .to_xml();
        let err = GsimLogicTree::new(&xml, "gmpe.xml", [ACTIVE]).unwrap_err();
        assert!(err.message().starts_with("gmpe.xml: Found duplicated applyToTectonicRegionType"));
    }

    #[test]
    fn test_duplicated_region_type_outside_keys() {
        let xml = LogicTreeXml::new()
            .level([BranchSetXml::new("bs1", "gmpeModel")
                .attr("applyToTectonicRegionType", ACTIVE)
                .branch("b1", "BooreAtkinson2008", "1.0")])
            .level([BranchSetXml::new("bs2", "gmpeModel")
                .attr("applyToTectonicRegionType", STABLE)
                .branch("b2", "ToroEtAl2002", "1.0")])
            .level([BranchSetXml::new("bs3", "gmpeModel")
                .attr("applyToTectonicRegionType", STABLE)
                .branch("b3", "AkkarBommer2010", "1.0")])
            .to_xml();
        let err = GsimLogicTree::new(&xml, "gmpe.xml", [ACTIVE]).unwrap_err();
        assert!(matches!(err, LogicTreeError::InvalidLogicTree(_)));
        assert!(err.message().contains(STABLE));
        assert!(err.message().contains("Found duplicated"));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let xml = LogicTreeXml::new()
            .level([BranchSetXml::new("bs1", "gmpeModel")
                .attr("applyToTectonicRegionType", ACTIVE)
                .branch("b1", "BooreAtkinson2008", "0.5")
                .branch("b2", "ChiouYoungs2008", "0.4")])
            .to_xml();
        let err = GsimLogicTree::new(&xml, "gmpe.xml", [ACTIVE]).unwrap_err();
        assert!(err.message().contains("don't sum up to 1.0"));
        assert!(err.message().starts_with("gmpe.xml: branchset \"bs1\""));
    }

    #[test]
    fn test_unknown_keys_find_no_branches() {
        let err =
            GsimLogicTree::new(&three_region_tree(), "gmpe.xml", ["Volcanic"]).unwrap_err();
        assert!(err.message().starts_with("gmpe.xml: Could not find branches"));
    }

    #[test]
    fn test_keys_must_be_distinct() {
        let err =
            GsimLogicTree::new(&three_region_tree(), "gmpe.xml", [ACTIVE, ACTIVE]).unwrap_err();
        assert!(err.message().contains("not distinct"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gmpe_logic_tree.xml");
        std::fs::write(&path, three_region_tree()).unwrap();

        let tree = GsimLogicTree::from_file(&path, [SUBDUCTION]).unwrap();
        assert_eq!(tree.filename(), "gmpe_logic_tree.xml");
        assert_eq!(tree.num_paths(), 1);

        let missing = GsimLogicTree::from_file(dir.path().join("missing.xml"), [SUBDUCTION]);
        assert!(missing.unwrap_err().is_parsing());
    }
}
