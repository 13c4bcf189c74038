//! A tree kind defined outside the engine, built through the public hooks.

use logictree::{
    attach_to_open_ends, build, BranchRef, BranchSet, BranchSetId, BuildOptions, Element,
    ErrorContext, Filters, LogicTree, LogicTreeKind, RawFilters, Result, UncertaintyType,
    UncertaintyValue,
};
use logictree_test::{BranchSetXml, LogicTreeXml};
use rust_decimal::Decimal;

/// Plain float values; every later branchset hangs off one open end only.
struct FirstOpenEnd {
    attach_everywhere: bool,
}

impl LogicTreeKind for FirstOpenEnd {
    const KIND: &'static str = "first_open_end";

    fn validate_filters(
        &mut self,
        _ctx: &ErrorContext,
        _node: &Element,
        _uncertainty_type: UncertaintyType,
        _filters: &RawFilters,
    ) -> Result<()> {
        Ok(())
    }

    fn parse_filters(
        &self,
        _ctx: &ErrorContext,
        _node: &Element,
        _uncertainty_type: UncertaintyType,
        _filters: RawFilters,
    ) -> Result<Filters> {
        Ok(Filters::new())
    }

    fn validate_branchset(
        &self,
        _ctx: &ErrorContext,
        _node: &Element,
        _depth: usize,
        _number: usize,
        _branchset: &BranchSet,
    ) -> Result<()> {
        Ok(())
    }

    fn validate_uncertainty_value(
        &mut self,
        _ctx: &ErrorContext,
        _node: &Element,
        _branchset: &BranchSet,
        _value: &str,
    ) -> Result<()> {
        Ok(())
    }

    fn parse_uncertainty_value(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        _branchset: &BranchSet,
        value: &str,
    ) -> Result<UncertaintyValue> {
        value
            .parse::<f64>()
            .map(UncertaintyValue::Float)
            .map_err(|e| ctx.validation(node, e.to_string()))
    }

    fn apply_branchset(
        &self,
        _ctx: &ErrorContext,
        _node: &Element,
        tree: &mut LogicTree,
        open_ends: &[BranchRef],
        branchset: BranchSetId,
    ) -> Result<()> {
        if self.attach_everywhere {
            attach_to_open_ends(tree, open_ends, branchset);
        } else if let Some(&first) = open_ends.first() {
            tree.attach(first, branchset);
        }
        Ok(())
    }
}

fn two_level_xml() -> String {
    LogicTreeXml::new()
        .level([BranchSetXml::new("bs1", "bGRRelative")
            .branch("b1", "0.1", "0.5")
            .branch("b2", "-0.1", "0.5")])
        .level([BranchSetXml::new("bs2", "maxMagGRRelative")
            .branch("b3", "0.2", "0.4")
            .branch("b4", "-0.2", "0.6")])
        .to_xml()
}

fn build_kind(attach_everywhere: bool) -> LogicTree {
    let ctx = ErrorContext::new(".", "custom.xml");
    let mut kind = FirstOpenEnd { attach_everywhere };
    build(&mut kind, &two_level_xml(), &ctx, BuildOptions::default()).unwrap()
}

#[test]
fn test_custom_attachment() {
    let tree = build_kind(false);

    assert_eq!(tree.num_paths(), 3);
    let paths: Vec<Vec<String>> = tree.enumerate_paths().map(|p| p.branch_ids()).collect();
    assert_eq!(
        paths,
        vec![vec!["b1", "b3"], vec!["b1", "b4"], vec!["b2"]]
    );
    assert!(tree.branch("b2").unwrap().is_leaf());

    let total: Decimal = tree.enumerate_paths().filter_map(|p| p.weight()).sum();
    assert_eq!(total, Decimal::ONE);
}

#[test]
fn test_custom_kind_with_default_attachment() {
    let tree = build_kind(true);

    assert_eq!(tree.num_paths(), 4);
    assert_eq!(tree.depth(), 2);
    let bs2 = tree.branch("b1").unwrap().child_branchset();
    assert_eq!(bs2, tree.branch("b2").unwrap().child_branchset());
}
