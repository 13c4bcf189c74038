//! Generic logic tree construction.
//!
//! [`build`] walks a document's branching levels in order. Everything that
//! differs between tree kinds is delegated to a [`LogicTreeKind`]: which
//! branchsets to skip, how filters and values are checked and converted,
//! where a branchset is attached and what the finished tree must satisfy.
//!
//! Weight sums and branch id uniqueness are checked for every tree, whether
//! or not validation is enabled.

use rust_decimal::Decimal;
use tracing::{debug, info};

use logictree_core::{
    weight, Branch, BranchRef, BranchSet, BranchSetId, FilterKind, Filters, RawFilters, Result,
    UncertaintyType, UncertaintyValue,
};

use crate::context::ErrorContext;
use crate::document::{parse_document, Element};
use crate::schema::schema;
use crate::tree::LogicTree;

/// Construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Run the kind-specific validation hooks. Trees reloaded from
    /// already-validated input may turn this off.
    pub validate: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Hooks supplied by a concrete tree kind.
///
/// `depth` is the 0-based index of the branching level in the document and
/// `number` the 0-based index of the branchset inside its level, counting
/// skipped branchsets.
pub trait LogicTreeKind {
    /// Short name used in log events.
    const KIND: &'static str;

    /// Branchsets for which this returns true are ignored entirely.
    fn skip_branchset(&self, _node: &Element) -> bool {
        false
    }

    fn validate_filters(
        &mut self,
        ctx: &ErrorContext,
        node: &Element,
        uncertainty_type: UncertaintyType,
        filters: &RawFilters,
    ) -> Result<()>;

    fn parse_filters(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        uncertainty_type: UncertaintyType,
        filters: RawFilters,
    ) -> Result<Filters>;

    fn validate_branchset(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        depth: usize,
        number: usize,
        branchset: &BranchSet,
    ) -> Result<()>;

    fn validate_uncertainty_value(
        &mut self,
        ctx: &ErrorContext,
        node: &Element,
        branchset: &BranchSet,
        value: &str,
    ) -> Result<()>;

    fn parse_uncertainty_value(
        &self,
        ctx: &ErrorContext,
        node: &Element,
        branchset: &BranchSet,
        value: &str,
    ) -> Result<UncertaintyValue>;

    /// Links a non-root branchset into the tree.
    ///
    /// `open_ends` are the branches of the previous contributing level. The
    /// default attaches `branchset` to each of them that has no child yet.
    fn apply_branchset(
        &self,
        _ctx: &ErrorContext,
        _node: &Element,
        tree: &mut LogicTree,
        open_ends: &[BranchRef],
        branchset: BranchSetId,
    ) -> Result<()> {
        attach_to_open_ends(tree, open_ends, branchset);
        Ok(())
    }

    /// Whole-tree checks, run after the last level when validating.
    fn validate_tree(
        &self,
        _ctx: &ErrorContext,
        _node: &Element,
        _tree: &LogicTree,
    ) -> Result<()> {
        Ok(())
    }
}

/// Makes `branchset` the child of every open end that has none yet.
pub fn attach_to_open_ends(
    tree: &mut LogicTree,
    open_ends: &[BranchRef],
    branchset: BranchSetId,
) {
    for &at in open_ends {
        if tree.branch_at(at).is_leaf() {
            tree.attach(at, branchset);
        }
    }
}

/// Parses `content` and builds a tree with the hooks of `kind`.
///
/// No tree is returned unless every check passes.
pub fn build<K: LogicTreeKind>(
    kind: &mut K,
    content: &str,
    ctx: &ErrorContext,
    options: BuildOptions,
) -> Result<LogicTree> {
    let root = parse_document(content).map_err(|msg| ctx.parsing(msg))?;
    schema()
        .validate(&root)
        .map_err(|violation| ctx.parsing(violation.to_string()))?;
    let tree_node = root
        .child("logicTree")
        .ok_or_else(|| ctx.parsing("missing <logicTree> element"))?;

    info!(
        event = "build_start",
        kind = K::KIND,
        filename = ctx.filename(),
        validate = options.validate,
    );

    let mut builder = Builder {
        kind,
        ctx,
        options,
        tree: LogicTree::new(),
        depth: 0,
    };
    tree_node
        .children_named("logicTreeBranchingLevel")
        .enumerate()
        .try_fold(Vec::new(), |open_ends, (depth, level)| {
            builder.parse_branching_level(level, depth, open_ends)
        })?;

    let Builder {
        kind,
        mut tree,
        depth,
        ..
    } = builder;
    if tree.is_empty() {
        return Err(ctx.validation(tree_node, "logic tree defines no branchset"));
    }
    tree.set_depth(depth);
    if options.validate {
        kind.validate_tree(ctx, tree_node, &tree)?;
    }

    info!(
        event = "build_end",
        kind = K::KIND,
        filename = ctx.filename(),
        branchsets = tree.branchsets().len() as u64,
        branches = tree.num_branches() as u64,
        depth = tree.depth() as u64,
    );
    Ok(tree)
}

struct Builder<'k, 'c, K> {
    kind: &'k mut K,
    ctx: &'c ErrorContext,
    options: BuildOptions,
    tree: LogicTree,
    depth: usize,
}

impl<K: LogicTreeKind> Builder<'_, '_, K> {
    /// Processes one branching level and returns the next frontier.
    ///
    /// A level whose branchsets were all skipped leaves the frontier as it
    /// was.
    fn parse_branching_level(
        &mut self,
        level: &Element,
        depth: usize,
        open_ends: Vec<BranchRef>,
    ) -> Result<Vec<BranchRef>> {
        let mut new_open_ends = Vec::new();
        for (number, node) in level.children_named("logicTreeBranchSet").enumerate() {
            if self.kind.skip_branchset(node) {
                debug!(
                    event = "branchset_skipped",
                    branchset = node.attr("branchSetID").unwrap_or_default(),
                    line = node.line(),
                );
                continue;
            }
            let branchset = self.parse_branchset(node, depth, number)?;
            let id = self.tree.push_branchset(branchset);
            if id != BranchSetId(0) {
                self.kind
                    .apply_branchset(self.ctx, node, &mut self.tree, &open_ends, id)?;
                let applied = open_ends
                    .iter()
                    .any(|&at| self.tree.branch_at(at).child_branchset() == Some(id));
                if !applied {
                    return Err(self.ctx.validation(
                        node,
                        format!(
                            "branchset {:?} is not applied to any branch of the previous branching level",
                            self.tree.branchset(id).branchset_id()
                        ),
                    ));
                }
            }
            let count = self.tree.branchset(id).branches().len();
            new_open_ends.extend((0..count).map(|index| BranchRef {
                branchset: id,
                index,
            }));
        }

        debug!(
            event = "branching_level",
            level = level.attr("branchingLevelID").unwrap_or_default(),
            depth = depth as u64,
            open_ends = new_open_ends.len() as u64,
        );
        if new_open_ends.is_empty() {
            return Ok(open_ends);
        }
        self.depth += 1;
        Ok(new_open_ends)
    }

    fn parse_branchset(
        &mut self,
        node: &Element,
        depth: usize,
        number: usize,
    ) -> Result<BranchSet> {
        let ctx = self.ctx;
        let uncertainty_type = node
            .attr("uncertaintyType")
            .unwrap_or_default()
            .parse::<UncertaintyType>()
            .map_err(|msg| ctx.validation(node, msg))?;
        let raw: RawFilters = node
            .attrs()
            .iter()
            .filter_map(|(name, value)| {
                FilterKind::from_attribute(name).map(|kind| (kind, value.clone()))
            })
            .collect();

        if self.options.validate {
            self.kind
                .validate_filters(ctx, node, uncertainty_type, &raw)?;
        }
        let filters = self.kind.parse_filters(ctx, node, uncertainty_type, raw)?;
        let branchset_id = node.attr("branchSetID").unwrap_or_default();
        let mut branchset = BranchSet::new(branchset_id, uncertainty_type, filters);
        if self.options.validate {
            self.kind
                .validate_branchset(ctx, node, depth, number, &branchset)?;
        }
        self.parse_branches(node, &mut branchset)?;
        Ok(branchset)
    }

    fn parse_branches(&mut self, node: &Element, branchset: &mut BranchSet) -> Result<()> {
        let ctx = self.ctx;
        let id = self.tree.next_branchset_id();
        for branch_node in node.children_named("logicTreeBranch") {
            let (Some(weight_node), Some(value_node)) = (
                branch_node.child("uncertaintyWeight"),
                branch_node.child("uncertaintyModel"),
            ) else {
                return Err(ctx.parsing(format!(
                    "line {}: incomplete <logicTreeBranch>",
                    branch_node.line()
                )));
            };
            let weight = weight::parse_weight(weight_node.text())
                .map_err(|e| ctx.validation(weight_node, e.to_string()))?;

            let text = value_node.text().trim();
            if self.options.validate {
                self.kind
                    .validate_uncertainty_value(ctx, value_node, branchset, text)?;
            }
            let value = self
                .kind
                .parse_uncertainty_value(ctx, value_node, branchset, text)?;

            let branch_id = branch_node.attr("branchID").unwrap_or_default();
            let at = BranchRef {
                branchset: id,
                index: branchset.branches().len(),
            };
            if !self.tree.index_branch(branch_id, at) {
                return Err(ctx.validation(
                    branch_node,
                    format!("branchID {branch_id:?} is not unique"),
                ));
            }
            branchset.push_branch(Branch::new(branch_id, weight, value));
        }

        if branchset.total_weight() != Decimal::ONE {
            return Err(ctx.validation(node, "branchset weights don't sum up to 1.0"));
        }
        Ok(())
    }
}
